//! `import` command: runs the full pipeline against the configured database.

use std::path::Path;

use anyhow::Context;
use geoload_import::{run_import, ImportLimits, ImportRequest, ImportSummary, PgImportStore};

/// Import the archive at `path` on behalf of `user_id` and print a summary.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the import fails. A failed
/// import is still recorded in the audit trail.
pub(crate) async fn run_import_file(
    pool: &sqlx::PgPool,
    limits: ImportLimits,
    path: &Path,
    user_id: i64,
) -> anyhow::Result<()> {
    let archive = tokio::fs::read(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    let filename = display_filename(path);

    let store = PgImportStore::new(pool.clone());
    let request = ImportRequest {
        user_id,
        filename: &filename,
        archive: &archive,
    };

    let summary = match run_import(&store, &store, limits, request).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::warn!(
                user_id,
                filename = %filename,
                client_error = e.is_client_error(),
                error = %e,
                "import failed"
            );
            return Err(e).with_context(|| format!("import of {filename} failed"));
        }
    };

    tracing::info!(
        user_id,
        attempt_id = summary.attempt_id,
        count = summary.count,
        skipped_rows = summary.skipped_rows,
        "import finished"
    );
    print_summary(&summary);
    Ok(())
}

fn display_filename(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

fn print_summary(summary: &ImportSummary) {
    println!(
        "{} locations uploaded successfully (attempt {}, {} malformed rows skipped)",
        summary.count, summary.attempt_id, summary.skipped_rows
    );
    if summary.preview.is_empty() {
        return;
    }

    println!();
    println!("{:<10}{:<12}{:<12}NAME", "ID", "LATITUDE", "LONGITUDE");
    for loc in &summary.preview {
        println!(
            "{:<10}{:<12.6}{:<12.6}{}",
            loc.id, loc.latitude, loc.longitude, loc.name
        );
    }
    if summary.count > summary.preview.len() {
        println!("... and {} more", summary.count - summary.preview.len());
    }
}

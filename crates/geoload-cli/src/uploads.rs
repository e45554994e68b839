use chrono::{DateTime, Utc};

/// Print a user's most recent upload attempts, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_uploads_list(
    pool: &sqlx::PgPool,
    user_id: i64,
    limit: i64,
) -> anyhow::Result<()> {
    let attempts = geoload_db::list_import_attempts(pool, user_id, limit).await?;

    if attempts.is_empty() {
        println!("no uploads found for user {user_id}");
        return Ok(());
    }

    println!(
        "{:<18}{:<10}{:<8}{:<9}{:<32}ERROR",
        "CREATED", "STATUS", "COUNT", "SKIPPED", "FILENAME"
    );
    for attempt in &attempts {
        println!(
            "{:<18}{:<10}{:<8}{:<9}{:<32}{}",
            fmt_timestamp(attempt.created_at),
            status_label(attempt.success, attempt.completed_at),
            attempt.location_count,
            attempt.skipped_rows,
            shorten(&attempt.filename, 30),
            attempt.error_message.as_deref().unwrap_or("-"),
        );
    }

    Ok(())
}

fn fmt_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M").to_string()
}

fn status_label(success: bool, completed_at: Option<DateTime<Utc>>) -> &'static str {
    match (success, completed_at) {
        (true, _) => "ok",
        (false, Some(_)) => "failed",
        (false, None) => "pending",
    }
}

fn shorten(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        format!("{}...", s.chars().take(max - 3).collect::<String>())
    } else {
        s.to_string()
    }
}

//! Live integration tests for geoload-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/geoload-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use geoload_core::ValidatedLocation;
use geoload_db::{
    complete_import_attempt, count_locations_for_user, create_import_attempt,
    fail_import_attempt, get_import_attempt, insert_location_batch, list_import_attempts,
    list_locations_for_user, DbError,
};

fn loc(name: &str, latitude: f64, longitude: f64) -> ValidatedLocation {
    ValidatedLocation {
        name: name.to_string(),
        latitude,
        longitude,
    }
}

// ---------------------------------------------------------------------------
// Section 1: Location batch writes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn insert_location_batch_returns_rows_in_input_order(pool: sqlx::PgPool) {
    let batch = vec![
        loc("Alpha", 1.0, 2.0),
        loc("Bravo", -45.5, 170.25),
        loc("Charlie", 89.9, -179.9),
    ];

    let rows = insert_location_batch(&pool, 7, &batch)
        .await
        .expect("insert_location_batch failed");

    assert_eq!(rows.len(), 3);
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["Alpha", "Bravo", "Charlie"]);
    assert!(rows.iter().all(|r| r.user_id == 7));
    assert!(rows.windows(2).all(|w| w[0].id < w[1].id));
    assert!((rows[1].latitude - -45.5).abs() < f64::EPSILON);
    assert!((rows[1].longitude - 170.25).abs() < f64::EPSILON);
}

#[sqlx::test(migrations = "../../migrations")]
async fn insert_location_batch_empty_is_noop(pool: sqlx::PgPool) {
    let rows = insert_location_batch(&pool, 7, &[])
        .await
        .expect("empty batch should succeed");
    assert!(rows.is_empty());
    assert_eq!(count_locations_for_user(&pool, 7).await.expect("count"), 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn insert_location_batch_is_all_or_nothing(pool: sqlx::PgPool) {
    // The second row violates the latitude CHECK constraint.
    let batch = vec![loc("Good", 10.0, 10.0), loc("Bad", 95.0, 10.0)];

    let err = insert_location_batch(&pool, 3, &batch)
        .await
        .expect_err("constraint violation should fail the batch");
    assert!(matches!(err, DbError::Sqlx(_)), "unexpected error: {err:?}");

    assert_eq!(
        count_locations_for_user(&pool, 3).await.expect("count"),
        0,
        "no row of a failed batch may be committed"
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn locations_are_scoped_to_their_user(pool: sqlx::PgPool) {
    insert_location_batch(&pool, 1, &[loc("Mine", 0.0, 0.0)])
        .await
        .expect("insert user 1");
    insert_location_batch(&pool, 2, &[loc("Theirs", 1.0, 1.0), loc("Also", 2.0, 2.0)])
        .await
        .expect("insert user 2");

    let mine = list_locations_for_user(&pool, 1, 50).await.expect("list");
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].name, "Mine");
    assert_eq!(count_locations_for_user(&pool, 2).await.expect("count"), 2);
}

// ---------------------------------------------------------------------------
// Section 2: Import attempt lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn import_attempt_lifecycle_created_to_succeeded(pool: sqlx::PgPool) {
    let attempt = create_import_attempt(&pool, 5, "points.zip")
        .await
        .expect("create_import_attempt failed");

    assert!(!attempt.success);
    assert_eq!(attempt.location_count, 0);
    assert!(attempt.error_message.is_none());
    assert!(attempt.completed_at.is_none());

    let done = complete_import_attempt(&pool, attempt.id, 12, 2)
        .await
        .expect("complete_import_attempt failed");
    assert!(done.success);
    assert_eq!(done.location_count, 12);
    assert_eq!(done.skipped_rows, 2);
    assert!(done.completed_at.is_some());

    let fetched = get_import_attempt(&pool, attempt.id)
        .await
        .expect("get_import_attempt failed");
    assert!(fetched.success);
    assert_eq!(fetched.location_count, 12);
}

#[sqlx::test(migrations = "../../migrations")]
async fn import_attempt_lifecycle_created_to_failed(pool: sqlx::PgPool) {
    let attempt = create_import_attempt(&pool, 5, "points.zip")
        .await
        .expect("create_import_attempt failed");

    let long_message = "bad row ".repeat(100);
    let failed = fail_import_attempt(&pool, attempt.id, &long_message)
        .await
        .expect("fail_import_attempt failed");

    assert!(!failed.success);
    assert_eq!(failed.location_count, 0);
    let stored = failed.error_message.expect("error_message should be set");
    assert_eq!(stored.chars().count(), 500);
    assert!(failed.completed_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn import_attempt_cannot_be_completed_twice(pool: sqlx::PgPool) {
    let attempt = create_import_attempt(&pool, 5, "points.zip")
        .await
        .expect("create_import_attempt failed");

    fail_import_attempt(&pool, attempt.id, "first")
        .await
        .expect("first completion");

    let err = complete_import_attempt(&pool, attempt.id, 3, 0)
        .await
        .expect_err("second completion must be rejected");
    assert!(
        matches!(err, DbError::AttemptAlreadyCompleted { id } if id == attempt.id),
        "unexpected error: {err:?}"
    );

    let fetched = get_import_attempt(&pool, attempt.id).await.expect("get");
    assert!(!fetched.success);
    assert_eq!(fetched.error_message.as_deref(), Some("first"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_import_attempt_truncates_long_filenames(pool: sqlx::PgPool) {
    let filename = format!("{}.zip", "f".repeat(300));
    let attempt = create_import_attempt(&pool, 5, &filename)
        .await
        .expect("long filename should be truncated, not rejected");
    assert_eq!(attempt.filename.chars().count(), 255);
}

#[sqlx::test(migrations = "../../migrations")]
async fn get_import_attempt_missing_is_not_found(pool: sqlx::PgPool) {
    let err = get_import_attempt(&pool, 999_999)
        .await
        .expect_err("missing attempt");
    assert!(matches!(err, DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_import_attempts_is_newest_first_and_user_scoped(pool: sqlx::PgPool) {
    let first = create_import_attempt(&pool, 8, "one.zip").await.expect("one");
    let second = create_import_attempt(&pool, 8, "two.zip").await.expect("two");
    create_import_attempt(&pool, 9, "other.zip")
        .await
        .expect("other user");

    let rows = list_import_attempts(&pool, 8, 10).await.expect("list");
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, [second.id, first.id]);

    let limited = list_import_attempts(&pool, 8, 1).await.expect("list");
    assert_eq!(limited.len(), 1);
}

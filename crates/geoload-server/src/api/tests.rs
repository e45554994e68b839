use std::io::{Cursor, Write};

use axum::body::{to_bytes, Body};
use axum::http::Request;
use tower::ServiceExt;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::*;

const BOUNDARY: &str = "geoload-test-boundary";

fn zip_of(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .expect("start file");
        writer.write_all(contents.as_bytes()).expect("write entry");
    }
    writer.finish().expect("finish archive").into_inner()
}

fn multipart_body(field: &str, filename: &str, contents: &[u8]) -> Vec<u8> {
    let mut body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
         Content-Type: application/zip\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(contents);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload_request(user_id: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/v1/uploads")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        );
    if let Some(user_id) = user_id {
        builder = builder.header(USER_ID_HEADER, user_id);
    }
    builder.body(Body::from(body)).expect("request")
}

fn get_request(uri: &str, user_id: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(USER_ID_HEADER, user_id)
        .body(Body::empty())
        .expect("request")
}

fn app(pool: PgPool) -> Router {
    build_app(AppState {
        pool,
        limits: ImportLimits::default(),
    })
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

async fn attempt_count(pool: &PgPool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM import_attempts")
        .fetch_one(pool)
        .await
        .expect("count attempts")
}

#[test]
fn normalize_limit_applies_defaults_and_bounds() {
    assert_eq!(normalize_limit(None), 50);
    assert_eq!(normalize_limit(Some(0)), 1);
    assert_eq!(normalize_limit(Some(1_000)), 200);
    assert_eq!(normalize_limit(Some(25)), 25);
}

#[test]
fn api_error_codes_map_to_status() {
    assert_eq!(
        ApiError::bad_request("req-1", "bad").into_response().status(),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        ApiError::new("req-1", "unauthorized", "who").into_response().status(),
        StatusCode::UNAUTHORIZED
    );
    assert_eq!(
        ApiError::new("req-1", "internal_error", "boom")
            .into_response()
            .status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn health_reports_ok_and_echoes_request_id(pool: PgPool) {
    let response = app(pool)
        .oneshot(
            Request::builder()
                .uri("/api/v1/health")
                .header("x-request-id", "req-health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok()),
        Some("req-health")
    );
    let json = json_body(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["meta"]["request_id"], "req-health");
}

#[sqlx::test(migrations = "../../migrations")]
async fn upload_without_user_header_is_unauthorized(pool: PgPool) {
    let archive = zip_of(&[("data.txt", "Name,Lat,Lng\nA,1,2\n")]);
    let response = app(pool.clone())
        .oneshot(upload_request(
            None,
            multipart_body("file", "points.zip", &archive),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "unauthorized");
    assert_eq!(attempt_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn valid_upload_persists_locations_and_returns_summary(pool: PgPool) {
    let archive = zip_of(&[("data.txt", "Name,Lat,Lng\nA,1.0,2.0\nshort\nB,-3.5,4.25\n")]);
    let response = app(pool.clone())
        .oneshot(upload_request(
            Some("7"),
            multipart_body("file", "points.zip", &archive),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["success"], true);
    assert_eq!(json["data"]["message"], "2 locations uploaded successfully");
    assert_eq!(json["data"]["count"], 2);
    assert_eq!(json["data"]["skipped_rows"], 1);
    assert_eq!(json["data"]["locations"][0]["name"], "A");
    assert_eq!(json["data"]["locations"][1]["latitude"], -3.5);

    assert_eq!(
        geoload_db::count_locations_for_user(&pool, 7)
            .await
            .expect("count"),
        2
    );
    let attempts = geoload_db::list_import_attempts(&pool, 7, 10)
        .await
        .expect("list attempts");
    assert_eq!(attempts.len(), 1);
    assert!(attempts[0].success);
    assert_eq!(attempts[0].filename, "points.zip");
    assert_eq!(attempts[0].location_count, 2);
    assert_eq!(attempts[0].skipped_rows, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn invalid_row_rejects_upload_and_records_failed_attempt(pool: PgPool) {
    let archive = zip_of(&[
        ("__MACOSX/._data.txt", "junk"),
        ("data.txt", "Name,Lat,Lng\nA,1.0,2.0\nB,91.0,2.0"),
    ]);
    let response = app(pool.clone())
        .oneshot(upload_request(
            Some("7"),
            multipart_body("file", "points.zip", &archive),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["code"], "bad_request");
    let message = json["error"]["message"].as_str().expect("message");
    assert!(message.contains("row 2"), "{message}");

    assert_eq!(
        geoload_db::count_locations_for_user(&pool, 7)
            .await
            .expect("count"),
        0
    );
    let attempts = geoload_db::list_import_attempts(&pool, 7, 10)
        .await
        .expect("list attempts");
    assert_eq!(attempts.len(), 1);
    assert!(!attempts[0].success);
    assert_eq!(attempts[0].location_count, 0);
    assert!(attempts[0]
        .error_message
        .as_deref()
        .is_some_and(|m| m.contains("row 2")));
}

#[sqlx::test(migrations = "../../migrations")]
async fn non_zip_filename_is_rejected_without_audit(pool: PgPool) {
    let archive = zip_of(&[("data.txt", "Name,Lat,Lng\nA,1,2\n")]);
    let response = app(pool.clone())
        .oneshot(upload_request(
            Some("7"),
            multipart_body("file", "points.txt", &archive),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(
        json["error"]["message"],
        "Only .zip files are allowed. Please upload a .zip file."
    );
    assert_eq!(attempt_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn missing_file_part_is_rejected(pool: PgPool) {
    let archive = zip_of(&[("data.txt", "Name,Lat,Lng\nA,1,2\n")]);
    let response = app(pool.clone())
        .oneshot(upload_request(
            Some("7"),
            multipart_body("attachment", "points.zip", &archive),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(json["error"]["message"], "No file uploaded");
    assert_eq!(attempt_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn oversized_body_is_rejected_without_audit(pool: PgPool) {
    let app = build_app(AppState {
        pool: pool.clone(),
        limits: ImportLimits {
            max_upload_bytes: 1024,
            ..ImportLimits::default()
        },
    });
    let filler = vec![b'x'; MULTIPART_OVERHEAD_BYTES + 4096];

    let response = app
        .oneshot(upload_request(
            Some("7"),
            multipart_body("file", "big.zip", &filler),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_body(response).await;
    assert_eq!(
        json["error"]["message"],
        "File size too large. Maximum size is 1024 bytes"
    );
    assert_eq!(attempt_count(&pool).await, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn upload_history_is_scoped_to_caller_and_newest_first(pool: PgPool) {
    let good = zip_of(&[("data.txt", "Name,Lat,Lng\nA,1,2\n")]);
    let bad = zip_of(&[("notes.md", "nothing here")]);

    for (user, filename, archive) in [
        ("7", "first.zip", &good),
        ("7", "second.zip", &bad),
        ("8", "other.zip", &good),
    ] {
        app(pool.clone())
            .oneshot(upload_request(
                Some(user),
                multipart_body("file", filename, archive),
            ))
            .await
            .expect("response");
    }

    let response = app(pool.clone())
        .oneshot(get_request("/api/v1/uploads?limit=10", "7"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let items = json["data"].as_array().expect("data array");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["filename"], "second.zip");
    assert_eq!(items[0]["success"], false);
    assert_eq!(items[0]["error_message"], "ZIP must contain a .txt file");
    assert_eq!(items[1]["filename"], "first.zip");
    assert_eq!(items[1]["success"], true);
    assert_eq!(items[1]["location_count"], 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn locations_listing_returns_callers_rows_with_total(pool: PgPool) {
    let archive = zip_of(&[("data.txt", "Name,Lat,Lng\nA,1,2\nB,3,4\nC,5,6\n")]);
    app(pool.clone())
        .oneshot(upload_request(
            Some("7"),
            multipart_body("file", "points.zip", &archive),
        ))
        .await
        .expect("response");

    let response = app(pool.clone())
        .oneshot(get_request("/api/v1/locations?limit=2", "7"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["total"], 3);
    assert_eq!(json["data"]["locations"].as_array().expect("array").len(), 2);

    let other = app(pool)
        .oneshot(get_request("/api/v1/locations", "8"))
        .await
        .expect("response");
    let json = json_body(other).await;
    assert_eq!(json["data"]["total"], 0);
}

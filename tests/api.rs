#![cfg(feature = "web")]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use size_sorter::app::{AppState, router};
use size_sorter::store::RecordStore;
use std::sync::Arc;
use tower::ServiceExt;

const ORIGIN: &str = "http://localhost:5173";

fn app() -> Router {
    let state = Arc::new(AppState {
        store: RecordStore::in_memory(),
    });
    router(state, &[ORIGIN.to_string()])
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = response.into_body().collect().await.unwrap().to_bytes().to_vec();
    (status, headers, body)
}

async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::get(uri).body(Body::empty()).unwrap();
    let (status, _, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

async fn post_json(app: &Router, uri: &str, payload: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();
    let (status, _, body) = send(app, request).await;
    (status, serde_json::from_slice(&body).unwrap())
}

fn roster() -> Value {
    json!({
        "data": [
            ["姓名", "尺码"],
            ["王小明", "xxl"],
            ["李四", "M"],
            ["Al", "M"],
            ["小红", 130]
        ],
        "rows_per_column": 2
    })
}

#[tokio::test]
async fn root_greets() {
    let (status, body) = get_json(&app(), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "欢迎使用尺码排序API");
}

#[tokio::test]
async fn health_check_reports_store() {
    let (status, body) = get_json(&app(), "/test-db").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "数据库连接成功");
}

#[tokio::test]
async fn health_check_fails_when_snapshot_dir_is_gone() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = dir.path().join("data");
    let store = RecordStore::open(Some(data_dir.join("records.bin.gz"))).unwrap();
    let app = router(Arc::new(AppState { store }), &[ORIGIN.to_string()]);

    std::fs::remove_dir_all(&data_dir).unwrap();

    let (status, body) = get_json(&app, "/test-db").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["detail"].as_str().unwrap().contains("is missing"));
}

#[tokio::test]
async fn widget_page_is_served() {
    let app = app();
    let request = Request::get("/ui").body(Body::empty()).unwrap();
    let (status, headers, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/html"));
    let page = String::from_utf8(body).unwrap();
    assert!(page.contains("XLSX.read"));
    assert!(page.contains("/process-data"));
}

#[tokio::test]
async fn process_data_sorts_and_stores() {
    let app = app();
    let (status, body) = post_json(&app, "/process-data", roster()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rows_per_column"], 2);
    assert_eq!(
        body["processed_data"],
        json!([
            ["序号", "姓名", "尺码"],
            [1, "小红", "130"],
            [2, "Al", "M"],
            [3, "李四", "M"],
            [4, "王小明", "2XL"]
        ])
    );

    let (status, body) = get_json(&app, "/get-records").await;
    assert_eq!(status, StatusCode::OK);
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 4);
    assert_eq!(records[0]["id"], 1);
    assert_eq!(records[0]["序号"], 1);
    assert_eq!(records[3]["姓名"], "王小明");
    assert_eq!(records[3]["尺码"], "2XL");
}

#[tokio::test]
async fn new_upload_replaces_records() {
    let app = app();
    post_json(&app, "/process-data", roster()).await;
    let (status, _) = post_json(
        &app,
        "/process-data",
        json!({"data": [["姓名", "尺码"], ["Zed", "S"]], "rows_per_column": 10}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = get_json(&app, "/get-records").await;
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], 1);
    assert_eq!(records[0]["姓名"], "Zed");
}

#[tokio::test]
async fn short_table_is_rejected() {
    let app = app();
    let (status, body) = post_json(
        &app,
        "/process-data",
        json!({"data": [["姓名", "尺码"]], "rows_per_column": 10}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "数据为空或少于2行（包括表头）");
}

#[tokio::test]
async fn upload_parses_csv_file() {
    let app = app();
    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"rows_per_column\"\r\n\r\n\
         5\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"sizes.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         姓名,尺码\nBob,XL\nAnn,xs\n\r\n\
         --{b}--\r\n",
        b = boundary
    );
    let request = Request::post("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["rows_per_column"], 5);
    assert_eq!(body["processed_data"][1], json!([1, "Ann", "XS"]));
    assert_eq!(body["processed_data"][2], json!([2, "Bob", "XL"]));
}

#[tokio::test]
async fn upload_with_non_numeric_rows_per_column_is_rejected() {
    let app = app();
    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"rows_per_column\"\r\n\r\n\
         many\r\n\
         --{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"sizes.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         姓名,尺码\nBob,XL\n\r\n\
         --{b}--\r\n",
        b = boundary
    );
    let request = Request::post("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["detail"].as_str().unwrap().contains("rows_per_column"));

    let (_, records) = get_json(&app, "/get-records").await;
    assert!(records["records"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn upload_without_file_is_rejected() {
    let app = app();
    let boundary = "XBOUNDARYX";
    let body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"rows_per_column\"\r\n\r\n5\r\n--{b}--\r\n",
        b = boundary
    );
    let request = Request::post("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap();

    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["detail"], "未收到文件数据");
}

#[tokio::test]
async fn csv_download_is_an_attachment() {
    let app = app();
    post_json(&app, "/process-data", roster()).await;

    let request = Request::get("/download/csv").body(Body::empty()).unwrap();
    let (status, headers, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str().unwrap().starts_with("text/csv"));
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=size_records_"));
    assert!(disposition.ends_with(".csv"));
    assert_eq!(
        String::from_utf8(body).unwrap(),
        "序号,姓名,尺码\n1,小红,130\n2,Al,M\n3,李四,M\n4,王小明,2XL\n"
    );
}

#[tokio::test]
async fn excel_download_is_a_workbook() {
    let app = app();
    post_json(&app, "/process-data", roster()).await;

    let request = Request::get("/download/excel").body(Body::empty()).unwrap();
    let (status, headers, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .ends_with(".xlsx"));
    // XLSX files are zip archives.
    assert_eq!(&body[..2], b"PK");
}

#[tokio::test]
async fn unknown_download_format_is_rejected() {
    let (status, body) = get_json(&app(), "/download/pdf").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "不支持的文件格式: pdf");
}

#[tokio::test]
async fn cors_allows_configured_origin_only() {
    let app = app();
    let request = Request::get("/")
        .header(header::ORIGIN, ORIGIN)
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&app, request).await;
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], ORIGIN);
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

    let request = Request::get("/")
        .header(header::ORIGIN, "http://evil.example")
        .body(Body::empty())
        .unwrap();
    let (_, headers, _) = send(&app, request).await;
    assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
}

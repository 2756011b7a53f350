use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{HeaderValue, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use chrono::Local;
use log::{info, warn};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

use crate::config::Config;
use crate::downloader::{self, ExportFormat};
use crate::error::{Error, Result};
use crate::loader;
use crate::sorter::{self, SortRequest, SortResponse};
use crate::store::{RecordStore, SizeRecord};

/// Rows per rendered column when an upload does not say otherwise.
pub const DEFAULT_ROWS_PER_COLUMN: u32 = 20;

pub struct AppState {
    pub store: RecordStore,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

#[derive(Serialize)]
struct RecordsResponse {
    records: Vec<SizeRecord>,
}

pub async fn run(config: Config) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let store = RecordStore::open(config.data_path.clone())?;
    let state = Arc::new(AppState { store });

    let app = router(state, &config.allowed_origins);

    let listener = TcpListener::bind(config.addr).await?;
    info!("Listening on http://{}", config.addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the HTTP router with CORS restricted to `allowed_origins`.
pub fn router(state: Arc<AppState>, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/ui", get(serve_widget))
        .route("/test-db", get(test_db))
        .route("/process-data", post(process_data))
        .route("/upload", post(upload))
        .route("/get-records", get(get_records))
        .route("/download/:format", get(download))
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("ignoring invalid CORS origin {origin:?}");
                None
            }
        })
        .collect();

    // Credentials rule out wildcards, so methods and headers are mirrored.
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

async fn root() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "欢迎使用尺码排序API",
    })
}

async fn serve_widget() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

async fn test_db(State(state): State<Arc<AppState>>) -> Result<Json<MessageResponse>> {
    tokio::task::spawn_blocking(move || state.store.ping()).await??;
    Ok(Json(MessageResponse {
        message: "数据库连接成功",
    }))
}

async fn process_data(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SortRequest>,
) -> Result<Json<SortResponse>> {
    info!("received sort request with {} rows", request.data.len());
    Ok(Json(sort_and_store(state, request).await?))
}

async fn upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<SortResponse>> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut rows_per_column = DEFAULT_ROWS_PER_COLUMN;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::invalid(format!("上传数据格式错误: {}", e)))?
    {
        let field_name = field.name().unwrap_or("unknown").to_string();
        match field_name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| Error::invalid(format!("读取上传数据失败: {}", e)))?;
                file = Some((filename, bytes.to_vec()));
            }
            "rows_per_column" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| Error::invalid(format!("读取上传数据失败: {}", e)))?;
                rows_per_column = text.trim().parse().map_err(|_| {
                    Error::invalid(format!("rows_per_column 必须是非负整数，收到 {text:?}"))
                })?;
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or_else(|| Error::invalid("未收到文件数据"))?;
    info!("received upload {filename:?} ({} bytes)", bytes.len());

    let data = loader::parse_spreadsheet(&filename, &bytes)?;
    let request = SortRequest {
        data,
        rows_per_column,
    };
    Ok(Json(sort_and_store(state, request).await?))
}

// The snapshot write blocks on file I/O, so it runs off the async workers.
async fn sort_and_store(state: Arc<AppState>, request: SortRequest) -> Result<SortResponse> {
    tokio::task::spawn_blocking(move || -> Result<SortResponse> {
        let (entries, response) = sorter::process(&request)?;
        state.store.replace_all(&entries)?;
        info!("sorted and stored {} entries", entries.len());
        Ok(response)
    })
    .await?
}

async fn get_records(State(state): State<Arc<AppState>>) -> Result<Json<RecordsResponse>> {
    let records = state.store.records()?;
    Ok(Json(RecordsResponse { records }))
}

async fn download(
    Path(format): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Response> {
    let format: ExportFormat = format.parse()?;
    let records = state.store.records()?;

    let body = match format {
        ExportFormat::Csv => downloader::to_csv(&records).into_bytes(),
        ExportFormat::Excel => downloader::to_xlsx(&records)?,
    };

    let filename = downloader::export_filename(format, &Local::now());
    info!("serving {} export {} ({} records)", format, filename, records.len());

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", filename),
            ),
        ],
        body,
    )
        .into_response())
}

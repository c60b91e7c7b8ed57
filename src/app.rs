use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::aggregate::AggregationSummary;
use crate::config::RefillConfig;
use crate::downloader::{self, EXPORT_FILE_NAME};
use crate::error::RefillError;
use crate::filter::RefillCandidate;
use crate::loader::Upload;
use crate::pipeline::{self, RefillReport};
use crate::status::{Diagnostics, StatusEvent, StatusObserver};

/// Largest accepted upload.
const UPLOAD_LIMIT: usize = 25 * 1024 * 1024;

/// Multipart field carrying the spreadsheet.
const FILE_FIELD: &str = "file";

pub struct AppState {
    config: RefillConfig,
    /// Result of the last successful run; a new upload replaces it.
    last_report: Mutex<Option<RefillReport>>,
}

impl AppState {
    pub fn new(config: RefillConfig) -> Self {
        AppState {
            config,
            last_report: Mutex::new(None),
        }
    }

    fn last_report(&self) -> MutexGuard<'_, Option<RefillReport>> {
        self.last_report
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Serialize)]
struct ReportResponse {
    status: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sheet: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    header_row: Option<usize>,
    candidates: Vec<RefillCandidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<AggregationSummary>,
    diagnostics: Vec<StatusEvent>,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: &'static str,
    kind: &'static str,
    message: String,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "lowercase")]
enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
}

#[derive(Deserialize)]
struct ExportQuery {
    #[serde(default)]
    format: ExportFormat,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_index))
        .route("/api/health", get(health))
        .route("/api/report", post(create_report))
        .route("/api/export", get(export_report))
        .nest_service("/static", ServeDir::new("static"))
        .layer(DefaultBodyLimit::max(UPLOAD_LIMIT))
        .layer(middleware::from_fn(log_requests))
        .with_state(state)
}

async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    log::info!(
        "{} {} -> {} ({} ms)",
        method,
        uri,
        response.status(),
        started.elapsed().as_millis()
    );
    response
}

pub async fn run(bind: &str, config: RefillConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;
    let app = router(Arc::new(AppState::new(config)));

    let listener = TcpListener::bind(bind).await?;
    log::info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("./static/index.html"))
}

async fn health() -> &'static str {
    "ok"
}

fn status_code(err: &RefillError) -> StatusCode {
    match err {
        RefillError::NoFileSelected | RefillError::UnsupportedExtension { .. } => {
            StatusCode::BAD_REQUEST
        }
        RefillError::FileReadFailed(_) => StatusCode::BAD_REQUEST,
        RefillError::NothingToExport => StatusCode::CONFLICT,
        RefillError::DecodeUnavailable { .. } => StatusCode::NOT_IMPLEMENTED,
        RefillError::ExportFailed(_) | RefillError::InvalidConfig(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

fn error_response(err: &RefillError) -> Response {
    let body = ErrorResponse {
        status: "error",
        kind: err.kind(),
        message: err.to_string(),
    };
    (status_code(err), Json(body)).into_response()
}

/// Pulls the spreadsheet out of the multipart body. This is the only await in
/// a report run; everything after it is synchronous.
async fn read_upload(multipart: &mut Multipart) -> Result<Upload, RefillError> {
    let failed = |e: axum::extract::multipart::MultipartError| {
        RefillError::FileReadFailed(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.body_text(),
        ))
    };

    while let Some(field) = multipart.next_field().await.map_err(failed)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(failed)?;
        if file_name.is_empty() {
            return Err(RefillError::NoFileSelected);
        }
        return Ok(Upload::new(file_name, bytes.to_vec()));
    }
    Err(RefillError::NoFileSelected)
}

async fn create_report(State(state): State<Arc<AppState>>, mut multipart: Multipart) -> Response {
    let mut diagnostics = Diagnostics::new();

    let result = match read_upload(&mut multipart).await {
        Ok(upload) => pipeline::run(&upload, &state.config, &mut diagnostics),
        Err(err) => {
            diagnostics.error(err.to_string());
            Err(err)
        }
    };

    let message = diagnostics
        .headline()
        .map(|e| e.message.clone())
        .unwrap_or_default();

    match result {
        Ok(report) => {
            let body = ReportResponse {
                status: "ok",
                message,
                kind: None,
                sheet: Some(report.sheet.clone()),
                header_row: Some(report.header_row),
                candidates: report.candidates.clone(),
                summary: Some(report.summary.clone()),
                diagnostics: diagnostics.events().to_vec(),
            };
            *state.last_report() = Some(report);
            Json(body).into_response()
        }
        Err(err) => {
            let body = ReportResponse {
                status: "error",
                message: err.to_string(),
                kind: Some(err.kind()),
                sheet: None,
                header_row: None,
                candidates: Vec::new(),
                summary: None,
                diagnostics: diagnostics.events().to_vec(),
            };
            (status_code(&err), Json(body)).into_response()
        }
    }
}

async fn export_report(
    Query(query): Query<ExportQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let candidates = state
        .last_report()
        .as_ref()
        .map(|report| report.candidates.clone())
        .unwrap_or_default();

    let exported = match query.format {
        ExportFormat::Xlsx => downloader::to_xlsx(&candidates).map(|bytes| {
            (
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                EXPORT_FILE_NAME.to_string(),
                bytes,
            )
        }),
        ExportFormat::Csv => downloader::to_csv(&candidates).map(|text| {
            (
                "text/csv; charset=utf-8",
                EXPORT_FILE_NAME.replace(".xlsx", ".csv"),
                text.into_bytes(),
            )
        }),
    };

    match exported {
        Ok((content_type, file_name, bytes)) => (
            [
                (header::CONTENT_TYPE, content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file_name),
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(err) => {
            log::error!("export failed: {}", err);
            error_response(&err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    const BOUNDARY: &str = "refill-test-boundary";

    fn multipart_request(file_name: &str, contents: &str) -> Request<Body> {
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{f}\"\r\n\
             Content-Type: text/csv\r\n\r\n{c}\r\n--{b}--\r\n",
            b = BOUNDARY,
            f = file_name,
            c = contents
        );
        Request::builder()
            .method("POST")
            .uri("/api/report")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn export_request(format: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("/api/export?format={}", format))
            .body(Body::empty())
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    const STOCK_CSV: &str = "Item Code,Color Code,Total Warehouse Stock,Total Sales Stock\n\
                             A1,RED,10,2\nA1,RED,5,1\nA2,BLUE,0,0\nA3,GREEN,8,6\n";

    #[tokio::test]
    async fn report_then_export() {
        let state = Arc::new(AppState::new(RefillConfig::default()));
        let app = router(state.clone());

        let response = app
            .clone()
            .oneshot(multipart_request("stock.csv", STOCK_CSV))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert!(body["message"].as_str().unwrap().starts_with("scan complete"));
        assert_eq!(body["candidates"][0]["itemCode"], "A1");
        assert_eq!(body["candidates"][0]["totalWarehouseStock"], 15.0);
        assert!(!body["diagnostics"].as_array().unwrap().is_empty());

        let response = app.oneshot(export_request("csv")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let disposition = response.headers()[header::CONTENT_DISPOSITION]
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("Inventory_Refill_Report.csv"));
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            "Product Code,Total Warehouse Stock,Total Sales Stock\nA1RED,15,3\n"
        );
    }

    #[tokio::test]
    async fn export_without_report_is_rejected() {
        let app = router(Arc::new(AppState::new(RefillConfig::default())));
        let response = app.oneshot(export_request("xlsx")).await.unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(response).await["kind"], "NothingToExport");
    }

    #[tokio::test]
    async fn failed_upload_keeps_previous_report() {
        let state = Arc::new(AppState::new(RefillConfig::default()));
        let app = router(state.clone());

        app.clone()
            .oneshot(multipart_request("stock.csv", STOCK_CSV))
            .await
            .unwrap();
        let response = app
            .oneshot(multipart_request("notes.txt", "hello"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["kind"], "UnsupportedExtension");
        assert_eq!(state.last_report().as_ref().unwrap().candidates.len(), 1);
    }

    #[tokio::test]
    async fn missing_file_field() {
        let app = router(Arc::new(AppState::new(RefillConfig::default())));
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"other\"\r\n\r\nx\r\n--{b}--\r\n",
            b = BOUNDARY
        );
        let request = Request::builder()
            .method("POST")
            .uri("/api/report")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["kind"], "NoFileSelected");
    }
}

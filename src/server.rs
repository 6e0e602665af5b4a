//! Web front end: the single page plus the upload route.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, warn};

use crate::client::AltTextClient;
use crate::error::InferenceError;
use crate::page::INDEX_HTML;
use crate::payload::ImagePayload;
use crate::transport::{HttpTransport, Transport};

/// MIME type used when neither the upload nor the bytes say otherwise.
const FALLBACK_MIME: &str = "image/jpeg";

pub struct AppState<T = HttpTransport> {
    pub client: AltTextClient<T>,
    pub model_label: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DescribeResponse {
    pub description: String,
    pub model: String,
    pub processing_time_ms: u128,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failure of the upload route.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Inference(InferenceError),
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        Self::Inference(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Inference(err) => {
                let status = match err {
                    InferenceError::NoDescriptionProduced => StatusCode::UNPROCESSABLE_ENTITY,
                    InferenceError::RateLimitExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    _ => StatusCode::BAD_GATEWAY,
                };
                (status, err.user_message().to_string())
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Build the router. `max_upload_bytes` bounds the multipart body.
pub fn router<T>(state: Arc<AppState<T>>, max_upload_bytes: usize) -> Router
where
    T: Transport + 'static,
{
    Router::new()
        .route("/", get(index))
        .route("/api/describe", post(describe::<T>))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .with_state(state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn describe<T: Transport>(
    State(state): State<Arc<AppState<T>>>,
    mut multipart: Multipart,
) -> Result<Json<DescribeResponse>, ApiError> {
    let start = Instant::now();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let declared = field
            .content_type()
            .filter(|mime| mime.starts_with("image/"))
            .map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        if data.is_empty() && declared.is_none() {
            // empty text fields from the form, not a file
            continue;
        }

        let mime_type = declared
            .or_else(|| sniff_mime(&data).map(str::to_string))
            .unwrap_or_else(|| FALLBACK_MIME.to_string());
        debug!(bytes = data.len(), %mime_type, "Received upload");

        let payload = ImagePayload::from_bytes(&data, mime_type);
        let description = state.client.infer(&payload).await.map_err(|e| {
            if e.is_exhausted() {
                error!(error = %e, "Retries exhausted");
            } else {
                warn!(error = %e, "Description failed");
            }
            ApiError::from(e)
        })?;

        return Ok(Json(DescribeResponse {
            description,
            model: state.model_label.clone(),
            processing_time_ms: start.elapsed().as_millis(),
        }));
    }

    Err(ApiError::BadRequest("no image in upload".to_string()))
}

/// Guess the MIME type from leading magic bytes. Never rejects.
fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    use image::ImageFormat;

    let mime = match image::guess_format(data).ok()? {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        ImageFormat::Tiff => "image/tiff",
        ImageFormat::Ico => "image/x-icon",
        ImageFormat::Avif => "image/avif",
        _ => return None,
    };
    Some(mime)
}

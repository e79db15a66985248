//! Request controller for image operations and metadata.

use super::engine_job::run_engine_job;
use super::source::SourceImage;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use imgserve_core::{AppError, ImageMetadata};
use imgserve_processing::image::operations;
use imgserve_processing::OperationParameters;
use std::sync::Arc;

type QueryPairs = Result<Query<Vec<(String, String)>>, QueryRejection>;

fn parse_query(query: QueryPairs) -> Result<OperationParameters, HttpAppError> {
    let Query(pairs) = query
        .map_err(|e| AppError::BadRequest(format!("Invalid query string: {}", e.body_text())))?;
    let params =
        OperationParameters::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;
    Ok(params)
}

#[utoipa::path(
    post,
    path = "/{operation}",
    tag = "operations",
    params(
        ("operation" = String, Path, description = "One of crop, resize, enlarge, extract"),
        ("width" = Option<u32>, Query, description = "Target or region width in pixels"),
        ("height" = Option<u32>, Query, description = "Target or region height in pixels"),
        ("top" = Option<u32>, Query, description = "Extract: region top edge"),
        ("left" = Option<u32>, Query, description = "Extract: region left edge"),
        ("quality" = Option<u32>, Query, description = "Encoder quality for lossy formats (1-100)")
    ),
    request_body(content = Vec<u8>, description = "Source image bytes, raw or as multipart field 'file'", content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Transformed image in the source format", content_type = "image/*"),
        (status = 400, description = "Undecodable image, invalid parameter or region out of bounds", body = ErrorResponse),
        (status = 404, description = "Unknown operation", body = ErrorResponse),
        (status = 413, description = "Body too large", body = ErrorResponse),
        (status = 500, description = "Encoding or engine failure", body = ErrorResponse),
        (status = 503, description = "Operation timed out", body = ErrorResponse)
    )
)]
pub async fn run_operation(
    State(state): State<Arc<AppState>>,
    Path(operation): Path<String>,
    query: QueryPairs,
    SourceImage(body): SourceImage,
) -> Result<Response, HttpAppError> {
    let kind = operations::lookup(&operation)
        .ok_or_else(|| AppError::NotFound(format!("Unknown operation: {}", operation)))?;
    let params = parse_query(query)?;

    tracing::debug!(
        operation = %kind,
        bytes = body.len(),
        ?params,
        "Processing image operation"
    );

    let job_state = Arc::clone(&state);
    let encoded = run_engine_job(&state.engine_permits, state.request_timeout(), move |cancel| {
        job_state
            .transformer
            .apply_cancellable(kind, &body, &params, cancel)
    })
    .await?;

    tracing::debug!(
        operation = %kind,
        output = %encoded.size,
        bytes = encoded.data.len(),
        "Image operation completed"
    );

    Ok((
        [(header::CONTENT_TYPE, encoded.content_type())],
        encoded.data,
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/info",
    tag = "operations",
    request_body(content = Vec<u8>, description = "Source image bytes, raw or as multipart field 'file'", content_type = "application/octet-stream"),
    responses(
        (status = 200, description = "Image metadata", body = ImageMetadata),
        (status = 400, description = "Undecodable image", body = ErrorResponse),
        (status = 413, description = "Body too large", body = ErrorResponse)
    )
)]
pub async fn image_info(
    State(state): State<Arc<AppState>>,
    SourceImage(body): SourceImage,
) -> Result<Json<ImageMetadata>, HttpAppError> {
    let job_state = Arc::clone(&state);
    let metadata = run_engine_job(&state.engine_permits, state.request_timeout(), move |_| {
        job_state.processor.metadata(&body)
    })
    .await?;

    Ok(Json(metadata))
}

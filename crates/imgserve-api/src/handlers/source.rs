//! Source image extractor
//!
//! The image is either the raw request body (any content type) or the `file` field of a
//! `multipart/form-data` body.

use crate::constants::MULTIPART_FILE_FIELD;
use crate::error::HttpAppError;
use axum::{
    extract::{FromRequest, Multipart, Request},
    http::{header, StatusCode},
};
use bytes::Bytes;
use imgserve_core::AppError;

#[derive(Debug)]
pub struct SourceImage(pub Bytes);

fn body_error(status: StatusCode, message: String) -> HttpAppError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        HttpAppError(AppError::PayloadTooLarge(message))
    } else {
        HttpAppError(AppError::BadRequest(message))
    }
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"))
}

impl<S> FromRequest<S> for SourceImage
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let body = Bytes::from_request(req, state)
                .await
                .map_err(|rejection| body_error(rejection.status(), rejection.body_text()))?;
            return Ok(SourceImage(body));
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|rejection| body_error(rejection.status(), rejection.body_text()))?;

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| body_error(e.status(), e.body_text()))?
        {
            if field.name() == Some(MULTIPART_FILE_FIELD) {
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| body_error(e.status(), e.body_text()))?;
                return Ok(SourceImage(data));
            }
        }

        Err(HttpAppError(AppError::BadRequest(format!(
            "multipart body has no '{}' field",
            MULTIPART_FILE_FIELD
        ))))
    }
}

//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;
use imgserve_core::models;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "imgserve API",
        description = "Stateless image transformation service. POST an image to /{operation} to crop, resize, enlarge or extract a region; POST it to /info to read its metadata."
    ),
    paths(
        handlers::index::index,
        handlers::image_ops::run_operation,
        handlers::image_ops::image_info
    ),
    components(
        schemas(
            handlers::index::ServiceInfo,
            models::ImageMetadata,
            models::ImageSize,
            models::OperationKind,
            error::ErrorResponse
        )
    ),
    tags(
        (name = "service", description = "Service information"),
        (name = "operations", description = "Image operations and metadata extraction")
    )
)]
pub struct ApiDoc;

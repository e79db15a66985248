use axum::Json;
use imgserve_core::OperationKind;
use serde::Serialize;
use utoipa::ToSchema;

use crate::constants::{SERVICE_NAME, SERVICE_VERSION};

/// Service description returned by `GET /`
#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceInfo {
    pub name: String,
    pub version: String,
    pub operations: Vec<OperationKind>,
}

#[utoipa::path(
    get,
    path = "/",
    tag = "service",
    responses(
        (status = 200, description = "Service name, version and supported operations", body = ServiceInfo)
    )
)]
pub async fn index() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        name: SERVICE_NAME.to_string(),
        version: SERVICE_VERSION.to_string(),
        operations: OperationKind::ALL.to_vec(),
    })
}

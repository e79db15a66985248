use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The closed set of geometric operations the service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Crop,
    Resize,
    Enlarge,
    Extract,
}

impl OperationKind {
    pub const ALL: [OperationKind; 4] = [
        OperationKind::Crop,
        OperationKind::Resize,
        OperationKind::Enlarge,
        OperationKind::Extract,
    ];

    /// Route name of the operation (`POST /{name}`)
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Crop => "crop",
            OperationKind::Resize => "resize",
            OperationKind::Enlarge => "enlarge",
            OperationKind::Extract => "extract",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

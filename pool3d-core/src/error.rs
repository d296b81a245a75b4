/// Error types for scene construction and configuration
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("invalid scene configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to parse scene configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("mesh has {0} vertices, more than 16-bit indices can address")]
    MeshTooLarge(u64),
    #[error("graphics device error: {0}")]
    Device(String),
}

pub type Result<T> = std::result::Result<T, SceneError>;

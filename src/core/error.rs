use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorldError {
    #[error("save data inconsistent with world topology: {0}")]
    SaveConsistency(String),

    #[error("save data has invalid format: {0}")]
    SaveFormat(String),

    #[error("unknown waypoint: {0}")]
    UnknownWaypoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WorldError>;

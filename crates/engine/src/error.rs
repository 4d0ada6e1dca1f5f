//! Error types for caller mistakes. Placement policy rejections are not
//! errors; see [`crate::grid::PlaceOutcome`].

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Only quarter turns are supported.
    #[error("unsupported rotation: {0} degrees")]
    InvalidRotation(i32),

    #[error("unknown block family: {0}")]
    UnknownFamily(String),

    #[error("block id {0} is not in the catalog")]
    UnknownBlock(u16),

    #[error("visibility must be a finite fraction, got {0}")]
    InvalidVisibility(f64),
}

pub type Result<T> = std::result::Result<T, EngineError>;

//! Error types for screen operations

use thiserror::Error;

use crate::layer::LayerId;
use crate::registry::ScreenId;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScreenError {
    #[error("Screen ID {0} not found")]
    ScreenNotFound(ScreenId),

    #[error("Layer {0} not found")]
    LayerNotFound(LayerId),

    #[error("Layer {0} is not drawable")]
    NotDrawable(LayerId),

    #[error("Layer {0} is not a group")]
    NotAGroup(LayerId),

    #[error("Unsupported snapshot version {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid snapshot coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("Session is not running")]
    SessionNotRunning,

    #[error("Session is already running")]
    SessionAlreadyRunning,
}

pub type Result<T> = std::result::Result<T, ScreenError>;

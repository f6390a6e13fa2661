//! Error type for rendering.

use std::path::PathBuf;

use lux_core::AssetError;
use thiserror::Error;

/// Errors that can occur while building a scene or rendering it.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed PPM {path}: {reason}")]
    MalformedPpm { path: PathBuf, reason: String },

    #[error("Sub-image {path} is {found:?}, expected {expected:?}")]
    TileSize {
        path: PathBuf,
        expected: (u32, u32),
        found: (u32, u32),
    },

    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Asset(#[from] AssetError),
}

impl RenderError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| RenderError::Io { path, source }
    }
}

pub type RenderResult<T> = Result<T, RenderError>;

//! Error types for the terrain fetcher.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while fetching or inspecting terrain rasters.
#[derive(Debug, Error)]
pub enum TerrainError {
    /// Bad coordinates, non-positive size or resolution, or a degenerate bounding box.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The image service answered with a failure.
    #[error("Service error (HTTP {status}): {message}")]
    ServiceError {
        /// HTTP status code (or the ArcGIS error code for errors reported with 200).
        status: u16,
        /// Message reported by the service.
        message: String,
    },

    /// The image service answered with a zero-length body.
    #[error("Service returned an empty response")]
    EmptyResponse,

    /// The image service answered with something that is not a raster.
    #[error("Unexpected response content type: {0}")]
    UnexpectedContentType(String),

    /// I/O error reading or writing a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input raster does not exist.
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Input raster cannot be parsed as a GeoTIFF.
    #[error("Invalid GeoTIFF: {0}")]
    InvalidFormat(String),

    /// HTTP transport failure (connect, timeout, TLS).
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Report could not be encoded as JSON (e.g. a non UTF-8 path).
    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TerrainError {
    pub(crate) fn invalid_input<S: ToString>(msg: S) -> Self {
        TerrainError::InvalidInput(msg.to_string())
    }

    pub(crate) fn invalid_format<S: ToString>(msg: S) -> Self {
        TerrainError::InvalidFormat(msg.to_string())
    }

    /// Process exit code for this error kind.
    ///
    /// Usage errors reported by the argument parser also exit with 2, so
    /// invalid input shares that code.
    pub fn exit_code(&self) -> u8 {
        match self {
            TerrainError::InvalidInput(_) => 2,
            TerrainError::ServiceError { .. }
            | TerrainError::EmptyResponse
            | TerrainError::UnexpectedContentType(_)
            | TerrainError::Http(_) => 3,
            TerrainError::Io(_) => 4,
            TerrainError::FileNotFound(_) => 5,
            TerrainError::InvalidFormat(_) => 6,
            TerrainError::Json(_) => 1,
        }
    }
}

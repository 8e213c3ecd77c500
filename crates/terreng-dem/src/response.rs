//! Validation and persistence of image service responses.

use crate::{Result, TerrainError};
use reqwest::StatusCode;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::debug;

/// A response from the image service, detached from the HTTP transport.
#[derive(Debug, Clone)]
pub struct ServiceResponse {
    /// HTTP status code.
    pub status: u16,
    /// Value of the `Content-Type` header, if any.
    pub content_type: Option<String>,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

/// ArcGIS REST error payload: `{"error": {"code": 400, "message": "...", "details": [...]}}`.
#[derive(Debug, Deserialize)]
struct ArcGisErrorBody {
    error: ArcGisError,
}

#[derive(Debug, Deserialize)]
struct ArcGisError {
    #[serde(default)]
    code: Option<u16>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    details: Vec<String>,
}

impl ArcGisError {
    fn describe(&self) -> String {
        let details: Vec<&str> = self
            .details
            .iter()
            .map(String::as_str)
            .filter(|d| !d.is_empty())
            .collect();
        match (self.message.is_empty(), details.is_empty()) {
            (false, true) => self.message.clone(),
            (false, false) => format!("{} ({})", self.message, details.join("; ")),
            (true, false) => details.join("; "),
            (true, true) => "unknown service error".to_string(),
        }
    }
}

impl ServiceResponse {
    pub fn new(status: u16, content_type: Option<String>, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// JSON by declaration or by content. A TIFF never starts with `{`.
    fn is_json(&self) -> bool {
        let declared = self
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains("json"));
        declared || self.body.iter().find(|b| !b.is_ascii_whitespace()) == Some(&b'{')
    }

    fn arcgis_error(&self) -> Option<ArcGisError> {
        serde_json::from_slice::<ArcGisErrorBody>(&self.body)
            .ok()
            .map(|b| b.error)
    }

    /// Check that the response carries a raster.
    pub fn validate(&self) -> Result<()> {
        if !self.is_success() {
            let message = match self.arcgis_error() {
                Some(err) => err.describe(),
                None => StatusCode::from_u16(self.status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("request failed")
                    .to_string(),
            };
            return Err(TerrainError::ServiceError {
                status: self.status,
                message,
            });
        }

        if self.body.is_empty() {
            return Err(TerrainError::EmptyResponse);
        }

        // ArcGIS reports some failures with status 200 and a JSON error body
        if self.is_json() {
            return Err(match self.arcgis_error() {
                Some(err) => TerrainError::ServiceError {
                    status: err.code.unwrap_or(self.status),
                    message: err.describe(),
                },
                None => TerrainError::UnexpectedContentType(
                    self.content_type
                        .clone()
                        .unwrap_or_else(|| "undeclared JSON body".to_string()),
                ),
            });
        }

        if let Some(content_type) = &self.content_type {
            let ct = content_type.to_ascii_lowercase();
            if !ct.contains("tiff") && !ct.contains("image") {
                return Err(TerrainError::UnexpectedContentType(content_type.clone()));
            }
        }

        Ok(())
    }

    /// Validate the response and write the body verbatim to `path`.
    ///
    /// The body goes to a temporary file next to `path` that is renamed into
    /// place once fully written, so `path` is either untouched or complete.
    /// The temporary file is removed on every failure path. Missing parent
    /// directories are created.
    ///
    /// Returns the number of bytes written.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<u64> {
        self.validate()?;

        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let file_name = path
            .file_name()
            .ok_or_else(|| {
                TerrainError::invalid_input(format!("output path {} has no file name", path.display()))
            })?
            .to_string_lossy();

        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{file_name}."))
            .suffix(".part")
            .tempfile_in(dir)?;
        debug!("writing {} bytes to {}", self.body.len(), tmp.path().display());

        tmp.write_all(&self.body)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| TerrainError::Io(e.error))?;

        Ok(self.body.len() as u64)
    }
}

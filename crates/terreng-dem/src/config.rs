//! Image service configuration.

use crate::projection::SpatialRef;
use crate::{Result, TerrainError};
use std::time::Duration;
use url::Url;

/// høydedata.no DTM ImageServer export endpoint.
pub const DEFAULT_ENDPOINT: &str =
    "https://hoydedata.no/arcgis/rest/services/DTM/ImageServer/exportImage";

/// Largest image side (pixels) the service accepts.
pub const DEFAULT_MAX_IMAGE_SIZE: u32 = 15_000;

/// 32-bit float pixels preserve decimeter elevations.
pub const DEFAULT_PIXEL_TYPE: &str = "F32";

pub const DEFAULT_INTERPOLATION: &str = "RSP_BilinearInterpolation";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Settings for talking to an ArcGIS ImageServer `exportImage` endpoint.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Full URL of the `exportImage` operation.
    pub endpoint: Url,
    /// Spatial reference of the request bbox and the returned image.
    pub spatial_ref: SpatialRef,
    /// Maximum image width or height in pixels.
    pub max_image_size: u32,
    /// ArcGIS `pixelType` parameter.
    pub pixel_type: String,
    /// ArcGIS `interpolation` parameter.
    pub interpolation: String,
    /// Whole-request timeout for the HTTP call.
    pub timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL"),
            spatial_ref: SpatialRef::default(),
            max_image_size: DEFAULT_MAX_IMAGE_SIZE,
            pixel_type: DEFAULT_PIXEL_TYPE.to_string(),
            interpolation: DEFAULT_INTERPOLATION.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ServiceConfig {
    /// Point the configuration at another `exportImage` URL (e.g. a mock server).
    pub fn with_endpoint(mut self, endpoint: &str) -> Result<Self> {
        let url = Url::parse(endpoint)
            .map_err(|e| TerrainError::invalid_input(format!("invalid endpoint '{endpoint}': {e}")))?;
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(TerrainError::invalid_input(format!(
                    "unsupported endpoint scheme '{other}'"
                )))
            }
        }
        self.endpoint = url;
        Ok(self)
    }

    pub fn with_spatial_ref(mut self, spatial_ref: SpatialRef) -> Self {
        self.spatial_ref = spatial_ref;
        self
    }

    pub fn with_max_image_size(mut self, max_image_size: u32) -> Self {
        self.max_image_size = max_image_size;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

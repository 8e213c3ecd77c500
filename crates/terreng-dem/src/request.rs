//! Request shaping for the ArcGIS ImageServer `exportImage` operation.

use crate::config::ServiceConfig;
use crate::geo::{pixel_dimensions, BoundingBox, GeoPoint, PixelSize};
use crate::projection::ServiceExtent;
use crate::Result;
use std::path::{Path, PathBuf};
use url::Url;

/// A fully validated fetch: where, how large, and where to store it.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    /// Geographic bounds of the requested area.
    pub bbox: BoundingBox,
    /// Requested area in the service's spatial reference.
    pub extent: ServiceExtent,
    /// Output image size.
    pub pixels: PixelSize,
    /// Meters per pixel.
    pub resolution: f64,
    /// Destination GeoTIFF path.
    pub output_path: PathBuf,
}

impl FetchRequest {
    /// A `width_m` x `height_m` area centered on `center`.
    pub fn centered(
        config: &ServiceConfig,
        center: GeoPoint,
        width_m: f64,
        height_m: f64,
        resolution: f64,
        output_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let bbox = BoundingBox::from_center(center, width_m, height_m)?;
        let pixels = pixel_dimensions(width_m, height_m, resolution, config.max_image_size)?;

        let spatial_ref = config.spatial_ref;
        let extent = if spatial_ref.is_geographic() {
            spatial_ref.project_bbox(&bbox)
        } else {
            ServiceExtent::around(
                spatial_ref,
                center.latitude(),
                center.longitude(),
                width_m,
                height_m,
            )
        };

        Ok(Self {
            bbox,
            extent,
            pixels,
            resolution,
            output_path: output_path.as_ref().to_path_buf(),
        })
    }

    /// The area covered by `bbox`.
    pub fn bounded(
        config: &ServiceConfig,
        bbox: BoundingBox,
        resolution: f64,
        output_path: impl AsRef<Path>,
    ) -> Result<Self> {
        let spatial_ref = config.spatial_ref;
        let extent = spatial_ref.project_bbox(&bbox);
        let (width_m, height_m) = if spatial_ref.is_geographic() {
            (bbox.width_meters(), bbox.height_meters())
        } else {
            (extent.width(), extent.height())
        };
        let pixels = pixel_dimensions(width_m, height_m, resolution, config.max_image_size)?;

        Ok(Self {
            bbox,
            extent,
            pixels,
            resolution,
            output_path: output_path.as_ref().to_path_buf(),
        })
    }
}

/// Parameters of one `exportImage` call. Construction has no side effects.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportImageRequest {
    endpoint: Url,
    params: Vec<(&'static str, String)>,
}

impl ExportImageRequest {
    pub fn new(config: &ServiceConfig, extent: &ServiceExtent, pixels: PixelSize) -> Self {
        let epsg = config.spatial_ref.epsg().to_string();
        let params = vec![
            ("bbox", extent.to_bbox_string()),
            ("bboxSR", epsg.clone()),
            ("imageSR", epsg),
            ("size", format!("{},{}", pixels.width, pixels.height)),
            ("format", "tiff".to_string()),
            ("pixelType", config.pixel_type.clone()),
            ("interpolation", config.interpolation.clone()),
            ("f", "image".to_string()),
        ];
        Self {
            endpoint: config.endpoint.clone(),
            params,
        }
    }

    pub fn for_fetch(config: &ServiceConfig, fetch: &FetchRequest) -> Self {
        Self::new(config, &fetch.extent, fetch.pixels)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Query parameters in request order.
    pub fn query_pairs(&self) -> &[(&'static str, String)] {
        &self.params
    }

    /// Value of a single query parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Endpoint with the encoded query string appended.
    pub fn url(&self) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .extend_pairs(self.params.iter().map(|(k, v)| (*k, v.as_str())));
        url
    }
}

//! # terreng-dem
//!
//! Fetch Digital Terrain Model (DTM) rasters from the Norwegian høydedata.no
//! ArcGIS ImageServer and inspect the resulting GeoTIFF files.
//!
//! ## Overview
//!
//! A fetch is a single linear pipeline:
//! - [`geo`] turns a center point plus size, or a bounding box, into
//!   geographic bounds and pixel dimensions
//! - [`projection`] expresses the area in the service CRS
//!   (ETRS89 / UTM zone 33N, EPSG:25833)
//! - [`request`] shapes the `exportImage` query
//! - [`client`] performs one HTTP GET
//! - [`response`] validates the answer and writes the GeoTIFF atomically
//!
//! [`info`] reads the georeferencing header of a GeoTIFF back.
//!
//! ## Examples
//!
//! ```no_run
//! use terreng_dem::{FetchRequest, GeoPoint, HoydedataClient, ServiceConfig};
//!
//! let config = ServiceConfig::default();
//! let center = GeoPoint::new(59.9639, 10.6683)?;
//! let fetch = FetchRequest::centered(&config, center, 1000.0, 1000.0, 1.0, "terrain.tif")?;
//!
//! let client = HoydedataClient::new(config)?;
//! let outcome = client.fetch(&fetch)?;
//! println!("{} bytes written to {}", outcome.bytes_written, outcome.path.display());
//! # Ok::<(), terreng_dem::TerrainError>(())
//! ```
//!
//! ```no_run
//! use terreng_dem::RasterInfo;
//!
//! let info = RasterInfo::from_file("terrain.tif")?;
//! println!("{info}");
//! # Ok::<(), terreng_dem::TerrainError>(())
//! ```

pub mod client;
pub mod config;
mod error;
pub mod geo;
pub mod info;
pub mod projection;
pub mod request;
pub mod response;

pub use client::{FetchOutcome, HoydedataClient};
pub use config::ServiceConfig;
pub use error::TerrainError;
pub use geo::{BoundingBox, GeoPoint, PixelSize};
pub use info::RasterInfo;
pub use projection::{ServiceExtent, SpatialRef};
pub use request::{ExportImageRequest, FetchRequest};
pub use response::ServiceResponse;

/// Result type for terrain operations.
pub type Result<T> = std::result::Result<T, TerrainError>;

//! Spatial reference systems understood by the image service.
//!
//! høydedata.no serves its DTM in ETRS89 / UTM zone 33N (EPSG:25833). The
//! request extent is projected with the Krüger series for the transverse
//! Mercator projection, which is accurate to well below a millimeter inside
//! a UTM zone. ETRS89 and WGS84 differ by less than a meter, so input
//! coordinates are used as-is.
//!
//! See <https://en.wikipedia.org/wiki/Universal_Transverse_Mercator_coordinate_system>.

use crate::geo::BoundingBox;
use crate::{Result, TerrainError};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// GRS80 semi-major axis in meters.
const GRS80_A: f64 = 6_378_137.0;

/// GRS80 flattening.
const GRS80_F: f64 = 1.0 / 298.257_222_101;

/// UTM scale factor on the central meridian.
const UTM_K0: f64 = 0.9996;

/// UTM false easting in meters.
const UTM_FALSE_EASTING: f64 = 500_000.0;

/// EPSG code of ETRS89 / UTM zone 33N.
pub const EPSG_ETRS89_UTM33: u32 = 25833;

/// EPSG code of WGS84 geographic coordinates.
pub const EPSG_WGS84: u32 = 4326;

/// A spatial reference system for the request extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SpatialRef {
    /// Geographic longitude/latitude in degrees (EPSG:4326).
    Wgs84,
    /// ETRS89 / UTM north zone (EPSG:25828 to EPSG:25838), meters.
    EtrsUtm { zone: u8 },
}

impl Default for SpatialRef {
    fn default() -> Self {
        SpatialRef::EtrsUtm { zone: 33 }
    }
}

impl SpatialRef {
    pub fn from_epsg(epsg: u32) -> Result<Self> {
        match epsg {
            EPSG_WGS84 => Ok(SpatialRef::Wgs84),
            25828..=25838 => Ok(SpatialRef::EtrsUtm {
                zone: (epsg - 25800) as u8,
            }),
            _ => Err(TerrainError::invalid_input(format!(
                "unsupported spatial reference EPSG:{epsg}"
            ))),
        }
    }

    pub fn epsg(&self) -> u32 {
        match *self {
            SpatialRef::Wgs84 => EPSG_WGS84,
            SpatialRef::EtrsUtm { zone } => 25800 + zone as u32,
        }
    }

    /// Whether coordinates are in degrees rather than meters.
    pub fn is_geographic(&self) -> bool {
        matches!(self, SpatialRef::Wgs84)
    }

    /// Project a (lat, lon) position in degrees to (x, y) in this system.
    pub fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        match *self {
            SpatialRef::Wgs84 => (lon, lat),
            SpatialRef::EtrsUtm { zone } => utm_forward(lat, lon, zone),
        }
    }

    /// Project a geographic bounding box, returning the envelope of its projected corners.
    pub fn project_bbox(&self, bbox: &BoundingBox) -> ServiceExtent {
        let mut extent = ServiceExtent {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
            spatial_ref: *self,
        };
        for (lat, lon) in bbox.corners() {
            let (x, y) = self.project(lat, lon);
            extent.min_x = extent.min_x.min(x);
            extent.min_y = extent.min_y.min(y);
            extent.max_x = extent.max_x.max(x);
            extent.max_y = extent.max_y.max(y);
        }
        extent
    }
}

impl fmt::Display for SpatialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for SpatialRef {
    type Err = TerrainError;

    /// Accepts `25833`, `EPSG:25833` or `WGS84`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("WGS84") {
            return Ok(SpatialRef::Wgs84);
        }
        let code = if s.len() > 5 && s[..5].eq_ignore_ascii_case("epsg:") {
            &s[5..]
        } else {
            s
        };
        let epsg = code
            .parse::<u32>()
            .map_err(|_| TerrainError::invalid_input(format!("invalid spatial reference '{s}'")))?;
        Self::from_epsg(epsg)
    }
}

/// A rectangular extent in the service's spatial reference system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ServiceExtent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub spatial_ref: SpatialRef,
}

impl ServiceExtent {
    /// An extent of `width` x `height` units centered on the projected position (lat, lon).
    pub fn around(spatial_ref: SpatialRef, lat: f64, lon: f64, width: f64, height: f64) -> Self {
        let (x, y) = spatial_ref.project(lat, lon);
        Self {
            min_x: x - width / 2.0,
            min_y: y - height / 2.0,
            max_x: x + width / 2.0,
            max_y: y + height / 2.0,
            spatial_ref,
        }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Format as the ArcGIS `bbox` parameter (`xmin,ymin,xmax,ymax`).
    pub fn to_bbox_string(&self) -> String {
        format!("{},{},{},{}", self.min_x, self.min_y, self.max_x, self.max_y)
    }
}

/// Krüger series forward transverse Mercator for a northern UTM zone.
fn utm_forward(lat: f64, lon: f64, zone: u8) -> (f64, f64) {
    let n = GRS80_F / (2.0 - GRS80_F);
    let n2 = n * n;
    let n3 = n2 * n;
    let a_rect = GRS80_A / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0);
    let alpha = [
        n / 2.0 - 2.0 / 3.0 * n2 + 5.0 / 16.0 * n3,
        13.0 / 48.0 * n2 - 3.0 / 5.0 * n3,
        61.0 / 240.0 * n3,
    ];
    let c = 2.0 * n.sqrt() / (1.0 + n);

    let central_meridian = (zone as f64 * 6.0 - 183.0).to_radians();
    let phi = lat.to_radians();
    let d_lambda = lon.to_radians() - central_meridian;

    let sin_phi = phi.sin();
    let t = (sin_phi.atanh() - c * (c * sin_phi).atanh()).sinh();
    let xi = (t / d_lambda.cos()).atan();
    let eta = (d_lambda.sin() / (1.0 + t * t).sqrt()).atanh();

    let mut easting = eta;
    let mut northing = xi;
    for (j, a) in alpha.iter().enumerate() {
        let k = 2.0 * (j + 1) as f64;
        easting += a * (k * xi).cos() * (k * eta).sinh();
        northing += a * (k * xi).sin() * (k * eta).cosh();
    }

    (
        UTM_FALSE_EASTING + UTM_K0 * a_rect * easting,
        UTM_K0 * a_rect * northing,
    )
}

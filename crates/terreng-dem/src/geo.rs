//! Geographic points, bounding boxes and pixel dimensions.
//!
//! Meter offsets are converted to degrees with the local approximation used
//! throughout this crate:
//! - 1 degree of latitude ≈ 111,320 meters
//! - 1 degree of longitude ≈ 111,320 · cos(latitude) meters
//!
//! The approximation is only accurate close to the reference latitude. The
//! extent actually sent to the service is projected separately (see
//! [`crate::projection`]).

use crate::{Result, TerrainError};
use serde::Serialize;

/// Meters per degree of latitude (and of longitude at the equator).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoPoint {
    latitude: f64,
    longitude: f64,
}

impl GeoPoint {
    /// Create a point, validating latitude in [-90, 90] and longitude in [-180, 180].
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(TerrainError::invalid_input(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(TerrainError::invalid_input(format!(
                "longitude {longitude} is outside [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// Geographic bounds in decimal degrees.
///
/// Always satisfies `min_lat < max_lat` and `min_lon < max_lon`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    /// Minimum latitude (south edge).
    pub min_lat: f64,
    /// Minimum longitude (west edge).
    pub min_lon: f64,
    /// Maximum latitude (north edge).
    pub max_lat: f64,
    /// Maximum longitude (east edge).
    pub max_lon: f64,
}

impl BoundingBox {
    /// Create a bounding box from its edges.
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Result<Self> {
        let min = GeoPoint::new(min_lat, min_lon)?;
        let max = GeoPoint::new(max_lat, max_lon)?;
        Self::from_corners(min, max)
    }

    /// Create a bounding box from its southwest and northeast corners.
    pub fn from_corners(min: GeoPoint, max: GeoPoint) -> Result<Self> {
        if min.latitude >= max.latitude {
            return Err(TerrainError::invalid_input(format!(
                "min latitude {} must be less than max latitude {}",
                min.latitude, max.latitude
            )));
        }
        if min.longitude >= max.longitude {
            return Err(TerrainError::invalid_input(format!(
                "min longitude {} must be less than max longitude {}",
                min.longitude, max.longitude
            )));
        }
        Ok(Self {
            min_lat: min.latitude,
            min_lon: min.longitude,
            max_lat: max.latitude,
            max_lon: max.longitude,
        })
    }

    /// Create a bounding box of `width_m` x `height_m` meters centered on `center`.
    pub fn from_center(center: GeoPoint, width_m: f64, height_m: f64) -> Result<Self> {
        check_size("width", width_m)?;
        check_size("height", height_m)?;

        let half_lat = meters_to_lat_degrees(height_m / 2.0);
        let half_lon = meters_to_lon_degrees(width_m / 2.0, center.latitude);
        if !half_lon.is_finite() || half_lon >= 180.0 {
            return Err(TerrainError::invalid_input(format!(
                "latitude {} is too close to a pole",
                center.latitude
            )));
        }

        // corners must still be valid coordinates (no pole or antimeridian wrap)
        Self::new(
            center.latitude - half_lat,
            center.longitude - half_lon,
            center.latitude + half_lat,
            center.longitude + half_lon,
        )
    }

    /// Check if a coordinate is within the bounds.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lon >= self.min_lon && lon <= self.max_lon
    }

    /// Center of the box.
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }

    /// The four corners as (lat, lon), counter-clockwise from southwest.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.min_lat, self.min_lon),
            (self.min_lat, self.max_lon),
            (self.max_lat, self.max_lon),
            (self.max_lat, self.min_lon),
        ]
    }

    /// Approximate east-west extent in meters, measured at the center latitude.
    pub fn width_meters(&self) -> f64 {
        let (center_lat, _) = self.center();
        (self.max_lon - self.min_lon) * METERS_PER_DEGREE * center_lat.to_radians().cos()
    }

    /// Approximate north-south extent in meters.
    pub fn height_meters(&self) -> f64 {
        (self.max_lat - self.min_lat) * METERS_PER_DEGREE
    }
}

/// Raster size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

/// Compute the pixel dimensions of a `width_m` x `height_m` area at `resolution` meters per pixel.
///
/// Fails when the resolution is not positive, or when either side rounds to
/// zero or exceeds `max_side` (the service would reject such a request).
pub fn pixel_dimensions(
    width_m: f64,
    height_m: f64,
    resolution: f64,
    max_side: u32,
) -> Result<PixelSize> {
    if !resolution.is_finite() || resolution <= 0.0 {
        return Err(TerrainError::invalid_input(format!(
            "resolution must be positive, got {resolution}"
        )));
    }
    check_size("width", width_m)?;
    check_size("height", height_m)?;

    let width = pixel_side("width", width_m / resolution, max_side)?;
    let height = pixel_side("height", height_m / resolution, max_side)?;
    Ok(PixelSize { width, height })
}

fn pixel_side(name: &str, pixels: f64, max_side: u32) -> Result<u32> {
    let rounded = pixels.round();
    if rounded < 1.0 {
        return Err(TerrainError::invalid_input(format!(
            "image {name} rounds to 0 pixels; use a finer resolution"
        )));
    }
    if rounded > max_side as f64 {
        return Err(TerrainError::invalid_input(format!(
            "image {name} of {rounded} pixels exceeds the service limit of {max_side}; use a coarser resolution"
        )));
    }
    Ok(rounded as u32)
}

fn check_size(name: &str, meters: f64) -> Result<()> {
    if !meters.is_finite() || meters <= 0.0 {
        return Err(TerrainError::invalid_input(format!(
            "{name} must be positive, got {meters}"
        )));
    }
    Ok(())
}

/// Convert a north-south distance in meters to degrees of latitude.
pub fn meters_to_lat_degrees(meters: f64) -> f64 {
    meters / METERS_PER_DEGREE
}

/// Convert an east-west distance in meters to degrees of longitude at `lat`.
pub fn meters_to_lon_degrees(meters: f64, lat: f64) -> f64 {
    meters / (METERS_PER_DEGREE * lat.to_radians().cos())
}

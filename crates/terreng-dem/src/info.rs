//! GeoTIFF header inspection.

use crate::{Result, TerrainError};
use serde::Serialize;
use std::fmt;
use std::fs::File;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;

/// GeoKey for geographic CRS codes.
const GEOGRAPHIC_TYPE_KEY: u16 = 2048;
/// GeoKey for projected CRS codes.
const PROJECTED_CS_TYPE_KEY: u16 = 3072;

/// Georeferenced extent of a raster in its own CRS units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RasterExtent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// Minimum and maximum of the valid (non no-data) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ElevationRange {
    pub min: f64,
    pub max: f64,
}

/// What `info` reports about a GeoTIFF.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RasterInfo {
    pub path: PathBuf,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel size in CRS units along x.
    pub pixel_size_x: f64,
    /// Pixel size in CRS units along y (positive).
    pub pixel_size_y: f64,
    pub extent: RasterExtent,
    /// EPSG code from the GeoKey directory, when present.
    pub epsg: Option<u32>,
    pub no_data: Option<f64>,
    /// `None` for header-only reads or when every pixel is no-data.
    pub elevation: Option<ElevationRange>,
}

impl RasterInfo {
    /// Read the georeferencing header and the elevation range of band 1.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut decoder = open_decoder(path)?;
        let mut info = Self::from_decoder(&mut decoder, path)?;
        info.elevation = elevation_range(&mut decoder, info.no_data)?;
        Ok(info)
    }

    /// Read only the georeferencing header, skipping pixel data.
    pub fn read_header<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut decoder = open_decoder(path)?;
        Self::from_decoder(&mut decoder, path)
    }

    fn from_decoder<R: Read + Seek>(decoder: &mut Decoder<R>, path: &Path) -> Result<Self> {
        let (width, height) = decoder.dimensions().map_err(TerrainError::invalid_format)?;
        if width == 0 || height == 0 {
            return Err(TerrainError::invalid_format("raster has zero dimensions"));
        }

        let (pixel_size_x, pixel_size_y, extent) = read_georeference(decoder, width, height)?;
        let epsg = read_epsg(decoder);
        let no_data = decoder
            .get_tag_ascii_string(Tag::GdalNodata)
            .ok()
            .and_then(|s| s.trim().trim_end_matches('\0').parse::<f64>().ok());

        Ok(Self {
            path: path.to_path_buf(),
            width,
            height,
            pixel_size_x,
            pixel_size_y,
            extent,
            epsg,
            no_data,
            elevation: None,
        })
    }

    /// Pretty-printed JSON report.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Unit label for extent and pixel size.
    fn unit(&self) -> &'static str {
        match self.epsg {
            Some(code) if (4000..5000).contains(&code) => "°",
            _ => "m",
        }
    }
}

impl fmt::Display for RasterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = self.unit();
        writeln!(f, "File: {}", self.path.display())?;
        writeln!(f, "Size: {}x{} pixels", self.width, self.height)?;
        match self.epsg {
            Some(code) => writeln!(f, "CRS: EPSG:{code}")?,
            None => writeln!(f, "CRS: unknown")?,
        }
        writeln!(
            f,
            "Bounds: left={}, bottom={}, right={}, top={}",
            self.extent.min_x, self.extent.min_y, self.extent.max_x, self.extent.max_y
        )?;
        write!(
            f,
            "Resolution: {:.2}x{:.2}{unit}",
            self.pixel_size_x, self.pixel_size_y
        )?;
        if let Some(range) = self.elevation {
            write!(
                f,
                "\nElevation range: {:.1}m to {:.1}m",
                range.min, range.max
            )?;
        }
        Ok(())
    }
}

fn open_decoder(path: &Path) -> Result<Decoder<File>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(TerrainError::FileNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    if file.metadata()?.is_dir() {
        return Err(TerrainError::invalid_format(format!(
            "{} is a directory",
            path.display()
        )));
    }

    let decoder = Decoder::new(file).map_err(TerrainError::invalid_format)?;

    // The service returns up to 15000 x 15000 F32 pixels (~900 MB)
    let mut limits = Limits::default();
    limits.decoding_buffer_size = 1024 * 1024 * 1024; // 1 GB
    limits.intermediate_buffer_size = 1024 * 1024 * 1024; // 1 GB
    limits.ifd_value_size = 1024 * 1024 * 1024;
    Ok(decoder.with_limits(limits))
}

/// Returns (pixel_size_x, pixel_size_y, extent).
fn read_georeference<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    width: u32,
    height: u32,
) -> Result<(f64, f64, RasterExtent)> {
    let tiepoint = decoder.get_tag_f64_vec(Tag::ModelTiepointTag);
    let pixel_scale = decoder.get_tag_f64_vec(Tag::ModelPixelScaleTag);

    if let (Ok(tiepoint), Ok(scale)) = (tiepoint, pixel_scale) {
        if tiepoint.len() >= 6 && scale.len() >= 2 {
            // Tiepoint format: [i, j, k, x, y, z], raster (i, j) maps to model (x, y)
            let (i, j) = (tiepoint[0], tiepoint[1]);
            let (scale_x, scale_y) = (scale[0], scale[1]);

            let min_x = tiepoint[3] - i * scale_x;
            let max_y = tiepoint[4] + j * scale_y;
            let extent = RasterExtent {
                min_x,
                min_y: max_y - height as f64 * scale_y,
                max_x: min_x + width as f64 * scale_x,
                max_y,
            };
            return Ok((scale_x, scale_y, extent));
        }
    }

    if let Ok(m) = decoder.get_tag_f64_vec(Tag::ModelTransformationTag) {
        if m.len() >= 16 {
            // row-major 4x4: x = m0*i + m1*j + m3, y = m4*i + m5*j + m7
            let corners = [
                (0.0, 0.0),
                (width as f64, 0.0),
                (0.0, height as f64),
                (width as f64, height as f64),
            ];
            let mut extent = RasterExtent {
                min_x: f64::INFINITY,
                min_y: f64::INFINITY,
                max_x: f64::NEG_INFINITY,
                max_y: f64::NEG_INFINITY,
            };
            for (i, j) in corners {
                let x = m[0] * i + m[1] * j + m[3];
                let y = m[4] * i + m[5] * j + m[7];
                extent.min_x = extent.min_x.min(x);
                extent.min_y = extent.min_y.min(y);
                extent.max_x = extent.max_x.max(x);
                extent.max_y = extent.max_y.max(y);
            }
            let pixel_size_x = (extent.max_x - extent.min_x) / width as f64;
            let pixel_size_y = (extent.max_y - extent.min_y) / height as f64;
            return Ok((pixel_size_x, pixel_size_y, extent));
        }
    }

    Err(TerrainError::invalid_format(
        "missing georeferencing tags (ModelPixelScale/ModelTiepoint or ModelTransformation)",
    ))
}

/// Look up the CRS code in the GeoKey directory.
///
/// The directory is a header `[version, revision, minor, count]` followed by
/// `count` entries of `[key, location, count, value]`. Only inline values
/// (location 0) are considered.
fn read_epsg<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<u32> {
    let keys = decoder
        .get_tag_u16_vec(Tag::GeoKeyDirectoryTag)
        .ok()?;
    let count = *keys.get(3)? as usize;

    let mut geographic = None;
    let mut projected = None;
    for entry in keys[4..].chunks_exact(4).take(count) {
        let (key, location, value) = (entry[0], entry[1], entry[3]);
        // 32767 is "user-defined"
        if location != 0 || value == 0 || value == 32767 {
            continue;
        }
        match key {
            PROJECTED_CS_TYPE_KEY => projected = Some(value as u32),
            GEOGRAPHIC_TYPE_KEY => geographic = Some(value as u32),
            _ => {}
        }
    }
    projected.or(geographic)
}

fn elevation_range<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    no_data: Option<f64>,
) -> Result<Option<ElevationRange>> {
    let data = decoder.read_image().map_err(TerrainError::invalid_format)?;

    let values: Box<dyn Iterator<Item = f64>> = match data {
        DecodingResult::F32(data) => Box::new(data.into_iter().map(f64::from)),
        DecodingResult::F64(data) => Box::new(data.into_iter()),
        DecodingResult::I16(data) => Box::new(data.into_iter().map(f64::from)),
        DecodingResult::I32(data) => Box::new(data.into_iter().map(f64::from)),
        DecodingResult::U16(data) => Box::new(data.into_iter().map(f64::from)),
        DecodingResult::U32(data) => Box::new(data.into_iter().map(f64::from)),
        DecodingResult::U8(data) => Box::new(data.into_iter().map(f64::from)),
        DecodingResult::I8(data) => Box::new(data.into_iter().map(f64::from)),
        DecodingResult::U64(data) => Box::new(data.into_iter().map(|v| v as f64)),
        DecodingResult::I64(data) => Box::new(data.into_iter().map(|v| v as f64)),
    };

    let range = values
        .filter(|v| !v.is_nan())
        .filter(|v| no_data.map_or(true, |nd| (v - nd).abs() > 1e-3))
        .fold(None, |acc: Option<ElevationRange>, v| match acc {
            None => Some(ElevationRange { min: v, max: v }),
            Some(r) => Some(ElevationRange {
                min: r.min.min(v),
                max: r.max.max(v),
            }),
        });
    Ok(range)
}

// src/raster/loader.rs
// GDAL-backed raster loading (feature-gated). Band 1 only: every input in
// this pipeline is a single-band product (DEM, classification, coefficient).

use std::path::Path;

use crate::error::{DrapeError, DrapeResult};
use crate::raster::RasterGrid;

/// Open a raster file and read band 1 as f64, masking no-data to NaN.
#[cfg(feature = "gdal")]
pub fn open_raster(path: impl AsRef<Path>) -> DrapeResult<RasterGrid> {
    use crate::geo::AffineTransform;
    use gdal::Dataset;

    let path = path.as_ref();
    if !path.exists() {
        return Err(DrapeError::raster(format!(
            "file not found: {}",
            path.display()
        )));
    }

    let dataset = Dataset::open(path)
        .map_err(|e| DrapeError::raster(format!("{}: {}", path.display(), e)))?;
    let (width, height) = dataset.raster_size();
    let geo_transform = dataset
        .geo_transform()
        .map_err(|e| DrapeError::raster(format!("{}: no geotransform: {}", path.display(), e)))?;
    let crs = dataset_crs(&dataset);

    let band = dataset
        .rasterband(1)
        .map_err(|e| DrapeError::raster(format!("{}: band 1: {}", path.display(), e)))?;
    let nodata = band.no_data_value();

    let buffer = band
        .read_as::<f64>((0, 0), (width, height), (width, height), None)
        .map_err(|e| DrapeError::raster(format!("{}: read failed: {}", path.display(), e)))?;
    let mut data = buffer.data;

    if let Some(nd) = nodata {
        for v in &mut data {
            if (*v - nd).abs() < 1e-10 {
                *v = f64::NAN;
            }
        }
    }

    log::info!(
        "loaded {} ({}x{}, crs {})",
        path.display(),
        width,
        height,
        if crs.is_empty() { "unknown" } else { &crs }
    );

    RasterGrid::from_parts(
        width,
        height,
        data,
        AffineTransform::from_gdal(geo_transform),
        crs,
    )
}

/// Prefer a compact EPSG identifier over the raw WKT when the authority is known.
#[cfg(feature = "gdal")]
fn dataset_crs(dataset: &gdal::Dataset) -> String {
    if let Ok(sr) = dataset.spatial_ref() {
        if let (Ok(name), Ok(code)) = (sr.auth_name(), sr.auth_code()) {
            if name == "EPSG" {
                return format!("EPSG:{}", code);
            }
        }
    }
    dataset.projection()
}

/// Stub when GDAL support is not compiled in.
#[cfg(not(feature = "gdal"))]
pub fn open_raster(path: impl AsRef<Path>) -> DrapeResult<RasterGrid> {
    Err(DrapeError::raster(format!(
        "cannot open {}: GDAL support not compiled in (enable the `gdal` feature)",
        path.as_ref().display()
    )))
}

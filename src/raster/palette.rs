// src/raster/palette.rs
// Embedded color-table extraction for categorical rasters (NLCD, CDL).

use std::path::Path;

use crate::colormap::CategoricalLut;
use crate::error::DrapeResult;

/// Read the embedded palette of band 1, if any.
///
/// Returns None when the raster carries no color table; the caller falls
/// back to a default gradient. Codes at or above LUT_SIZE are dropped with
/// a warning — classified 8-bit products never legitimately exceed it.
#[cfg(feature = "gdal")]
pub fn read_palette(path: impl AsRef<Path>) -> DrapeResult<Option<CategoricalLut>> {
    use crate::colormap::LUT_SIZE;
    use crate::error::DrapeError;
    use gdal::Dataset;

    let path = path.as_ref();
    let dataset = Dataset::open(path)
        .map_err(|e| DrapeError::raster(format!("{}: {}", path.display(), e)))?;
    let band = dataset
        .rasterband(1)
        .map_err(|e| DrapeError::raster(format!("{}: band 1: {}", path.display(), e)))?;

    let Some(table) = band.color_table() else {
        return Ok(None);
    };

    let clamp = |v: i16| v.clamp(0, 255) as u8;
    let mut lut = CategoricalLut::new();
    let count = table.entry_count();
    for code in 0..count {
        let Some(entry) = table.entry_as_rgb(code) else {
            continue;
        };
        if code >= LUT_SIZE {
            log::warn!(
                "{}: palette code {} exceeds {}-entry table, dropping",
                path.display(),
                code,
                LUT_SIZE
            );
            continue;
        }
        lut.set(
            code,
            [clamp(entry.r), clamp(entry.g), clamp(entry.b), clamp(entry.a)],
        );
    }

    Ok(Some(lut))
}

/// Stub when GDAL support is not compiled in.
#[cfg(not(feature = "gdal"))]
pub fn read_palette(_path: impl AsRef<Path>) -> DrapeResult<Option<CategoricalLut>> {
    Ok(None)
}

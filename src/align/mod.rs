// src/align/mod.rs
// Reprojects and resamples overlay rasters onto the DEM grid.
//
// Inverse mapping: for each target cell center, walk target-geo ->
// (optional CRS hop) -> source-geo -> source-pixel, then sample. Nearest
// keeps categorical codes intact; bilinear smooths continuous fields.

use crate::error::{DrapeError, DrapeResult};
use crate::geo::{crs_equal, CrsTransformer};
use crate::raster::{GridDef, RasterGrid};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resampling {
    /// Nearest-neighbor: preserves the source value alphabet.
    Nearest,
    /// Bilinear between the four surrounding cell centers.
    Bilinear,
}

/// Resample `source` onto `target`, reprojecting first when the CRS differ.
///
/// The output always has exactly the target's shape and geolocation; cells
/// outside the source's coverage come back as NaN.
pub fn align_to(
    source: &RasterGrid,
    target: &GridDef,
    method: Resampling,
) -> DrapeResult<RasterGrid> {
    if source.grid_def() == *target {
        return Ok(source.clone());
    }

    let same_crs = source.crs.is_empty() || target.crs.is_empty() || crs_equal(&source.crs, &target.crs);
    if source.crs.is_empty() || target.crs.is_empty() {
        log::warn!("aligning rasters with missing CRS metadata, assuming identical systems");
    }

    let transformer = if same_crs {
        None
    } else {
        log::info!("reprojecting overlay from {} to {}", source.crs, target.crs);
        Some(
            CrsTransformer::new(&target.crs, &source.crs)
                .map_err(|e| DrapeError::align(e.to_string()))?,
        )
    };

    let inv = source
        .transform
        .inverse()
        .ok_or_else(|| DrapeError::align("source raster has a singular geotransform"))?;

    let mut data = Vec::with_capacity(target.cell_count());
    for row in 0..target.height {
        for col in 0..target.width {
            let (gx, gy) = target.transform.cell_center(col, row);
            let (sx, sy) = match &transformer {
                // a cell whose center falls outside the transform's domain
                // is simply uncovered, not a fatal error
                Some(t) => match t.transform(gx, gy) {
                    Ok(p) => p,
                    Err(_) => {
                        data.push(f64::NAN);
                        continue;
                    }
                },
                None => (gx, gy),
            };
            let (pc, pr) = inv.apply(sx, sy);
            let sample = match method {
                Resampling::Nearest => source.sample_nearest(pc, pr),
                Resampling::Bilinear => source.sample_bilinear(pc, pr),
            };
            data.push(sample.unwrap_or(f64::NAN));
        }
    }

    RasterGrid::from_parts(
        target.width,
        target.height,
        data,
        target.transform,
        target.crs.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::AffineTransform;
    use std::collections::BTreeSet;

    fn grid(width: usize, height: usize, origin: (f64, f64), res: f64, data: Vec<f64>) -> RasterGrid {
        RasterGrid::from_parts(
            width,
            height,
            data,
            AffineTransform::north_up(origin.0, origin.1, res, -res),
            "EPSG:26918",
        )
        .unwrap()
    }

    #[test]
    fn identical_grid_is_passthrough() {
        let src = grid(3, 2, (0.0, 2.0), 1.0, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let out = align_to(&src, &src.grid_def(), Resampling::Nearest).unwrap();
        assert_eq!(out.data, src.data);
    }

    #[test]
    fn output_shape_matches_target() {
        // 4x4 source at 1m, target 8x8 at 0.5m over the same extent
        let src = grid(4, 4, (0.0, 4.0), 1.0, (0..16).map(f64::from).collect());
        let target = GridDef {
            width: 8,
            height: 8,
            transform: AffineTransform::north_up(0.0, 4.0, 0.5, -0.5),
            crs: "EPSG:26918".into(),
        };
        let out = align_to(&src, &target, Resampling::Nearest).unwrap();
        assert_eq!(out.cell_count(), target.cell_count());
        assert_eq!((out.width, out.height), (8, 8));
    }

    #[test]
    fn nearest_preserves_value_alphabet() {
        // categorical codes, upsampled 3x: no new codes may appear
        let codes = vec![11.0, 21.0, 41.0, 81.0, 90.0, 11.0, 41.0, 21.0, 90.0];
        let src = grid(3, 3, (0.0, 3.0), 1.0, codes.clone());
        let target = GridDef {
            width: 9,
            height: 9,
            transform: AffineTransform::north_up(0.0, 3.0, 1.0 / 3.0, -1.0 / 3.0),
            crs: "EPSG:26918".into(),
        };
        let out = align_to(&src, &target, Resampling::Nearest).unwrap();

        let alphabet: BTreeSet<u64> = codes.iter().map(|v| *v as u64).collect();
        for v in out.data.iter().filter(|v| !v.is_nan()) {
            assert!(alphabet.contains(&(*v as u64)), "invented code {}", v);
            assert_eq!(v.fract(), 0.0);
        }
    }

    #[test]
    fn bilinear_interpolates_between_cells() {
        let src = grid(2, 1, (0.0, 1.0), 1.0, vec![0.0, 10.0]);
        // single cell centered exactly between the two source centers
        let target = GridDef {
            width: 1,
            height: 1,
            transform: AffineTransform::north_up(0.5, 1.0, 1.0, -1.0),
            crs: "EPSG:26918".into(),
        };
        let out = align_to(&src, &target, Resampling::Bilinear).unwrap();
        assert!((out.data[0] - 5.0).abs() < 1e-10);
    }

    #[test]
    fn uncovered_cells_are_nodata() {
        let src = grid(2, 2, (0.0, 2.0), 1.0, vec![1.0, 2.0, 3.0, 4.0]);
        // target extends well east of the source extent
        let target = GridDef {
            width: 4,
            height: 2,
            transform: AffineTransform::north_up(0.0, 2.0, 2.0, -1.0),
            crs: "EPSG:26918".into(),
        };
        let out = align_to(&src, &target, Resampling::Nearest).unwrap();
        assert!(!out.data[0].is_nan());
        assert!(out.data[1].is_nan());
        assert!(out.data[3].is_nan());
    }

    #[test]
    fn offset_grid_shifts_sampling() {
        let src = grid(2, 2, (0.0, 2.0), 1.0, vec![1.0, 2.0, 3.0, 4.0]);
        // same shape, shifted one cell east: west column now reads the
        // source's east column, east column falls off coverage
        let target = GridDef {
            width: 2,
            height: 2,
            transform: AffineTransform::north_up(1.0, 2.0, 1.0, -1.0),
            crs: "EPSG:26918".into(),
        };
        let out = align_to(&src, &target, Resampling::Nearest).unwrap();
        assert_eq!(out.data[0], 2.0);
        assert!(out.data[1].is_nan());
        assert_eq!(out.data[2], 4.0);
        assert!(out.data[3].is_nan());
    }
}

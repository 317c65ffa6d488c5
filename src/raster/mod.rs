// src/raster/mod.rs
// In-memory raster grid with geolocation metadata.
// Loading from disk lives in loader.rs (GDAL, feature-gated).

pub mod loader;
pub mod palette;

use crate::error::{DrapeError, DrapeResult};
use crate::geo::AffineTransform;

/// Target grid definition: what the alignment stage resamples onto.
#[derive(Debug, Clone, PartialEq)]
pub struct GridDef {
    pub width: usize,
    pub height: usize,
    pub transform: AffineTransform,
    pub crs: String,
}

impl GridDef {
    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }
}

/// A single-band raster: row-major f64 samples plus geolocation.
/// No-data cells are NaN after masking.
#[derive(Debug, Clone)]
pub struct RasterGrid {
    pub width: usize,
    pub height: usize,
    pub data: Vec<f64>,
    pub transform: AffineTransform,
    pub crs: String,
}

impl RasterGrid {
    /// Build a grid from parts, validating the sample count.
    pub fn from_parts(
        width: usize,
        height: usize,
        data: Vec<f64>,
        transform: AffineTransform,
        crs: impl Into<String>,
    ) -> DrapeResult<Self> {
        if data.len() != width * height {
            return Err(DrapeError::raster(format!(
                "sample count {} does not match {}x{} grid",
                data.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            transform,
            crs: crs.into(),
        })
    }

    pub fn cell_count(&self) -> usize {
        self.width * self.height
    }

    pub fn grid_def(&self) -> GridDef {
        GridDef {
            width: self.width,
            height: self.height,
            transform: self.transform,
            crs: self.crs.clone(),
        }
    }

    /// Pixel resolution (absolute x/y cell sizes).
    pub fn resolution(&self) -> (f64, f64) {
        (self.transform.a.abs(), self.transform.e.abs())
    }

    /// Geographic extent (min_x, min_y, max_x, max_y).
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        let (x0, y0) = self.transform.apply(0.0, 0.0);
        let (x1, y1) = self
            .transform
            .apply(self.width as f64, self.height as f64);
        (x0.min(x1), y0.min(y1), x0.max(x1), y0.max(y1))
    }

    /// Value at (col, row); None when out of bounds or no-data.
    #[inline]
    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let val = self.data[row * self.width + col];
        if val.is_nan() {
            None
        } else {
            Some(val)
        }
    }

    /// Nearest-neighbor sample at fractional pixel coordinates.
    /// (col, row) address cell centers at half-integers, so rounding down
    /// the raw coordinate selects the containing cell.
    pub fn sample_nearest(&self, col: f64, row: f64) -> Option<f64> {
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let c = col.floor();
        let r = row.floor();
        if c >= self.width as f64 || r >= self.height as f64 {
            return None;
        }
        self.get(c as usize, r as usize)
    }

    /// Bilinear sample between the four surrounding cell centers.
    /// Neighbor indices clamp at the grid edge, so the outer half-cell
    /// border degrades to linear/nearest instead of dropping out.
    pub fn sample_bilinear(&self, col: f64, row: f64) -> Option<f64> {
        if col < 0.0 || row < 0.0 || col > self.width as f64 || row > self.height as f64 {
            return None;
        }
        // shift into cell-center space
        let x = (col - 0.5).clamp(0.0, (self.width - 1) as f64);
        let y = (row - 0.5).clamp(0.0, (self.height - 1) as f64);
        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let v00 = self.get(x0, y0)?;
        let v10 = self.get(x1, y0)?;
        let v01 = self.get(x0, y1)?;
        let v11 = self.get(x1, y1)?;

        let fx = x - x0 as f64;
        let fy = y - y0 as f64;
        let v0 = v00 * (1.0 - fx) + v10 * fx;
        let v1 = v01 * (1.0 - fx) + v11 * fx;
        Some(v0 * (1.0 - fy) + v1 * fy)
    }

    /// Min/max over valid samples; None when everything is no-data.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        let mut range: Option<(f64, f64)> = None;
        for &v in &self.data {
            if v.is_nan() {
                continue;
            }
            range = Some(match range {
                Some((lo, hi)) => (lo.min(v), hi.max(v)),
                None => (v, v),
            });
        }
        range
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_grid() -> RasterGrid {
        RasterGrid::from_parts(
            2,
            2,
            vec![0.0, 1.0, 2.0, 3.0],
            AffineTransform::north_up(0.0, 2.0, 1.0, -1.0),
            "EPSG:32618",
        )
        .unwrap()
    }

    #[test]
    fn from_parts_rejects_bad_count() {
        let r = RasterGrid::from_parts(3, 3, vec![0.0; 8], AffineTransform::identity(), "");
        assert!(r.is_err());
    }

    #[test]
    fn get_masks_nan() {
        let g = RasterGrid::from_parts(
            2,
            1,
            vec![5.0, f64::NAN],
            AffineTransform::identity(),
            "",
        )
        .unwrap();
        assert_eq!(g.get(0, 0), Some(5.0));
        assert_eq!(g.get(1, 0), None);
        assert_eq!(g.get(2, 0), None);
    }

    #[test]
    fn bilinear_center_is_mean_of_corners() {
        let g = small_grid();
        let v = g.sample_bilinear(1.0, 1.0).unwrap();
        assert!((v - 1.5).abs() < 1e-10);
    }

    #[test]
    fn bilinear_clamps_at_grid_edges() {
        let g = RasterGrid::from_parts(
            2,
            1,
            vec![0.0, 10.0],
            AffineTransform::north_up(0.0, 1.0, 1.0, -1.0),
            "",
        )
        .unwrap();
        // midway between the two cell centers on a single-row grid
        assert!((g.sample_bilinear(1.0, 0.5).unwrap() - 5.0).abs() < 1e-10);
        // within the outer half-cell border, the edge value holds
        assert!((g.sample_bilinear(0.25, 0.5).unwrap() - 0.0).abs() < 1e-10);
        // past the grid entirely is no coverage
        assert_eq!(g.sample_bilinear(2.5, 0.5), None);
    }

    #[test]
    fn nearest_picks_containing_cell() {
        let g = small_grid();
        assert_eq!(g.sample_nearest(0.25, 0.25), Some(0.0));
        assert_eq!(g.sample_nearest(1.75, 0.25), Some(1.0));
        assert_eq!(g.sample_nearest(1.75, 1.75), Some(3.0));
        assert_eq!(g.sample_nearest(2.5, 0.5), None);
    }

    #[test]
    fn extent_flips_negative_y_res() {
        let g = small_grid();
        let (min_x, min_y, max_x, max_y) = g.extent();
        assert!((min_x - 0.0).abs() < 1e-10);
        assert!((min_y - 0.0).abs() < 1e-10);
        assert!((max_x - 2.0).abs() < 1e-10);
        assert!((max_y - 2.0).abs() < 1e-10);
        assert_eq!(g.resolution(), (1.0, 1.0));
    }

    #[test]
    fn value_range_skips_nodata() {
        let g = RasterGrid::from_parts(
            3,
            1,
            vec![2.0, f64::NAN, 7.0],
            AffineTransform::identity(),
            "",
        )
        .unwrap();
        assert_eq!(g.value_range(), Some((2.0, 7.0)));
    }
}

// src/geo/mod.rs
// Geospatial primitives: affine geotransforms and CRS reprojection.

pub mod reproject;
pub mod transform;

pub use reproject::{crs_equal, parse_epsg_code, CrsTransformer, GeoError};
pub use transform::AffineTransform;

//! drape3d: interactive 3D visualization of DEMs draped with categorical
//! and continuous raster overlays (land cover, cropland, runoff).
//!
//! Pipeline per run: load rasters -> align overlays onto the DEM grid ->
//! build a height-field mesh with named scalar attributes -> color through
//! colormap LUTs -> show an interactive window, optionally export PNG +
//! a standalone interactive HTML document.

pub mod align;
pub mod cli;
pub mod colormap;
pub mod error;
pub mod export;
pub mod geo;
pub mod raster;
pub mod render;
pub mod scene;
pub mod terrain;
pub mod viewer;

pub use error::{DrapeError, DrapeResult};

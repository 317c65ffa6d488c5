// src/render/mod.rs
// wgpu rendering: terrain pipeline, HUD overlay pass, off-screen targets.

pub mod context;
pub mod offscreen;
pub mod overlay;
pub mod pipeline;

pub use context::ctx;
pub use offscreen::OffscreenTarget;
pub use overlay::{OverlayRenderer, RectInstance};
pub use pipeline::{GpuMesh, LutTexture, TerrainPipeline, TerrainUniforms, NODATA_SENTINEL};

// src/terrain/mod.rs
// Structured-grid terrain mesh with named per-vertex scalar attributes.
// Geometry z carries the exaggeration; the "elevation" attribute stays
// unscaled so coloring reflects true height regardless of the slider.

pub mod mesh;

pub use mesh::{grid_indices, grid_normals, Indices};

use crate::error::{DrapeError, DrapeResult};
use crate::raster::RasterGrid;

/// Usable exaggeration range, matching the interactive slider.
pub const MIN_EXAGGERATION: f32 = 0.1;
pub const MAX_EXAGGERATION: f32 = 5.0;

/// Name of the scalar attribute that always exists after `from_dem`.
pub const ELEVATION_ATTR: &str = "elevation";

#[derive(Debug, Clone)]
pub struct ScalarAttribute {
    pub name: String,
    pub values: Vec<f32>,
}

/// Height-field mesh over the DEM grid.
///
/// Point ordering is row-major, identical to the raster's sample order;
/// every attached attribute uses the same ordering, which is what keeps
/// the drape aligned with the geometry.
#[derive(Debug, Clone)]
pub struct TerrainMesh {
    width: usize,
    height: usize,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    indices: Indices,
    /// Unscaled elevation per vertex; NaN where the DEM has no data.
    base_elevation: Vec<f32>,
    /// Geometry z for no-data cells (the DEM's minimum valid elevation).
    floor: f32,
    scale_z: f32,
    attributes: Vec<ScalarAttribute>,
}

impl TerrainMesh {
    /// Build the mesh from a DEM, with geometry z = elevation * scale_z.
    pub fn from_dem(dem: &RasterGrid, scale_z: f32) -> DrapeResult<Self> {
        if dem.width < 2 || dem.height < 2 {
            return Err(DrapeError::geometry(format!(
                "DEM grid {}x{} is too small to mesh",
                dem.width, dem.height
            )));
        }
        let scale_z = clamp_exaggeration(scale_z);

        let (min_x, min_y, max_x, max_y) = dem.extent();
        let cx = (min_x + max_x) * 0.5;
        let cy = (min_y + max_y) * 0.5;

        let (floor, _) = dem
            .value_range()
            .ok_or_else(|| DrapeError::geometry("DEM contains no valid elevation samples"))?;
        let floor = floor as f32;

        let n = dem.cell_count();
        let mut positions = Vec::with_capacity(n);
        let mut base_elevation = Vec::with_capacity(n);
        for row in 0..dem.height {
            for col in 0..dem.width {
                let (gx, gy) = dem.transform.cell_center(col, row);
                let elev = dem.data[row * dem.width + col] as f32;
                let z = if elev.is_nan() { floor } else { elev };
                positions.push([(gx - cx) as f32, (gy - cy) as f32, z * scale_z]);
                base_elevation.push(elev);
            }
        }

        let normals = grid_normals(&positions, dem.width, dem.height);
        let indices = grid_indices(dem.width, dem.height);

        let mut mesh = Self {
            width: dem.width,
            height: dem.height,
            positions,
            normals,
            indices,
            base_elevation: base_elevation.clone(),
            floor,
            scale_z,
            attributes: Vec::new(),
        };
        mesh.attributes.push(ScalarAttribute {
            name: ELEVATION_ATTR.to_string(),
            values: base_elevation,
        });
        Ok(mesh)
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn grid_shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn indices(&self) -> &Indices {
        &self.indices
    }

    pub fn exaggeration(&self) -> f32 {
        self.scale_z
    }

    /// Attach an aligned raster's values as a named scalar attribute.
    /// The length must match the vertex count exactly; anything else would
    /// silently scramble the drape, so it is a hard error here.
    pub fn attach_scalar(&mut self, name: &str, values: Vec<f32>) -> DrapeResult<()> {
        if values.len() != self.vertex_count() {
            return Err(DrapeError::geometry(format!(
                "attribute '{}' has {} values, mesh has {} vertices",
                name,
                values.len(),
                self.vertex_count()
            )));
        }
        if let Some(existing) = self.attributes.iter_mut().find(|a| a.name == name) {
            existing.values = values;
        } else {
            self.attributes.push(ScalarAttribute {
                name: name.to_string(),
                values,
            });
        }
        Ok(())
    }

    /// Attach directly from an aligned raster (must share the DEM's shape).
    pub fn attach_raster(&mut self, name: &str, raster: &RasterGrid) -> DrapeResult<()> {
        let values = raster.data.iter().map(|&v| v as f32).collect();
        self.attach_scalar(name, values)
    }

    pub fn attribute(&self, name: &str) -> Option<&[f32]> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.values.as_slice())
    }

    pub fn attributes(&self) -> &[ScalarAttribute] {
        &self.attributes
    }

    /// Recompute geometry z in place from the stored base elevation.
    pub fn set_exaggeration(&mut self, scale_z: f32) {
        let scale_z = clamp_exaggeration(scale_z);
        if scale_z == self.scale_z {
            return;
        }
        self.scale_z = scale_z;
        for (pos, &elev) in self.positions.iter_mut().zip(&self.base_elevation) {
            let z = if elev.is_nan() { self.floor } else { elev };
            pos[2] = z * scale_z;
        }
        self.normals = grid_normals(&self.positions, self.width, self.height);
    }

    /// Interleaved position+normal buffer (6 floats per vertex).
    pub fn interleaved_vertices(&self) -> Vec<f32> {
        let mut verts = Vec::with_capacity(self.vertex_count() * 6);
        for (p, n) in self.positions.iter().zip(&self.normals) {
            verts.extend_from_slice(p);
            verts.extend_from_slice(n);
        }
        verts
    }

    /// Half-extents of the mesh in world units, for camera framing.
    pub fn bounds(&self) -> (f32, f32, f32) {
        let mut max_x = 0.0f32;
        let mut max_y = 0.0f32;
        let mut max_z = 0.0f32;
        for p in &self.positions {
            max_x = max_x.max(p[0].abs());
            max_y = max_y.max(p[1].abs());
            max_z = max_z.max(p[2].abs());
        }
        (max_x, max_y, max_z)
    }
}

fn clamp_exaggeration(s: f32) -> f32 {
    if !(MIN_EXAGGERATION..=MAX_EXAGGERATION).contains(&s) {
        log::warn!(
            "vertical exaggeration {} outside [{}, {}], clamping",
            s,
            MIN_EXAGGERATION,
            MAX_EXAGGERATION
        );
    }
    s.clamp(MIN_EXAGGERATION, MAX_EXAGGERATION)
}

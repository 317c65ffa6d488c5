// src/scene/mod.rs
// One terrain mesh, N drape layers, exactly one active at a time.
// The toggle buttons and the CLI --color flag both drive this state.

use crate::align::{align_to, Resampling};
use crate::colormap::{CategoricalLut, Colormap, GradientType};
use crate::error::{DrapeError, DrapeResult};
use crate::raster::RasterGrid;
use crate::terrain::{TerrainMesh, ELEVATION_ATTR};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Elevation,
    Nlcd,
    Cdl,
    Runoff,
}

impl LayerKind {
    /// Mesh attribute name carrying this layer's values.
    pub fn attr_name(&self) -> &'static str {
        match self {
            LayerKind::Elevation => ELEVATION_ATTR,
            LayerKind::Nlcd => "nlcd",
            LayerKind::Cdl => "cdl",
            LayerKind::Runoff => "runoff",
        }
    }

    /// Button label in the viewer HUD.
    pub fn label(&self) -> &'static str {
        match self {
            LayerKind::Elevation => "ELEVATION",
            LayerKind::Nlcd => "NLCD",
            LayerKind::Cdl => "CDL",
            LayerKind::Runoff => "RUNOFF",
        }
    }

    /// Scalar-bar title.
    pub fn title(&self) -> &'static str {
        match self {
            LayerKind::Elevation => "ELEVATION M",
            LayerKind::Nlcd => "NLCD LANDCOVER",
            LayerKind::Cdl => "CDL LANDCOVER",
            LayerKind::Runoff => "RUNOFF COEFF",
        }
    }

    /// Categorical layers keep discrete codes through alignment.
    pub fn is_categorical(&self) -> bool {
        matches!(self, LayerKind::Nlcd | LayerKind::Cdl)
    }

    pub fn resampling(&self) -> Resampling {
        if self.is_categorical() {
            Resampling::Nearest
        } else {
            Resampling::Bilinear
        }
    }

    fn default_gradient(&self) -> GradientType {
        match self {
            LayerKind::Elevation => GradientType::Earth,
            LayerKind::Runoff => GradientType::ViridisR,
            // categorical layers normally bring their own palette
            LayerKind::Nlcd | LayerKind::Cdl => GradientType::Viridis,
        }
    }
}

/// One drape layer: which attribute to color by, how, and over what range.
#[derive(Debug, Clone)]
pub struct Layer {
    pub kind: LayerKind,
    pub colormap: Colormap,
    /// Color limits (ignored for categorical maps, which index by code).
    pub range: (f32, f32),
}

/// An overlay raster as loaded, before alignment.
#[derive(Debug, Clone)]
pub struct OverlayInput {
    pub kind: LayerKind,
    pub raster: RasterGrid,
    pub palette: Option<CategoricalLut>,
}

/// The populated scene: mesh plus layers plus the single active selection.
#[derive(Debug, Clone)]
pub struct Scene {
    pub mesh: TerrainMesh,
    layers: Vec<Layer>,
    active: usize,
}

impl Scene {
    /// Align every overlay onto the DEM grid, attach it, and pick colormaps.
    ///
    /// Layer order is overlays in input order, elevation last — the same
    /// order the toggle buttons show. The first layer starts active, so a
    /// scene with overlays opens on the first overlay and a bare DEM opens
    /// on elevation coloring.
    pub fn assemble(
        dem: &RasterGrid,
        overlays: Vec<OverlayInput>,
        scale_z: f32,
    ) -> DrapeResult<Self> {
        let mut mesh = TerrainMesh::from_dem(dem, scale_z)?;
        let target = dem.grid_def();

        let mut layers = Vec::with_capacity(overlays.len() + 1);
        for overlay in overlays {
            let kind = overlay.kind;
            if kind == LayerKind::Elevation {
                return Err(DrapeError::align(
                    "elevation is derived from the DEM, not an overlay",
                ));
            }
            log::info!("aligning {} onto DEM grid", kind.attr_name());
            let aligned = align_to(&overlay.raster, &target, kind.resampling())?;
            mesh.attach_raster(kind.attr_name(), &aligned)?;

            let (colormap, range) = if kind.is_categorical() {
                let lut = match overlay.palette {
                    Some(p) => p,
                    None => {
                        log::warn!(
                            "{} carries no embedded palette, using qualitative fallback",
                            kind.attr_name()
                        );
                        CategoricalLut::qualitative()
                    }
                };
                (Colormap::Categorical(lut), (0.0, 255.0))
            } else {
                let range = aligned
                    .value_range()
                    .map(|(lo, hi)| (lo as f32, hi as f32))
                    .unwrap_or((0.0, 1.0));
                (Colormap::Continuous(kind.default_gradient()), range)
            };
            layers.push(Layer {
                kind,
                colormap,
                range,
            });
        }

        let elev_range = dem
            .value_range()
            .map(|(lo, hi)| (lo as f32, hi as f32))
            .unwrap_or((0.0, 1.0));
        layers.push(Layer {
            kind: LayerKind::Elevation,
            colormap: Colormap::Continuous(LayerKind::Elevation.default_gradient()),
            range: elev_range,
        });

        Ok(Self {
            mesh,
            layers,
            active: 0,
        })
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_layer(&self) -> &Layer {
        &self.layers[self.active]
    }

    pub fn is_active(&self, kind: LayerKind) -> bool {
        self.layers[self.active].kind == kind
    }

    /// Make `kind` the active layer. Returns true when the selection
    /// changed; activating the current layer is a no-op, and every other
    /// layer is implicitly deactivated (there is only one index).
    pub fn activate(&mut self, kind: LayerKind) -> bool {
        match self.layers.iter().position(|l| l.kind == kind) {
            Some(idx) if idx != self.active => {
                self.active = idx;
                true
            }
            _ => false,
        }
    }

    /// Override the gradient of a continuous layer (the `--cmap` flag).
    /// Categorical layers keep their palette; returns false when the layer
    /// is absent or categorical.
    pub fn set_continuous_gradient(&mut self, kind: LayerKind, gradient: GradientType) -> bool {
        match self.layers.iter_mut().find(|l| l.kind == kind) {
            Some(layer) if !layer.colormap.is_categorical() => {
                layer.colormap = Colormap::Continuous(gradient);
                true
            }
            _ => false,
        }
    }

    /// Values of the active layer's attribute.
    pub fn active_values(&self) -> &[f32] {
        self.mesh
            .attribute(self.active_layer().kind.attr_name())
            .expect("active layer attribute always attached at assembly")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::AffineTransform;

    fn dem() -> RasterGrid {
        let data = (0..100).map(|i| i as f64).collect();
        RasterGrid::from_parts(
            10,
            10,
            data,
            AffineTransform::north_up(0.0, 10.0, 1.0, -1.0),
            "EPSG:26918",
        )
        .unwrap()
    }

    fn overlay(kind: LayerKind) -> OverlayInput {
        let data = (0..100).map(|i| (i % 5) as f64 * 10.0 + 11.0).collect();
        OverlayInput {
            kind,
            raster: RasterGrid::from_parts(
                10,
                10,
                data,
                AffineTransform::north_up(0.0, 10.0, 1.0, -1.0),
                "EPSG:26918",
            )
            .unwrap(),
            palette: None,
        }
    }

    #[test]
    fn bare_dem_opens_on_elevation() {
        let scene = Scene::assemble(&dem(), vec![], 1.0).unwrap();
        assert_eq!(scene.layers().len(), 1);
        assert!(scene.is_active(LayerKind::Elevation));
    }

    #[test]
    fn first_overlay_starts_active() {
        let scene = Scene::assemble(
            &dem(),
            vec![overlay(LayerKind::Nlcd), overlay(LayerKind::Runoff)],
            1.0,
        )
        .unwrap();
        assert_eq!(scene.layers().len(), 3);
        assert!(scene.is_active(LayerKind::Nlcd));
    }

    #[test]
    fn exactly_one_active_through_toggling() {
        let mut scene = Scene::assemble(
            &dem(),
            vec![overlay(LayerKind::Nlcd), overlay(LayerKind::Cdl)],
            1.0,
        )
        .unwrap();

        let active_count = |s: &Scene| {
            [LayerKind::Elevation, LayerKind::Nlcd, LayerKind::Cdl, LayerKind::Runoff]
                .iter()
                .filter(|k| s.is_active(**k))
                .count()
        };
        assert_eq!(active_count(&scene), 1);

        assert!(scene.activate(LayerKind::Cdl));
        assert!(scene.is_active(LayerKind::Cdl));
        assert_eq!(active_count(&scene), 1);

        // rapid re-toggling of the same layer stays a no-op
        assert!(!scene.activate(LayerKind::Cdl));
        assert_eq!(active_count(&scene), 1);

        assert!(scene.activate(LayerKind::Elevation));
        assert!(!scene.is_active(LayerKind::Cdl));
        assert_eq!(active_count(&scene), 1);

        // a layer that was never loaded cannot become active
        assert!(!scene.activate(LayerKind::Runoff));
        assert!(scene.is_active(LayerKind::Elevation));
    }

    #[test]
    fn categorical_without_palette_gets_qualitative_fallback() {
        let scene = Scene::assemble(&dem(), vec![overlay(LayerKind::Nlcd)], 1.0).unwrap();
        let layer = scene.active_layer();
        assert!(layer.colormap.is_categorical());
        assert_eq!(layer.range, (0.0, 255.0));
    }

    #[test]
    fn continuous_overlay_range_comes_from_data() {
        let scene = Scene::assemble(&dem(), vec![overlay(LayerKind::Runoff)], 1.0).unwrap();
        let layer = scene.active_layer();
        assert!(!layer.colormap.is_categorical());
        assert_eq!(layer.range, (11.0, 51.0));
    }

    #[test]
    fn gradient_override_only_touches_continuous_layers() {
        let mut scene = Scene::assemble(&dem(), vec![overlay(LayerKind::Nlcd)], 1.0).unwrap();
        assert!(scene.set_continuous_gradient(LayerKind::Elevation, GradientType::Viridis));
        assert!(matches!(
            scene
                .layers()
                .iter()
                .find(|l| l.kind == LayerKind::Elevation)
                .unwrap()
                .colormap,
            Colormap::Continuous(GradientType::Viridis)
        ));
        // categorical layers keep their palette
        assert!(!scene.set_continuous_gradient(LayerKind::Nlcd, GradientType::Earth));
        // layers that were never loaded cannot be recolored
        assert!(!scene.set_continuous_gradient(LayerKind::Runoff, GradientType::Earth));
    }

    #[test]
    fn elevation_as_overlay_is_rejected() {
        let err = Scene::assemble(&dem(), vec![overlay(LayerKind::Elevation)], 1.0).unwrap_err();
        assert!(err.to_string().contains("derived from the DEM"));
    }
}

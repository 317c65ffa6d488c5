// End-to-end pipeline over synthetic rasters: load-free versions of the
// scenarios the CLI drives, checking the documented invariants without
// touching GDAL or a GPU.

use std::collections::BTreeSet;

use drape3d::align::{align_to, Resampling};
use drape3d::colormap::CategoricalLut;
use drape3d::export::html::render_document;
use drape3d::geo::AffineTransform;
use drape3d::raster::RasterGrid;
use drape3d::scene::{LayerKind, OverlayInput, Scene};
use drape3d::terrain::ELEVATION_ATTR;

/// 100x100 DEM with elevations spanning 0..500 m on a 30 m UTM grid.
fn synthetic_dem() -> RasterGrid {
    let mut data = Vec::with_capacity(100 * 100);
    for row in 0..100 {
        for col in 0..100 {
            let t = (row * 100 + col) as f64 / 9999.0;
            data.push(t * 500.0);
        }
    }
    RasterGrid::from_parts(
        100,
        100,
        data,
        AffineTransform::north_up(440_000.0, 4_700_000.0, 30.0, -30.0),
        "EPSG:26918",
    )
    .unwrap()
}

/// Land-cover raster over the same extent with exactly 5 distinct codes,
/// at half the DEM's resolution so alignment has real work to do.
fn synthetic_landcover() -> RasterGrid {
    let codes = [11.0, 21.0, 41.0, 81.0, 90.0];
    let mut data = Vec::with_capacity(50 * 50);
    for row in 0..50 {
        for col in 0..50 {
            data.push(codes[(row * 7 + col) % codes.len()]);
        }
    }
    RasterGrid::from_parts(
        50,
        50,
        data,
        AffineTransform::north_up(440_000.0, 4_700_000.0, 60.0, -60.0),
        "EPSG:26918",
    )
    .unwrap()
}

fn landcover_palette() -> CategoricalLut {
    let mut lut = CategoricalLut::new();
    lut.set(11, [70, 107, 159, 255]);
    lut.set(21, [222, 197, 197, 255]);
    lut.set(41, [104, 171, 95, 255]);
    lut.set(81, [220, 217, 57, 255]);
    lut.set(90, [186, 216, 234, 255]);
    lut
}

#[test]
fn aligned_overlay_matches_dem_cell_count() {
    let dem = synthetic_dem();
    let overlay = synthetic_landcover();
    assert_ne!(overlay.cell_count(), dem.cell_count());

    let aligned = align_to(&overlay, &dem.grid_def(), Resampling::Nearest).unwrap();
    assert_eq!(aligned.cell_count(), dem.cell_count());
}

#[test]
fn categorical_alignment_preserves_code_alphabet() {
    let dem = synthetic_dem();
    let overlay = synthetic_landcover();
    let source_codes: BTreeSet<u64> = overlay.data.iter().map(|v| *v as u64).collect();
    assert_eq!(source_codes.len(), 5);

    let aligned = align_to(&overlay, &dem.grid_def(), Resampling::Nearest).unwrap();
    for v in aligned.data.iter().filter(|v| !v.is_nan()) {
        assert!(source_codes.contains(&(*v as u64)), "invented code {}", v);
    }
}

#[test]
fn elevation_mode_scene_has_expected_attribute() {
    let scene = Scene::assemble(&synthetic_dem(), vec![], 1.0).unwrap();

    assert_eq!(scene.layers().len(), 1);
    assert!(scene.is_active(LayerKind::Elevation));

    let elev = scene.mesh.attribute(ELEVATION_ATTR).unwrap();
    assert_eq!(elev.len(), 10_000);
    for v in elev {
        assert!((0.0..=500.0).contains(v), "elevation {} out of range", v);
    }
    let layer = scene.active_layer();
    assert!((layer.range.0 - 0.0).abs() < 1e-3);
    assert!((layer.range.1 - 500.0).abs() < 1e-3);
}

#[test]
fn nlcd_mode_scene_drapes_landcover() {
    let dem = synthetic_dem();
    let overlay = OverlayInput {
        kind: LayerKind::Nlcd,
        raster: synthetic_landcover(),
        palette: Some(landcover_palette()),
    };
    let scene = Scene::assemble(&dem, vec![overlay], 1.0).unwrap();

    assert!(scene.is_active(LayerKind::Nlcd));
    assert_eq!(scene.active_values().len(), 10_000);
    let nlcd = scene.mesh.attribute("nlcd").unwrap();
    assert_eq!(nlcd.len(), 10_000);

    let layer = scene.active_layer();
    assert!(layer.colormap.is_categorical());
    assert_eq!(layer.range, (0.0, 255.0));

    // LUT keeps the embedded palette and leaves absent codes transparent
    let lut = layer.colormap.to_rgba8();
    assert_eq!(lut.len(), 256 * 4);
    assert_eq!(&lut[11 * 4..11 * 4 + 4], &[70, 107, 159, 255]);
    assert_eq!(&lut[12 * 4..12 * 4 + 4], &[0, 0, 0, 0]);
}

#[test]
fn exaggeration_is_linear_across_tested_range() {
    let dem = synthetic_dem();
    for s in [0.1f32, 1.0, 5.0] {
        let scene = Scene::assemble(&dem, vec![], s).unwrap();
        let base = scene.mesh.attribute(ELEVATION_ATTR).unwrap();
        for (p, b) in scene.mesh.positions().iter().zip(base) {
            assert!((p[2] - b * s).abs() < 1e-2);
        }
    }
}

#[test]
fn toggling_keeps_exactly_one_layer_active() {
    let dem = synthetic_dem();
    let overlays = vec![
        OverlayInput {
            kind: LayerKind::Nlcd,
            raster: synthetic_landcover(),
            palette: Some(landcover_palette()),
        },
        OverlayInput {
            kind: LayerKind::Runoff,
            raster: synthetic_dem(),
            palette: None,
        },
    ];
    let mut scene = Scene::assemble(&dem, overlays, 1.0).unwrap();

    let all = [
        LayerKind::Elevation,
        LayerKind::Nlcd,
        LayerKind::Cdl,
        LayerKind::Runoff,
    ];
    let active_count =
        |s: &Scene| all.iter().filter(|k| s.is_active(**k)).count();

    assert_eq!(active_count(&scene), 1);
    for kind in [
        LayerKind::Runoff,
        LayerKind::Elevation,
        LayerKind::Nlcd,
        LayerKind::Nlcd,
        LayerKind::Runoff,
    ] {
        scene.activate(kind);
        assert_eq!(active_count(&scene), 1);
    }
}

#[test]
fn export_document_is_nonempty_and_complete() {
    let dem = synthetic_dem();
    let overlay = OverlayInput {
        kind: LayerKind::Nlcd,
        raster: synthetic_landcover(),
        palette: Some(landcover_palette()),
    };
    let scene = Scene::assemble(&dem, vec![overlay], 1.0).unwrap();

    let html = render_document(&scene).unwrap();
    assert!(html.len() > 10_000);
    assert!(html.contains("\"grid\":[100,100]"));
    assert!(html.contains("\"nlcd\""));
    assert!(html.contains("\"elevation\""));
}

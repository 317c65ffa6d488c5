// src/main.rs
// Binary entry: parse flags, run the load -> align -> mesh -> view -> export
// pipeline, and turn any failure into a nonzero exit.

use std::path::Path;
use std::process;

use drape3d::cli::{CliConfig, CliError, ColorMode, USAGE};
use drape3d::colormap::map_name_to_type;
use drape3d::error::{DrapeError, DrapeResult};
use drape3d::export::run_export;
use drape3d::raster::{loader, palette};
use drape3d::scene::{LayerKind, OverlayInput, Scene};
use drape3d::viewer::{run_viewer, ViewerConfig};

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match CliConfig::parse(&args) {
        Ok(config) => config,
        Err(CliError::Help) => {
            println!("{}", USAGE);
            return;
        }
        Err(e) => {
            eprintln!("[drape3d] {}", e);
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    if let Err(e) = run(config) {
        eprintln!("[drape3d] {}", e);
        process::exit(1);
    }
}

fn load_overlay(kind: LayerKind, path: &Path) -> DrapeResult<OverlayInput> {
    let raster = loader::open_raster(path)?;
    let palette = if kind.is_categorical() {
        palette::read_palette(path)?
    } else {
        None
    };
    Ok(OverlayInput {
        kind,
        raster,
        palette,
    })
}

fn required<'a>(
    path: &'a Option<std::path::PathBuf>,
    mode: &str,
    flag: &str,
) -> DrapeResult<&'a Path> {
    path.as_deref().ok_or_else(|| {
        DrapeError::cli(format!("--color {} requires {} <path>", mode, flag))
    })
}

fn run(config: CliConfig) -> DrapeResult<()> {
    let dem = loader::open_raster(&config.dem)?;

    let overlays = match config.color {
        ColorMode::Elevation => Vec::new(),
        ColorMode::Nlcd => vec![load_overlay(
            LayerKind::Nlcd,
            required(&config.nlcd, "nlcd", "--nlcd")?,
        )?],
        ColorMode::Cdl => vec![load_overlay(
            LayerKind::Cdl,
            required(&config.cdl, "cdl", "--cdl")?,
        )?],
        ColorMode::Runoff => vec![load_overlay(
            LayerKind::Runoff,
            required(&config.runoff, "runoff", "--runoff")?,
        )?],
        ColorMode::Interactive => {
            // every provided overlay, in button order
            let mut loaded = Vec::new();
            if let Some(path) = &config.nlcd {
                loaded.push(load_overlay(LayerKind::Nlcd, path)?);
            }
            if let Some(path) = &config.cdl {
                loaded.push(load_overlay(LayerKind::Cdl, path)?);
            }
            if let Some(path) = &config.runoff {
                loaded.push(load_overlay(LayerKind::Runoff, path)?);
            }
            loaded
        }
    };

    let mut scene = Scene::assemble(&dem, overlays, config.scale_z)?;
    if let Some(name) = &config.cmap {
        let gradient = map_name_to_type(name).map_err(DrapeError::cli)?;
        scene.set_continuous_gradient(LayerKind::Elevation, gradient);
    }
    log::info!(
        "scene ready: {} vertices, {} layers",
        scene.mesh.vertex_count(),
        scene.layers().len()
    );

    let viewer_config = ViewerConfig {
        width: config.width,
        height: config.height,
        title: format!("drape3d - {}", config.dem.display()),
        vsync: true,
    };
    run_viewer(scene.clone(), viewer_config)?;

    if config.export {
        let (png, html) = run_export(
            &scene,
            config.color.as_str(),
            &config.out_dir,
            config.width,
            config.height,
        )?;
        println!("exported {} and {}", png.display(), html.display());
    }

    Ok(())
}

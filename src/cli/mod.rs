// src/cli/mod.rs
// Hand-rolled CLI parsing: typed config, typed errors, no surprises.

use std::path::PathBuf;

pub const USAGE: &str = "\
Usage: drape3d --dem <path> [options]

Options:
  --dem <path>       DEM raster (required)
  --nlcd <path>      NLCD land-cover raster
  --cdl <path>       CDL cropland raster
  --runoff <path>    runoff-coefficient raster
  --color <mode>     elevation | nlcd | runoff | cdl | interactive (default: interactive)
  --cmap <name>      gradient for elevation coloring: earth | viridis | viridis_r
  --export           write PNG + HTML into the output directory after the session
  --scale_z <f>      initial vertical exaggeration (default: 1.0)
  --out-dir <path>   export directory (default: outputs)
  --size <WxH>       window and export size (default: 1280x720)
  --help             print this help";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Elevation,
    Nlcd,
    Runoff,
    Cdl,
    Interactive,
}

impl ColorMode {
    pub fn parse(s: &str) -> Result<Self, CliError> {
        match s {
            "elevation" => Ok(ColorMode::Elevation),
            "nlcd" => Ok(ColorMode::Nlcd),
            "runoff" => Ok(ColorMode::Runoff),
            "cdl" => Ok(ColorMode::Cdl),
            "interactive" => Ok(ColorMode::Interactive),
            _ => Err(CliError::InvalidValue {
                flag: "--color",
                value: s.to_string(),
                expected: "elevation, nlcd, runoff, cdl, interactive",
            }),
        }
    }

    /// Name used in exported file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorMode::Elevation => "elevation",
            ColorMode::Nlcd => "nlcd",
            ColorMode::Runoff => "runoff",
            ColorMode::Cdl => "cdl",
            ColorMode::Interactive => "interactive",
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CliError {
    #[error("help requested")]
    Help,

    #[error("missing value for {0}")]
    MissingValue(&'static str),

    #[error("unknown flag '{0}'")]
    UnknownFlag(String),

    #[error("invalid value '{value}' for {flag} (expected {expected})")]
    InvalidValue {
        flag: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("--dem <path> is required")]
    MissingDem,
}

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub dem: PathBuf,
    pub nlcd: Option<PathBuf>,
    pub cdl: Option<PathBuf>,
    pub runoff: Option<PathBuf>,
    pub color: ColorMode,
    pub cmap: Option<String>,
    pub export: bool,
    pub scale_z: f32,
    pub out_dir: PathBuf,
    pub width: u32,
    pub height: u32,
}

impl CliConfig {
    pub fn parse(args: &[String]) -> Result<Self, CliError> {
        let mut dem: Option<PathBuf> = None;
        let mut nlcd = None;
        let mut cdl = None;
        let mut runoff = None;
        let mut color = ColorMode::Interactive;
        let mut cmap = None;
        let mut export = false;
        let mut scale_z = 1.0f32;
        let mut out_dir = PathBuf::from("outputs");
        let mut width = 1280u32;
        let mut height = 720u32;

        let mut it = args.iter();
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "--help" | "-h" => return Err(CliError::Help),
                "--dem" => {
                    let v = it.next().ok_or(CliError::MissingValue("--dem"))?;
                    dem = Some(PathBuf::from(v));
                }
                "--nlcd" => {
                    let v = it.next().ok_or(CliError::MissingValue("--nlcd"))?;
                    nlcd = Some(PathBuf::from(v));
                }
                "--cdl" => {
                    let v = it.next().ok_or(CliError::MissingValue("--cdl"))?;
                    cdl = Some(PathBuf::from(v));
                }
                "--runoff" => {
                    let v = it.next().ok_or(CliError::MissingValue("--runoff"))?;
                    runoff = Some(PathBuf::from(v));
                }
                "--color" => {
                    let v = it.next().ok_or(CliError::MissingValue("--color"))?;
                    color = ColorMode::parse(v)?;
                }
                "--cmap" => {
                    let v = it.next().ok_or(CliError::MissingValue("--cmap"))?;
                    cmap = Some(v.clone());
                }
                "--export" => export = true,
                "--scale_z" => {
                    let v = it.next().ok_or(CliError::MissingValue("--scale_z"))?;
                    scale_z = v.parse().map_err(|_| CliError::InvalidValue {
                        flag: "--scale_z",
                        value: v.clone(),
                        expected: "a float",
                    })?;
                }
                "--out-dir" => {
                    let v = it.next().ok_or(CliError::MissingValue("--out-dir"))?;
                    out_dir = PathBuf::from(v);
                }
                "--size" => {
                    let v = it.next().ok_or(CliError::MissingValue("--size"))?;
                    let parsed = v.split_once('x').and_then(|(w, h)| {
                        Some((w.parse::<u32>().ok()?, h.parse::<u32>().ok()?))
                    });
                    let (w, h) = parsed.ok_or_else(|| CliError::InvalidValue {
                        flag: "--size",
                        value: v.clone(),
                        expected: "WIDTHxHEIGHT, e.g. 1280x720",
                    })?;
                    width = w;
                    height = h;
                }
                other => return Err(CliError::UnknownFlag(other.to_string())),
            }
        }

        Ok(Self {
            dem: dem.ok_or(CliError::MissingDem)?,
            nlcd,
            cdl,
            runoff,
            color,
            cmap,
            export,
            scale_z,
            out_dir,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliConfig, CliError> {
        let owned: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        CliConfig::parse(&owned)
    }

    #[test]
    fn parse_defaults() {
        let cfg = parse(&["--dem", "dem.tif"]).unwrap();
        assert_eq!(cfg.dem, PathBuf::from("dem.tif"));
        assert_eq!(cfg.color, ColorMode::Interactive);
        assert_eq!(cfg.cmap, None);
        assert!(!cfg.export);
        assert_eq!(cfg.scale_z, 1.0);
        assert_eq!(cfg.out_dir, PathBuf::from("outputs"));
        assert_eq!((cfg.width, cfg.height), (1280, 720));
    }

    #[test]
    fn parse_full_invocation() {
        let cfg = parse(&[
            "--dem", "DEM_UTM.tif",
            "--nlcd", "nlcd2016.tif",
            "--cdl", "CDL_2020.tif",
            "--runoff", "runoff.tif",
            "--color", "nlcd",
            "--cmap", "viridis",
            "--export",
            "--scale_z", "2.5",
            "--out-dir", "out",
            "--size", "800x600",
        ])
        .unwrap();
        assert_eq!(cfg.color, ColorMode::Nlcd);
        assert_eq!(cfg.cmap.as_deref(), Some("viridis"));
        assert!(cfg.export);
        assert_eq!(cfg.scale_z, 2.5);
        assert_eq!(cfg.out_dir, PathBuf::from("out"));
        assert_eq!((cfg.width, cfg.height), (800, 600));
        assert!(cfg.nlcd.is_some() && cfg.cdl.is_some() && cfg.runoff.is_some());
    }

    #[test]
    fn reject_missing_dem() {
        assert_eq!(parse(&["--color", "elevation"]).unwrap_err(), CliError::MissingDem);
    }

    #[test]
    fn reject_unknown_color_mode() {
        let err = parse(&["--dem", "d.tif", "--color", "ndvi"]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ndvi"));
        assert!(msg.contains("elevation, nlcd, runoff, cdl, interactive"));
    }

    #[test]
    fn reject_unknown_flag_and_bad_values() {
        assert!(matches!(
            parse(&["--dem", "d.tif", "--wat"]).unwrap_err(),
            CliError::UnknownFlag(_)
        ));
        assert!(matches!(
            parse(&["--dem", "d.tif", "--scale_z", "tall"]).unwrap_err(),
            CliError::InvalidValue { flag: "--scale_z", .. }
        ));
        assert!(matches!(
            parse(&["--dem", "d.tif", "--size", "big"]).unwrap_err(),
            CliError::InvalidValue { flag: "--size", .. }
        ));
        assert_eq!(
            parse(&["--dem", "d.tif", "--color"]).unwrap_err(),
            CliError::MissingValue("--color")
        );
    }

    #[test]
    fn help_short_circuits() {
        assert_eq!(parse(&["--help"]).unwrap_err(), CliError::Help);
        assert_eq!(parse(&["-h", "--dem", "d.tif"]).unwrap_err(), CliError::Help);
    }
}

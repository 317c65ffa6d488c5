// src/geo/reproject.rs
// CRS reprojection using the PROJ library (feature-gated)
// RELEVANT FILES: src/geo/transform.rs, src/align/mod.rs

use thiserror::Error;

/// Error type for geographic operations
#[derive(Error, Debug)]
pub enum GeoError {
    #[error("Projection error: {0}")]
    Projection(String),

    #[error("PROJ feature not enabled")]
    ProjNotAvailable,
}

/// Get the EPSG code from a CRS string if it's in EPSG format.
pub fn parse_epsg_code(crs: &str) -> Option<u32> {
    let crs_upper = crs.to_uppercase();
    if crs_upper.starts_with("EPSG:") {
        crs_upper[5..].parse::<u32>().ok()
    } else {
        None
    }
}

/// Check if two CRS strings refer to the same coordinate system.
///
/// Identical strings and matching EPSG codes compare equal; anything more
/// would require an authority lookup, so other mismatches are treated as
/// distinct systems.
pub fn crs_equal(crs1: &str, crs2: &str) -> bool {
    if crs1 == crs2 {
        return true;
    }
    if let (Some(c1), Some(c2)) = (parse_epsg_code(crs1), parse_epsg_code(crs2)) {
        return c1 == c2;
    }
    false
}

/// Reusable point transformer between two CRS.
///
/// Construct once per raster pair; `transform` is then called per cell
/// during alignment, so the PROJ pipeline must not be rebuilt per point.
#[cfg(feature = "proj")]
pub struct CrsTransformer {
    inner: proj::Proj,
}

#[cfg(feature = "proj")]
impl CrsTransformer {
    /// Build a transform from `from_crs` into `to_crs`.
    /// Accepts EPSG codes (e.g., "EPSG:4326"), WKT, or PROJ strings.
    pub fn new(from_crs: &str, to_crs: &str) -> Result<Self, GeoError> {
        let inner = proj::Proj::new_known_crs(from_crs, to_crs, None)
            .map_err(|e| GeoError::Projection(format!("Failed to create transform: {}", e)))?;
        Ok(Self { inner })
    }

    pub fn transform(&self, x: f64, y: f64) -> Result<(f64, f64), GeoError> {
        self.inner
            .convert((x, y))
            .map_err(|e| GeoError::Projection(format!("Transform failed at ({}, {}): {}", x, y, e)))
    }
}

/// Stub for when the proj feature is disabled
#[cfg(not(feature = "proj"))]
pub struct CrsTransformer;

#[cfg(not(feature = "proj"))]
impl CrsTransformer {
    pub fn new(_from_crs: &str, _to_crs: &str) -> Result<Self, GeoError> {
        Err(GeoError::ProjNotAvailable)
    }

    pub fn transform(&self, _x: f64, _y: f64) -> Result<(f64, f64), GeoError> {
        Err(GeoError::ProjNotAvailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_epsg_code() {
        assert_eq!(parse_epsg_code("EPSG:4326"), Some(4326));
        assert_eq!(parse_epsg_code("epsg:32618"), Some(32618));
        assert_eq!(parse_epsg_code("WGS84"), None);
        assert_eq!(parse_epsg_code("EPSG:invalid"), None);
    }

    #[test]
    fn test_crs_equal() {
        assert!(crs_equal("EPSG:26918", "EPSG:26918"));
        assert!(crs_equal("EPSG:26918", "epsg:26918"));
        assert!(!crs_equal("EPSG:26918", "EPSG:4326"));
        // Different WKT strings never compare equal without an authority lookup
        assert!(!crs_equal("PROJCS[\"a\"]", "PROJCS[\"b\"]"));
    }

    #[cfg(feature = "proj")]
    #[test]
    fn test_reproject_wgs84_to_utm() {
        // Finger Lakes region, UTM zone 18N
        let t = CrsTransformer::new("EPSG:4326", "EPSG:32618").unwrap();
        let (x, y) = t.transform(-76.5, 42.4).unwrap();
        assert!(x > 300_000.0 && x < 500_000.0);
        assert!(y > 4_600_000.0 && y < 4_800_000.0);
    }
}

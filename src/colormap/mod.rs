//! Central colormap registry.
//! - Single source for supported gradient names
//! - Gradients interpolated from built-in color stops into 256x1 RGBA tables
//! - Categorical lookup tables built from raster palettes

/// Number of entries in every lookup table.
pub const LUT_SIZE: usize = 256;

/// Built-in gradient names (case-sensitive).
pub static SUPPORTED: [&str; 3] = ["earth", "viridis", "viridis_r"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientType {
    Earth,
    Viridis,
    ViridisR,
}

pub fn map_name_to_type(name: &str) -> Result<GradientType, String> {
    match name {
        "earth" => Ok(GradientType::Earth),
        "viridis" => Ok(GradientType::Viridis),
        "viridis_r" => Ok(GradientType::ViridisR),
        _ => Err(format!(
            "Unknown colormap '{}'. Supported: {}",
            name,
            SUPPORTED.join(", ")
        )),
    }
}

// Anchor colors, positions in [0,1]. The earth ramp follows the usual
// hypsometric convention: water-dark green lowlands through tan to white.
const EARTH_STOPS: &[(f32, [u8; 3])] = &[
    (0.00, [0, 48, 70]),
    (0.10, [0, 84, 71]),
    (0.25, [26, 122, 69]),
    (0.40, [110, 157, 85]),
    (0.55, [168, 166, 98]),
    (0.70, [196, 166, 113]),
    (0.85, [221, 201, 173]),
    (1.00, [253, 250, 250]),
];

const VIRIDIS_STOPS: &[(f32, [u8; 3])] = &[
    (0.000, [68, 1, 84]),
    (0.125, [72, 40, 120]),
    (0.250, [62, 74, 137]),
    (0.375, [49, 104, 142]),
    (0.500, [38, 130, 142]),
    (0.625, [31, 158, 137]),
    (0.750, [53, 183, 121]),
    (0.875, [109, 205, 89]),
    (1.000, [253, 231, 37]),
];

fn lerp_u8(a: u8, b: u8, t: f32) -> u8 {
    let a_f = a as f32;
    let b_f = b as f32;
    (a_f + (b_f - a_f) * t.clamp(0.0, 1.0))
        .round()
        .clamp(0.0, 255.0) as u8
}

fn color_at(stops: &[(f32, [u8; 3])], t: f32) -> [u8; 3] {
    if t <= stops[0].0 {
        return stops[0].1;
    }
    if t >= stops[stops.len() - 1].0 {
        return stops[stops.len() - 1].1;
    }
    for w in stops.windows(2) {
        let (t0, c0) = w[0];
        let (t1, c1) = w[1];
        if t >= t0 && t <= t1 {
            let f = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
            return [
                lerp_u8(c0[0], c1[0], f),
                lerp_u8(c0[1], c1[1], f),
                lerp_u8(c0[2], c1[2], f),
            ];
        }
    }
    stops[stops.len() - 1].1
}

/// Interpolate a gradient into LUT_SIZE x 1 RGBA8 bytes.
pub fn gradient_rgba8(which: GradientType) -> Vec<u8> {
    let (stops, reversed) = match which {
        GradientType::Earth => (EARTH_STOPS, false),
        GradientType::Viridis => (VIRIDIS_STOPS, false),
        GradientType::ViridisR => (VIRIDIS_STOPS, true),
    };
    let mut data = Vec::with_capacity(LUT_SIZE * 4);
    for i in 0..LUT_SIZE {
        let mut t = i as f32 / (LUT_SIZE - 1) as f32;
        if reversed {
            t = 1.0 - t;
        }
        let c = color_at(stops, t);
        data.extend_from_slice(&[c[0], c[1], c[2], 255]);
    }
    data
}

/// Fixed-size RGBA lookup table for categorical rasters, indexed by code.
/// Entries start transparent; codes absent from the source palette stay so.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalLut {
    entries: Vec<[u8; 4]>,
}

// Fallback cycle for classified rasters without an embedded palette,
// in the spirit of the usual qualitative map sets.
const QUALITATIVE_CYCLE: &[[u8; 3]] = &[
    [31, 119, 180],
    [255, 127, 14],
    [44, 160, 44],
    [214, 39, 40],
    [148, 103, 189],
    [140, 86, 75],
    [227, 119, 194],
    [127, 127, 127],
    [188, 189, 34],
    [23, 190, 207],
];

impl CategoricalLut {
    pub fn new() -> Self {
        Self {
            entries: vec![[0, 0, 0, 0]; LUT_SIZE],
        }
    }

    /// Every code colored by cycling a qualitative set, for rasters that
    /// carry no palette of their own.
    pub fn qualitative() -> Self {
        let mut lut = Self::new();
        for code in 0..LUT_SIZE {
            let c = QUALITATIVE_CYCLE[code % QUALITATIVE_CYCLE.len()];
            lut.set(code, [c[0], c[1], c[2], 255]);
        }
        lut
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no code has been assigned a color.
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| *e == [0, 0, 0, 0])
    }

    pub fn set(&mut self, code: usize, rgba: [u8; 4]) {
        if code < LUT_SIZE {
            self.entries[code] = rgba;
        }
    }

    pub fn get(&self, code: usize) -> Option<[u8; 4]> {
        self.entries.get(code).copied()
    }

    /// Flatten to LUT_SIZE x 1 RGBA8 bytes for the GPU texture.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(LUT_SIZE * 4);
        for e in &self.entries {
            data.extend_from_slice(e);
        }
        data
    }
}

impl Default for CategoricalLut {
    fn default() -> Self {
        Self::new()
    }
}

/// A layer's color mapping: a continuous gradient over a value range, or a
/// categorical table sampled at the raw code.
#[derive(Debug, Clone)]
pub enum Colormap {
    Continuous(GradientType),
    Categorical(CategoricalLut),
}

impl Colormap {
    pub fn is_categorical(&self) -> bool {
        matches!(self, Colormap::Categorical(_))
    }

    pub fn to_rgba8(&self) -> Vec<u8> {
        match self {
            Colormap::Continuous(g) => gradient_rgba8(*g),
            Colormap::Categorical(lut) => lut.to_rgba8(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_gradient_lists_supported() {
        let err = map_name_to_type("plasma").unwrap_err();
        assert!(err.contains("plasma"));
        assert!(err.contains("earth, viridis, viridis_r"));
    }

    #[test]
    fn gradient_has_256_rgba_entries() {
        for which in [GradientType::Earth, GradientType::Viridis, GradientType::ViridisR] {
            let bytes = gradient_rgba8(which);
            assert_eq!(bytes.len(), LUT_SIZE * 4);
        }
    }

    #[test]
    fn viridis_endpoints() {
        let bytes = gradient_rgba8(GradientType::Viridis);
        assert_eq!(&bytes[0..4], &[68, 1, 84, 255]);
        let last = &bytes[(LUT_SIZE - 1) * 4..];
        assert_eq!(last, &[253, 231, 37, 255]);
    }

    #[test]
    fn viridis_r_is_reversed() {
        let fwd = gradient_rgba8(GradientType::Viridis);
        let rev = gradient_rgba8(GradientType::ViridisR);
        assert_eq!(&rev[0..4], &fwd[(LUT_SIZE - 1) * 4..]);
    }

    #[test]
    fn categorical_lut_starts_transparent() {
        let lut = CategoricalLut::new();
        assert_eq!(lut.len(), 256);
        assert!(lut.is_empty());
        assert_eq!(lut.get(42), Some([0, 0, 0, 0]));
    }

    #[test]
    fn qualitative_covers_every_code() {
        let lut = CategoricalLut::qualitative();
        assert!(!lut.is_empty());
        assert_eq!(lut.get(0).unwrap()[3], 255);
        assert_eq!(lut.get(255).unwrap()[3], 255);
    }

    #[test]
    fn categorical_set_leaves_others_transparent() {
        let mut lut = CategoricalLut::new();
        lut.set(11, [70, 107, 159, 255]);
        lut.set(81, [220, 217, 57, 255]);
        // out-of-range codes are ignored
        lut.set(300, [1, 2, 3, 4]);

        assert_eq!(lut.get(11), Some([70, 107, 159, 255]));
        assert_eq!(lut.get(81), Some([220, 217, 57, 255]));
        assert_eq!(lut.get(12), Some([0, 0, 0, 0]));
        assert!(!lut.is_empty());

        let bytes = lut.to_rgba8();
        assert_eq!(bytes.len(), 1024);
        assert_eq!(&bytes[11 * 4..11 * 4 + 4], &[70, 107, 159, 255]);
        assert_eq!(&bytes[12 * 4..12 * 4 + 4], &[0, 0, 0, 0]);
    }
}

// src/viewer/ui.rs
// HUD widget layout and hit testing: layer toggle buttons down the left
// edge, the exaggeration slider along the top, a scalar bar underneath
// the buttons. Everything renders as rect instances; labels use a 3x5
// block font.

use crate::colormap::LUT_SIZE;
use crate::render::RectInstance;
use crate::scene::{LayerKind, Scene};
use crate::terrain::{MAX_EXAGGERATION, MIN_EXAGGERATION};

pub const BUTTON_SIZE: f32 = 30.0;
const BUTTON_X: f32 = 10.0;
const BUTTON_Y0: f32 = 90.0;
const BUTTON_SPACING: f32 = 40.0;
const BORDER: f32 = 3.0;

const SLIDER_X0: f32 = 10.0;
const SLIDER_X1: f32 = 170.0;
const SLIDER_Y: f32 = 40.0;
const SLIDER_HALF_HEIGHT: f32 = 10.0;

const BAR_WIDTH: f32 = 18.0;
const BAR_SEGMENTS: usize = 64;

const COLOR_ON: [f32; 4] = [0.05, 0.05, 0.05, 1.0];
const COLOR_OFF: [f32; 4] = [0.55, 0.55, 0.55, 1.0];
const COLOR_BORDER: [f32; 4] = [0.95, 0.95, 0.95, 1.0];
const COLOR_TEXT: [f32; 4] = [0.05, 0.05, 0.05, 0.9];
const COLOR_TRACK: [f32; 4] = [0.25, 0.25, 0.25, 0.9];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }
}

/// Static widget layout for a given set of layers.
pub struct UiLayout {
    buttons: Vec<(LayerKind, Rect)>,
    slider_track: Rect,
}

impl UiLayout {
    pub fn new(layer_kinds: &[LayerKind]) -> Self {
        let buttons = layer_kinds
            .iter()
            .enumerate()
            .map(|(i, &kind)| {
                let y0 = BUTTON_Y0 + i as f32 * BUTTON_SPACING;
                (
                    kind,
                    Rect {
                        x0: BUTTON_X,
                        y0,
                        x1: BUTTON_X + BUTTON_SIZE,
                        y1: y0 + BUTTON_SIZE,
                    },
                )
            })
            .collect();

        Self {
            buttons,
            slider_track: Rect {
                x0: SLIDER_X0,
                y0: SLIDER_Y - SLIDER_HALF_HEIGHT,
                x1: SLIDER_X1,
                y1: SLIDER_Y + SLIDER_HALF_HEIGHT,
            },
        }
    }

    pub fn hit_button(&self, x: f32, y: f32) -> Option<LayerKind> {
        self.buttons
            .iter()
            .find(|(_, r)| r.contains(x, y))
            .map(|(k, _)| *k)
    }

    pub fn hit_slider(&self, x: f32, y: f32) -> bool {
        self.slider_track.contains(x, y)
    }

    /// Map a cursor x to an exaggeration value on the slider range.
    pub fn slider_value_at(&self, x: f32) -> f32 {
        let t = ((x - self.slider_track.x0) / (self.slider_track.x1 - self.slider_track.x0))
            .clamp(0.0, 1.0);
        MIN_EXAGGERATION + t * (MAX_EXAGGERATION - MIN_EXAGGERATION)
    }

    fn slider_handle_x(&self, value: f32) -> f32 {
        let t = ((value - MIN_EXAGGERATION) / (MAX_EXAGGERATION - MIN_EXAGGERATION))
            .clamp(0.0, 1.0);
        self.slider_track.x0 + t * (self.slider_track.x1 - self.slider_track.x0)
    }

    fn scalar_bar_top(&self) -> f32 {
        BUTTON_Y0 + self.buttons.len() as f32 * BUTTON_SPACING + 30.0
    }

    /// Rebuild the HUD instance list for the current scene state.
    pub fn build_instances(&self, scene: &Scene, exaggeration: f32) -> Vec<RectInstance> {
        let mut inst = Vec::new();

        // toggle buttons: border, then fill (black = active, grey = off)
        for (kind, rect) in &self.buttons {
            push_rect(
                &mut inst,
                rect.x0 - BORDER,
                rect.y0 - BORDER,
                rect.x1 + BORDER,
                rect.y1 + BORDER,
                COLOR_BORDER,
            );
            let fill = if scene.is_active(*kind) {
                COLOR_ON
            } else {
                COLOR_OFF
            };
            push_rect(&mut inst, rect.x0, rect.y0, rect.x1, rect.y1, fill);
            push_text_3x5(
                &mut inst,
                rect.x1 + 14.0,
                rect.y0 + 8.0,
                2.0,
                kind.label(),
                COLOR_TEXT,
            );
        }

        // exaggeration slider: track, handle, label, value
        let track = &self.slider_track;
        push_rect(
            &mut inst,
            track.x0,
            SLIDER_Y - 2.0,
            track.x1,
            SLIDER_Y + 2.0,
            COLOR_TRACK,
        );
        let hx = self.slider_handle_x(exaggeration);
        push_rect(
            &mut inst,
            hx - 4.0,
            SLIDER_Y - SLIDER_HALF_HEIGHT,
            hx + 4.0,
            SLIDER_Y + SLIDER_HALF_HEIGHT,
            COLOR_ON,
        );
        let after = push_text_3x5(&mut inst, SLIDER_X0, 12.0, 2.0, "Z SCALE", COLOR_TEXT);
        push_text_3x5(
            &mut inst,
            after + 10.0,
            12.0,
            2.0,
            &format!("{:.1}", exaggeration),
            COLOR_TEXT,
        );

        // scalar bar for the active layer
        let layer = scene.active_layer();
        let lut = layer.colormap.to_rgba8();
        let top = self.scalar_bar_top();
        let seg_h = 3.0;
        push_text_3x5(&mut inst, BUTTON_X, top - 16.0, 2.0, layer.kind.title(), COLOR_TEXT);
        for i in 0..BAR_SEGMENTS {
            // high values at the top of the bar
            let t = 1.0 - (i as f32 + 0.5) / BAR_SEGMENTS as f32;
            let idx = ((t * (LUT_SIZE - 1) as f32) as usize).min(LUT_SIZE - 1) * 4;
            let color = [
                lut[idx] as f32 / 255.0,
                lut[idx + 1] as f32 / 255.0,
                lut[idx + 2] as f32 / 255.0,
                lut[idx + 3] as f32 / 255.0,
            ];
            let y0 = top + i as f32 * seg_h;
            push_rect(&mut inst, BUTTON_X, y0, BUTTON_X + BAR_WIDTH, y0 + seg_h, color);
        }
        if !layer.colormap.is_categorical() {
            let (lo, hi) = layer.range;
            push_text_3x5(
                &mut inst,
                BUTTON_X + BAR_WIDTH + 8.0,
                top,
                2.0,
                &format!("{:.0}", hi),
                COLOR_TEXT,
            );
            push_text_3x5(
                &mut inst,
                BUTTON_X + BAR_WIDTH + 8.0,
                top + BAR_SEGMENTS as f32 * seg_h - 10.0,
                2.0,
                &format!("{:.0}", lo),
                COLOR_TEXT,
            );
        }

        inst
    }
}

/// Push a solid colored rectangle to the HUD instance buffer
pub fn push_rect(
    inst: &mut Vec<RectInstance>,
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
    color: [f32; 4],
) {
    inst.push(RectInstance {
        rect_min: [x0, y0],
        rect_max: [x1, y1],
        color,
    });
}

/// 3x5 block glyphs covering the HUD's label alphabet and digits.
fn glyph_3x5(ch: char) -> Option<[&'static str; 5]> {
    match ch.to_ascii_uppercase() {
        'A' => Some([" X ", "X X", "XXX", "X X", "X X"]),
        'C' => Some([" XX", "X  ", "X  ", "X  ", " XX"]),
        'D' => Some(["XX ", "X X", "X X", "X X", "XX "]),
        'E' => Some(["XXX", "X  ", "XX ", "X  ", "XXX"]),
        'F' => Some(["XXX", "X  ", "XX ", "X  ", "X  "]),
        'I' => Some(["XXX", " X ", " X ", " X ", "XXX"]),
        'L' => Some(["X  ", "X  ", "X  ", "X  ", "XXX"]),
        'M' => Some(["X X", "XXX", "X X", "X X", "X X"]),
        'N' => Some(["X X", "XX ", "X X", "X X", "X X"]),
        'O' => Some(["XXX", "X X", "X X", "X X", "XXX"]),
        'R' => Some(["XX ", "X X", "XX ", "X X", "X X"]),
        'S' => Some([" XX", "X  ", " X ", "  X", "XX "]),
        'T' => Some(["XXX", " X ", " X ", " X ", " X "]),
        'U' => Some(["X X", "X X", "X X", "X X", "XXX"]),
        'V' => Some(["X X", "X X", "X X", "X X", " X "]),
        'Z' => Some(["XXX", "  X", " X ", "X  ", "XXX"]),
        '0' => Some(["XXX", "X X", "X X", "X X", "XXX"]),
        '1' => Some([" X ", "XX ", " X ", " X ", "XXX"]),
        '2' => Some(["XXX", "  X", "XXX", "X  ", "XXX"]),
        '3' => Some(["XXX", "  X", "XXX", "  X", "XXX"]),
        '4' => Some(["X X", "X X", "XXX", "  X", "  X"]),
        '5' => Some(["XXX", "X  ", "XXX", "  X", "XXX"]),
        '6' => Some(["XXX", "X  ", "XXX", "X X", "XXX"]),
        '7' => Some(["XXX", "  X", "  X", "  X", "  X"]),
        '8' => Some(["XXX", "X X", "XXX", "X X", "XXX"]),
        '9' => Some(["XXX", "X X", "XXX", "  X", "XXX"]),
        '.' => Some(["   ", "   ", "   ", "   ", " X "]),
        _ => None,
    }
}

/// Push a single 3x5 block character; returns the advance width.
pub fn push_char_3x5(
    inst: &mut Vec<RectInstance>,
    x: f32,
    y: f32,
    scale: f32,
    ch: char,
    color: [f32; 4],
) -> f32 {
    let cell = 2.0 * scale;
    let spacing = 1.0 * scale;
    if let Some(rows) = glyph_3x5(ch) {
        for (r, row) in rows.iter().enumerate() {
            for (c, bit) in row.chars().enumerate() {
                if bit == 'X' {
                    let x0 = x + c as f32 * cell;
                    let y0 = y + r as f32 * cell;
                    push_rect(inst, x0, y0, x0 + cell, y0 + cell, color);
                }
            }
        }
    }
    3.0 * cell + spacing
}

/// Push a string of 3x5 block characters; returns the end x.
pub fn push_text_3x5(
    inst: &mut Vec<RectInstance>,
    mut x: f32,
    y: f32,
    scale: f32,
    text: &str,
    color: [f32; 4],
) -> f32 {
    for ch in text.chars() {
        if ch == ' ' {
            x += 2.0 * scale;
            continue;
        }
        x += push_char_3x5(inst, x, y, scale, ch, color);
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> UiLayout {
        UiLayout::new(&[LayerKind::Nlcd, LayerKind::Runoff, LayerKind::Elevation])
    }

    #[test]
    fn buttons_hit_in_order() {
        let ui = layout();
        assert_eq!(ui.hit_button(20.0, 100.0), Some(LayerKind::Nlcd));
        assert_eq!(ui.hit_button(20.0, 140.0), Some(LayerKind::Runoff));
        assert_eq!(ui.hit_button(20.0, 180.0), Some(LayerKind::Elevation));
        assert_eq!(ui.hit_button(300.0, 100.0), None);
    }

    #[test]
    fn slider_maps_track_to_range() {
        let ui = layout();
        assert!((ui.slider_value_at(SLIDER_X0) - MIN_EXAGGERATION).abs() < 1e-5);
        assert!((ui.slider_value_at(SLIDER_X1) - MAX_EXAGGERATION).abs() < 1e-5);
        let mid = ui.slider_value_at((SLIDER_X0 + SLIDER_X1) / 2.0);
        assert!((mid - (MIN_EXAGGERATION + MAX_EXAGGERATION) / 2.0).abs() < 1e-4);
        // cursor past either end pins to the bounds
        assert_eq!(ui.slider_value_at(-100.0), MIN_EXAGGERATION);
        assert_eq!(ui.slider_value_at(10_000.0), MAX_EXAGGERATION);
    }

    #[test]
    fn text_advances_per_character() {
        let mut inst = Vec::new();
        let end = push_text_3x5(&mut inst, 0.0, 0.0, 2.0, "NLCD", [0.0; 4]);
        assert!(end > 0.0);
        assert!(!inst.is_empty());
    }

    #[test]
    fn unknown_glyphs_advance_without_rects() {
        let mut inst = Vec::new();
        push_char_3x5(&mut inst, 0.0, 0.0, 2.0, '?', [0.0; 4]);
        assert!(inst.is_empty());
    }
}

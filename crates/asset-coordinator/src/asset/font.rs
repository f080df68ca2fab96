use std::collections::HashMap;

use glam::Vec2;

/// One drawing command of a glyph outline, in font units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutlineCommand {
    MoveTo(Vec2),
    LineTo(Vec2),
    QuadraticTo { control: Vec2, to: Vec2 },
    CubicTo { control1: Vec2, control2: Vec2, to: Vec2 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlyphAsset {
    /// Horizontal advance.
    pub advance: f32,
    pub x_min: Option<f32>,
    pub x_max: Option<f32>,
    pub outline: Vec<OutlineCommand>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FontBoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

/// A vector font in typeface JSON form.
#[derive(Debug, Clone)]
pub struct FontAsset {
    pub family_name: Option<String>,
    /// Font units per em.
    pub resolution: f32,
    pub ascender: f32,
    pub descender: f32,
    pub underline_position: f32,
    pub underline_thickness: f32,
    pub bounding_box: FontBoundingBox,
    pub glyphs: HashMap<char, GlyphAsset>,
}

impl FontAsset {
    /// Glyph used to draw `character`, falling back to `?` when the font
    /// lacks it.
    pub fn glyph(&self, character: char) -> Option<&GlyphAsset> {
        self.glyphs
            .get(&character)
            .or_else(|| self.glyphs.get(&'?'))
    }

    /// Factor turning font units into units of a font of size `size`.
    pub fn scale(&self, size: f32) -> f32 {
        if self.resolution <= 0.0 {
            return 0.0;
        }
        size / self.resolution
    }

    pub fn line_height(&self, size: f32) -> f32 {
        let bounds = self.bounding_box;
        (bounds.y_max - bounds.y_min + self.underline_thickness) * self.scale(size)
    }

    /// Width of the widest line of `text` laid out at `size`.
    pub fn text_width(&self, text: &str, size: f32) -> f32 {
        let scale = self.scale(size);
        text.lines()
            .map(|line| {
                line.chars()
                    .filter_map(|character| self.glyph(character))
                    .map(|glyph| glyph.advance * scale)
                    .sum::<f32>()
            })
            .fold(0.0, f32::max)
    }
}

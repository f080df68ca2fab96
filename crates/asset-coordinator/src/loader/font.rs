use std::{
    collections::HashMap,
    error::Error,
    fmt::{self, Display, Formatter},
    sync::Arc,
};

use glam::Vec2;
use log::warn;
use serde::Deserialize;

use crate::{
    asset::font::{FontAsset, FontBoundingBox, GlyphAsset, OutlineCommand},
    error::LoadErrorKind,
    source::{fetch_source, Fetch, FetchError, SourceUri},
};

use super::Loader;

#[derive(Debug)]
pub enum FontLoadError {
    Fetch(FetchError),
    Json(serde_json::Error),
    BadOutline { glyph: char, token: String },
}

impl FontLoadError {
    pub fn kind(&self) -> LoadErrorKind {
        match self {
            FontLoadError::Fetch(error) => error.kind(),
            FontLoadError::Json(_) | FontLoadError::BadOutline { .. } => {
                LoadErrorKind::DecodeFailure
            }
        }
    }
}

impl Display for FontLoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FontLoadError::Fetch(error) => Display::fmt(&error, f),
            FontLoadError::Json(error) => write!(f, "Bad typeface JSON: {}", error),
            FontLoadError::BadOutline { glyph, token } => {
                write!(f, "Bad outline of glyph {:?} near {:?}", glyph, token)
            }
        }
    }
}

impl Error for FontLoadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FontLoadError::Fetch(error) => Some(error),
            FontLoadError::Json(error) => Some(error),
            FontLoadError::BadOutline { .. } => None,
        }
    }
}

impl From<FetchError> for FontLoadError {
    fn from(value: FetchError) -> Self {
        FontLoadError::Fetch(value)
    }
}

impl From<serde_json::Error> for FontLoadError {
    fn from(value: serde_json::Error) -> Self {
        FontLoadError::Json(value)
    }
}

#[derive(Debug, Deserialize)]
struct TypefaceGlyph {
    ha: f32,
    x_min: Option<f32>,
    x_max: Option<f32>,
    #[serde(default)]
    o: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TypefaceBoundingBox {
    x_min: f32,
    y_min: f32,
    x_max: f32,
    y_max: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Typeface {
    glyphs: HashMap<String, TypefaceGlyph>,
    family_name: Option<String>,
    #[serde(default)]
    ascender: f32,
    #[serde(default)]
    descender: f32,
    #[serde(default)]
    underline_position: f32,
    #[serde(default)]
    underline_thickness: f32,
    #[serde(default)]
    bounding_box: TypefaceBoundingBox,
    resolution: f32,
}

/// Parses the outline string of a typeface glyph.
///
/// Commands are `m x y`, `l x y`, `q x y cx cy` and `b x y c1x c1y c2x c2y`,
/// the end point always coming first.
fn parse_outline(glyph: char, outline: &str) -> Result<Vec<OutlineCommand>, FontLoadError> {
    let mut tokens = outline.split_whitespace();
    let mut commands = Vec::new();

    let point = |tokens: &mut std::str::SplitWhitespace<'_>| -> Result<Vec2, FontLoadError> {
        let mut coordinate = || {
            let token = tokens.next().unwrap_or_default();
            token.parse::<f32>().map_err(|_| FontLoadError::BadOutline {
                glyph,
                token: token.to_string(),
            })
        };
        Ok(Vec2::new(coordinate()?, coordinate()?))
    };

    while let Some(command) = tokens.next() {
        let command = match command {
            "m" => OutlineCommand::MoveTo(point(&mut tokens)?),
            "l" => OutlineCommand::LineTo(point(&mut tokens)?),
            "q" => {
                let to = point(&mut tokens)?;
                let control = point(&mut tokens)?;
                OutlineCommand::QuadraticTo { control, to }
            }
            "b" => {
                let to = point(&mut tokens)?;
                let control1 = point(&mut tokens)?;
                let control2 = point(&mut tokens)?;
                OutlineCommand::CubicTo {
                    control1,
                    control2,
                    to,
                }
            }
            "z" => continue,
            other => {
                return Err(FontLoadError::BadOutline {
                    glyph,
                    token: other.to_string(),
                })
            }
        };
        commands.push(command);
    }
    Ok(commands)
}

pub(crate) fn parse_typeface(buffer: &[u8]) -> Result<FontAsset, FontLoadError> {
    let typeface: Typeface = serde_json::from_slice(buffer)?;

    let mut glyphs = HashMap::with_capacity(typeface.glyphs.len());
    for (key, glyph) in typeface.glyphs {
        let mut chars = key.chars();
        let (Some(character), None) = (chars.next(), chars.next()) else {
            warn!("Skipping glyph with key {:?}", key);
            continue;
        };
        let outline = match &glyph.o {
            Some(outline) => parse_outline(character, outline)?,
            None => Vec::new(),
        };
        glyphs.insert(
            character,
            GlyphAsset {
                advance: glyph.ha,
                x_min: glyph.x_min,
                x_max: glyph.x_max,
                outline,
            },
        );
    }

    let bounds = typeface.bounding_box;
    Ok(FontAsset {
        family_name: typeface.family_name,
        resolution: typeface.resolution,
        ascender: typeface.ascender,
        descender: typeface.descender,
        underline_position: typeface.underline_position,
        underline_thickness: typeface.underline_thickness,
        bounding_box: FontBoundingBox {
            x_min: bounds.x_min,
            y_min: bounds.y_min,
            x_max: bounds.x_max,
            y_max: bounds.y_max,
        },
        glyphs,
    })
}

/// Loads fonts in typeface JSON form, as converted by facetype.js.
pub struct FontLoader<F> {
    fetcher: Arc<F>,
}

impl<F> FontLoader<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self { fetcher }
    }
}

impl<F: Fetch> Loader for FontLoader<F> {
    type Asset = FontAsset;
    type Error = FontLoadError;

    async fn load(&self, source: &SourceUri) -> Result<FontAsset, FontLoadError> {
        let buffer = fetch_source(self.fetcher.as_ref(), source).await?;
        parse_typeface(&buffer)
    }
}

#[cfg(test)]
pub(crate) mod test {
    use glam::Vec2;

    use crate::{asset::font::OutlineCommand, error::LoadErrorKind};

    use super::{parse_outline, parse_typeface};

    pub const TYPEFACE: &str = r#"{
        "glyphs": {
            "A": { "ha": 700, "x_min": 10, "x_max": 690, "o": "m 0 0 l 350 1000 l 700 0 z" },
            "?": { "ha": 500, "x_min": 0, "x_max": 500, "o": "m 0 0 q 100 100 50 200 b 10 10 1 2 3 4" },
            " ": { "ha": 300 },
            "ligature": { "ha": 900 }
        },
        "familyName": "Mono Test",
        "ascender": 800,
        "descender": -200,
        "underlinePosition": -100,
        "underlineThickness": 50,
        "boundingBox": { "xMin": 0, "yMin": -200, "xMax": 700, "yMax": 1000 },
        "resolution": 1000,
        "original_font_information": { "format": 0 }
    }"#;

    #[test]
    fn parses_typeface() {
        let font = parse_typeface(TYPEFACE.as_bytes()).unwrap();
        assert_eq!(font.family_name.as_deref(), Some("Mono Test"));
        assert_eq!(font.glyphs.len(), 3);
        assert_eq!(font.glyph('A').unwrap().outline.len(), 3);
        assert!(font.glyph(' ').unwrap().outline.is_empty());
        // Missing glyphs fall back to '?'.
        assert_eq!(font.glyph('Z').unwrap().advance, 500.0);
        assert_eq!(font.scale(10.0), 0.01);
        assert!((font.text_width("A A\nA", 10.0) - 17.0).abs() < 1e-4);
        assert!((font.line_height(10.0) - 12.5).abs() < 1e-4);
    }

    #[test]
    fn curves_put_end_point_first() {
        let outline = parse_outline('?', "q 100 100 50 200 b 10 10 1 2 3 4").unwrap();
        assert_eq!(
            outline,
            vec![
                OutlineCommand::QuadraticTo {
                    control: Vec2::new(50.0, 200.0),
                    to: Vec2::new(100.0, 100.0),
                },
                OutlineCommand::CubicTo {
                    control1: Vec2::new(1.0, 2.0),
                    control2: Vec2::new(3.0, 4.0),
                    to: Vec2::new(10.0, 10.0),
                },
            ]
        );
    }

    #[test]
    fn rejects_broken_outlines() {
        assert!(parse_outline('x', "m 0").is_err());
        assert!(parse_outline('x', "k 1 2").is_err());
        let error = parse_typeface(b"{\"glyphs\": 3}").unwrap_err();
        assert_eq!(error.kind(), LoadErrorKind::DecodeFailure);
    }
}

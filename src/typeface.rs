//! Reader for `typeface.json` fonts.
//!
//! Each glyph carries an advance width and an outline string made of
//! whitespace separated commands: `m x y`, `l x y`, `q x y cx cy`,
//! `b x y c1x c1y c2x c2y` and `z`. Curve commands list the end point before
//! the control points.

use std::collections::HashMap;

use glam::Vec2;
use serde::Deserialize;
use thiserror::Error;

/// Straight segments used to approximate each curve.
pub const DEFAULT_CURVE_SEGMENTS: usize = 12;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("failed to read font: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid typeface JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to fetch font: {0}")]
    Fetch(String),
    #[error("glyph {0:?} is not part of the font")]
    MissingGlyph(char),
    #[error("glyph {glyph:?}: {message}")]
    Outline { glyph: char, message: String },
    #[error("font load was abandoned after {0:.1}s")]
    TimedOut(f64),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Typeface {
    glyphs: HashMap<String, GlyphData>,
    #[serde(rename = "familyName", default)]
    family_name: String,
    #[serde(default = "default_resolution")]
    resolution: f32,
}

#[derive(Debug, Clone, Deserialize)]
struct GlyphData {
    #[serde(default)]
    ha: f32,
    #[serde(default)]
    o: Option<String>,
}

fn default_resolution() -> f32 {
    1000.0
}

/// Closed polygon in glyph space. The closing edge is implicit.
pub type Contour = Vec<Vec2>;

/// Flattened outline of a single glyph scaled to the requested size.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GlyphOutline {
    pub contours: Vec<Contour>,
    pub advance: f32,
}

impl Typeface {
    pub fn from_json(json: &str) -> Result<Self, FontError> {
        let typeface: Self = serde_json::from_str(json)?;
        Ok(typeface)
    }

    pub fn family_name(&self) -> &str {
        &self.family_name
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    pub fn has_glyph(&self, glyph: char) -> bool {
        self.glyph(glyph).is_some()
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Flattens `glyph` into polygons, scaled so that one em is `size` units.
    pub fn outline(
        &self,
        glyph: char,
        size: f32,
        curve_segments: usize,
    ) -> Result<GlyphOutline, FontError> {
        let data = self.glyph(glyph).ok_or(FontError::MissingGlyph(glyph))?;
        let scale = Scale {
            size,
            resolution: self.resolution,
        };
        let contours = match data.o.as_deref() {
            Some(commands) => parse_outline(commands, scale, curve_segments.max(1))
                .map_err(|message| FontError::Outline { glyph, message })?,
            None => Vec::new(),
        };
        Ok(GlyphOutline {
            contours,
            advance: scale.apply(data.ha),
        })
    }

    fn glyph(&self, glyph: char) -> Option<&GlyphData> {
        let mut buffer = [0; 4];
        let key: &str = glyph.encode_utf8(&mut buffer);
        self.glyphs.get(key)
    }
}

/// Font units to output units.
#[derive(Debug, Clone, Copy)]
struct Scale {
    size: f32,
    resolution: f32,
}

impl Scale {
    fn apply(self, units: f32) -> f32 {
        units * self.size / self.resolution
    }
}

fn parse_outline(
    commands: &str,
    scale: Scale,
    segments: usize,
) -> Result<Vec<Contour>, String> {
    let mut tokens = commands.split_whitespace();
    let mut contours = Vec::new();
    let mut current: Contour = Vec::new();

    while let Some(command) = tokens.next() {
        match command {
            "m" => {
                finish_contour(&mut current, &mut contours);
                current.push(read_point(&mut tokens, scale)?);
            }
            "l" => {
                let point = read_point(&mut tokens, scale)?;
                push_point(&mut current, point);
            }
            "q" => {
                let end = read_point(&mut tokens, scale)?;
                let control = read_point(&mut tokens, scale)?;
                let start = *current.last().ok_or("curve without a start point")?;
                for step in 1..=segments {
                    let t = step as f32 / segments as f32;
                    push_point(&mut current, quadratic(start, control, end, t));
                }
            }
            "b" => {
                let end = read_point(&mut tokens, scale)?;
                let c1 = read_point(&mut tokens, scale)?;
                let c2 = read_point(&mut tokens, scale)?;
                let start = *current.last().ok_or("curve without a start point")?;
                for step in 1..=segments {
                    let t = step as f32 / segments as f32;
                    push_point(&mut current, cubic(start, c1, c2, end, t));
                }
            }
            "z" => finish_contour(&mut current, &mut contours),
            other => return Err(format!("unknown outline command {other:?}")),
        }
    }
    finish_contour(&mut current, &mut contours);
    Ok(contours)
}

fn read_point<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    scale: Scale,
) -> Result<Vec2, String> {
    let mut coordinate = || -> Result<f32, String> {
        let token = tokens.next().ok_or("outline ended mid-command")?;
        token
            .parse::<f32>()
            .map_err(|err| format!("bad coordinate {token:?}: {err}"))
    };
    let x = coordinate()?;
    let y = coordinate()?;
    Ok(Vec2::new(scale.apply(x), scale.apply(y)))
}

fn push_point(contour: &mut Contour, point: Vec2) {
    if contour.last() != Some(&point) {
        contour.push(point);
    }
}

fn finish_contour(current: &mut Contour, contours: &mut Vec<Contour>) {
    let mut contour = std::mem::take(current);
    if contour.len() > 1 && contour.first() == contour.last() {
        contour.pop();
    }
    if contour.len() >= 3 {
        contours.push(contour);
    }
}

fn quadratic(p0: Vec2, p1: Vec2, p2: Vec2, t: f32) -> Vec2 {
    let k = 1.0 - t;
    k * k * p0 + 2.0 * k * t * p1 + t * t * p2
}

fn cubic(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let k = 1.0 - t;
    k * k * k * p0 + 3.0 * k * k * t * p1 + 3.0 * k * t * t * p2 + t * t * t * p3
}

/// Signed area; positive for counter-clockwise contours.
pub fn signed_area(contour: &[Vec2]) -> f32 {
    let n = contour.len();
    (0..n)
        .map(|i| contour[i].perp_dot(contour[(i + 1) % n]))
        .sum::<f32>()
        * 0.5
}

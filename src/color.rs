use glam::Vec3;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColorError {
    #[error("unknown color name: {0}")]
    UnknownName(String),
    #[error("invalid hex color: {0}")]
    InvalidHex(String),
}

/// Parses a CSS style color (`#rrggbb`, `#rgb` or one of the named colors the
/// scene uses) into sRGB components in `[0, 1]`.
pub fn parse_css_color(value: &str) -> Result<Vec3, ColorError> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(|| ColorError::InvalidHex(value.to_string()));
    }
    let rgb = match value.to_ascii_lowercase().as_str() {
        "white" => 0xffffff,
        "black" => 0x000000,
        "red" => 0xff0000,
        "green" => 0x008000,
        "blue" => 0x0000ff,
        "darkblue" => 0x00008b,
        "orange" => 0xffa500,
        _ => return Err(ColorError::UnknownName(value.to_string())),
    };
    Ok(from_rgb24(rgb))
}

/// Same as [`parse_css_color`] but converted to the linear space the shaders
/// work in.
pub fn parse_linear_color(value: &str) -> Result<Vec3, ColorError> {
    parse_css_color(value).map(srgb_to_linear)
}

pub fn srgb_to_linear(color: Vec3) -> Vec3 {
    Vec3::new(
        channel_to_linear(color.x),
        channel_to_linear(color.y),
        channel_to_linear(color.z),
    )
}

fn channel_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn parse_hex(hex: &str) -> Option<Vec3> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => u32::from_str_radix(hex, 16).ok().map(from_rgb24),
        3 => {
            let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
            u32::from_str_radix(&expanded, 16).ok().map(from_rgb24)
        }
        _ => None,
    }
}

fn from_rgb24(rgb: u32) -> Vec3 {
    let r = ((rgb >> 16) & 0xff) as f32;
    let g = ((rgb >> 8) & 0xff) as f32;
    let b = (rgb & 0xff) as f32;
    Vec3::new(r, g, b) / 255.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_and_names() {
        assert_eq!(
            parse_css_color("#00008B").unwrap(),
            Vec3::new(0.0, 0.0, 139.0 / 255.0)
        );
        assert_eq!(parse_css_color("#f00").unwrap(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(
            parse_css_color("orange").unwrap(),
            Vec3::new(1.0, 165.0 / 255.0, 0.0)
        );
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(
            parse_css_color("#12345"),
            Err(ColorError::InvalidHex("#12345".into()))
        );
        assert!(matches!(
            parse_css_color("chartreuse-ish"),
            Err(ColorError::UnknownName(_))
        ));
    }

    #[test]
    fn linear_conversion_keeps_endpoints() {
        assert_eq!(srgb_to_linear(Vec3::ZERO), Vec3::ZERO);
        assert!((srgb_to_linear(Vec3::ONE) - Vec3::ONE).abs().max_element() < 1e-6);
        let mid = srgb_to_linear(Vec3::splat(0.5)).x;
        assert!(mid > 0.2 && mid < 0.22);
    }
}

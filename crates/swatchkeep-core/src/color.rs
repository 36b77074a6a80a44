//! Color values and their textual forms.
//!
//! A [`Color`] is an sRGB triple. It renders as `#RRGGBB`, `rgb(r, g, b)` or
//! `hsl(h, s%, l%)` and parses from hex or `rgb()` text.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

/// Error returned by [`Color::from_str`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized color: {0:?}")]
pub struct ParseColorError(pub String);

impl Color {
    pub const BLACK: Color = Color::from_rgb(0, 0, 0);
    pub const WHITE: Color = Color::from_rgb(255, 255, 255);

    /// Create a color from its channels.
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RGB`, `#RRGGBB` or `rgb(r, g, b)` text.
    ///
    /// Returns `None` for anything else, including out-of-range channels and
    /// `rgba()` text. Hex digits are case-insensitive.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if let Some(hex) = text.strip_prefix('#') {
            return parse_hex(hex);
        }
        match text.get(..3) {
            Some(prefix) if prefix.eq_ignore_ascii_case("rgb") => parse_rgb_args(&text[3..]),
            _ => None,
        }
    }

    /// Uppercase `#RRGGBB`.
    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// `rgb(r, g, b)`.
    pub fn to_rgb_string(self) -> String {
        format!("rgb({}, {}, {})", self.r, self.g, self.b)
    }

    /// Convert to HSL at full precision.
    ///
    /// Achromatic colors get `h = s = 0`. Hue is in degrees in `[0, 360)`,
    /// saturation and lightness are percentages.
    pub fn to_hsl(self) -> Hsl {
        let r = self.r as f64 / 255.0;
        let g = self.g as f64 / 255.0;
        let b = self.b as f64 / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;

        if max == min {
            return Hsl { h: 0.0, s: 0.0, l: l * 100.0 };
        }

        let d = max - min;
        let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };

        Hsl {
            h: h * 60.0,
            s: s * 100.0,
            l: l * 100.0,
        }
    }

    /// `hsl(h, s%, l%)` with integer components.
    pub fn to_hsl_string(self) -> String {
        self.to_hsl().to_string()
    }

    /// Render in the given textual form.
    pub fn format(self, format: ColorFormat) -> String {
        match format {
            ColorFormat::Hex => self.to_hex(),
            ColorFormat::Rgb => self.to_rgb_string(),
            ColorFormat::Hsl => self.to_hsl_string(),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::parse(s).ok_or_else(|| ParseColorError(s.to_string()))
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    let nibble = |c: u8| (c as char).to_digit(16).map(|d| d as u8);
    let bytes = hex.as_bytes();

    match bytes.len() {
        3 => {
            // #RGB
            let r = nibble(bytes[0])?;
            let g = nibble(bytes[1])?;
            let b = nibble(bytes[2])?;
            Some(Color::from_rgb(r * 17, g * 17, b * 17))
        }
        6 => {
            // #RRGGBB
            let pair = |i: usize| Some(nibble(bytes[i])? << 4 | nibble(bytes[i + 1])?);
            Some(Color::from_rgb(pair(0)?, pair(2)?, pair(4)?))
        }
        _ => None,
    }
}

/// Parse the `(r, g, b)` tail of an `rgb()` function.
fn parse_rgb_args(rest: &str) -> Option<Color> {
    let args = rest.trim_start().strip_prefix('(')?.strip_suffix(')')?;

    let channel = |part: &str| -> Option<u8> {
        let part = part.trim();
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        part.parse().ok()
    };

    let mut parts = args.split(',');
    let r = channel(parts.next()?)?;
    let g = channel(parts.next()?)?;
    let b = channel(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some(Color::from_rgb(r, g, b))
}

/// A color in HSL space: hue in degrees, saturation and lightness in percent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Hsl {
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Hsl {
    /// Round to whole degrees and percentages. A hue that rounds to 360
    /// wraps to 0.
    pub fn rounded(self) -> Hsl {
        Hsl {
            h: self.h.round().rem_euclid(360.0),
            s: self.s.round().clamp(0.0, 100.0),
            l: self.l.round().clamp(0.0, 100.0),
        }
    }

    /// Convert back to sRGB.
    pub fn to_color(self) -> Color {
        let h = self.h.rem_euclid(360.0) / 360.0;
        let s = (self.s / 100.0).clamp(0.0, 1.0);
        let l = (self.l / 100.0).clamp(0.0, 1.0);

        if s == 0.0 {
            let v = unit_to_channel(l);
            return Color::from_rgb(v, v, v);
        }

        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;

        Color::from_rgb(
            unit_to_channel(hue_to_unit(p, q, h + 1.0 / 3.0)),
            unit_to_channel(hue_to_unit(p, q, h)),
            unit_to_channel(hue_to_unit(p, q, h - 1.0 / 3.0)),
        )
    }
}

impl fmt::Display for Hsl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.rounded();
        write!(
            f,
            "hsl({}, {}%, {}%)",
            rounded.h as u16, rounded.s as u8, rounded.l as u8
        )
    }
}

fn hue_to_unit(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn unit_to_channel(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Which textual form to render a color in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorFormat {
    #[default]
    Hex,
    Rgb,
    Hsl,
}

/// Error returned when a format name is not `hex`, `rgb` or `hsl`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown color format {0:?} (expected hex, rgb or hsl)")]
pub struct ParseFormatError(pub String);

impl FromStr for ColorFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hex" => Ok(Self::Hex),
            "rgb" => Ok(Self::Rgb),
            "hsl" => Ok(Self::Hsl),
            _ => Err(ParseFormatError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every 5th value on each axis, plus the top of the range.
    fn sample_cube() -> impl Iterator<Item = Color> {
        let axis = || (0..=255u8).step_by(5).chain(std::iter::once(254));
        axis().flat_map(move |r| {
            axis().flat_map(move |g| axis().map(move |b| Color::from_rgb(r, g, b)))
        })
    }

    #[test]
    fn test_parse_long_hex() {
        assert_eq!(Color::parse("#FF8000"), Some(Color::from_rgb(255, 128, 0)));
        assert_eq!(Color::parse("#ff8000"), Some(Color::from_rgb(255, 128, 0)));
        assert_eq!(Color::parse("  #aBcDeF "), Some(Color::from_rgb(0xAB, 0xCD, 0xEF)));
    }

    #[test]
    fn test_parse_short_hex() {
        assert_eq!(Color::parse("#f00"), Some(Color::from_rgb(255, 0, 0)));
        assert_eq!(Color::parse("#1A9"), Some(Color::from_rgb(0x11, 0xAA, 0x99)));
    }

    #[test]
    fn test_parse_rgb_function() {
        assert_eq!(Color::parse("rgb(1, 2, 3)"), Some(Color::from_rgb(1, 2, 3)));
        assert_eq!(Color::parse("rgb(255,0,128)"), Some(Color::from_rgb(255, 0, 128)));
        assert_eq!(Color::parse("RGB( 10 , 20 , 30 )"), Some(Color::from_rgb(10, 20, 30)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for text in [
            "",
            "#",
            "#12",
            "#1234",
            "#GGGGGG",
            "FF0000",
            "red",
            "rgb(256, 0, 0)",
            "rgb(-1, 0, 0)",
            "rgb(1, 2)",
            "rgb(1, 2, 3, 4)",
            "rgb(+1, 2, 3)",
            "rgba(0, 0, 0, 0)",
            "rgb 1 2 3",
            "#ÿÿÿ",
        ] {
            assert_eq!(Color::parse(text), None, "{text:?} should not parse");
        }
    }

    #[test]
    fn test_to_hex_is_padded_uppercase() {
        assert_eq!(Color::from_rgb(0, 10, 255).to_hex(), "#000AFF");
        assert_eq!(Color::from_rgb(171, 205, 239).to_string(), "#ABCDEF");
    }

    #[test]
    fn test_to_rgb_string() {
        assert_eq!(Color::from_rgb(17, 34, 51).to_rgb_string(), "rgb(17, 34, 51)");
    }

    #[test]
    fn test_hsl_primaries() {
        assert_eq!(Color::from_rgb(255, 0, 0).to_hsl_string(), "hsl(0, 100%, 50%)");
        assert_eq!(Color::from_rgb(0, 255, 0).to_hsl_string(), "hsl(120, 100%, 50%)");
        assert_eq!(Color::from_rgb(0, 0, 255).to_hsl_string(), "hsl(240, 100%, 50%)");
        assert_eq!(Color::from_rgb(0, 255, 255).to_hsl_string(), "hsl(180, 100%, 50%)");
    }

    #[test]
    fn test_hsl_achromatic() {
        let hsl = Color::from_rgb(128, 128, 128).to_hsl();
        assert_eq!(hsl.h, 0.0);
        assert_eq!(hsl.s, 0.0);
        assert_eq!(Color::from_rgb(128, 128, 128).to_hsl_string(), "hsl(0, 0%, 50%)");
        assert_eq!(Color::WHITE.to_hsl_string(), "hsl(0, 0%, 100%)");
        assert_eq!(Color::BLACK.to_hsl_string(), "hsl(0, 0%, 0%)");
    }

    #[test]
    fn test_hsl_light_and_dark_saturation() {
        // l > 0.5 branch
        assert_eq!(Color::from_rgb(255, 128, 128).to_hsl_string(), "hsl(0, 100%, 75%)");
        // l <= 0.5 branch
        assert_eq!(Color::from_rgb(0, 64, 0).to_hsl_string(), "hsl(120, 100%, 13%)");
    }

    #[test]
    fn test_hue_rounding_wraps_to_zero() {
        let hsl = Color::from_rgb(255, 0, 1).to_hsl();
        assert!(hsl.h > 359.5 && hsl.h < 360.0);
        assert_eq!(hsl.rounded().h, 0.0);
        assert_eq!(Color::from_rgb(255, 0, 1).to_hsl_string(), "hsl(0, 100%, 50%)");
    }

    #[test]
    fn test_hsl_round_trip_within_one() {
        for color in sample_cube() {
            let back = color.to_hsl().to_color();
            assert!(
                color.r.abs_diff(back.r) <= 1
                    && color.g.abs_diff(back.g) <= 1
                    && color.b.abs_diff(back.b) <= 1,
                "{color} came back as {back}"
            );
        }
    }

    #[test]
    fn test_rounded_hsl_stays_close() {
        // Whole degrees and percentages cost a few channel units.
        for color in sample_cube() {
            let back = color.to_hsl().rounded().to_color();
            assert!(
                color.r.abs_diff(back.r) <= 6
                    && color.g.abs_diff(back.g) <= 6
                    && color.b.abs_diff(back.b) <= 6,
                "{color} came back as {back}"
            );
        }
    }

    #[test]
    fn test_parse_hex_round_trip() {
        for color in sample_cube() {
            assert_eq!(Color::parse(&color.to_hex()), Some(color));
        }
    }

    #[test]
    fn test_from_str() {
        assert_eq!("#00ff00".parse::<Color>(), Ok(Color::from_rgb(0, 255, 0)));
        assert!("nope".parse::<Color>().is_err());
    }

    #[test]
    fn test_format_selection() {
        let color = Color::from_rgb(255, 0, 0);
        assert_eq!(color.format(ColorFormat::Hex), "#FF0000");
        assert_eq!(color.format(ColorFormat::Rgb), "rgb(255, 0, 0)");
        assert_eq!(color.format(ColorFormat::Hsl), "hsl(0, 100%, 50%)");
        assert_eq!("HSL".parse::<ColorFormat>(), Ok(ColorFormat::Hsl));
        assert!("cmyk".parse::<ColorFormat>().is_err());
    }
}

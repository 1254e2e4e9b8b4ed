//! Hex color parsing and blending for derived series.
//!
//! Nodes without an explicit color take an equal-weight blend of their
//! children's colors: the first two are mixed 1:1, the result is mixed
//! with the third at weight 1/3, and so on.

use super::tree::TreeError;

/// An sRGB color parsed from a `#rrggbb` literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
}

impl Color {
    /// Parse a `#rrggbb` literal.
    pub fn parse(value: &str) -> Result<Self, TreeError> {
        let hex = value.strip_prefix('#').ok_or_else(|| invalid(value))?;
        if hex.len() != 6 {
            return Err(invalid(value));
        }
        let channel = |range| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| invalid(value))
        };
        Ok(Self {
            r: channel(0..2)?,
            g: channel(2..4)?,
            b: channel(4..6)?,
        })
    }

    /// Format back to a `#rrggbb` literal.
    #[must_use]
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Mix with `other`, taking `weight` (0..=1) of `other`.
    #[must_use]
    pub fn mix(self, other: Self, weight: f64) -> Self {
        let lerp = |a: u8, b: u8| {
            let v = f64::from(a).mul_add(1.0 - weight, f64::from(b) * weight);
            v.round().clamp(0.0, 255.0) as u8
        };
        Self {
            r: lerp(self.r, other.r),
            g: lerp(self.g, other.g),
            b: lerp(self.b, other.b),
        }
    }
}

fn invalid(value: &str) -> TreeError {
    TreeError::InvalidColor {
        value: value.to_string(),
    }
}

/// Equal-weight iterative blend of a non-empty color list.
#[must_use]
pub(crate) fn blend_equal(colors: &[Color]) -> Option<Color> {
    let (first, rest) = colors.split_first()?;
    let mut mixed = *first;
    for (i, color) in rest.iter().enumerate() {
        // After k colors the next one enters at weight 1/(k+1).
        let weight = 1.0 / (i as f64 + 2.0);
        mixed = mixed.mix(*color, weight);
    }
    Some(mixed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        let color = Color::parse("#7cb5ec").unwrap();
        assert_eq!(color.to_hex(), "#7cb5ec");
    }

    #[test]
    fn test_parse_rejects_bad_literals() {
        assert!(Color::parse("7cb5ec").is_err());
        assert!(Color::parse("#7cb5e").is_err());
        assert!(Color::parse("#zzzzzz").is_err());
    }

    #[test]
    fn test_mix_midpoint() {
        let black = Color::parse("#000000").unwrap();
        let white = Color::parse("#ffffff").unwrap();
        assert_eq!(black.mix(white, 0.5).to_hex(), "#808080");
    }

    #[test]
    fn test_blend_equal_is_average() {
        let a = Color::parse("#000000").unwrap();
        let b = Color::parse("#666666").unwrap();
        let c = Color::parse("#cccccc").unwrap();
        // 1:1:1 blend of 0x00, 0x66, 0xcc is 0x66 per channel.
        assert_eq!(blend_equal(&[a, b, c]).unwrap().to_hex(), "#666666");
    }

    #[test]
    fn test_blend_empty() {
        assert!(blend_equal(&[]).is_none());
    }
}

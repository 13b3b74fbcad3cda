//! Opaque RGB color with hex notation

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color {
        r: 255,
        g: 255,
        b: 255,
    };
    pub const BLACK: Color = Color { r: 0, g: 0, b: 0 };

    /// Parse a hex color string (e.g. "#FF0000" or "FF0000"). Malformed
    /// input falls back to black.
    pub fn from_hex(color: &str) -> Color {
        let hex = color.trim_start_matches('#');
        if hex.len() >= 6 {
            let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
            let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
            let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
            Color { r, g, b }
        } else {
            Color::BLACK
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_hex_with_and_without_hash() {
        assert_eq!(Color::from_hex("#FFFFFF"), Color::WHITE);
        assert_eq!(Color::from_hex("ffffff"), Color::WHITE);
        assert_eq!(Color::from_hex("#FF8000"), Color { r: 255, g: 128, b: 0 });
    }

    #[test]
    fn test_malformed_hex_defaults_to_black() {
        assert_eq!(Color::from_hex(""), Color::BLACK);
        assert_eq!(Color::from_hex("#12"), Color::BLACK);
    }

    #[test]
    fn test_hex_roundtrip() {
        let c = Color { r: 18, g: 52, b: 86 };
        assert_eq!(Color::from_hex(&c.to_hex()), c);
    }
}

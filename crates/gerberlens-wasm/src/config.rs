//! Declared board specifications supplied by the quote form.

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::Deserialize;

use crate::layers::Color;

const DEFAULT_BOARD_SIZE_MM: f64 = 100.0;
const DEFAULT_LAYER_COUNT: f64 = 2.0;

/// Solder-mask colors offered by the fab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SolderMaskColor {
    /// Standard green mask.
    #[default]
    Green,
    /// Red mask.
    Red,
    /// Yellow mask.
    Yellow,
    /// Blue mask.
    Blue,
    /// White mask.
    White,
    /// Glossy black mask.
    Black,
    /// Purple mask.
    Purple,
    /// Matte black mask.
    MatteBlack,
    /// Matte green mask.
    MatteGreen,
}

impl SolderMaskColor {
    /// Resolves a color name case-insensitively, ignoring spaces, dashes and
    /// underscores. Unknown names fall back to green.
    pub fn from_name(name: &str) -> Self {
        let key: String = name
            .chars()
            .filter(|ch| !matches!(ch, ' ' | '-' | '_'))
            .map(|ch| ch.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "red" => Self::Red,
            "yellow" => Self::Yellow,
            "blue" => Self::Blue,
            "white" => Self::White,
            "black" => Self::Black,
            "purple" => Self::Purple,
            "matteblack" => Self::MatteBlack,
            "mattegreen" => Self::MatteGreen,
            _ => Self::Green,
        }
    }

    /// Display color used to render mask layers.
    pub const fn display_color(self) -> Color {
        match self {
            Self::Green => Color::rgb(0x1b, 0x7a, 0x3a),
            Self::Red => Color::rgb(0xb0, 0x22, 0x22),
            Self::Yellow => Color::rgb(0xd4, 0xb0, 0x1e),
            Self::Blue => Color::rgb(0x1e, 0x4f, 0xa8),
            Self::White => Color::rgb(0xf2, 0xf2, 0xf2),
            Self::Black => Color::rgb(0x1a, 0x1a, 0x1a),
            Self::Purple => Color::rgb(0x5e, 0x2a, 0x84),
            Self::MatteBlack => Color::rgb(0x2b, 0x2b, 0x2b),
            Self::MatteGreen => Color::rgb(0x2e, 0x5e, 0x3a),
        }
    }
}

/// Board specifications declared by the customer.
///
/// Decoded from the quote form with camelCase keys; any missing field takes
/// its default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BoardSpecs {
    /// Declared board width in millimetres.
    #[serde(deserialize_with = "lenient_number")]
    pub board_width_mm: f64,
    /// Declared board height in millimetres.
    #[serde(deserialize_with = "lenient_number")]
    pub board_height_mm: f64,
    /// Declared copper layer count. Kept as entered; the layer count check
    /// rejects fractions and out-of-range values.
    #[serde(deserialize_with = "lenient_number")]
    pub layer_count: f64,
    /// Solder-mask color name as entered on the form.
    pub solder_mask_color: String,
}

impl BoardSpecs {
    /// Solder-mask color named by these specs.
    pub fn mask_color(&self) -> SolderMaskColor {
        SolderMaskColor::from_name(&self.solder_mask_color)
    }
}

impl Default for BoardSpecs {
    fn default() -> Self {
        Self {
            board_width_mm: DEFAULT_BOARD_SIZE_MM,
            board_height_mm: DEFAULT_BOARD_SIZE_MM,
            layer_count: DEFAULT_LAYER_COUNT,
            solder_mask_color: "Green".to_string(),
        }
    }
}

/// Accepts any number, a numeric string, or null. Anything that is not a
/// number becomes NaN so the design rule checks report it.
fn lenient_number<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(LenientNumber)
}

struct LenientNumber;

impl<'de> Visitor<'de> for LenientNumber {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a number, a numeric string or null")
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> Result<f64, E> {
        Ok(value)
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_i64<E: de::Error>(self, value: i64) -> Result<f64, E> {
        Ok(value as f64)
    }

    #[allow(clippy::cast_precision_loss)]
    fn visit_u64<E: de::Error>(self, value: u64) -> Result<f64, E> {
        Ok(value as f64)
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<f64, E> {
        Ok(value.trim().parse().unwrap_or(f64::NAN))
    }

    fn visit_bool<E: de::Error>(self, _value: bool) -> Result<f64, E> {
        Ok(f64::NAN)
    }

    fn visit_unit<E: de::Error>(self) -> Result<f64, E> {
        Ok(f64::NAN)
    }

    fn visit_none<E: de::Error>(self) -> Result<f64, E> {
        Ok(f64::NAN)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(self)
    }
}

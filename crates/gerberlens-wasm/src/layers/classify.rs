//! File-name based layer role detection.
//!
//! Roles are resolved from an ordered rule table; the first matching row
//! wins. Each row lists the extensions and name fragments used by the common
//! CAD exporters (Protel/Altium extensions, KiCad `F.Cu` style names,
//! EasyEDA/Eagle words), so a new dialect is a new entry in a row.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::config::SolderMaskColor;

/// Display color as 8-bit RGB. Serializes as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Creates a color from its channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Canonical manufacturing role of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LayerRole {
    /// Front copper.
    #[serde(rename = "Top Copper")]
    TopCopper,
    /// Back copper.
    #[serde(rename = "Bottom Copper")]
    BottomCopper,
    /// Front solder mask.
    #[serde(rename = "Top Solder Mask")]
    TopSolderMask,
    /// Back solder mask.
    #[serde(rename = "Bottom Solder Mask")]
    BottomSolderMask,
    /// Front legend.
    #[serde(rename = "Top Silkscreen")]
    TopSilkscreen,
    /// Back legend.
    #[serde(rename = "Bottom Silkscreen")]
    BottomSilkscreen,
    /// Drill file.
    #[serde(rename = "Drill")]
    Drill,
    /// Board profile.
    #[serde(rename = "Board Outline")]
    BoardOutline,
    /// Paste stencil, either side.
    #[serde(rename = "Solder Paste")]
    SolderPaste,
    /// Inner copper plane.
    #[serde(rename = "Inner Layer")]
    InnerLayer,
    /// No rule matched.
    #[serde(rename = "Unknown")]
    Unknown,
}

impl LayerRole {
    /// Human-readable role name.
    pub const fn label(self) -> &'static str {
        match self {
            Self::TopCopper => "Top Copper",
            Self::BottomCopper => "Bottom Copper",
            Self::TopSolderMask => "Top Solder Mask",
            Self::BottomSolderMask => "Bottom Solder Mask",
            Self::TopSilkscreen => "Top Silkscreen",
            Self::BottomSilkscreen => "Bottom Silkscreen",
            Self::Drill => "Drill",
            Self::BoardOutline => "Board Outline",
            Self::SolderPaste => "Solder Paste",
            Self::InnerLayer => "Inner Layer",
            Self::Unknown => "Unknown",
        }
    }

    /// Copper roles: top, bottom and inner.
    pub const fn is_copper(self) -> bool {
        matches!(self, Self::TopCopper | Self::BottomCopper | Self::InnerLayer)
    }
}

impl fmt::Display for LayerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Role and display color for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Detected role.
    pub role: LayerRole,
    /// Color to draw the layer with.
    pub color: Color,
}

#[derive(Debug, Clone, Copy)]
enum ColorSource {
    Fixed(Color),
    SolderMask,
}

#[derive(Debug)]
struct ClassifierRule {
    role: LayerRole,
    /// Matched against the end of the lower-cased name.
    extensions: &'static [&'static str],
    /// Matched anywhere in the lower-cased name.
    fragments: &'static [&'static str],
    color: ColorSource,
}

impl ClassifierRule {
    fn matches(&self, name: &str) -> bool {
        self.extensions.iter().any(|ext| name.ends_with(ext))
            || self.fragments.iter().any(|fragment| name.contains(fragment))
    }
}

const COPPER: Color = Color::rgb(0xc8, 0x7f, 0x3a);
const BOTTOM_COPPER: Color = Color::rgb(0x3a, 0x7f, 0xc8);
const SILKSCREEN: Color = Color::rgb(0xff, 0xff, 0xff);
const BOTTOM_SILKSCREEN: Color = Color::rgb(0xdd, 0xdd, 0xdd);
const DRILL: Color = Color::rgb(0x33, 0x33, 0x33);
const OUTLINE: Color = Color::rgb(0xf5, 0xd0, 0x32);
const PASTE: Color = Color::rgb(0xa8, 0xa8, 0xb0);
const INNER: Color = Color::rgb(0xb0, 0x8d, 0x57);
const UNKNOWN: Color = Color::rgb(0x88, 0x88, 0x88);

const RULES: &[ClassifierRule] = &[
    ClassifierRule {
        role: LayerRole::TopCopper,
        extensions: &[".gtl", ".cmp", ".top"],
        fragments: &[
            "f.cu",
            "f_cu",
            "top_copper",
            "top.copper",
            "copper_top",
            "toplayer",
            "top_layer",
        ],
        color: ColorSource::Fixed(COPPER),
    },
    ClassifierRule {
        role: LayerRole::BottomCopper,
        extensions: &[".gbl", ".sol", ".bot"],
        fragments: &[
            "b.cu",
            "b_cu",
            "bottom_copper",
            "bottom.copper",
            "copper_bottom",
            "bottomlayer",
            "bottom_layer",
        ],
        color: ColorSource::Fixed(BOTTOM_COPPER),
    },
    ClassifierRule {
        role: LayerRole::TopSolderMask,
        extensions: &[".gts", ".stc"],
        fragments: &[
            "f.mask",
            "f_mask",
            "top_mask",
            "topsoldermask",
            "top_solder_mask",
            "soldermask_top",
        ],
        color: ColorSource::SolderMask,
    },
    ClassifierRule {
        role: LayerRole::BottomSolderMask,
        extensions: &[".gbs", ".sts"],
        fragments: &[
            "b.mask",
            "b_mask",
            "bottom_mask",
            "bottomsoldermask",
            "bottom_solder_mask",
            "soldermask_bottom",
        ],
        color: ColorSource::SolderMask,
    },
    ClassifierRule {
        role: LayerRole::TopSilkscreen,
        extensions: &[".gto", ".plc"],
        fragments: &[
            "f.silks",
            "f_silks",
            "top_silk",
            "topsilk",
            "silkscreen_top",
        ],
        color: ColorSource::Fixed(SILKSCREEN),
    },
    ClassifierRule {
        role: LayerRole::BottomSilkscreen,
        extensions: &[".gbo", ".pls"],
        fragments: &[
            "b.silks",
            "b_silks",
            "bottom_silk",
            "bottomsilk",
            "silkscreen_bottom",
        ],
        color: ColorSource::Fixed(BOTTOM_SILKSCREEN),
    },
    ClassifierRule {
        role: LayerRole::Drill,
        extensions: &[".drl", ".xln", ".exc", ".drd", ".ncd"],
        fragments: &["drill", "-pth", "_pth", "-npth", "_npth"],
        color: ColorSource::Fixed(DRILL),
    },
    ClassifierRule {
        role: LayerRole::BoardOutline,
        extensions: &[".gko", ".gm1", ".gml", ".dim"],
        fragments: &["edge.cuts", "edge_cuts", "outline", "profile"],
        color: ColorSource::Fixed(OUTLINE),
    },
    ClassifierRule {
        role: LayerRole::SolderPaste,
        extensions: &[".gtp", ".gbp", ".crc", ".crs"],
        fragments: &["paste"],
        color: ColorSource::Fixed(PASTE),
    },
    ClassifierRule {
        role: LayerRole::InnerLayer,
        extensions: &[".g1", ".g2", ".g3", ".g4", ".g5", ".g6", ".g7", ".g8"],
        fragments: &[
            "in1.cu", "in1_cu", "in2.cu", "in2_cu", "in3.cu", "in3_cu", "in4.cu", "in4_cu",
            "inner",
        ],
        color: ColorSource::Fixed(INNER),
    },
];

/// Classify a file by name.
///
/// `solder_mask_color` is the color name from the board specs; it only
/// affects the color of mask layers.
pub fn classify(file_name: &str, solder_mask_color: &str) -> Classification {
    classify_with(file_name, SolderMaskColor::from_name(solder_mask_color))
}

/// Classify a file by name with an already resolved mask color.
pub fn classify_with(file_name: &str, mask: SolderMaskColor) -> Classification {
    let name = file_name.to_lowercase();

    RULES
        .iter()
        .find(|rule| rule.matches(&name))
        .map_or(
            Classification {
                role: LayerRole::Unknown,
                color: UNKNOWN,
            },
            |rule| Classification {
                role: rule.role,
                color: match rule.color {
                    ColorSource::Fixed(color) => color,
                    ColorSource::SolderMask => mask.display_color(),
                },
            },
        )
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("board-F.Cu.gbr", LayerRole::TopCopper)]
    #[case("board-F_Cu.gbr", LayerRole::TopCopper)]
    #[case("PCB.GTL", LayerRole::TopCopper)]
    #[case("Gerber_TopLayer.GTL", LayerRole::TopCopper)]
    #[case("board-B_Cu.gbr", LayerRole::BottomCopper)]
    #[case("arduino.GBL", LayerRole::BottomCopper)]
    #[case("board-F_Mask.gbr", LayerRole::TopSolderMask)]
    #[case("Gerber_TopSolderMaskLayer.GTS", LayerRole::TopSolderMask)]
    #[case("board-B.Mask.gbr", LayerRole::BottomSolderMask)]
    #[case("arduino.gbs", LayerRole::BottomSolderMask)]
    #[case("board-F_SilkS.gbr", LayerRole::TopSilkscreen)]
    #[case("Gerber_TopSilkscreenLayer.GTO", LayerRole::TopSilkscreen)]
    #[case("board-B_SilkS.gbr", LayerRole::BottomSilkscreen)]
    #[case("arduino.GBO", LayerRole::BottomSilkscreen)]
    #[case("design.drl", LayerRole::Drill)]
    #[case("Drill_PTH_Through.DRL", LayerRole::Drill)]
    #[case("board-NPTH.xln", LayerRole::Drill)]
    #[case("outline.gko", LayerRole::BoardOutline)]
    #[case("board-Edge_Cuts.gbr", LayerRole::BoardOutline)]
    #[case("Gerber_BoardOutlineLayer.GKO", LayerRole::BoardOutline)]
    #[case("board-F_Paste.gbr", LayerRole::SolderPaste)]
    #[case("arduino.GTP", LayerRole::SolderPaste)]
    #[case("board-In1_Cu.gbr", LayerRole::InnerLayer)]
    #[case("Gerber_InnerLayer2.G2", LayerRole::InnerLayer)]
    #[case("mystery.xyz", LayerRole::Unknown)]
    #[case("readme.txt", LayerRole::Unknown)]
    fn classifies_common_export_names(#[case] name: &str, #[case] expected: LayerRole) {
        assert_eq!(classify(name, "Green").role, expected);
    }

    #[test]
    fn classification_is_deterministic() {
        for name in ["board-F.Cu.gbr", "design.drl", "outline.gko", "mystery.xyz"] {
            assert_eq!(classify(name, "Red"), classify(name, "Red"));
        }
    }

    #[test]
    fn mask_layers_follow_configured_color() {
        let red = classify("board-F_Mask.gbr", "Red");
        assert_eq!(red.color, SolderMaskColor::Red.display_color());

        let blue = classify("arduino.gbs", "blue");
        assert_eq!(blue.color, SolderMaskColor::Blue.display_color());
    }

    #[test]
    fn unknown_mask_color_uses_default() {
        let mask = classify("board-F_Mask.gbr", "chartreuse");
        assert_eq!(mask.color, SolderMaskColor::Green.display_color());
    }

    #[test]
    fn non_mask_colors_ignore_mask_setting() {
        assert_eq!(
            classify("board-F.Cu.gbr", "Red").color,
            classify("board-F.Cu.gbr", "Black").color
        );
    }

    #[test]
    fn copper_roles_include_inner_layers() {
        assert!(LayerRole::TopCopper.is_copper());
        assert!(LayerRole::InnerLayer.is_copper());
        assert!(!LayerRole::Drill.is_copper());
        assert!(!LayerRole::Unknown.is_copper());
    }

    #[test]
    fn color_formats_as_hex() {
        assert_eq!(Color::rgb(0x1b, 0x7a, 0x3a).to_string(), "#1b7a3a");
    }
}

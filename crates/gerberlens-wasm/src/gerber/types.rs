//! Parsed Gerber layer types.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::geometry::BoundingBox;

/// Coordinate units per millimetre assumed for every file.
pub const UNITS_PER_MM: f64 = 10_000.0;

/// Shape of an `%ADD` aperture definition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "shape", rename_all = "camelCase")]
pub enum ApertureShape {
    /// Round aperture.
    Circle {
        /// Outer diameter.
        diameter: f64,
    },
    /// Rectangular aperture.
    Rectangle {
        /// X size.
        width: f64,
        /// Y size.
        height: f64,
    },
    /// Rectangle with semicircular ends on its short sides.
    Obround {
        /// X size.
        width: f64,
        /// Y size.
        height: f64,
    },
}

impl ApertureShape {
    /// Width of the stroke this aperture paints when dragged.
    pub fn stroke_width(&self) -> f64 {
        match *self {
            Self::Circle { diameter } => diameter,
            Self::Rectangle { width, height } | Self::Obround { width, height } => {
                width.min(height)
            }
        }
    }

    /// Largest dimension of the aperture.
    pub fn extent(&self) -> f64 {
        match *self {
            Self::Circle { diameter } => diameter,
            Self::Rectangle { width, height } | Self::Obround { width, height } => {
                width.max(height)
            }
        }
    }
}

/// One drawing command, coordinates in millimetres.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GerberCommand {
    /// D02: cursor moves without painting.
    Move {
        /// Target X.
        x: f64,
        /// Target Y.
        y: f64,
    },
    /// D01: linear draw from the cursor to the target.
    Draw {
        /// Start X (cursor at parse time).
        x1: f64,
        /// Start Y (cursor at parse time).
        y1: f64,
        /// End X.
        x2: f64,
        /// End Y.
        y2: f64,
        /// Aperture selected when the draw was parsed.
        aperture: Option<String>,
    },
    /// D03: aperture stamped at a single point.
    Flash {
        /// Flash X.
        x: f64,
        /// Flash Y.
        y: f64,
        /// Aperture selected when the flash was parsed.
        aperture: Option<String>,
    },
    /// Circular interpolation line. Kept verbatim; contributes no geometry.
    Arc {
        /// Source line.
        source: String,
    },
    /// `G36`/`G37` region boundary. Contributes no geometry.
    Region {
        /// True for `G36` (region start), false for `G37`.
        begin: bool,
    },
}

/// Units declared by a `%MO` statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DeclaredUnits {
    /// `%MOMM*%`
    Millimeters,
    /// `%MOIN*%`
    Inches,
}

/// Result of parsing one Gerber file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedGerberData {
    /// Commands in file order.
    pub commands: Vec<GerberCommand>,
    /// Aperture table keyed by numeric id (`"10"` for `D10`).
    pub apertures: BTreeMap<String, ApertureShape>,
    /// Extent of all observed coordinates; never empty.
    pub bounds: BoundingBox,
    /// Units named by the file header, if any. Informational only.
    pub declared_units: Option<DeclaredUnits>,
    /// Non-fatal notes collected while parsing.
    pub warnings: Vec<String>,
}

impl ParsedGerberData {
    /// Looks up an aperture by id.
    pub fn aperture(&self, id: &str) -> Option<&ApertureShape> {
        self.apertures.get(id)
    }

    /// Number of draw and flash commands.
    pub fn primitive_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|cmd| matches!(cmd, GerberCommand::Draw { .. } | GerberCommand::Flash { .. }))
            .count()
    }
}

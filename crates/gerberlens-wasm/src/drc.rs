//! Quote-time design rule checks.
//!
//! A fixed battery comparing the declared board specs with the classified
//! layer set. Pure: the result is derived from the inputs alone.

use serde::Serialize;

use crate::layers::{LayerInfo, LayerRole};

/// Largest board side accepted, in millimetres.
pub const MAX_BOARD_SIDE_MM: f64 = 500.0;
/// Smallest declared layer count accepted.
pub const MIN_LAYER_COUNT: f64 = 1.0;
/// Largest declared layer count accepted.
pub const MAX_LAYER_COUNT: f64 = 20.0;
/// Fewest files a quote can be produced from.
pub const MIN_FILE_COUNT: usize = 2;

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrcCheck {
    /// Check name shown in the summary panel.
    pub name: &'static str,
    /// Whether the check passed.
    pub passed: bool,
    /// Status line.
    pub message: String,
    /// Whether a failure blocks the order.
    pub critical: bool,
}

impl DrcCheck {
    fn new(name: &'static str, passed: bool, message: String, critical: bool) -> Self {
        Self {
            name,
            passed,
            message,
            critical,
        }
    }

    /// Failed and blocking.
    pub const fn is_critical_failure(&self) -> bool {
        self.critical && !self.passed
    }
}

/// Totals over a check list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrcSummary {
    /// Checks that passed.
    pub passed: usize,
    /// Checks that failed.
    pub failed: usize,
    /// Failed checks marked critical.
    pub critical_failures: usize,
    /// No critical failure.
    pub ready: bool,
}

impl DrcSummary {
    /// Tallies `checks`.
    pub fn from_checks(checks: &[DrcCheck]) -> Self {
        let passed = checks.iter().filter(|check| check.passed).count();
        let critical_failures = checks
            .iter()
            .filter(|check| check.is_critical_failure())
            .count();
        Self {
            passed,
            failed: checks.len() - passed,
            critical_failures,
            ready: critical_failures == 0,
        }
    }
}

/// Run the battery, in display order.
pub fn evaluate(
    board_width_mm: f64,
    board_height_mm: f64,
    layer_count: f64,
    file_count: usize,
    layers: &[LayerInfo],
) -> Vec<DrcCheck> {
    let count_role = |pred: fn(LayerRole) -> bool| layers.iter().filter(|layer| pred(layer.role)).count();

    let drill_count = count_role(|role| role == LayerRole::Drill);
    let outline_count = count_role(|role| role == LayerRole::BoardOutline);
    let copper_count = count_role(LayerRole::is_copper);

    vec![
        check_dimensions(board_width_mm, board_height_mm),
        check_layer_count(layer_count),
        check_file_count(file_count),
        DrcCheck::new(
            "Drill File",
            drill_count > 0,
            if drill_count > 0 {
                format!("{drill_count} drill file(s) detected")
            } else {
                "No drill file found".to_string()
            },
            true,
        ),
        DrcCheck::new(
            "Board Outline",
            outline_count > 0,
            if outline_count > 0 {
                "Board outline layer detected".to_string()
            } else {
                "No board outline layer found; the declared size will be used".to_string()
            },
            false,
        ),
        DrcCheck::new(
            "Copper Layers",
            copper_count > 0,
            if copper_count > 0 {
                format!("{copper_count} copper layer(s) detected")
            } else {
                "No copper layers found".to_string()
            },
            true,
        ),
    ]
}

fn check_dimensions(width: f64, height: f64) -> DrcCheck {
    let within = |side: f64| side > 0.0 && side <= MAX_BOARD_SIDE_MM;
    let passed = within(width) && within(height);
    let message = if passed {
        format!("{width} x {height} mm")
    } else {
        format!("{width} x {height} mm is outside 0 to {MAX_BOARD_SIDE_MM} mm")
    };
    DrcCheck::new("Board Dimensions", passed, message, true)
}

fn check_layer_count(layer_count: f64) -> DrcCheck {
    let whole = layer_count.fract().abs() < f64::EPSILON;
    let passed = whole && (MIN_LAYER_COUNT..=MAX_LAYER_COUNT).contains(&layer_count);
    let message = if passed {
        format!("{layer_count} layer(s)")
    } else if layer_count.is_finite() && !whole {
        format!("{layer_count} is not a whole number of layers")
    } else {
        format!("{layer_count} layers is outside {MIN_LAYER_COUNT} to {MAX_LAYER_COUNT}")
    };
    DrcCheck::new("Layer Count", passed, message, true)
}

fn check_file_count(file_count: usize) -> DrcCheck {
    let passed = file_count >= MIN_FILE_COUNT;
    let message = if passed {
        format!("{file_count} file(s) uploaded")
    } else {
        format!("{file_count} file(s) uploaded; at least {MIN_FILE_COUNT} required")
    };
    DrcCheck::new("Gerber Files", passed, message, true)
}

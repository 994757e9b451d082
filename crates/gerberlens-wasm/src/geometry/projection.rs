//! Projection of board coordinates into the preview viewbox.
//!
//! Every layer of one preview is projected through the same [`Projection`],
//! built from the combined bounds, so the layers stay in registration.

use serde::Serialize;

use crate::gerber::{GerberCommand, ParsedGerberData};

use super::types::{BoundingBox, Point};

/// Side length of the square preview viewbox.
pub const VIEWBOX_SIZE: f64 = 180.0;

/// A primitive in viewbox coordinates (Y down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RenderPrimitive {
    /// Flash marker.
    Marker {
        /// Viewbox X.
        x: f64,
        /// Viewbox Y.
        y: f64,
        /// Aperture extent in viewbox units; zero when unknown.
        size: f64,
    },
    /// Draw segment.
    Segment {
        /// Start X.
        x1: f64,
        /// Start Y.
        y1: f64,
        /// End X.
        x2: f64,
        /// End Y.
        y2: f64,
        /// Stroke width in viewbox units; zero when unknown.
        width: f64,
    },
}

/// Uniform board-to-viewbox mapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    bounds: BoundingBox,
    scale: f64,
}

impl Projection {
    /// Fits `bounds` into the viewbox. The larger side spans the full
    /// viewbox; the aspect ratio is preserved.
    pub fn new(bounds: BoundingBox) -> Self {
        let span = bounds.width().max(bounds.height());
        let scale = if span.is_finite() && span > f64::EPSILON {
            VIEWBOX_SIZE / span
        } else {
            1.0
        };
        Self { bounds, scale }
    }

    /// Viewbox units per millimetre.
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Maps a board point (Y up) to the viewbox (Y down).
    pub fn project_point(&self, x: f64, y: f64) -> Point {
        Point::new(
            (x - self.bounds.min_x) * self.scale,
            (self.bounds.max_y - y) * self.scale,
        )
    }

    /// Projects one layer's draws and flashes. Moves, arcs and regions are
    /// skipped; a layer without parse data yields nothing.
    pub fn project_layer(&self, parsed: Option<&ParsedGerberData>) -> Vec<RenderPrimitive> {
        let Some(parsed) = parsed else {
            return Vec::new();
        };

        let aperture_size = |id: &Option<String>, stroke: bool| {
            id.as_deref()
                .and_then(|id| parsed.aperture(id))
                .map_or(0.0, |shape| {
                    let size = if stroke {
                        shape.stroke_width()
                    } else {
                        shape.extent()
                    };
                    size.abs() * self.scale
                })
        };

        parsed
            .commands
            .iter()
            .filter_map(|command| match command {
                GerberCommand::Draw {
                    x1,
                    y1,
                    x2,
                    y2,
                    aperture,
                } => {
                    let start = self.project_point(*x1, *y1);
                    let end = self.project_point(*x2, *y2);
                    Some(RenderPrimitive::Segment {
                        x1: start.x,
                        y1: start.y,
                        x2: end.x,
                        y2: end.y,
                        width: aperture_size(aperture, true),
                    })
                }
                GerberCommand::Flash { x, y, aperture } => {
                    let at = self.project_point(*x, *y);
                    Some(RenderPrimitive::Marker {
                        x: at.x,
                        y: at.y,
                        size: aperture_size(aperture, false),
                    })
                }
                GerberCommand::Move { .. }
                | GerberCommand::Arc { .. }
                | GerberCommand::Region { .. } => None,
            })
            .collect()
    }
}

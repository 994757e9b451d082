//! Triangle mesh for one parsed layer.

use log::debug;

use crate::gerber::{ApertureShape, GerberCommand, ParsedGerberData};

use super::aperture::flash_aperture;
use super::stroke::draw_linear;
use super::types::{saturate_u32, GeometryBuilder, LayerGeometry, Point};

/// Expand every draw and flash of `parsed` into triangles.
///
/// Commands without a usable aperture, and apertures with invalid
/// dimensions, are skipped with a warning; the mesh itself never fails.
pub fn build_layer_mesh(parsed: &ParsedGerberData) -> LayerGeometry {
    let mut builder = GeometryBuilder::new();
    let mut expanded = 0_usize;

    for command in &parsed.commands {
        let (aperture_id, result) = match command {
            GerberCommand::Draw {
                x1,
                y1,
                x2,
                y2,
                aperture,
            } => {
                let Some(shape) = resolve(parsed, aperture.as_deref(), &mut builder) else {
                    continue;
                };
                (
                    aperture,
                    draw_linear(
                        &mut builder,
                        Point::new(*x1, *y1),
                        Point::new(*x2, *y2),
                        &shape,
                    ),
                )
            }
            GerberCommand::Flash { x, y, aperture } => {
                let Some(shape) = resolve(parsed, aperture.as_deref(), &mut builder) else {
                    continue;
                };
                (aperture, flash_aperture(&mut builder, &shape, Point::new(*x, *y)))
            }
            GerberCommand::Move { .. } | GerberCommand::Arc { .. } | GerberCommand::Region { .. } => {
                continue
            }
        };

        match result {
            Ok(()) => expanded += 1,
            Err(err) => builder.warn(format!(
                "D{} skipped: {err}",
                aperture_id.as_deref().unwrap_or("?")
            )),
        }
    }

    let mut geom = builder.build();
    geom.command_count = saturate_u32(expanded);

    debug!(
        "meshed layer: {} commands, {} vertices, {} warnings",
        geom.command_count,
        geom.vertex_count,
        geom.warnings.len()
    );

    geom
}

fn resolve(
    parsed: &ParsedGerberData,
    aperture: Option<&str>,
    builder: &mut GeometryBuilder,
) -> Option<ApertureShape> {
    let Some(id) = aperture else {
        builder.warn("primitive without aperture skipped".to_string());
        return None;
    };

    let shape = parsed.aperture(id).copied();
    if shape.is_none() {
        builder.warn(format!("primitive with undefined aperture D{id} skipped"));
    }
    shape
}

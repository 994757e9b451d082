//! Aperture flash geometry expansion.
//!
//! This module converts D03 aperture flashes into triangle geometry
//! using the shared [`GeometryBuilder`].

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::error::GeometryError;
use crate::gerber::ApertureShape;

use super::types::{GeometryBuilder, Point};

const CIRCLE_SEGMENTS: u32 = 32;
const OBROUND_ENDCAP_SEGMENTS: u32 = 16;

/// Expand a flashed aperture at `position` into renderable triangles.
///
/// # Errors
///
/// Returns an error when aperture parameters are not finite.
pub fn flash_aperture(
    builder: &mut GeometryBuilder,
    aperture: &ApertureShape,
    position: Point,
) -> Result<(), GeometryError> {
    match *aperture {
        ApertureShape::Circle { diameter } => flash_circle(builder, diameter, position),
        ApertureShape::Rectangle { width, height } => {
            flash_rectangle(builder, width, height, position)
        }
        ApertureShape::Obround { width, height } => flash_obround(builder, width, height, position),
    }
}

/// Validates an aperture dimension: negative values are mirrored with a
/// warning, zero yields `None` with a warning.
pub(crate) fn normalize_dimension(
    builder: &mut GeometryBuilder,
    value: f64,
    label: &str,
) -> Result<Option<f64>, GeometryError> {
    if !value.is_finite() {
        return Err(GeometryError::InvalidAperture(format!(
            "{label} must be finite, got {value}"
        )));
    }

    let mut normalized = value;
    if normalized < 0.0 {
        builder.warn(format!(
            "{label} is negative ({normalized}); using absolute value"
        ));
        normalized = normalized.abs();
    }

    if normalized <= f64::EPSILON {
        builder.warn(format!("{label} is zero; skipping"));
        return Ok(None);
    }

    Ok(Some(normalized))
}

fn flash_circle(
    builder: &mut GeometryBuilder,
    diameter: f64,
    position: Point,
) -> Result<(), GeometryError> {
    let Some(diameter) = normalize_dimension(builder, diameter, "circle diameter")? else {
        return Ok(());
    };

    builder.push_ngon(position.x, position.y, diameter / 2.0, CIRCLE_SEGMENTS);
    Ok(())
}

fn flash_rectangle(
    builder: &mut GeometryBuilder,
    width: f64,
    height: f64,
    position: Point,
) -> Result<(), GeometryError> {
    let Some(width) = normalize_dimension(builder, width, "rectangle width")? else {
        return Ok(());
    };
    let Some(height) = normalize_dimension(builder, height, "rectangle height")? else {
        return Ok(());
    };

    push_centered_rectangle(builder, position, width, height);
    Ok(())
}

fn flash_obround(
    builder: &mut GeometryBuilder,
    width: f64,
    height: f64,
    position: Point,
) -> Result<(), GeometryError> {
    let Some(width) = normalize_dimension(builder, width, "obround width")? else {
        return Ok(());
    };
    let Some(height) = normalize_dimension(builder, height, "obround height")? else {
        return Ok(());
    };

    if (width - height).abs() <= f64::EPSILON {
        builder.push_ngon(position.x, position.y, width / 2.0, CIRCLE_SEGMENTS);
        return Ok(());
    }

    if width > height {
        let radius = height / 2.0;
        let body_width = width - height;
        let half_body = body_width / 2.0;

        push_centered_rectangle(builder, position, body_width, height);
        push_semi_circle(
            builder,
            Point::new(position.x - half_body, position.y),
            radius,
            FRAC_PI_2,
            3.0 * FRAC_PI_2,
        );
        push_semi_circle(
            builder,
            Point::new(position.x + half_body, position.y),
            radius,
            -FRAC_PI_2,
            FRAC_PI_2,
        );
    } else {
        let radius = width / 2.0;
        let body_height = height - width;
        let half_body = body_height / 2.0;

        push_centered_rectangle(builder, position, width, body_height);
        push_semi_circle(
            builder,
            Point::new(position.x, position.y + half_body),
            radius,
            0.0,
            PI,
        );
        push_semi_circle(
            builder,
            Point::new(position.x, position.y - half_body),
            radius,
            PI,
            TAU,
        );
    }

    Ok(())
}

fn push_centered_rectangle(builder: &mut GeometryBuilder, center: Point, width: f64, height: f64) {
    let half_width = width / 2.0;
    let half_height = height / 2.0;

    let a = builder.push_vertex(center.x - half_width, center.y - half_height);
    let b = builder.push_vertex(center.x + half_width, center.y - half_height);
    let c = builder.push_vertex(center.x + half_width, center.y + half_height);
    let d = builder.push_vertex(center.x - half_width, center.y + half_height);
    builder.push_quad(a, b, c, d);
}

/// Triangle fan around `center` sweeping `start_angle..end_angle`.
pub(crate) fn push_semi_circle(
    builder: &mut GeometryBuilder,
    center: Point,
    radius: f64,
    start_angle: f64,
    end_angle: f64,
) {
    let center_index = builder.push_vertex(center.x, center.y);
    let step = (end_angle - start_angle) / f64::from(OBROUND_ENDCAP_SEGMENTS);

    let mut previous_index: Option<u32> = None;
    for i in 0..=OBROUND_ENDCAP_SEGMENTS {
        let angle = step.mul_add(f64::from(i), start_angle);
        let x = radius.mul_add(angle.cos(), center.x);
        let y = radius.mul_add(angle.sin(), center.y);
        let index = builder.push_vertex(x, y);
        if let Some(previous) = previous_index {
            builder.push_triangle(center_index, previous, index);
        }
        previous_index = Some(index);
    }
}

//! Linear stroke widening for D01 draws.
//!
//! This module converts a line segment into thick triangle geometry using the
//! aperture selected when the draw was parsed.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::error::GeometryError;
use crate::gerber::ApertureShape;

use super::aperture::{flash_aperture, normalize_dimension, push_semi_circle};
use super::types::{GeometryBuilder, Point};

/// Expand a linear draw into renderable triangles.
///
/// The segment body is emitted as a quad. Circular apertures add rounded
/// semicircle endcaps at both ends; rectangles and obrounds are swept with
/// their smaller dimension and square ends.
///
/// # Errors
///
/// Returns an error when aperture parameters are not finite.
pub fn draw_linear(
    builder: &mut GeometryBuilder,
    from: Point,
    to: Point,
    aperture: &ApertureShape,
) -> Result<(), GeometryError> {
    let Some(stroke_width) = normalize_dimension(builder, aperture.stroke_width(), "stroke width")?
    else {
        return Ok(());
    };

    let delta_x = to.x - from.x;
    let delta_y = to.y - from.y;
    let segment_length_sq = delta_x.mul_add(delta_x, delta_y * delta_y);
    if segment_length_sq <= f64::EPSILON {
        return handle_zero_length_segment(builder, from, aperture);
    }

    let inverse_length = 1.0 / segment_length_sq.sqrt();
    let direction_x = delta_x * inverse_length;
    let direction_y = delta_y * inverse_length;
    let normal_x = -direction_y;
    let normal_y = direction_x;
    let half_width = stroke_width / 2.0;

    let start_left = Point::new(
        normal_x.mul_add(half_width, from.x),
        normal_y.mul_add(half_width, from.y),
    );
    let start_right = Point::new(
        (-normal_x).mul_add(half_width, from.x),
        (-normal_y).mul_add(half_width, from.y),
    );
    let end_right = Point::new(
        (-normal_x).mul_add(half_width, to.x),
        (-normal_y).mul_add(half_width, to.y),
    );
    let end_left = Point::new(
        normal_x.mul_add(half_width, to.x),
        normal_y.mul_add(half_width, to.y),
    );

    let a = builder.push_vertex(start_left.x, start_left.y);
    let b = builder.push_vertex(start_right.x, start_right.y);
    let c = builder.push_vertex(end_right.x, end_right.y);
    let d = builder.push_vertex(end_left.x, end_left.y);
    builder.push_quad(a, b, c, d);

    if matches!(aperture, ApertureShape::Circle { .. }) {
        let direction_angle = direction_y.atan2(direction_x);
        push_semi_circle(
            builder,
            from,
            half_width,
            direction_angle + FRAC_PI_2,
            direction_angle + PI + FRAC_PI_2,
        );
        push_semi_circle(
            builder,
            to,
            half_width,
            direction_angle - FRAC_PI_2,
            direction_angle + FRAC_PI_2,
        );
    }

    Ok(())
}

fn handle_zero_length_segment(
    builder: &mut GeometryBuilder,
    position: Point,
    aperture: &ApertureShape,
) -> Result<(), GeometryError> {
    if matches!(aperture, ApertureShape::Circle { .. }) {
        return flash_aperture(builder, aperture, position);
    }

    builder.warn("zero-length draw with non-circular aperture; skipping".to_string());
    Ok(())
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-6;

    fn square(size: f64) -> ApertureShape {
        ApertureShape::Rectangle {
            width: size,
            height: size,
        }
    }

    fn draw_and_build(from: Point, to: Point, aperture: ApertureShape) -> crate::geometry::LayerGeometry {
        let mut builder = GeometryBuilder::new();
        let result = draw_linear(&mut builder, from, to, &aperture);
        assert!(result.is_ok(), "expected draw_linear to succeed");
        builder.build()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < EPSILON,
            "expected {expected}, got {actual}"
        );
    }

    fn assert_point(positions: &[f32], index: usize, expected_x: f64, expected_y: f64) {
        let base = index * 2;
        assert_close(f64::from(positions[base]), expected_x);
        assert_close(f64::from(positions[base + 1]), expected_y);
    }

    #[test]
    fn horizontal_line_generates_quad() {
        let geom = draw_and_build(Point::new(0.0, 0.0), Point::new(10.0, 0.0), square(2.0));

        assert_eq!(geom.vertex_count, 4);
        assert_eq!(geom.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_point(&geom.positions, 0, 0.0, 1.0);
        assert_point(&geom.positions, 1, 0.0, -1.0);
        assert_point(&geom.positions, 2, 10.0, -1.0);
        assert_point(&geom.positions, 3, 10.0, 1.0);
    }

    #[test]
    fn vertical_line_generates_quad() {
        let geom = draw_and_build(Point::new(0.0, 0.0), Point::new(0.0, 10.0), square(2.0));

        assert_eq!(geom.vertex_count, 4);
        assert_point(&geom.positions, 0, -1.0, 0.0);
        assert_point(&geom.positions, 1, 1.0, 0.0);
        assert_point(&geom.positions, 2, 1.0, 10.0);
        assert_point(&geom.positions, 3, -1.0, 10.0);
    }

    #[test]
    fn diagonal_line_quad_is_perpendicular_to_direction() {
        let geom = draw_and_build(Point::new(0.0, 0.0), Point::new(3.0, 4.0), square(2.0));

        let edge_x = f64::from(geom.positions[2]) - f64::from(geom.positions[0]);
        let edge_y = f64::from(geom.positions[3]) - f64::from(geom.positions[1]);
        let dot = edge_x.mul_add(3.0 / 5.0, edge_y * (4.0 / 5.0));
        assert_close(dot, 0.0);
    }

    #[test]
    fn zero_length_line_with_circle_aperture_flashes_circle() {
        let geom = draw_and_build(
            Point::new(5.0, 5.0),
            Point::new(5.0, 5.0),
            ApertureShape::Circle { diameter: 1.0 },
        );

        assert_eq!(geom.vertex_count, 32);
        assert_close(geom.bounds.min_x, 4.5);
        assert_close(geom.bounds.max_y, 5.5);
    }

    #[test]
    fn zero_length_line_with_rectangle_warns() {
        let geom = draw_and_build(Point::new(5.0, 5.0), Point::new(5.0, 5.0), square(1.0));
        assert_eq!(geom.vertex_count, 0);
        assert!(geom.warnings.iter().any(|msg| msg.contains("zero-length")));
    }

    #[test]
    fn circular_aperture_adds_rounded_endcaps() {
        let geom = draw_and_build(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            ApertureShape::Circle { diameter: 2.0 },
        );

        assert!(geom.vertex_count > 4);
        assert_close(geom.bounds.min_x, -1.0);
        assert_close(geom.bounds.max_x, 11.0);
        assert_close(geom.bounds.min_y, -1.0);
        assert_close(geom.bounds.max_y, 1.0);
    }

    #[test]
    fn obround_sweeps_with_smaller_dimension() {
        let geom = draw_and_build(
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            ApertureShape::Obround {
                width: 3.0,
                height: 1.0,
            },
        );

        assert_eq!(geom.vertex_count, 4);
        assert_close(geom.bounds.min_y, -0.5);
        assert_close(geom.bounds.max_y, 0.5);
    }
}

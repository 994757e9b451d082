//! Geometry types, bounds aggregation, preview projection and meshing.

pub mod aperture;
pub mod bounds;
pub mod mesh;
pub mod projection;
pub mod stroke;
pub mod types;

pub use aperture::flash_aperture;
pub use bounds::aggregate;
pub use mesh::build_layer_mesh;
pub use projection::{Projection, RenderPrimitive, VIEWBOX_SIZE};
pub use stroke::draw_linear;
pub use types::*;

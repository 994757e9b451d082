//! Gerber text parsing into commands, apertures and bounds.

pub mod parser;
pub mod types;

pub use parser::parse;
pub use types::*;

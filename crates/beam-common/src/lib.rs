//! Common types shared across the beam-profiler crates.

pub mod error;
pub mod grid;
pub mod header;

pub use error::{BeamError, BeamResult};
pub use grid::Grid;
pub use header::{Axis, Header};

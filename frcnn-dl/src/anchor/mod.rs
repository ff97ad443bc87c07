//! Anchor to ground-truth assignment.

mod grid;
mod regression;
mod roi;
mod target;

pub use grid::*;
pub use regression::*;
pub use roi::*;
pub use target::*;

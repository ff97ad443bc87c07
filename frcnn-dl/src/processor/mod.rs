//! Image loading hooks and pixel preprocessing.

mod augment;
mod pixels;

pub use augment::*;
pub use pixels::*;

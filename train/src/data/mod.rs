//! Dataset formats.

mod simple;

pub use simple::*;

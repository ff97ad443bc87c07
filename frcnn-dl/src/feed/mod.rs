//! The endless stream of training samples.

mod sync_iter;
mod training_feed;

pub use sync_iter::*;
pub use training_feed::*;

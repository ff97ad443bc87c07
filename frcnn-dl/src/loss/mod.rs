//! Losses matching the layout of the generated targets.

mod classifier_loss;
mod misc;
mod rpn_loss;

pub use classifier_loss::*;
pub use misc::*;
pub use rpn_loss::*;

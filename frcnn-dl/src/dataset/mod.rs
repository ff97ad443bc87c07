//! Annotation records and class bookkeeping.

mod balancer;
mod class_mapping;
mod record;

pub use balancer::*;
pub use class_mapping::*;
pub use record::*;

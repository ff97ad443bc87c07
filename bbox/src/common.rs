pub use anyhow::{ensure, Result};
pub use num_traits::{Float, Num, ToPrimitive};
pub use std::ops::Mul;

pub use anyhow::{bail, ensure, format_err, Result};
pub use bbox::{prelude::*, Transform, HW, TLBR, TLHW};
pub use indexmap::{IndexMap, IndexSet};
pub use itertools::{iproduct, izip};
pub use label::Label;
pub use log::{debug, info, warn};
pub use ndarray::{s, Array3, Array4, ArrayView3, ArrayView4, Axis, Zip};
pub use noisy_float::prelude::*;
pub use rand::{prelude::*, rngs::StdRng, seq::index::sample as sample_indices};
pub use serde::{Deserialize, Serialize};
pub use std::{
    num::NonZeroUsize,
    path::PathBuf,
    sync::{Arc, Mutex, PoisonError},
};

//! Common imports from external crates.

pub use anyhow::{bail, ensure, format_err, Context, Error, Result};
pub use bbox::{prelude::*, HW};
pub use frcnn_dl::{
    config::{AnchorConfig, FeedConfig},
    dataset::{BoundingBox, ClassMapping, ImageAnnotation},
    feed::{FeedBatch, FeedMode, SyncIter, TrainingFeed, TrainingFeedInit},
    processor::Augment,
};
pub use image::RgbImage;
pub use indexmap::IndexMap;
pub use itertools::Itertools;
pub use label::Label;
pub use log::{debug, info, warn};
pub use ndarray::{Array3, Axis};
pub use rand::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::{
    env,
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::atomic::{AtomicUsize, Ordering},
    thread,
};

//! Training program configuration format.

use crate::common::*;

/// The main training configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub anchor: AnchorConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub augment: AugmentConfig,
    #[serde(default)]
    pub mode: FeedMode,
}

impl Config {
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let text = std::fs::read_to_string(path)?;
        let config = json5::from_str(&text)?;
        Ok(config)
    }
}

/// Dataset options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// The simple-format annotation file, one box per line.
    pub annotation_file: PathBuf,
    /// Relative image paths are resolved against this directory if set.
    pub image_dir: Option<PathBuf>,
}

/// Random augmentation options, applied in train mode only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    pub use_horizontal_flips: bool,
    pub use_vertical_flips: bool,
    /// Rotate by a random multiple of 90 degrees.
    pub rot_90: bool,
}

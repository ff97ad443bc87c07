//! Anchor geometry and training feed options.

use crate::common::*;

/// Mean pixel values subtracted from network input, in BGR order.
pub const DEFAULT_IMG_CHANNEL_MEAN: [f64; 3] = [103.939, 116.779, 123.68];

/// Anchor geometry and target assignment options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorConfig {
    /// The stride of the feature grid in resized-image pixels.
    pub rpn_stride: NonZeroUsize,
    /// Anchor base sizes in pixels.
    pub anchor_box_scales: Vec<R64>,
    /// Anchor (width, height) multiplier pairs.
    pub anchor_box_ratios: Vec<[R64; 2]>,
    /// The number of sampled ROIs per image.
    pub num_rois: NonZeroUsize,
    /// Anchors below this IoU with every box are negatives.
    pub rpn_min_overlap: R64,
    /// Anchors above this IoU with some box are positives.
    pub rpn_max_overlap: R64,
    /// ROI candidates below this IoU are discarded.
    pub classifier_min_overlap: R64,
    /// ROI candidates at or above this IoU are positives.
    pub classifier_max_overlap: R64,
    /// The cap of valid positive anchors in the classification grid.
    pub max_positive_anchors: usize,
    /// The cap of valid anchors in the classification grid.
    pub anchor_batch_size: usize,
}

impl AnchorConfig {
    pub fn num_anchors(&self) -> usize {
        self.anchor_box_scales.len() * self.anchor_box_ratios.len()
    }

    /// Anchor shapes as `[width, height]` in pixels.
    ///
    /// The anchor at scale `i` and ratio `j` has index
    /// `j + i * anchor_box_ratios.len()`.
    pub fn anchor_shapes(&self) -> Vec<[f64; 2]> {
        iproduct!(&self.anchor_box_scales, &self.anchor_box_ratios)
            .map(|(scale, [rw, rh])| [(*scale * *rw).raw(), (*scale * *rh).raw()])
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.anchor_box_scales.is_empty() && !self.anchor_box_ratios.is_empty(),
            "anchor_box_scales and anchor_box_ratios must not be empty"
        );
        ensure!(
            self.anchor_box_scales.iter().all(|&scale| scale > 0.0),
            "anchor_box_scales must be positive"
        );
        ensure!(
            self.anchor_box_ratios
                .iter()
                .flatten()
                .all(|&ratio| ratio > 0.0),
            "anchor_box_ratios must be positive"
        );
        ensure!(
            self.rpn_min_overlap <= self.rpn_max_overlap,
            "rpn_min_overlap must not exceed rpn_max_overlap"
        );
        ensure!(
            self.classifier_min_overlap <= self.classifier_max_overlap,
            "classifier_min_overlap must not exceed classifier_max_overlap"
        );
        ensure!(
            self.max_positive_anchors <= self.anchor_batch_size,
            "max_positive_anchors must not exceed anchor_batch_size"
        );
        Ok(())
    }
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            rpn_stride: NonZeroUsize::new(16).unwrap(),
            anchor_box_scales: vec![r64(128.0), r64(256.0), r64(512.0)],
            anchor_box_ratios: vec![
                [r64(1.0), r64(1.0)],
                [r64(1.0), r64(2.0)],
                [r64(2.0), r64(1.0)],
            ],
            num_rois: NonZeroUsize::new(4).unwrap(),
            rpn_min_overlap: r64(0.3),
            rpn_max_overlap: r64(0.7),
            classifier_min_overlap: r64(0.1),
            classifier_max_overlap: r64(0.5),
            max_positive_anchors: 128,
            anchor_batch_size: 256,
        }
    }
}

/// Training feed options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// The length of the shorter image side after resizing.
    pub im_size: NonZeroUsize,
    /// If set, skip images so that classes take round-robin turns.
    pub balanced_classes: bool,
    /// Per-channel mean pixel values in BGR order.
    pub img_channel_mean: [R64; 3],
    /// Seeds shuffling and sampling. Drawn from entropy if unset.
    pub seed: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        let [b, g, r] = DEFAULT_IMG_CHANNEL_MEAN;
        Self {
            im_size: NonZeroUsize::new(600).unwrap(),
            balanced_classes: false,
            img_channel_mean: [r64(b), r64(g), r64(r)],
            seed: None,
        }
    }
}

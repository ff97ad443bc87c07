use super::{AnchorGrid, AnchorLoc, RegressionTarget, RoiCandidate, RoiCandidates, RoiTargets};
use crate::{
    common::*,
    config::AnchorConfig,
    dataset::{ClassMapping, ImageAnnotation},
    utils::project_output_size,
};

/// The training targets of one image.
#[derive(Debug, Clone)]
pub struct AnchorTargets {
    /// `[1, num_rois, 4]`
    pub rois: Array3<f32>,
    /// `[1, 2 * num_anchors, out_h, out_w]`
    pub rpn_cls: Array4<f32>,
    /// `[1, 8 * num_anchors, out_h, out_w]`
    pub rpn_regr: Array4<f32>,
    /// `[1, num_rois, num_classes]`
    pub class_onehot: Array3<f32>,
    /// `[1, num_rois, 8]`
    pub class_regr: Array3<f32>,
}

#[derive(Debug, Clone)]
pub struct AnchorTargetBuilderInit {
    pub config: AnchorConfig,
    pub class_mapping: ClassMapping,
}

impl AnchorTargetBuilderInit {
    pub fn build(self) -> Result<AnchorTargetBuilder> {
        let Self {
            config,
            class_mapping,
        } = self;
        config.validate()?;

        Ok(AnchorTargetBuilder {
            anchor_shapes: config.anchor_shapes(),
            config,
            class_mapping,
        })
    }
}

/// Assigns anchors to ground-truth boxes and samples training targets.
#[derive(Debug, Clone)]
pub struct AnchorTargetBuilder {
    config: AnchorConfig,
    class_mapping: ClassMapping,
    anchor_shapes: Vec<[f64; 2]>,
}

/// A ground-truth box rescaled to the resized image.
#[derive(Debug)]
struct GroundTruth {
    rect: TLBR<f64>,
    class: usize,
    is_background: bool,
}

/// The best anchor seen so far for a ground-truth box.
#[derive(Debug, Clone, Copy)]
struct BestAnchor {
    iou: f64,
    loc: AnchorLoc,
    regression: RegressionTarget,
}

#[derive(Debug, Default)]
struct GroundTruthMatch {
    num_positive_anchors: usize,
    best: Option<BestAnchor>,
}

impl GroundTruthMatch {
    fn best_iou(&self) -> f64 {
        self.best.map(|best| best.iou).unwrap_or(0.0)
    }
}

impl AnchorTargetBuilder {
    pub fn config(&self) -> &AnchorConfig {
        &self.config
    }

    pub fn class_mapping(&self) -> &ClassMapping {
        &self.class_mapping
    }

    pub fn num_anchors(&self) -> usize {
        self.anchor_shapes.len()
    }

    /// Builds the targets of one image resized to `resized`.
    ///
    /// Returns `Ok(None)` when no anchor overlaps any box well enough to
    /// make a positive ROI, in which case the image should be skipped.
    pub fn build<R>(
        &self,
        annotation: &ImageAnnotation,
        resized: &HW<usize>,
        rng: &mut R,
    ) -> Result<Option<AnchorTargets>>
    where
        R: Rng + ?Sized,
    {
        let AnchorConfig {
            rpn_stride,
            num_rois,
            rpn_min_overlap,
            rpn_max_overlap,
            classifier_min_overlap,
            classifier_max_overlap,
            max_positive_anchors,
            anchor_batch_size,
            ..
        } = self.config;
        let rpn_min_overlap = rpn_min_overlap.raw();
        let rpn_max_overlap = rpn_max_overlap.raw();
        let classifier_min_overlap = classifier_min_overlap.raw();
        let classifier_max_overlap = classifier_max_overlap.raw();
        let downscale = rpn_stride.get() as f64;

        let plane = resized.to_f64();
        let (output_w, output_h) = project_output_size(resized.w(), resized.h());

        let ground_truths = self.rescale_ground_truths(annotation, resized)?;
        let mut matches: Vec<GroundTruthMatch> = ground_truths
            .iter()
            .map(|_| GroundTruthMatch::default())
            .collect();
        let mut grid = AnchorGrid::new(self.num_anchors(), output_h, output_w);
        let mut candidates = RoiCandidates::default();

        for (anchor_index, &[anchor_w, anchor_h]) in self.anchor_shapes.iter().enumerate() {
            for col in 0..output_w {
                let x1 = downscale * (col as f64 + 0.5) - anchor_w / 2.0;
                let x2 = downscale * (col as f64 + 0.5) + anchor_w / 2.0;

                for row in 0..output_h {
                    let y1 = downscale * (row as f64 + 0.5) - anchor_h / 2.0;
                    let y2 = downscale * (row as f64 + 0.5) + anchor_h / 2.0;
                    let anchor = TLBR::from_tlbr([y1, x1, y2, x2]);

                    // anchors crossing the image boundary are ignored
                    if !plane.contains(&anchor) {
                        continue;
                    }

                    let loc = AnchorLoc {
                        row,
                        col,
                        anchor: anchor_index,
                    };
                    let grid_rect = TLHW::from_tlhw([
                        (y1 / downscale).trunc(),
                        (x1 / downscale).trunc(),
                        ((y2 - y1) / downscale).trunc(),
                        ((x2 - x1) / downscale).trunc(),
                    ]);

                    let mut is_neutral = false;
                    // the closest box among those this anchor is positive for
                    let mut positive: Option<(f64, RegressionTarget)> = None;

                    for (gt, gt_match) in izip!(&ground_truths, &mut matches) {
                        let iou = anchor.try_iou_with(&gt.rect)?;
                        let regression = RegressionTarget::encode(&anchor, &gt.rect);

                        if !gt.is_background {
                            if iou > gt_match.best_iou() {
                                gt_match.best = Some(BestAnchor {
                                    iou,
                                    loc,
                                    regression,
                                });
                            }

                            if iou > rpn_max_overlap {
                                gt_match.num_positive_anchors += 1;

                                match positive {
                                    Some((best_iou, _)) if best_iou >= iou => {}
                                    _ => positive = Some((iou, regression)),
                                }
                            } else if rpn_min_overlap < iou && iou < rpn_max_overlap {
                                is_neutral = true;
                            }
                        }

                        if iou < classifier_min_overlap {
                            // easy negative, not worth a ROI
                        } else if iou < classifier_max_overlap {
                            candidates.negatives.push(grid_rect);
                        } else {
                            candidates.positives.push(RoiCandidate {
                                rect: grid_rect,
                                class: gt.class,
                                regression,
                            });
                        }
                    }

                    match positive {
                        Some((_, regression)) => grid.set_positive(loc, &regression),
                        None if is_neutral => {}
                        None => grid.set_negative(loc),
                    }
                }
            }
        }

        if candidates.positives.is_empty() {
            debug!(
                "no positive ROI candidate in image '{}'",
                annotation.path.display()
            );
            return Ok(None);
        }

        // every box gets at least one positive anchor
        matches
            .iter()
            .filter(|gt_match| gt_match.num_positive_anchors == 0)
            .filter_map(|gt_match| gt_match.best)
            .for_each(|best| grid.set_positive(best.loc, &best.regression));

        let RoiTargets {
            rois,
            class_onehot,
            class_regr,
        } = candidates.sample(num_rois.get(), &self.class_mapping, rng)?;

        grid.subsample(max_positive_anchors, anchor_batch_size, rng);
        let (rpn_cls, rpn_regr) = grid.into_tensors()?;

        Ok(Some(AnchorTargets {
            rois,
            rpn_cls,
            rpn_regr,
            class_onehot,
            class_regr,
        }))
    }

    fn rescale_ground_truths(
        &self,
        annotation: &ImageAnnotation,
        resized: &HW<usize>,
    ) -> Result<Vec<GroundTruth>> {
        let background = self.class_mapping.background_index();
        let transform = Transform::from_sizes_exact(annotation.size.to_f64(), resized.to_f64());

        annotation
            .bboxes
            .iter()
            .map(|bbox| {
                let Label { rect, class } = &transform * bbox;
                let class = self
                    .class_mapping
                    .index_of(&class)
                    .ok_or_else(|| format_err!("unknown class name '{}'", class))?;
                Ok(GroundTruth {
                    rect,
                    class,
                    is_background: class == background,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{bounding_box, BACKGROUND_CLASS};
    use approx::abs_diff_eq;

    fn builder(classes: &[&str]) -> AnchorTargetBuilder {
        AnchorTargetBuilderInit {
            config: AnchorConfig::default(),
            class_mapping: ClassMapping::new(classes.iter().copied()),
        }
        .build()
        .unwrap()
    }

    fn annotation(width: usize, height: usize, boxes: &[(&str, [f64; 4])]) -> ImageAnnotation {
        let bboxes = boxes
            .iter()
            .map(|(class, xyxy)| bounding_box(*class, *xyxy).unwrap())
            .collect();
        ImageAnnotation::new("image.jpg", width, height, bboxes).unwrap()
    }

    fn count_rpn_positives(rpn_cls: &Array4<f32>, num_anchors: usize) -> usize {
        let valid = rpn_cls.slice(s![0, ..num_anchors, .., ..]);
        let object = rpn_cls.slice(s![0, num_anchors.., .., ..]);
        Zip::from(&valid)
            .and(&object)
            .fold(0, |count, &valid, &object| {
                count + (valid == 1.0 && object == 1.0) as usize
            })
    }

    /// A single 128x128 anchor shape with grid subsampling disabled, so
    /// every assigned label stays visible.
    fn dense_builder(classes: &[&str]) -> AnchorTargetBuilder {
        AnchorTargetBuilderInit {
            config: AnchorConfig {
                anchor_box_scales: vec![r64(128.0)],
                anchor_box_ratios: vec![[r64(1.0), r64(1.0)]],
                max_positive_anchors: 100_000,
                anchor_batch_size: 100_000,
                ..Default::default()
            },
            class_mapping: ClassMapping::new(classes.iter().copied()),
        }
        .build()
        .unwrap()
    }

    /// Returns `(is_valid, has_object)` of the anchor at `row` and `col`
    /// of a single-shape grid.
    fn rpn_label(targets: &AnchorTargets, row: usize, col: usize) -> (f32, f32) {
        (
            targets.rpn_cls[[0, 0, row, col]],
            targets.rpn_cls[[0, 1, row, col]],
        )
    }

    /// Returns the regression deltas at `row` and `col` of a single-shape
    /// grid.
    fn rpn_deltas(targets: &AnchorTargets, row: usize, col: usize) -> Vec<f32> {
        targets.rpn_regr.slice(s![0, 4..8, row, col]).to_vec()
    }

    #[test]
    fn single_box_targets() {
        let builder = builder(&["cat"]);
        let annotation = annotation(400, 300, &[("cat", [50.0, 50.0, 150.0, 150.0])]);
        let resized = HW::from_hw([600, 800]);
        let mut rng = StdRng::seed_from_u64(1);

        let targets = builder
            .build(&annotation, &resized, &mut rng)
            .unwrap()
            .unwrap();

        assert_eq!(targets.rpn_cls.shape(), &[1, 18, 38, 50]);
        assert_eq!(targets.rpn_regr.shape(), &[1, 72, 38, 50]);
        assert_eq!(targets.rois.shape(), &[1, 4, 4]);
        assert_eq!(targets.class_onehot.shape(), &[1, 4, 2]);
        assert_eq!(targets.class_regr.shape(), &[1, 4, 8]);

        // no anchor passes 0.7 IoU, so only the best one is forced positive
        assert_eq!(count_rpn_positives(&targets.rpn_cls, 9), 1);
        let num_valid = targets
            .rpn_cls
            .slice(s![0, ..9, .., ..])
            .iter()
            .filter(|&&valid| valid == 1.0)
            .count();
        assert_eq!(num_valid, 256);

        // the first 256x256 anchor enclosing the box, at row 11 and column 11
        let anchor = 3;
        assert_eq!(targets.rpn_cls[[0, 9 + anchor, 11, 11]], 1.0);
        for channel in 4 * anchor..4 * (anchor + 1) {
            assert_eq!(targets.rpn_regr[[0, channel, 11, 11]], 1.0);
        }
        let tx = targets.rpn_regr[[0, 36 + 4 * anchor, 11, 11]];
        let tw = targets.rpn_regr[[0, 36 + 4 * anchor + 2, 11, 11]];
        assert!(abs_diff_eq!(tx, 44.0 / 256.0, epsilon = 1e-6));
        assert!(abs_diff_eq!(tw, (200.0f32 / 256.0).ln(), epsilon = 1e-6));

        let num_positive_rois = (0..4)
            .filter(|&index| targets.class_onehot[[0, index, 0]] == 1.0)
            .count();
        assert!((1..=2).contains(&num_positive_rois));
        for index in 0..4 {
            let is_positive = targets.class_onehot[[0, index, 0]] == 1.0;
            assert_eq!(targets.class_onehot[[0, index, 1]] == 1.0, !is_positive);
            assert_eq!(targets.class_regr[[0, index, 0]] == 1.0, is_positive);
        }
    }

    #[test]
    fn tiny_box_yields_no_targets() {
        let builder = builder(&["cat"]);
        let annotation = annotation(800, 600, &[("cat", [0.0, 0.0, 10.0, 10.0])]);
        let mut rng = StdRng::seed_from_u64(1);

        let targets = builder
            .build(&annotation, &HW::from_hw([600, 800]), &mut rng)
            .unwrap();
        assert!(targets.is_none());
    }

    #[test]
    fn background_box_only_feeds_roi_sampling() {
        let builder = builder(&["cat"]);
        let annotation = annotation(
            800,
            600,
            &[(BACKGROUND_CLASS, [72.0, 72.0, 328.0, 328.0])],
        );
        let mut rng = StdRng::seed_from_u64(1);

        let targets = builder
            .build(&annotation, &HW::from_hw([600, 800]), &mut rng)
            .unwrap()
            .unwrap();

        assert_eq!(count_rpn_positives(&targets.rpn_cls, 9), 0);
        assert!(targets.class_regr.iter().all(|&value| value == 0.0));
        for index in 0..4 {
            assert_eq!(targets.class_onehot[[0, index, 1]], 1.0);
        }
    }

    #[test]
    fn boundary_anchors_are_ignored() {
        let builder = builder(&["cat"]);
        let annotation = annotation(800, 600, &[("cat", [100.0, 100.0, 300.0, 300.0])]);
        let mut rng = StdRng::seed_from_u64(1);

        let targets = builder
            .build(&annotation, &HW::from_hw([600, 800]), &mut rng)
            .unwrap()
            .unwrap();

        // a 128x128 anchor at column 0 spans x in [-56, 72]
        assert_eq!(targets.rpn_cls[[0, 0, 10, 0]], 0.0);
        // and the 1024x512 anchors never fit in an 800 pixel wide image
        assert!(targets
            .rpn_cls
            .slice(s![0, 8, .., ..])
            .iter()
            .all(|&valid| valid == 0.0));
    }

    #[test]
    fn unknown_class_is_an_error() {
        let builder = builder(&["cat"]);
        let annotation = annotation(800, 600, &[("dog", [100.0, 100.0, 300.0, 300.0])]);
        let mut rng = StdRng::seed_from_u64(1);

        assert!(builder
            .build(&annotation, &HW::from_hw([600, 800]), &mut rng)
            .is_err());
    }

    #[test]
    fn overlap_band_edges() {
        let builder = dense_builder(&["cat"]);
        // The anchor at row 10 and column 10 spans [104, 232] on both axes.
        // The first box shares its rows and 112 of its columns, an IoU of
        // exactly 0.7. The second box sits around the anchor at row 25 and
        // column 35 with an IoU of exactly 0.3.
        let annotation = annotation(
            800,
            600,
            &[
                ("cat", [120.0, 104.0, 264.0, 232.0]),
                ("cat", [584.0, 344.0, 664.0, 472.0]),
            ],
        );
        let mut rng = StdRng::seed_from_u64(1);

        let targets = builder
            .build(&annotation, &HW::from_hw([600, 800]), &mut rng)
            .unwrap()
            .unwrap();

        // IoU 0.7 and IoU 0.3 are both negatives
        assert_eq!(rpn_label(&targets, 10, 10), (1.0, 0.0));
        assert_eq!(rpn_label(&targets, 25, 35), (1.0, 0.0));
        // IoU 96/176 lies in the neutral band
        assert_eq!(rpn_label(&targets, 10, 9), (0.0, 0.0));
        // IoU 128/144 is positive
        assert_eq!(rpn_label(&targets, 10, 11), (1.0, 1.0));
        // IoU 64/144 is neutral, and the second box gets its best anchor,
        // IoU 80/128, forced positive
        assert_eq!(rpn_label(&targets, 25, 36), (0.0, 0.0));
        assert_eq!(rpn_label(&targets, 25, 37), (1.0, 1.0));
    }

    #[test]
    fn closest_box_wins_shared_anchor() {
        let builder = dense_builder(&["cat"]);
        // both boxes pass 0.7 IoU on the anchor spanning [104, 232]: the
        // wide one with 128/144, the narrow one with 120/128
        let annotation = annotation(
            800,
            600,
            &[
                ("cat", [104.0, 104.0, 248.0, 232.0]),
                ("cat", [112.0, 104.0, 232.0, 232.0]),
            ],
        );
        let mut rng = StdRng::seed_from_u64(1);

        let targets = builder
            .build(&annotation, &HW::from_hw([600, 800]), &mut rng)
            .unwrap()
            .unwrap();

        assert_eq!(rpn_label(&targets, 10, 10), (1.0, 1.0));
        let deltas = rpn_deltas(&targets, 10, 10);
        assert!(abs_diff_eq!(deltas[0], 8.0 / 128.0, epsilon = 1e-6));
        assert!(abs_diff_eq!(deltas[1], 0.0, epsilon = 1e-6));
        assert!(abs_diff_eq!(deltas[2], (120.0f32 / 128.0).ln(), epsilon = 1e-6));
        assert!(abs_diff_eq!(deltas[3], 0.0, epsilon = 1e-6));
    }

    #[test]
    fn matched_boxes_are_not_forced() {
        let builder = dense_builder(&["cat"]);
        // Both boxes have positive anchors and share their best anchor at
        // row 10 and column 10. Forcing the wide box, listed last, there
        // would overwrite the deltas of the closer narrow box.
        let annotation = annotation(
            800,
            600,
            &[
                ("cat", [112.0, 104.0, 232.0, 232.0]),
                ("cat", [104.0, 104.0, 248.0, 232.0]),
            ],
        );
        let mut rng = StdRng::seed_from_u64(1);

        let targets = builder
            .build(&annotation, &HW::from_hw([600, 800]), &mut rng)
            .unwrap()
            .unwrap();

        let deltas = rpn_deltas(&targets, 10, 10);
        assert!(abs_diff_eq!(deltas[0], 8.0 / 128.0, epsilon = 1e-6));
        assert!(abs_diff_eq!(deltas[2], (120.0f32 / 128.0).ln(), epsilon = 1e-6));
    }
}

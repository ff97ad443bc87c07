use super::RegressionTarget;
use crate::{common::*, dataset::ClassMapping};

/// A positive ROI candidate, an anchor overlapping a box well enough.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiCandidate {
    /// The anchor in feature-grid units.
    pub rect: TLHW<f64>,
    /// The class index of the matched box.
    pub class: usize,
    pub regression: RegressionTarget,
}

/// ROI candidates collected from every (anchor, box) pair.
#[derive(Debug, Clone, Default)]
pub struct RoiCandidates {
    pub positives: Vec<RoiCandidate>,
    /// Partially overlapping anchors in feature-grid units.
    pub negatives: Vec<TLHW<f64>>,
}

/// The sampled ROI batch and its classifier targets.
#[derive(Debug, Clone)]
pub struct RoiTargets {
    /// `[1, num_rois, 4]` boxes as (x, y, w, h) in feature-grid units.
    pub rois: Array3<f32>,
    /// `[1, num_rois, num_classes]` one-hot classes, background last.
    pub class_onehot: Array3<f32>,
    /// `[1, num_rois, 8]` regression mask then regression target.
    pub class_regr: Array3<f32>,
}

impl RoiCandidates {
    /// Samples up to `num_rois / 2` positives and fills the rest of the
    /// `num_rois` budget with negatives.
    ///
    /// It fails if there are not enough negatives to fill the budget.
    pub fn sample<R>(
        &self,
        num_rois: usize,
        class_mapping: &ClassMapping,
        rng: &mut R,
    ) -> Result<RoiTargets>
    where
        R: Rng + ?Sized,
    {
        let target_positives = num_rois / 2;
        let positives: Vec<&RoiCandidate> = if self.positives.len() > target_positives {
            sample_indices(rng, self.positives.len(), target_positives)
                .into_iter()
                .map(|index| &self.positives[index])
                .collect()
        } else {
            self.positives.iter().collect()
        };

        let num_negatives = num_rois - positives.len();
        ensure!(
            self.negatives.len() >= num_negatives,
            "{} negative ROIs are required but only {} candidates are found",
            num_negatives,
            self.negatives.len()
        );
        let negatives: Vec<&TLHW<f64>> = sample_indices(rng, self.negatives.len(), num_negatives)
            .into_iter()
            .map(|index| &self.negatives[index])
            .collect();

        let num_classes = class_mapping.len();
        let background = class_mapping.background_index();
        let mut rois = Array3::<f32>::zeros((1, num_rois, 4));
        let mut class_onehot = Array3::<f32>::zeros((1, num_rois, num_classes));
        let mut class_regr = Array3::<f32>::zeros((1, num_rois, 8));

        let rects = positives
            .iter()
            .map(|candidate| &candidate.rect)
            .chain(negatives.iter().copied());
        rects.enumerate().for_each(|(index, rect)| {
            let values = [rect.l(), rect.t(), rect.w(), rect.h()];
            rois.slice_mut(s![0, index, ..])
                .iter_mut()
                .zip(values)
                .for_each(|(dst, src)| *dst = src as f32);
        });

        positives.iter().enumerate().for_each(|(index, candidate)| {
            class_onehot[[0, index, candidate.class]] = 1.0;

            if candidate.class != background {
                class_regr.slice_mut(s![0, index, ..4]).fill(1.0);
                class_regr
                    .slice_mut(s![0, index, 4..])
                    .iter_mut()
                    .zip(candidate.regression.to_array())
                    .for_each(|(dst, src)| *dst = src);
            }
        });
        (positives.len()..num_rois).for_each(|index| {
            class_onehot[[0, index, background]] = 1.0;
        });

        Ok(RoiTargets {
            rois,
            class_onehot,
            class_regr,
        })
    }
}

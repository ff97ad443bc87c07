use super::{clip_probability, smooth_l1, LAMBDA_CLS_CLASS, LAMBDA_CLS_REGR};
use crate::common::*;

/// Smooth L1 loss of the per-ROI regression head.
#[derive(Debug, Clone)]
pub struct ClassRegressionLoss {
    pub num_rois: usize,
}

impl ClassRegressionLoss {
    /// `input` has shape `[batch, num_rois, K]`, `target` has shape
    /// `[batch, num_rois, 2K]` with the mask in the first half.
    pub fn forward(&self, input: ArrayView3<f32>, target: ArrayView3<f32>) -> Result<f32> {
        let (batch_size, num_rois, num_values) = input.dim();
        ensure!(
            num_rois == self.num_rois,
            "expect {} ROIs, but get {}",
            self.num_rois,
            num_rois
        );
        ensure!(
            target.dim() == (batch_size, num_rois, 2 * num_values),
            "target shape {:?} does not match input shape {:?}",
            target.shape(),
            input.shape()
        );

        let mask = target.slice(s![.., .., ..num_values]);
        let deltas = target.slice(s![.., .., num_values..]);
        let sum = Zip::from(&mask)
            .and(&deltas)
            .and(&input)
            .fold(0.0, |sum, &mask, &delta, &pred| {
                sum + mask * smooth_l1(delta - pred)
            });

        Ok(LAMBDA_CLS_REGR * sum / self.num_rois as f32)
    }
}

/// Categorical cross entropy of the per-ROI class head, averaged over ROIs.
#[derive(Debug, Clone, Default)]
pub struct ClassClassificationLoss;

impl ClassClassificationLoss {
    /// `input` holds class probabilities and `target` one-hot classes, both
    /// of shape `[batch, num_rois, num_classes]`.
    pub fn forward(&self, input: ArrayView3<f32>, target: ArrayView3<f32>) -> Result<f32> {
        ensure!(
            input.dim() == target.dim(),
            "target shape {:?} does not match input shape {:?}",
            target.shape(),
            input.shape()
        );
        let (batch_size, num_rois, _) = input.dim();
        let num_samples = batch_size * num_rois;
        if num_samples == 0 {
            return Ok(0.0);
        }

        let sum: f32 = input
            .lanes(Axis(2))
            .into_iter()
            .zip(target.lanes(Axis(2)))
            .map(|(probs, onehot)| {
                let total = probs.sum();
                probs
                    .iter()
                    .zip(onehot)
                    .map(|(&prob, &truth)| -truth * clip_probability(prob / total).ln())
                    .sum::<f32>()
            })
            .sum();

        Ok(LAMBDA_CLS_CLASS * sum / num_samples as f32)
    }
}

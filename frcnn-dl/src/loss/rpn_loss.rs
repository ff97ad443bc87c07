use super::{
    clip_probability, smooth_l1, LAMBDA_RPN_CLASS, LAMBDA_RPN_REGR, RPN_NORMALIZER,
};
use crate::common::*;

/// Smooth L1 loss of the RPN regression head over positive anchors.
#[derive(Debug, Clone)]
pub struct RpnRegressionLoss {
    pub num_anchors: usize,
}

impl RpnRegressionLoss {
    /// `input` has shape `[batch, 4A, H, W]`, `target` has shape
    /// `[batch, 8A, H, W]` with the mask in the first half.
    pub fn forward(&self, input: ArrayView4<f32>, target: ArrayView4<f32>) -> Result<f32> {
        let num_channels = 4 * self.num_anchors;
        let (batch_size, _, height, width) = input.dim();
        ensure!(
            input.dim() == (batch_size, num_channels, height, width),
            "expect {} input channels, but get {}",
            num_channels,
            input.shape()[1]
        );
        ensure!(
            target.dim() == (batch_size, 2 * num_channels, height, width),
            "target shape {:?} does not match input shape {:?}",
            target.shape(),
            input.shape()
        );

        let mask = target.slice(s![.., ..num_channels, .., ..]);
        let deltas = target.slice(s![.., num_channels.., .., ..]);
        let sum = Zip::from(&mask)
            .and(&deltas)
            .and(&input)
            .fold(0.0, |sum, &mask, &delta, &pred| {
                sum + mask * smooth_l1(delta - pred)
            });

        Ok(LAMBDA_RPN_REGR * sum / RPN_NORMALIZER)
    }
}

/// Binary cross entropy of the RPN objectness head over valid anchors.
#[derive(Debug, Clone)]
pub struct RpnClassificationLoss {
    pub num_anchors: usize,
}

impl RpnClassificationLoss {
    /// `input` holds objectness probabilities of shape `[batch, A, H, W]`,
    /// `target` has shape `[batch, 2A, H, W]` with validity then objectness.
    pub fn forward(&self, input: ArrayView4<f32>, target: ArrayView4<f32>) -> Result<f32> {
        let num_anchors = self.num_anchors;
        let (batch_size, _, height, width) = input.dim();
        ensure!(
            input.dim() == (batch_size, num_anchors, height, width),
            "expect {} input channels, but get {}",
            num_anchors,
            input.shape()[1]
        );
        ensure!(
            target.dim() == (batch_size, 2 * num_anchors, height, width),
            "target shape {:?} does not match input shape {:?}",
            target.shape(),
            input.shape()
        );

        let valid = target.slice(s![.., ..num_anchors, .., ..]);
        let object = target.slice(s![.., num_anchors.., .., ..]);
        let sum = Zip::from(&valid)
            .and(&object)
            .and(&input)
            .fold(0.0, |sum, &valid, &object, &prob| {
                let prob = clip_probability(prob);
                let bce = -(object * prob.ln() + (1.0 - object) * (1.0 - prob).ln());
                sum + valid * bce
            });

        Ok(LAMBDA_RPN_CLASS * sum / RPN_NORMALIZER)
    }
}

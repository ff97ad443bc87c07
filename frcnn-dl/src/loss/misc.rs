pub const LAMBDA_RPN_REGR: f32 = 10.0;
pub const LAMBDA_RPN_CLASS: f32 = 1.0;
pub const LAMBDA_CLS_REGR: f32 = 10.0;
pub const LAMBDA_CLS_CLASS: f32 = 1.0;

/// The fixed normalizer of the RPN losses, the sampled anchor batch size.
pub const RPN_NORMALIZER: f32 = 256.0;

/// Probabilities are clipped to `[EPSILON, 1 - EPSILON]` before taking logs.
pub const EPSILON: f32 = 1e-7;

/// Smooth L1 with the knee at 1.
pub fn smooth_l1(diff: f32) -> f32 {
    let abs = diff.abs();
    if abs <= 1.0 {
        0.5 * diff * diff
    } else {
        abs - 0.5
    }
}

pub(crate) fn clip_probability(prob: f32) -> f32 {
    prob.clamp(EPSILON, 1.0 - EPSILON)
}

use crate::common::*;

/// Filter sizes of the stride-2 stages of the backbone.
const BACKBONE_FILTER_SIZES: [usize; 4] = [7, 3, 1, 1];
const BACKBONE_STRIDE: usize = 2;
const BACKBONE_ZERO_PAD: usize = 6;

/// Projects an input image size onto the backbone feature map size.
///
/// Returns `(output_width, output_height)`.
pub fn project_output_size(width: usize, height: usize) -> (usize, usize) {
    fn project(length: usize) -> usize {
        BACKBONE_FILTER_SIZES
            .iter()
            .fold(length + BACKBONE_ZERO_PAD, |length, &filter_size| {
                (length + BACKBONE_STRIDE).saturating_sub(filter_size) / BACKBONE_STRIDE
            })
    }

    (project(width), project(height))
}

/// Scales `(width, height)` so that the shorter side equals `short_side`.
///
/// Returns `(resized_width, resized_height)`. The longer side is truncated.
pub fn rescale_to_short_side(width: usize, height: usize, short_side: usize) -> (usize, usize) {
    if width <= height {
        let scale = short_side as f64 / width as f64;
        (short_side, (scale * height as f64) as usize)
    } else {
        let scale = short_side as f64 / height as f64;
        ((scale * width as f64) as usize, short_side)
    }
}

/// Like [rescale_to_short_side] on a [HW] size.
pub fn rescale_size_to_short_side(size: &HW<usize>, short_side: usize) -> HW<usize> {
    let (width, height) = rescale_to_short_side(size.w(), size.h(), short_side);
    HW::from_hw([height, width])
}

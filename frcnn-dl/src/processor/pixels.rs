use crate::common::*;
use image::{imageops::FilterType, ImageBuffer, Rgb};

/// Resizes a `[height, width, 3]` image to `size` with cubic interpolation.
pub fn resize_image(image: ArrayView3<u8>, size: &HW<usize>) -> Result<Array3<u8>> {
    let (height, width, channels) = image.dim();
    ensure!(
        channels == 3,
        "expect 3 channels, but get {} channels",
        channels
    );

    if height == size.h() && width == size.w() {
        return Ok(image.to_owned());
    }

    let pixels = image.as_standard_layout().into_owned().into_raw_vec();
    // channel order is irrelevant to resampling
    let buffer: ImageBuffer<Rgb<u8>, _> =
        ImageBuffer::from_raw(width as u32, height as u32, pixels)
            .ok_or_else(|| format_err!("image buffer does not match its size"))?;
    let resized = image::imageops::resize(
        &buffer,
        size.w() as u32,
        size.h() as u32,
        FilterType::CatmullRom,
    );

    let resized = Array3::from_shape_vec((size.h(), size.w(), 3), resized.into_raw())?;
    Ok(resized)
}

/// Converts a `[height, width, 3]` BGR image to a `[1, 3, height, width]`
/// network input with per-channel mean subtracted.
pub fn to_input_tensor(image: ArrayView3<u8>, mean: &[R64; 3]) -> Result<Array4<f32>> {
    let (_, _, channels) = image.dim();
    ensure!(
        channels == 3,
        "expect 3 channels, but get {} channels",
        channels
    );

    let mut tensor = image.mapv(f32::from).permuted_axes([2, 0, 1]);
    tensor
        .axis_iter_mut(Axis(0))
        .zip(mean)
        .for_each(|(mut channel, mean)| channel -= mean.raw() as f32);

    Ok(tensor
        .as_standard_layout()
        .into_owned()
        .insert_axis(Axis(0)))
}

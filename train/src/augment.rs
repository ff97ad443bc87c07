//! Image file loading with random flips and rotations.

use crate::{common::*, config::AugmentConfig};

/// Rotation by a multiple of 90 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rotation {
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    const ALL: [Rotation; 4] = [Self::Deg0, Self::Deg90, Self::Deg180, Self::Deg270];
}

/// Loads images from disk and applies the configured augmentations.
#[derive(Debug, Clone)]
pub struct FileAugmenter {
    config: AugmentConfig,
}

impl FileAugmenter {
    pub fn new(config: AugmentConfig) -> Self {
        Self { config }
    }
}

impl Augment for FileAugmenter {
    fn augment(
        &self,
        annotation: &ImageAnnotation,
        augment: bool,
        rng: &mut dyn RngCore,
    ) -> Result<(ImageAnnotation, Array3<u8>)> {
        let AugmentConfig {
            use_horizontal_flips,
            use_vertical_flips,
            rot_90,
        } = self.config;

        let image = load_bgr_image(&annotation.path)?;
        let mut sample = (annotation.clone(), image);

        if augment {
            if use_horizontal_flips && rng.gen_bool(0.5) {
                sample = horizontal_flip(sample)?;
            }
            if use_vertical_flips && rng.gen_bool(0.5) {
                sample = vertical_flip(sample)?;
            }
            if rot_90 {
                let rotation = *Rotation::ALL
                    .choose(rng)
                    .ok_or_else(|| format_err!("no rotation to choose from"))?;
                sample = rotate(sample, rotation)?;
            }
        }

        let (annotation, image) = sample;
        Ok((annotation, image.as_standard_layout().into_owned()))
    }
}

/// Reads an image file into a `[height, width, 3]` BGR array.
pub fn load_bgr_image(path: &Path) -> Result<Array3<u8>> {
    let mut image: RgbImage = image::open(path)
        .with_context(|| format!("unable to open image '{}'", path.display()))?
        .to_rgb8();
    image.pixels_mut().for_each(|pixel| pixel.0.swap(0, 2));

    let (width, height) = image.dimensions();
    let array = Array3::from_shape_vec((height as usize, width as usize, 3), image.into_raw())?;
    Ok(array)
}

/// Maps every box of `annotation` through `map_xyxy` into an image of the
/// given size.
fn map_boxes<F>(
    annotation: &ImageAnnotation,
    size: HW<usize>,
    map_xyxy: F,
) -> Result<ImageAnnotation>
where
    F: Fn([f64; 4]) -> [f64; 4],
{
    let bboxes: Vec<BoundingBox> = annotation
        .bboxes
        .iter()
        .map(|bbox| Label::try_from_xyxy(bbox.class.clone(), map_xyxy(bbox.rect.xyxy())))
        .try_collect()?;
    ImageAnnotation::new(annotation.path.clone(), size.w(), size.h(), bboxes)
}

pub fn horizontal_flip(
    (annotation, mut image): (ImageAnnotation, Array3<u8>),
) -> Result<(ImageAnnotation, Array3<u8>)> {
    let cols = annotation.width() as f64;
    image.invert_axis(Axis(1));
    let annotation = map_boxes(&annotation, annotation.size, |[x1, y1, x2, y2]| {
        [cols - x2, y1, cols - x1, y2]
    })?;
    Ok((annotation, image))
}

pub fn vertical_flip(
    (annotation, mut image): (ImageAnnotation, Array3<u8>),
) -> Result<(ImageAnnotation, Array3<u8>)> {
    let rows = annotation.height() as f64;
    image.invert_axis(Axis(0));
    let annotation = map_boxes(&annotation, annotation.size, |[x1, y1, x2, y2]| {
        [x1, rows - y2, x2, rows - y1]
    })?;
    Ok((annotation, image))
}

/// Rotates clockwise by `rotation`.
pub fn rotate(
    (annotation, image): (ImageAnnotation, Array3<u8>),
    rotation: Rotation,
) -> Result<(ImageAnnotation, Array3<u8>)> {
    let cols = annotation.width() as f64;
    let rows = annotation.height() as f64;
    let turned = annotation.size.transpose();

    let output = match rotation {
        Rotation::Deg0 => (annotation, image),
        Rotation::Deg180 => vertical_flip(horizontal_flip((annotation, image))?)?,
        Rotation::Deg90 => {
            // transpose, then mirror the columns
            let mut image = image.permuted_axes([1, 0, 2]);
            image.invert_axis(Axis(1));
            let annotation = map_boxes(&annotation, turned, |[x1, y1, x2, y2]| {
                [rows - y2, x1, rows - y1, x2]
            })?;
            (annotation, image)
        }
        Rotation::Deg270 => {
            // transpose, then mirror the rows
            let mut image = image.permuted_axes([1, 0, 2]);
            image.invert_axis(Axis(0));
            let annotation = map_boxes(&annotation, turned, |[x1, y1, x2, y2]| {
                [y1, cols - x2, y2, cols - x1]
            })?;
            (annotation, image)
        }
    };

    Ok(output)
}

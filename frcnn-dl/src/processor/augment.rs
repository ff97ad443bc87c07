use crate::{common::*, dataset::ImageAnnotation};

/// Loads the pixels of an annotated image, optionally with random
/// augmentation.
pub trait Augment
where
    Self: Send + Sync,
{
    /// Returns the (possibly transformed) annotation and its image.
    ///
    /// The image is laid out as `[height, width, 3]` in BGR order, and
    /// its size must agree with the returned annotation.
    fn augment(
        &self,
        annotation: &ImageAnnotation,
        augment: bool,
        rng: &mut dyn RngCore,
    ) -> Result<(ImageAnnotation, Array3<u8>)>;
}

impl<A> Augment for Arc<A>
where
    A: Augment + ?Sized,
{
    fn augment(
        &self,
        annotation: &ImageAnnotation,
        augment: bool,
        rng: &mut dyn RngCore,
    ) -> Result<(ImageAnnotation, Array3<u8>)> {
        (**self).augment(annotation, augment, rng)
    }
}

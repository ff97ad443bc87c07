use crate::common::*;

/// A ground-truth box in original-image pixel coordinates.
pub type BoundingBox = Label<TLBR<f64>, String>;

/// The record with image path, size and boxes, but without image pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAnnotation {
    pub path: PathBuf,
    /// Image size in pixels.
    pub size: HW<usize>,
    pub bboxes: Vec<BoundingBox>,
}

impl ImageAnnotation {
    pub fn new(
        path: impl Into<PathBuf>,
        width: usize,
        height: usize,
        bboxes: Vec<BoundingBox>,
    ) -> Result<Self> {
        ensure!(
            width > 0 && height > 0,
            "image width and height must be positive"
        );
        ensure!(
            bboxes.iter().all(|bbox| bbox.rect.is_proper()),
            "bounding boxes must satisfy x1 < x2 and y1 < y2"
        );

        Ok(Self {
            path: path.into(),
            size: HW::from_hw([height, width]),
            bboxes,
        })
    }

    pub fn width(&self) -> usize {
        self.size.w()
    }

    pub fn height(&self) -> usize {
        self.size.h()
    }

    pub fn contains_class(&self, class: &str) -> bool {
        self.bboxes.iter().any(|bbox| bbox.class == class)
    }
}

/// Creates a [BoundingBox] from `[x1, y1, x2, y2]` corners.
pub fn bounding_box(class: impl Into<String>, xyxy: [f64; 4]) -> Result<BoundingBox> {
    Label::try_from_xyxy(class.into(), xyxy)
}

use super::ImageAnnotation;
use crate::common::*;

/// Skips images so that classes take round-robin turns in the stream.
///
/// Each call to [ClassBalancer::should_skip] advances the cursor to the
/// next class, whatever the outcome. Call it exactly once per candidate
/// image to keep the cycle deterministic.
#[derive(Debug, Clone)]
pub struct ClassBalancer {
    classes: Vec<String>,
    cursor: usize,
}

impl ClassBalancer {
    /// Builds a balancer over classes with nonzero sample counts, in
    /// the order of `class_count`.
    pub fn new(class_count: &IndexMap<String, usize>) -> Result<Self> {
        let classes: Vec<_> = class_count
            .iter()
            .filter(|(_, &count)| count != 0)
            .map(|(class, _)| class.clone())
            .collect();
        ensure!(
            !classes.is_empty(),
            "class balancing requires at least one class with samples"
        );

        class_count
            .iter()
            .filter(|(_, &count)| count == 0)
            .for_each(|(class, _)| {
                warn!("class '{}' has no samples and is never required", class);
            });

        Ok(Self { classes, cursor: 0 })
    }

    /// The class the next call requires.
    pub fn current_class(&self) -> &str {
        &self.classes[self.cursor]
    }

    /// Returns true unless the annotation contains the current class.
    pub fn should_skip(&mut self, annotation: &ImageAnnotation) -> bool {
        let class = &self.classes[self.cursor];
        let skip = !annotation.contains_class(class);
        self.cursor = (self.cursor + 1) % self.classes.len();
        skip
    }
}

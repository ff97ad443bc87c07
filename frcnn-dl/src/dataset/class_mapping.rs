use crate::common::*;

/// The reserved name of the background class.
pub const BACKGROUND_CLASS: &str = "bg";

/// Class name to index mapping where the background class takes the
/// last index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMapping {
    classes: IndexSet<String>,
}

impl ClassMapping {
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut classes: IndexSet<String> = classes
            .into_iter()
            .map(Into::into)
            .filter(|name| name != BACKGROUND_CLASS)
            .collect();
        classes.insert(BACKGROUND_CLASS.to_string());
        Self { classes }
    }

    pub fn index_of(&self, class: &str) -> Option<usize> {
        self.classes.get_index_of(class)
    }

    pub fn name_of(&self, index: usize) -> Option<&str> {
        self.classes.get_index(index).map(String::as_str)
    }

    pub fn background_index(&self) -> usize {
        self.classes.len() - 1
    }

    /// The number of classes including the background class.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn background_is_last() {
        let mapping = ClassMapping::new(["bg", "cat", "dog", "cat"]);
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.index_of("cat"), Some(0));
        assert_eq!(mapping.index_of("dog"), Some(1));
        assert_eq!(mapping.index_of(BACKGROUND_CLASS), Some(2));
        assert_eq!(mapping.background_index(), 2);
        assert_eq!(mapping.name_of(1), Some("dog"));
        assert_eq!(mapping.index_of("bird"), None);
    }
}

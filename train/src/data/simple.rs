use crate::common::*;

/// One line of the simple annotation format,
/// `filepath,x1,y1,x2,y2,class_name`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimpleSample {
    pub filepath: PathBuf,
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub class_name: String,
}

/// A dataset in the simple annotation format.
#[derive(Debug, Clone)]
pub struct SimpleDataset {
    pub annotations: Vec<ImageAnnotation>,
    /// Box counts per class in first-seen order.
    pub class_count: IndexMap<String, usize>,
    pub class_mapping: ClassMapping,
}

impl SimpleDataset {
    /// Loads the annotation file and reads the size of each image.
    pub fn load(annotation_file: impl AsRef<Path>, image_dir: Option<&Path>) -> Result<Self> {
        let annotation_file = annotation_file.as_ref();
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_path(annotation_file)?;
        Self::from_reader(reader, image_dir)
    }

    pub fn from_reader<R>(mut reader: csv::Reader<R>, image_dir: Option<&Path>) -> Result<Self>
    where
        R: std::io::Read,
    {
        let mut class_count = IndexMap::<String, usize>::new();
        let mut groups = IndexMap::<PathBuf, Vec<BoundingBox>>::new();

        for (index, sample) in reader.deserialize::<SimpleSample>().enumerate() {
            let line = index + 1;
            let SimpleSample {
                filepath,
                x1,
                y1,
                x2,
                y2,
                class_name,
            } = sample.with_context(|| format!("unable to parse line {}", line))?;

            let bbox = Label::try_from_xyxy(class_name.clone(), [x1, y1, x2, y2])
                .with_context(|| format!("invalid box at line {}", line))?;
            *class_count.entry(class_name).or_default() += 1;

            let path = match image_dir {
                Some(dir) => dir.join(filepath),
                None => filepath,
            };
            groups.entry(path).or_default().push(bbox);
        }

        let annotations: Vec<_> = groups
            .into_iter()
            .map(|(path, bboxes)| {
                let imagesize::ImageSize { width, height } = imagesize::size(&path)
                    .with_context(|| format!("unable to read the size of '{}'", path.display()))?;
                ImageAnnotation::new(path, width, height, bboxes)
            })
            .try_collect()?;

        let class_mapping = ClassMapping::new(class_count.keys());
        debug!("class mapping {:?}", class_mapping);

        Ok(Self {
            annotations,
            class_count,
            class_mapping,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader(text: &str) -> csv::Reader<&[u8]> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(text.as_bytes())
    }

    #[test]
    fn malformed_box_names_the_line() {
        let text = "a.png,10,10,50,50,cat\nb.png,60,10,50,50,dog\n";
        let err = SimpleDataset::from_reader(reader(text), None).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn missing_field_rejected() {
        let text = "a.png,10,10,50,cat\n";
        assert!(SimpleDataset::from_reader(reader(text), None).is_err());
    }

    #[test]
    fn missing_image_rejected() {
        let text = "/nonexistent/a.png,10,10,50,50,cat\n";
        assert!(SimpleDataset::from_reader(reader(text), None).is_err());
    }
}

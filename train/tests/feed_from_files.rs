use anyhow::Result;
use frcnn_dl::feed::{FeedMode, TrainingFeedInit};
use image::RgbImage;
use std::{env, fs, num::NonZeroUsize, path::PathBuf};
use train::{
    augment::FileAugmenter,
    config::{Config, DatasetConfig},
    data::SimpleDataset,
    RunOptions,
};

/// Writes two 800x600 images, an annotation file and a config file.
fn setup(name: &str) -> Result<PathBuf> {
    let dir = env::temp_dir().join(format!("train-{}-{}", name, std::process::id()));
    fs::create_dir_all(dir.join("images"))?;

    for file in ["a.png", "b.png"] {
        RgbImage::new(800, 600).save(dir.join("images").join(file))?;
    }
    fs::write(
        dir.join("annotations.txt"),
        "# filepath,x1,y1,x2,y2,class_name\n\
         a.png,100,100,300,300,cat\n\
         a.png,450,250,700,520,dog\n\
         b.png,400,200,650,450,cat\n",
    )?;
    fs::write(
        dir.join("train.json5"),
        format!(
            r#"{{
                dataset: {{
                    annotation_file: "{}",
                    image_dir: "{}",
                }},
                anchor: {{ num_rois: 8 }},
                feed: {{ seed: 7 }},
                augment: {{ use_horizontal_flips: true, rot_90: true }},
                mode: "train",
            }}"#,
            dir.join("annotations.txt").display(),
            dir.join("images").display()
        ),
    )?;

    Ok(dir)
}

#[test]
fn parse_simple_dataset() -> Result<()> {
    let dir = setup("parse")?;
    let config = Config::open(dir.join("train.json5"))?;
    assert_eq!(config.mode, FeedMode::Train);
    assert_eq!(config.anchor.num_rois.get(), 8);
    assert!(config.augment.rot_90 && !config.augment.use_vertical_flips);

    let DatasetConfig {
        annotation_file,
        image_dir,
    } = &config.dataset;
    let dataset = SimpleDataset::load(annotation_file, image_dir.as_deref())?;

    assert_eq!(dataset.annotations.len(), 2);
    assert_eq!(dataset.annotations[0].bboxes.len(), 2);
    assert_eq!(dataset.annotations[0].width(), 800);
    assert_eq!(dataset.annotations[0].height(), 600);
    assert_eq!(dataset.class_count["cat"], 2);
    assert_eq!(dataset.class_count["dog"], 1);
    assert_eq!(dataset.class_mapping.index_of("cat"), Some(0));
    assert_eq!(dataset.class_mapping.index_of("dog"), Some(1));
    assert_eq!(dataset.class_mapping.index_of("bg"), Some(2));

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn feed_augmented_batches() -> Result<()> {
    let dir = setup("feed")?;
    let Config {
        dataset,
        anchor,
        feed,
        augment,
        mode,
    } = Config::open(dir.join("train.json5"))?;
    let SimpleDataset {
        annotations,
        class_count,
        class_mapping,
    } = SimpleDataset::load(&dataset.annotation_file, dataset.image_dir.as_deref())?;

    let feed = TrainingFeedInit {
        annotations,
        class_count,
        class_mapping,
        anchor,
        feed,
        mode,
        augmenter: FileAugmenter::new(augment),
    }
    .build()?;

    for _ in 0..4 {
        let batch = feed.next_batch()?;
        let image_shape = batch.inputs.image.shape();
        // quarter turns swap the sides, and the short side is always 600
        assert!(image_shape == [1, 3, 600, 800] || image_shape == [1, 3, 800, 600]);
        assert_eq!(batch.inputs.rois.shape(), &[1, 8, 4]);
        assert_eq!(batch.targets.class_onehot.shape(), &[1, 8, 3]);
        assert!(batch.targets.num_positive_rois() <= 4);
        assert!(batch.targets.num_valid_anchors() <= 256);
    }

    fs::remove_dir_all(&dir)?;
    Ok(())
}

#[test]
fn run_with_workers() -> Result<()> {
    let dir = setup("run")?;
    let config = Config::open(dir.join("train.json5"))?;

    for lock_whole_batch in [false, true] {
        train::start(
            config.clone(),
            RunOptions {
                num_workers: NonZeroUsize::new(2).unwrap(),
                num_batches: 3,
                lock_whole_batch,
            },
        )?;
    }

    fs::remove_dir_all(&dir)?;
    Ok(())
}

//! Produces Faster R-CNN training batches from a simple-format dataset.

pub mod augment;
pub mod common;
pub mod config;
pub mod data;

use crate::{
    augment::FileAugmenter,
    common::*,
    config::{Config, DatasetConfig},
    data::SimpleDataset,
};

/// Options of a feeding run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub num_workers: NonZeroUsize,
    /// The total number of batches to produce.
    pub num_batches: usize,
    /// Serialize whole batches instead of the feed cursor only.
    pub lock_whole_batch: bool,
}

/// The entry of the feeding program.
pub fn start(config: Config, options: RunOptions) -> Result<()> {
    let Config {
        dataset: DatasetConfig {
            annotation_file,
            image_dir,
        },
        anchor,
        feed,
        augment,
        mode,
    } = config;
    let RunOptions {
        num_workers,
        num_batches,
        lock_whole_batch,
    } = options;

    info!("loading dataset");
    let SimpleDataset {
        annotations,
        class_count,
        class_mapping,
    } = SimpleDataset::load(&annotation_file, image_dir.as_deref()).with_context(|| {
        format!(
            "failed to load annotation file '{}'",
            annotation_file.display()
        )
    })?;
    info!(
        "loaded {} images with {} classes",
        annotations.len(),
        class_count.len()
    );

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
    let shared = SyncIter::new(&feed);
    let num_taken = AtomicUsize::new(0);

    thread::scope(|scope| -> Result<()> {
        let handles: Vec<_> = (0..num_workers.get())
            .map(|worker| {
                let feed = &feed;
                let shared = &shared;
                let num_taken = &num_taken;

                scope.spawn(move || -> Result<()> {
                    while num_taken.fetch_add(1, Ordering::SeqCst) < num_batches {
                        let batch = if lock_whole_batch {
                            shared
                                .next()
                                .ok_or_else(|| format_err!("the training feed stopped"))??
                        } else {
                            feed.next_batch()?
                        };
                        log_batch(worker, &batch);
                    }
                    Ok(())
                })
            })
            .collect();

        handles.into_iter().try_for_each(|handle| {
            handle
                .join()
                .map_err(|_| format_err!("a feeding worker panicked"))?
        })
    })?;

    info!("produced {} batches", num_batches);
    Ok(())
}

fn log_batch(worker: usize, batch: &FeedBatch) {
    let FeedBatch {
        epoch,
        step,
        ref path,
        ref inputs,
        ref targets,
    } = *batch;

    info!(
        "worker {} step {} epoch {}: image '{}' shape {:?}, {} positive ROIs, {} valid anchors",
        worker,
        step,
        epoch,
        path.display(),
        inputs.image.shape(),
        targets.num_positive_rois(),
        targets.num_valid_anchors()
    );
}

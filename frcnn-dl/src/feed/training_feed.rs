use crate::{
    anchor::{AnchorTargetBuilder, AnchorTargetBuilderInit, AnchorTargets},
    common::*,
    config::{AnchorConfig, FeedConfig},
    dataset::{ClassBalancer, ClassMapping, ImageAnnotation},
    processor::{resize_image, to_input_tensor, Augment},
    utils::rescale_size_to_short_side,
};

/// Whether the feed shuffles and augments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    /// Reshuffle before each pass and augment every image.
    Train,
    /// Keep the dataset order and never augment.
    Eval,
}

impl Default for FeedMode {
    fn default() -> Self {
        Self::Train
    }
}

/// Network inputs of one image.
#[derive(Debug, Clone)]
pub struct FeedInputs {
    /// `[1, 3, height, width]` mean-centered BGR pixels.
    pub image: Array4<f32>,
    /// `[1, num_rois, 4]`
    pub rois: Array3<f32>,
}

/// Training targets of one image.
#[derive(Debug, Clone)]
pub struct FeedTargets {
    pub rpn_cls: Array4<f32>,
    pub rpn_regr: Array4<f32>,
    pub class_onehot: Array3<f32>,
    pub class_regr: Array3<f32>,
}

impl FeedTargets {
    /// The number of ROI rows not labelled as background.
    pub fn num_positive_rois(&self) -> usize {
        let background = self.class_onehot.shape()[2].saturating_sub(1);
        self.class_onehot
            .index_axis(Axis(2), background)
            .iter()
            .filter(|&&value| value != 1.0)
            .count()
    }

    /// The number of anchors that take part in the RPN classification loss.
    pub fn num_valid_anchors(&self) -> usize {
        let num_anchors = self.rpn_cls.shape()[1] / 2;
        self.rpn_cls
            .slice(s![.., ..num_anchors, .., ..])
            .iter()
            .filter(|&&value| value == 1.0)
            .count()
    }
}

#[derive(Debug, Clone)]
pub struct FeedBatch {
    /// The number of completed passes over the dataset.
    pub epoch: usize,
    /// The number of batches yielded before this one.
    pub step: usize,
    pub path: PathBuf,
    pub inputs: FeedInputs,
    pub targets: FeedTargets,
}

#[derive(Debug)]
pub struct TrainingFeedInit<A> {
    pub annotations: Vec<ImageAnnotation>,
    /// Box counts per class, consulted by the class balancer.
    pub class_count: IndexMap<String, usize>,
    pub class_mapping: ClassMapping,
    pub anchor: AnchorConfig,
    pub feed: FeedConfig,
    pub mode: FeedMode,
    pub augmenter: A,
}

impl<A> TrainingFeedInit<A>
where
    A: Augment,
{
    pub fn build(self) -> Result<TrainingFeed<A>> {
        let Self {
            annotations,
            class_count,
            class_mapping,
            anchor,
            feed,
            mode,
            augmenter,
        } = self;
        let FeedConfig {
            im_size,
            balanced_classes,
            img_channel_mean,
            seed,
        } = feed;

        ensure!(!annotations.is_empty(), "the dataset has no images");

        let target_builder = AnchorTargetBuilderInit {
            config: anchor,
            class_mapping,
        }
        .build()?;
        if balanced_classes {
            // a required class without images would stall the balancer
            let annotated: IndexSet<&str> = annotations
                .iter()
                .flat_map(|annotation| &annotation.bboxes)
                .map(|bbox| bbox.class.as_str())
                .collect();
            let missing = class_count
                .iter()
                .find(|(class, &count)| count != 0 && !annotated.contains(class.as_str()));
            if let Some((class, count)) = missing {
                bail!(
                    "class '{}' is counted {} times but no image contains it",
                    class,
                    count
                );
            }
        }
        let balancer = balanced_classes
            .then(|| ClassBalancer::new(&class_count))
            .transpose()?;

        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut order: Vec<usize> = (0..annotations.len()).collect();
        if mode == FeedMode::Train {
            order.shuffle(&mut rng);
        }

        info!(
            "training feed is ready with {} images in {:?} mode",
            annotations.len(),
            mode
        );

        Ok(TrainingFeed {
            annotations,
            target_builder,
            augmenter,
            mode,
            im_size: im_size.get(),
            img_channel_mean,
            num_classes: class_count.len(),
            cursor: Mutex::new(Cursor {
                order,
                pos: 0,
                epoch: 0,
                step: 0,
                balancer,
                rng,
            }),
        })
    }
}

/// Produces training batches endlessly, one image per batch.
///
/// The feed can be pulled from many threads at once. Only picking the
/// next image is serialized, the rest of the work runs in the caller's
/// thread. Under concurrent pulls the assignment of random streams to
/// images depends on thread timing, so a seed only makes single-threaded
/// use reproducible.
#[derive(Debug)]
pub struct TrainingFeed<A> {
    annotations: Vec<ImageAnnotation>,
    target_builder: AnchorTargetBuilder,
    augmenter: A,
    mode: FeedMode,
    im_size: usize,
    img_channel_mean: [R64; 3],
    num_classes: usize,
    cursor: Mutex<Cursor>,
}

#[derive(Debug)]
struct Cursor {
    order: Vec<usize>,
    pos: usize,
    epoch: usize,
    step: usize,
    balancer: Option<ClassBalancer>,
    rng: StdRng,
}

/// An image picked by the cursor with its own random stream.
struct Pick {
    epoch: usize,
    index: usize,
    rng: StdRng,
}

impl<A> TrainingFeed<A>
where
    A: Augment,
{
    pub fn mode(&self) -> FeedMode {
        self.mode
    }

    pub fn num_images(&self) -> usize {
        self.annotations.len()
    }

    pub fn target_builder(&self) -> &AnchorTargetBuilder {
        &self.target_builder
    }

    /// Produces the next batch, skipping images without positive samples.
    pub fn next_batch(&self) -> Result<FeedBatch> {
        loop {
            let Pick {
                epoch,
                index,
                mut rng,
            } = self.next_pick()?;
            let annotation = &self.annotations[index];

            let (annotation, image) = self.augmenter.augment(
                annotation,
                self.mode == FeedMode::Train,
                &mut rng,
            )?;
            let (height, width, _) = image.dim();
            ensure!(
                height == annotation.height() && width == annotation.width(),
                "the image '{}' has size {}x{}, but the annotation says {}x{}",
                annotation.path.display(),
                width,
                height,
                annotation.width(),
                annotation.height()
            );

            let resized = rescale_size_to_short_side(&annotation.size, self.im_size);
            let image = resize_image(image.view(), &resized)?;

            let targets = match self.target_builder.build(&annotation, &resized, &mut rng)? {
                Some(targets) => targets,
                None => continue,
            };
            let AnchorTargets {
                rois,
                rpn_cls,
                rpn_regr,
                class_onehot,
                class_regr,
            } = targets;
            let image = to_input_tensor(image.view(), &self.img_channel_mean)?;

            let step = {
                let mut cursor = self.lock_cursor();
                let step = cursor.step;
                cursor.step += 1;
                step
            };

            return Ok(FeedBatch {
                epoch,
                step,
                path: annotation.path,
                inputs: FeedInputs { image, rois },
                targets: FeedTargets {
                    rpn_cls,
                    rpn_regr,
                    class_onehot,
                    class_regr,
                },
            });
        }
    }

    fn lock_cursor(&self) -> std::sync::MutexGuard<'_, Cursor> {
        self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_pick(&self) -> Result<Pick> {
        let mut guard = self.lock_cursor();
        let cursor = &mut *guard;
        let num_images = cursor.order.len();
        // with a fixed order, the balancer repeats itself after this many skips
        let max_skips = num_images * self.num_classes.max(1);
        let mut num_skips = 0;

        loop {
            if cursor.pos == num_images {
                cursor.pos = 0;
                cursor.epoch += 1;
                if self.mode == FeedMode::Train {
                    cursor.order.shuffle(&mut cursor.rng);
                }
                info!("start epoch {}", cursor.epoch);
            }

            let index = cursor.order[cursor.pos];
            cursor.pos += 1;

            if let Some(balancer) = &mut cursor.balancer {
                if balancer.should_skip(&self.annotations[index]) {
                    num_skips += 1;
                    ensure!(
                        self.mode == FeedMode::Train || num_skips <= max_skips,
                        "the class balancer rejects every image in eval mode"
                    );
                    continue;
                }
            }

            let rng = StdRng::from_rng(&mut cursor.rng)?;
            return Ok(Pick {
                epoch: cursor.epoch,
                index,
                rng,
            });
        }
    }
}

impl<A> Iterator for &TrainingFeed<A>
where
    A: Augment,
{
    type Item = Result<FeedBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_batch())
    }
}

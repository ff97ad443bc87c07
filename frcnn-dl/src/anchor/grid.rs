use super::RegressionTarget;
use crate::common::*;

/// Location of one anchor instance on the feature grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorLoc {
    pub row: usize,
    pub col: usize,
    pub anchor: usize,
}

/// Dense per-anchor labels of the feature grid.
///
/// `is_valid` and `has_object` have shape `[num_anchors, height, width]`,
/// `regression` has shape `[4 * num_anchors, height, width]`.
#[derive(Debug, Clone)]
pub struct AnchorGrid {
    pub is_valid: Array3<f32>,
    pub has_object: Array3<f32>,
    pub regression: Array3<f32>,
}

impl AnchorGrid {
    pub fn new(num_anchors: usize, height: usize, width: usize) -> Self {
        Self {
            is_valid: Array3::zeros((num_anchors, height, width)),
            has_object: Array3::zeros((num_anchors, height, width)),
            regression: Array3::zeros((4 * num_anchors, height, width)),
        }
    }

    pub fn num_anchors(&self) -> usize {
        self.is_valid.shape()[0]
    }

    pub fn set_negative(&mut self, loc: AnchorLoc) {
        let AnchorLoc { row, col, anchor } = loc;
        self.is_valid[[anchor, row, col]] = 1.0;
        self.has_object[[anchor, row, col]] = 0.0;
    }

    pub fn set_positive(&mut self, loc: AnchorLoc, regression: &RegressionTarget) {
        let AnchorLoc { row, col, anchor } = loc;
        self.is_valid[[anchor, row, col]] = 1.0;
        self.has_object[[anchor, row, col]] = 1.0;
        self.regression
            .slice_mut(s![4 * anchor..4 * (anchor + 1), row, col])
            .iter_mut()
            .zip(regression.to_array())
            .for_each(|(dst, src)| *dst = src);
    }

    pub fn num_valid_positives(&self) -> usize {
        Zip::from(&self.is_valid)
            .and(&self.has_object)
            .fold(0, |count, &valid, &object| {
                count + (valid == 1.0 && object == 1.0) as usize
            })
    }

    pub fn num_valid(&self) -> usize {
        self.is_valid.iter().filter(|&&valid| valid == 1.0).count()
    }

    /// Randomly invalidates anchors so that at most `max_positives`
    /// positives and at most `batch_size` anchors in total stay valid.
    pub fn subsample<R>(&mut self, max_positives: usize, batch_size: usize, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let (pos_locs, neg_locs): (Vec<_>, Vec<_>) = self
            .is_valid
            .indexed_iter()
            .filter(|(_, &valid)| valid == 1.0)
            .map(|(index, _)| index)
            .partition(|&index| self.has_object[index] == 1.0);

        let mut num_pos = pos_locs.len();
        if num_pos > max_positives {
            sample_indices(rng, num_pos, num_pos - max_positives)
                .into_iter()
                .for_each(|index| self.is_valid[pos_locs[index]] = 0.0);
            num_pos = max_positives;
        }

        let num_neg = neg_locs.len();
        if num_neg + num_pos > batch_size {
            sample_indices(rng, num_neg, num_neg + num_pos - batch_size)
                .into_iter()
                .for_each(|index| self.is_valid[neg_locs[index]] = 0.0);
        }
    }

    /// Produces the classification target `[1, 2A, H, W]` (validity then
    /// objectness) and the regression target `[1, 8A, H, W]` (objectness
    /// repeated per coordinate, then encoded deltas).
    pub fn into_tensors(self) -> Result<(Array4<f32>, Array4<f32>)> {
        let Self {
            is_valid,
            has_object,
            regression,
        } = self;
        let num_anchors = has_object.shape()[0];

        let rpn_cls = ndarray::concatenate(Axis(0), &[is_valid.view(), has_object.view()])?
            .insert_axis(Axis(0));

        let mut regression_mask = Array3::<f32>::zeros(regression.raw_dim());
        (0..num_anchors).for_each(|anchor| {
            regression_mask
                .slice_mut(s![4 * anchor..4 * (anchor + 1), .., ..])
                .assign(&has_object.slice(s![anchor..anchor + 1, .., ..]));
        });
        let rpn_regr =
            ndarray::concatenate(Axis(0), &[regression_mask.view(), regression.view()])?
                .insert_axis(Axis(0));

        Ok((rpn_cls, rpn_regr))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(anchor: usize, row: usize, col: usize) -> AnchorLoc {
        AnchorLoc { row, col, anchor }
    }

    #[test]
    fn subsample_caps_positives_and_total() {
        let mut grid = AnchorGrid::new(2, 20, 20);
        let regr = RegressionTarget {
            tx: 0.0,
            ty: 0.0,
            tw: 0.0,
            th: 0.0,
        };
        for row in 0..20 {
            for col in 0..20 {
                grid.set_negative(loc(0, row, col));
                if row < 10 {
                    grid.set_positive(loc(1, row, col), &regr);
                }
            }
        }
        assert_eq!(grid.num_valid_positives(), 200);
        assert_eq!(grid.num_valid(), 600);

        let mut rng = StdRng::seed_from_u64(1);
        grid.subsample(128, 256, &mut rng);
        assert_eq!(grid.num_valid_positives(), 128);
        assert_eq!(grid.num_valid(), 256);
    }

    #[test]
    fn subsample_keeps_small_grids() {
        let mut grid = AnchorGrid::new(1, 4, 4);
        grid.set_negative(loc(0, 0, 0));
        grid.set_negative(loc(0, 3, 2));

        let mut rng = StdRng::seed_from_u64(1);
        grid.subsample(128, 256, &mut rng);
        assert_eq!(grid.num_valid(), 2);
    }

    #[test]
    fn tensor_layout() {
        let mut grid = AnchorGrid::new(2, 3, 4);
        let regr = RegressionTarget {
            tx: 0.5,
            ty: -0.25,
            tw: 0.1,
            th: 0.2,
        };
        grid.set_positive(loc(1, 2, 3), &regr);
        grid.set_negative(loc(0, 0, 0));

        let (rpn_cls, rpn_regr) = grid.into_tensors().unwrap();
        assert_eq!(rpn_cls.shape(), &[1, 4, 3, 4]);
        assert_eq!(rpn_regr.shape(), &[1, 16, 3, 4]);

        assert_eq!(rpn_cls[[0, 0, 0, 0]], 1.0);
        assert_eq!(rpn_cls[[0, 2, 0, 0]], 0.0);
        assert_eq!(rpn_cls[[0, 1, 2, 3]], 1.0);
        assert_eq!(rpn_cls[[0, 3, 2, 3]], 1.0);

        for channel in 0..4 {
            assert_eq!(rpn_regr[[0, channel, 2, 3]], 0.0);
            assert_eq!(rpn_regr[[0, 4 + channel, 2, 3]], 1.0);
        }
        assert_eq!(rpn_regr[[0, 12, 2, 3]], 0.5);
        assert_eq!(rpn_regr[[0, 13, 2, 3]], -0.25);
        assert_eq!(rpn_regr[[0, 14, 2, 3]], 0.1);
        assert_eq!(rpn_regr[[0, 15, 2, 3]], 0.2);
    }
}

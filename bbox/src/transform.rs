use super::{Rect, TLBR};
use crate::{common::*, RectNum, HW};

/// Per-axis scaling followed by translation, mapping `x` to
/// `x * sx + tx` and `y` to `y * sy + ty`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Transform<T> {
    pub sy: T,
    pub sx: T,
    pub ty: T,
    pub tx: T,
}

impl<T> Transform<T>
where
    T: Copy + Num + PartialOrd,
{
    /// The transform taking `src` exactly onto `tgt`.
    pub fn from_rects<R>(src: &R, tgt: &R) -> Self
    where
        R: Rect<Type = T>,
    {
        let sx = tgt.w() / src.w();
        let sy = tgt.h() / src.h();

        Self {
            sy,
            sx,
            ty: tgt.t() - src.t() * sy,
            tx: tgt.l() - src.l() * sx,
        }
    }

    /// Stretches the `src_size` image plane onto the `tgt_size` one,
    /// scaling x by the width ratio and y by the height ratio.
    pub fn from_sizes_exact(src_size: HW<T>, tgt_size: HW<T>) -> Self {
        let plane = |size: HW<T>| TLBR::from_tlbr([T::zero(), T::zero(), size.h(), size.w()]);
        Self::from_rects(&plane(src_size), &plane(tgt_size))
    }
}

impl<T> Mul<&TLBR<T>> for &Transform<T>
where
    T: Copy + Num + PartialOrd,
{
    type Output = TLBR<T>;

    fn mul(self, rhs: &TLBR<T>) -> Self::Output {
        rhs.transform(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_between_rects() {
        let src = TLBR::from_tlbr([0.0, 0.0, 10.0, 10.0]);
        let tgt = TLBR::from_tlbr([5.0, 2.0, 25.0, 7.0]);
        let transform = Transform::from_rects(&src, &tgt);
        assert_eq!(&transform * &src, tgt);
    }

    #[test]
    fn rect_resize_exact() {
        let transform =
            Transform::from_sizes_exact(HW::from_hw([80.0, 80.0]), HW::from_hw([20.0, 40.0]));
        let expect = Transform {
            sx: 0.5,
            sy: 0.25,
            tx: 0.0,
            ty: 0.0,
        };
        assert_eq!(transform, expect);
    }

    #[test]
    fn resize_keeps_axes_apart() {
        let transform =
            Transform::from_sizes_exact(HW::from_hw([600.0, 800.0]), HW::from_hw([300.0, 200.0]));
        let rect = TLBR::try_from_xyxy([100.0, 60.0, 400.0, 300.0]).unwrap();
        let resized = &transform * &rect;
        assert_eq!(resized.xyxy(), [25.0, 30.0, 100.0, 150.0]);
    }
}

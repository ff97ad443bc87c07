use super::{TLBR, TLHW};
use crate::common::*;

/// The generic rectangle.
///
/// The `t`/`b` accessors are the y-axis extent and `l`/`r` the x-axis
/// extent, so `(l, t, r, b)` reads as `(x1, y1, x2, y2)`.
pub trait Rect {
    type Type;

    fn t(&self) -> Self::Type;
    fn l(&self) -> Self::Type;
    fn b(&self) -> Self::Type;
    fn r(&self) -> Self::Type;
    fn h(&self) -> Self::Type;
    fn w(&self) -> Self::Type;

    fn try_from_tlbr(tlbr: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;

    fn try_from_tlhw(tlhw: [Self::Type; 4]) -> Result<Self>
    where
        Self: Sized;
}

pub trait RectNum: Rect
where
    Self::Type: Num + PartialOrd,
{
    fn from_tlbr(tlbr: [Self::Type; 4]) -> Self
    where
        Self: Sized,
    {
        Self::try_from_tlbr(tlbr).unwrap()
    }

    fn from_tlhw(tlhw: [Self::Type; 4]) -> Self
    where
        Self: Sized,
    {
        Self::try_from_tlhw(tlhw).unwrap()
    }

    fn tlhw(&self) -> [Self::Type; 4] {
        [self.t(), self.l(), self.h(), self.w()]
    }

    /// Corner coordinates in `[x1, y1, x2, y2]` order.
    fn xyxy(&self) -> [Self::Type; 4] {
        [self.l(), self.t(), self.r(), self.b()]
    }

    fn hw(&self) -> [Self::Type; 2] {
        [self.h(), self.w()]
    }

    fn to_tlhw(&self) -> TLHW<Self::Type> {
        TLHW {
            t: self.t(),
            l: self.l(),
            h: self.h(),
            w: self.w(),
        }
    }

    fn area(&self) -> <Self::Type as Mul<Self::Type>>::Output
    where
        Self::Type: Mul<Self::Type>,
    {
        self.h() * self.w()
    }

    /// Checks the strict ordering `l < r` and `t < b`.
    fn is_proper(&self) -> bool {
        self.l() < self.r() && self.t() < self.b()
    }
}

pub trait RectFloat: RectNum
where
    Self::Type: Float,
{
    /// The smallest box enclosing both boxes.
    fn closure_with<R>(&self, other: &R) -> TLBR<Self::Type>
    where
        R: Rect<Type = Self::Type>,
    {
        let t = self.t().min(other.t());
        let l = self.l().min(other.l());
        let b = self.b().max(other.b());
        let r = self.r().max(other.r());
        TLBR::from_tlbr([t, l, b, r])
    }

    /// The enclosing box in (x, y, w, h) form.
    fn union_with<R>(&self, other: &R) -> TLHW<Self::Type>
    where
        R: Rect<Type = Self::Type>,
    {
        self.closure_with(other).to_tlhw()
    }

    fn intersect_with<R>(&self, other: &R) -> Option<TLBR<Self::Type>>
    where
        R: Rect<Type = Self::Type>,
    {
        let t = self.t().max(other.t());
        let l = self.l().max(other.l());
        let b = self.b().min(other.b());
        let r = self.r().min(other.r());
        (b >= t && r >= l).then(|| TLBR::from_tlbr([t, l, b, r]))
    }

    /// The overlapping box in (x, y, w, h) form, or the all-zero box if
    /// the boxes are disjoint.
    fn intersection_with<R>(&self, other: &R) -> TLHW<Self::Type>
    where
        R: Rect<Type = Self::Type>,
    {
        self.intersect_with(other)
            .map(|rect| rect.to_tlhw())
            .unwrap_or_else(TLHW::zero)
    }

    fn intersection_area_with<R>(&self, other: &R) -> Self::Type
    where
        R: Rect<Type = Self::Type>,
    {
        self.intersection_with(other).area()
    }

    /// Intersection over union.
    ///
    /// Both boxes must satisfy `l < r` and `t < b`.
    fn try_iou_with<R>(&self, other: &R) -> Result<Self::Type>
    where
        R: Rect<Type = Self::Type>,
    {
        ensure!(
            self.is_proper() && other.is_proper(),
            "boxes must satisfy x1 < x2 and y1 < y2"
        );
        let inter_area = self.intersection_area_with(other);
        let union_area = self.area() + other.area() - inter_area;
        Ok(inter_area / union_area)
    }
}

impl<T> RectNum for T
where
    T: Rect,
    T::Type: Num + PartialOrd,
{
}

impl<T> RectFloat for T
where
    T: Rect,
    T::Type: Float,
{
}

/// The enclosing box of two boxes in (x, y, w, h) form.
pub fn union<T, A, B>(lhs: &A, rhs: &B) -> TLHW<T>
where
    T: Float,
    A: Rect<Type = T>,
    B: Rect<Type = T>,
{
    lhs.union_with(rhs)
}

/// The overlapping box of two boxes in (x, y, w, h) form.
pub fn intersection<T, A, B>(lhs: &A, rhs: &B) -> TLHW<T>
where
    T: Float,
    A: Rect<Type = T>,
    B: Rect<Type = T>,
{
    lhs.intersection_with(rhs)
}

/// Intersection over union of two well-formed boxes.
pub fn iou<T, A, B>(lhs: &A, rhs: &B) -> Result<T>
where
    T: Float,
    A: Rect<Type = T>,
    B: Rect<Type = T>,
{
    lhs.try_iou_with(rhs)
}

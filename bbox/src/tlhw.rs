use super::Rect;
use crate::common::*;

/// Bounding box in TLHW format, that is `(x, y, w, h)` with the
/// origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TLHW<T> {
    pub(crate) t: T,
    pub(crate) l: T,
    pub(crate) h: T,
    pub(crate) w: T,
}

impl<T> TLHW<T>
where
    T: Num,
{
    /// The empty box at the origin.
    pub fn zero() -> Self {
        Self {
            t: T::zero(),
            l: T::zero(),
            h: T::zero(),
            w: T::zero(),
        }
    }
}

impl<T> Rect for TLHW<T>
where
    T: Copy + Num + PartialOrd,
{
    type Type = T;

    fn t(&self) -> Self::Type {
        self.t
    }

    fn l(&self) -> Self::Type {
        self.l
    }

    fn b(&self) -> Self::Type {
        self.t + self.h
    }

    fn r(&self) -> Self::Type {
        self.l + self.w
    }

    fn h(&self) -> Self::Type {
        self.h
    }

    fn w(&self) -> Self::Type {
        self.w
    }

    fn try_from_tlbr(tlbr: [Self::Type; 4]) -> Result<Self> {
        let [t, l, b, r] = tlbr;
        ensure!(b >= t && r >= l, "b >= t and r >= l must hold");
        Ok(Self {
            t,
            l,
            h: b - t,
            w: r - l,
        })
    }

    fn try_from_tlhw(tlhw: [Self::Type; 4]) -> Result<Self> {
        let [t, l, h, w] = tlhw;
        let zero = T::zero();
        ensure!(h >= zero && w >= zero, "h and w must be non-negative");
        Ok(Self { t, l, h, w })
    }
}

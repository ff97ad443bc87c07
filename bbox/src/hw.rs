use crate::{common::*, Rect};

/// Size of an image plane, height first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HW<T> {
    h: T,
    w: T,
}

impl<T> HW<T>
where
    T: Copy + Num + PartialOrd,
{
    /// Builds a size from `[height, width]`.
    pub fn try_from_hw([h, w]: [T; 2]) -> Result<Self> {
        ensure!(
            h >= T::zero() && w >= T::zero(),
            "image height and width must not be negative"
        );
        Ok(Self { h, w })
    }

    pub fn from_hw(hw: [T; 2]) -> Self {
        Self::try_from_hw(hw).unwrap()
    }

    pub fn h(&self) -> T {
        self.h
    }

    pub fn w(&self) -> T {
        self.w
    }

    pub fn hw(&self) -> [T; 2] {
        [self.h, self.w]
    }

    /// The size after a quarter turn.
    pub fn transpose(&self) -> Self {
        Self {
            h: self.w,
            w: self.h,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.h == T::zero() || self.w == T::zero()
    }

    /// Checks whether `rect` lies entirely within the plane.
    pub fn contains<R>(&self, rect: &R) -> bool
    where
        R: Rect<Type = T>,
    {
        let zero = T::zero();
        rect.l() >= zero && rect.t() >= zero && rect.r() <= self.w && rect.b() <= self.h
    }
}

impl<T> HW<T>
where
    T: ToPrimitive,
{
    /// Converts to floating point sizes for coordinate arithmetic.
    pub fn to_f64(&self) -> HW<f64> {
        // every primitive integer converts to f64, possibly rounded
        HW {
            h: self.h.to_f64().unwrap_or(f64::NAN),
            w: self.w.to_f64().unwrap_or(f64::NAN),
        }
    }
}

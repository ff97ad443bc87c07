use anyhow::{ensure, Result};
use bbox::{Rect, RectNum, Transform, TLBR};
use num_traits::Num;
use std::ops::Mul;

/// A rectangle tagged with a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label<R, C>
where
    R: Rect,
{
    pub rect: R,
    pub class: C,
}

impl<T, C> Label<TLBR<T>, C>
where
    T: Copy + Num + PartialOrd,
{
    /// Builds a label from `[x1, y1, x2, y2]` corners.
    ///
    /// The corners must satisfy `x1 < x2` and `y1 < y2`.
    pub fn try_from_xyxy(class: C, xyxy: [T; 4]) -> Result<Self> {
        let rect = TLBR::try_from_xyxy(xyxy)?;
        ensure!(rect.is_proper(), "x1 < x2 and y1 < y2 must hold");
        Ok(Self { rect, class })
    }
}

impl<'a, T, C> Mul<&'a Label<TLBR<T>, C>> for &'a Transform<T>
where
    T: Copy + Num + PartialOrd,
    C: Clone,
{
    type Output = Label<TLBR<T>, C>;

    fn mul(self, rhs: &'a Label<TLBR<T>, C>) -> Self::Output {
        Label {
            rect: self * &rhs.rect,
            class: rhs.class.clone(),
        }
    }
}

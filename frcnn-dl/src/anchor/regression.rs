use crate::common::*;

/// Box regression target relative to an anchor.
///
/// `tx` and `ty` are corner offsets in anchor-size units, `tw` and `th`
/// are log size ratios.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegressionTarget {
    pub tx: f64,
    pub ty: f64,
    pub tw: f64,
    pub th: f64,
}

impl RegressionTarget {
    /// Encodes `target` relative to `anchor`.
    ///
    /// Both boxes must have positive width and height.
    pub fn encode(anchor: &TLBR<f64>, target: &TLBR<f64>) -> Self {
        let anchor_w = anchor.w();
        let anchor_h = anchor.h();
        Self {
            tx: (target.l() - anchor.l()) / anchor_w,
            ty: (target.t() - anchor.t()) / anchor_h,
            tw: (target.w() / anchor_w).ln(),
            th: (target.h() / anchor_h).ln(),
        }
    }

    /// Applies the target to `anchor`, inverting [RegressionTarget::encode].
    pub fn decode(&self, anchor: &TLBR<f64>) -> TLBR<f64> {
        let anchor_w = anchor.w();
        let anchor_h = anchor.h();
        let l = self.tx * anchor_w + anchor.l();
        let t = self.ty * anchor_h + anchor.t();
        let w = self.tw.exp() * anchor_w;
        let h = self.th.exp() * anchor_h;
        TLBR::from_tlhw([t, l, h, w])
    }

    pub fn to_array(&self) -> [f32; 4] {
        [
            self.tx as f32,
            self.ty as f32,
            self.tw as f32,
            self.th as f32,
        ]
    }
}

use crate::common::*;

/// Shares one iterator among threads by serializing calls to `next`.
#[derive(Debug)]
pub struct SyncIter<I> {
    iter: Mutex<I>,
}

impl<I> SyncIter<I>
where
    I: Iterator,
{
    pub fn new(iter: I) -> Self {
        Self {
            iter: Mutex::new(iter),
        }
    }

    pub fn next(&self) -> Option<I::Item> {
        // a panicked holder leaves the iterator itself intact
        self.iter
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next()
    }

    pub fn into_inner(self) -> I {
        self.iter.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<I> Iterator for &SyncIter<I>
where
    I: Iterator,
{
    type Item = I::Item;

    fn next(&mut self) -> Option<Self::Item> {
        SyncIter::next(*self)
    }
}

/// Circular page over a frozen candidate list.
///
/// `start` only moves through [`RotationWindow::rotate`] and is always taken
/// modulo the list length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationWindow {
    start: usize,
    page_size: usize,
}

impl RotationWindow {
    pub fn new(page_size: usize) -> Self {
        Self {
            start: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Rotation only makes sense when there is more than one page
    pub fn can_rotate(&self, len: usize) -> bool {
        len > self.page_size
    }

    /// Advance by one page, wrapping; returns false when there is nothing to rotate to
    pub fn rotate(&mut self, len: usize) -> bool {
        if !self.can_rotate(len) {
            return false;
        }
        self.start = (self.start + self.page_size) % len;
        true
    }

    /// Positions shown for a list of `len` items.
    ///
    /// Always a full page taken circularly from `start`; lists shorter than
    /// a page repeat from the head to fill it.
    pub fn indices(&self, len: usize) -> impl Iterator<Item = usize> {
        let (start, count) = match len {
            0 => (0, 0),
            _ => (self.start % len, self.page_size),
        };
        (start..start + count).map(move |i| i % len)
    }

    pub fn visible<'a, T>(&self, items: &'a [T]) -> Vec<&'a T> {
        self.indices(items.len()).map(|i| &items[i]).collect()
    }
}

//! Selection over the flattened document projection.

use std::ops::Range;

use crate::error::EditorError;

/// Selection with anchor and head as document offsets.
///
/// The anchor is where the selection started, the head is where the caret
/// is now. Use `start()`/`end()` for ordered bounds.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub anchor: usize,
    pub head: usize,
}

impl Selection {
    pub fn new(anchor: usize, head: usize) -> Self {
        Self { anchor, head }
    }

    /// A caret at `offset`.
    pub fn collapsed(offset: usize) -> Self {
        Self {
            anchor: offset,
            head: offset,
        }
    }

    pub fn start(&self) -> usize {
        self.anchor.min(self.head)
    }

    pub fn end(&self) -> usize {
        self.anchor.max(self.head)
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.head
    }

    pub fn len(&self) -> usize {
        self.end() - self.start()
    }

    pub fn is_empty(&self) -> bool {
        self.is_collapsed()
    }

    pub fn to_range(&self) -> Range<usize> {
        self.start()..self.end()
    }

    pub fn is_backwards(&self) -> bool {
        self.head < self.anchor
    }

    /// Error if either end lies past `len`.
    pub fn check_bounds(&self, len: usize) -> Result<(), EditorError> {
        let offset = self.end();
        if offset > len {
            return Err(EditorError::SelectionOutOfBounds { offset, len });
        }
        Ok(())
    }

    /// Clamp both ends to `0..=len`.
    pub fn clamped(self, len: usize) -> Self {
        Self {
            anchor: self.anchor.min(len),
            head: self.head.min(len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_bounds() {
        let sel = Selection::new(7, 2);
        assert_eq!(sel.to_range(), 2..7);
        assert!(sel.is_backwards());
        assert_eq!(sel.len(), 5);
    }

    #[test]
    fn test_bounds_check() {
        assert!(Selection::new(0, 4).check_bounds(4).is_ok());
        assert!(matches!(
            Selection::collapsed(9).check_bounds(4),
            Err(EditorError::SelectionOutOfBounds { offset: 9, len: 4 })
        ));
        assert_eq!(Selection::new(9, 1).clamped(4), Selection::new(4, 1));
    }
}

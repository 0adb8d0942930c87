use serde::{Deserialize, Serialize};

/// A wrapping index into a content collection owned by someone else.
///
/// The collection's size is passed in on every call because the kernel does
/// not own the content and its size may differ between sessions. The index
/// stays in `[0, size)` for any non-empty collection; an empty collection
/// has no current item and cannot be advanced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCursor {
    index: usize,
}

impl ContentCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The index to present next, or `None` when there is nothing to show.
    ///
    /// A collection that shrank since the index was stored is folded back into
    /// range rather than indexed out of bounds.
    pub fn current(&self, size: usize) -> Option<usize> {
        if size == 0 {
            return None;
        }
        Some(self.index % size)
    }

    /// Step to the next index, wrapping to 0 at `size`. Skipped for `size == 0`.
    pub fn advance(&mut self, size: usize) {
        if let Some(current) = self.current(size) {
            self.index = (current + 1) % size;
        }
    }

    /// Borrow the current item and advance past it.
    pub fn take_next<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        let current = self.current(items.len())?;
        self.advance(items.len());
        items.get(current)
    }
}

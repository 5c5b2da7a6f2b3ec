//! Edit records for the live document
//!
//! An edit replaces `old_start..old_end` of the old document with `new_len`
//! bytes of new text. Positions at or after `old_end` shift by
//! `new_len - (old_end - old_start)`.

use serde::{Deserialize, Serialize};

/// A single replacement, in old-document byte offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    pub old_start: usize,
    pub old_end: usize,
    pub new_len: usize,
}

impl Edit {
    pub fn new(old_start: usize, old_end: usize, new_len: usize) -> Self {
        Self {
            old_start,
            old_end,
            new_len,
        }
    }

    pub fn insert(at: usize, len: usize) -> Self {
        Self::new(at, at, len)
    }

    pub fn delete(start: usize, end: usize) -> Self {
        Self::new(start, end, 0)
    }

    pub fn old_len(&self) -> usize {
        self.old_end.saturating_sub(self.old_start)
    }

    /// End of the replacement in the new document
    pub fn new_end(&self) -> usize {
        self.old_start + self.new_len
    }

    /// Net change in document length
    pub fn delta(&self) -> isize {
        self.new_len as isize - self.old_len() as isize
    }

    /// Map an old position at or after `old_end` into the new document
    pub fn shift(&self, pos: usize) -> usize {
        debug_assert!(pos >= self.old_end);
        pos - self.old_end + self.new_end()
    }

    /// Document length after applying this edit to a document of `old_doc_len`
    pub fn apply_len(&self, old_doc_len: usize) -> Option<usize> {
        if self.old_start > self.old_end || self.old_end > old_doc_len {
            return None;
        }
        Some(old_doc_len - self.old_len() + self.new_len)
    }

    /// Merge the changes of one transaction into a single covering edit.
    ///
    /// All edits must be in old-document coordinates and must not overlap.
    /// Returns `None` for an empty list or inconsistent edits.
    pub fn merge(edits: &[Edit]) -> Option<Edit> {
        let first = edits.first()?;
        let mut start = first.old_start;
        let mut end = first.old_end;
        let mut delta: isize = 0;
        for edit in edits {
            if edit.old_start > edit.old_end {
                return None;
            }
            start = start.min(edit.old_start);
            end = end.max(edit.old_end);
            delta += edit.delta();
        }
        let new_len = (end - start) as isize + delta;
        if new_len < 0 {
            return None;
        }
        Some(Edit::new(start, end, new_len as usize))
    }
}

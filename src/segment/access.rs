//! Patch overlay over an immutable segment
//!
//! Lookup precedence mirrors the engine's overlay-before-base rule:
//! session-only `pending` edits first, then the durable `committed` patches
//! loaded from the patches file, then the on-disk segment. Writes only ever
//! touch `pending`; the base file is never rewritten.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{BaseError, Result};
use crate::records::{DiskRecord, Istr};

use super::ImmutableSegment;

/// One table's durable patches: logical length plus sparse records
///
/// BTreeMap keeps serialization deterministic, which is what makes two
/// consecutive commits byte-identical.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchTable<R> {
    pub len: u32,
    pub records: BTreeMap<i32, R>,
}

impl<R> PatchTable<R> {
    pub fn empty(len: u32) -> PatchTable<R> {
        PatchTable {
            len,
            records: BTreeMap::new(),
        }
    }
}

/// Read/write access to one logical table
pub struct RecordAccess<R: DiskRecord> {
    segment: ImmutableSegment<R>,

    /// Durable patches, loaded from the patches file at open time
    committed: PatchTable<R>,

    /// Session-only edits, lost unless committed
    pending: BTreeMap<i32, R>,

    /// Logical length: max of disk length and both overlay extents
    len: u32,
}

impl<R: DiskRecord> RecordAccess<R> {
    pub fn new(segment: ImmutableSegment<R>, committed: PatchTable<R>) -> Self {
        let len = segment.len().max(committed.len);
        RecordAccess {
            segment,
            committed,
            pending: BTreeMap::new(),
            len,
        }
    }

    /// Logical length of the table
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Read record `i`: pending, then committed patches, then disk
    pub fn get(&self, i: i32) -> Result<R> {
        self.check_bounds(i)?;
        if let Some(r) = self.pending.get(&i) {
            return Ok(r.clone());
        }
        self.get_committed_or_disk(i)
    }

    /// Read record `i` skipping session-only edits
    ///
    /// Used when materializing the base state for a rewrite: the result
    /// reflects only what a fresh open would see.
    pub fn get_nopending(&self, i: i32) -> Result<R> {
        self.check_bounds(i)?;
        self.get_committed_or_disk(i)
    }

    /// Overwrite (or append past the end) record `i` in the pending layer
    ///
    /// The logical length only ever grows.
    pub fn patch(&mut self, i: i32, record: R) -> Result<()> {
        if i < 0 {
            return Err(BaseError::OutOfRange {
                kind: R::KIND,
                index: i,
                len: self.len,
            });
        }
        self.pending.insert(i, record);
        self.len = self.len.max(i as u32 + 1);
        Ok(())
    }

    /// Reconstruct the full logical array, overlay included
    ///
    /// For the explicit rebuild path only. Every index in `0..len` must
    /// exist in some layer; a hole is a consistency error.
    pub fn output_array(&self) -> Result<Vec<R>> {
        (0..self.len as i32).map(|i| self.get(i)).collect()
    }

    /// Raise the logical length (it never shrinks)
    ///
    /// Used by the database layer to keep the three iper-keyed (and the
    /// three ifam-keyed) tables at equal logical length.
    pub(crate) fn set_min_len(&mut self, len: u32) {
        self.len = self.len.max(len);
    }

    /// Move all pending edits into the committed layer
    pub fn merge_pending(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        self.committed.records.extend(pending);
        self.committed.len = self.committed.len.max(self.len);
    }

    /// Snapshot of the committed layer (for serializing the patches file)
    pub fn committed_table(&self) -> &PatchTable<R> {
        &self.committed
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drop the segment's whole-array cache
    pub fn clear_array(&self) {
        self.segment.clear_array();
    }

    /// Iterate over the overlay layers (pending shadowing committed)
    ///
    /// Yields each patched index at most once. Disk records are not
    /// included.
    pub fn patched(&self) -> impl Iterator<Item = (i32, &R)> {
        let committed = self
            .committed
            .records
            .iter()
            .filter(|(i, _)| !self.pending.contains_key(i));
        self.pending
            .iter()
            .chain(committed)
            .map(|(&i, r)| (i, r))
    }

    fn check_bounds(&self, i: i32) -> Result<()> {
        if i < 0 || i as u32 >= self.len {
            return Err(BaseError::OutOfRange {
                kind: R::KIND,
                index: i,
                len: self.len,
            });
        }
        Ok(())
    }

    fn get_committed_or_disk(&self, i: i32) -> Result<R> {
        if let Some(r) = self.committed.records.get(&i) {
            return Ok(r.clone());
        }
        if (i as u32) < self.segment.len() {
            // Without the accessor file the only disk path is a whole-array
            // load; force it once, then index.
            if !self.segment.has_accessor() {
                let array = self.segment.ensure_array()?;
                return Ok(array[i as usize].clone());
            }
            return self.segment.get(i);
        }
        Err(BaseError::NotFound(format!(
            "{} record {} exists in no layer",
            R::KIND,
            i
        )))
    }
}

impl RecordAccess<String> {
    /// Intern a string: return the existing istr on an exact match, else
    /// append in the pending layer
    ///
    /// The dedup scan walks pending, then committed, then the base array,
    /// skipping any index shadowed by a higher layer. Linear by design;
    /// name lookups are expected to go through the name indices instead.
    pub fn insert_string(&mut self, s: &str) -> Result<Istr> {
        for (&i, v) in &self.pending {
            if v == s {
                return Ok(i);
            }
        }
        for (&i, v) in &self.committed.records {
            if v == s && !self.pending.contains_key(&i) {
                return Ok(i);
            }
        }
        let array = self.segment.ensure_array()?;
        for (i, v) in array.iter().enumerate() {
            let i = i as i32;
            if v == s
                && !self.pending.contains_key(&i)
                && !self.committed.records.contains_key(&i)
            {
                return Ok(i);
            }
        }

        let istr = self.len as i32;
        self.patch(istr, s.to_string())?;
        Ok(istr)
    }
}

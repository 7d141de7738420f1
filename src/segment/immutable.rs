//! Immutable segment reader
//!
//! One segment per on-disk table. Two access paths exist:
//! - random access through the accessor file (`base.acc`): one 4-byte
//!   big-endian absolute offset per element, then a single-value decode;
//! - whole-array decode, cached for the lifetime of the segment.
//!
//! Without the accessor file there is no per-element path; the overlay
//! layer falls back to a whole-array load in that case.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{BaseError, Result};
use crate::iovalue;
use crate::records::DiskRecord;

/// A file handle shared between the seven segments
pub type SharedFile = Arc<Mutex<BufReader<File>>>;

/// Read-only, offset-indexed view of one on-disk array
pub struct ImmutableSegment<R: DiskRecord> {
    /// The `base` file, shared with the six sibling segments
    base: SharedFile,

    /// The `base.acc` file, when present
    acc: Option<SharedFile>,

    /// Absolute offset of this table's iovalue array inside `base`
    array_pos: u64,

    /// Start of this table's offset array inside `base.acc`
    acc_shift: u64,

    /// Number of elements on disk
    len: u32,

    /// Whole-array cache, filled at most once
    cache: Mutex<Option<Arc<Vec<R>>>>,
}

impl<R: DiskRecord> ImmutableSegment<R> {
    pub fn new(
        base: SharedFile,
        acc: Option<SharedFile>,
        array_pos: u64,
        acc_shift: u64,
        len: u32,
    ) -> Self {
        ImmutableSegment {
            base,
            acc,
            array_pos,
            acc_shift,
            len,
            cache: Mutex::new(None),
        }
    }

    /// Number of elements on disk (the overlay may extend past this)
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the per-element accessor path is available
    pub fn has_accessor(&self) -> bool {
        self.acc.is_some()
    }

    /// Read element `i`
    ///
    /// Indexes the cache when the whole array has been loaded; otherwise
    /// follows the accessor file. Out-of-range indices and a missing
    /// accessor file are errors, never silent nulls.
    pub fn get(&self, i: i32) -> Result<R> {
        if i < 0 || i as u32 >= self.len {
            return Err(BaseError::OutOfRange {
                kind: R::KIND,
                index: i,
                len: self.len,
            });
        }

        if let Some(array) = self.cache.lock().as_ref() {
            return Ok(array[i as usize].clone());
        }

        let acc = self.acc.as_ref().ok_or_else(|| {
            BaseError::NotFound(format!(
                "{}: no accessor file; per-element access unavailable",
                R::KIND
            ))
        })?;

        // Read the element's absolute offset from the accessor file.
        let offset = {
            let mut acc = acc.lock();
            acc.seek(SeekFrom::Start(self.acc_shift + 4 * i as u64))?;
            let mut buf = [0u8; 4];
            acc.read_exact(&mut buf)?;
            u32::from_be_bytes(buf) as u64
        };

        let mut base = self.base.lock();
        base.seek(SeekFrom::Start(offset))?;
        let value = iovalue::decode_from(&mut *base)?;
        R::from_value(&value)
    }

    /// Decode the whole array once and cache it
    pub fn ensure_array(&self) -> Result<Arc<Vec<R>>> {
        let mut cache = self.cache.lock();
        if let Some(array) = cache.as_ref() {
            return Ok(Arc::clone(array));
        }

        let value = {
            let mut base = self.base.lock();
            base.seek(SeekFrom::Start(self.array_pos))?;
            iovalue::decode_from(&mut *base)?
        };
        let items = value
            .as_array()
            .ok_or_else(|| BaseError::Corrupt(format!("{}: section is not an array", R::KIND)))?;
        if items.len() != self.len as usize {
            return Err(BaseError::Corrupt(format!(
                "{}: header says {} elements, array holds {}",
                R::KIND,
                self.len,
                items.len()
            )));
        }

        let records = items
            .iter()
            .map(R::from_value)
            .collect::<Result<Vec<R>>>()?;
        let array = Arc::new(records);
        *cache = Some(Arc::clone(&array));
        Ok(array)
    }

    /// Drop the whole-array cache
    pub fn clear_array(&self) {
        *self.cache.lock() = None;
    }
}

//! On-disk name index readers
//!
//! Three index files serve person lookup:
//! - `names.inx`: a flat 0x3FFF-bucket hash index keyed by
//!   `crush_lower`-folded names, one iper list per bucket;
//! - `snames.inx`/`snames.dat`: the surname index, sorted `(istr, offset)`
//!   pairs over posting lists of ipers;
//! - `fnames.inx`/`fnames.dat`: the same for first names.
//!
//! All readers are lazy and cache what they load; the caches belong to the
//! index instance and are dropped only by [`NameIndex::clear_caches`].
//! Merging with the in-memory patch layers happens in the database layer,
//! which owns the string resolver the comparisons need.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::base::FormatVersion;
use crate::error::{BaseError, Result};
use crate::iovalue;
use crate::records::{Iper, Istr};

use super::crush_lower;

/// Number of hash buckets in `names.inx`
pub const TABLE_SIZE: u32 = 0x3FFF;

/// Bucket key of a name: a pure, restart-stable function of the string
///
/// FNV-1a over the crushed casefold, reduced modulo the bucket count.
pub fn name_index_key(s: &str) -> u32 {
    fnv1a32(crush_lower(s).as_bytes()) % TABLE_SIZE
}

fn fnv1a32(bytes: &[u8]) -> u32 {
    let mut hash: u32 = 0x811c9dc5;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// Readers for the four name index files of one database
pub struct NameIndex {
    /// `names.inx` path
    inx_path: PathBuf,

    /// Whether this format version carries the sorted indices at all
    sorted_available: bool,

    /// Hash bucket cache, loaded at most once
    buckets: Mutex<Option<Arc<Vec<Vec<Iper>>>>>,

    surnames: SortedNames,
    first_names: SortedNames,
}

impl NameIndex {
    pub fn open(dir: &Path, version: FormatVersion) -> NameIndex {
        NameIndex {
            inx_path: dir.join("names.inx"),
            sorted_available: version.has_sorted_names(),
            buckets: Mutex::new(None),
            surnames: SortedNames::new(dir.join("snames.inx"), dir.join("snames.dat")),
            first_names: SortedNames::new(dir.join("fnames.inx"), dir.join("fnames.dat")),
        }
    }

    /// On-disk iper list of one hash bucket
    ///
    /// A missing `names.inx` behaves as an all-empty table: the patch
    /// layers may still produce hits.
    pub fn bucket(&self, key: u32) -> Result<Vec<Iper>> {
        let mut cache = self.buckets.lock();
        if cache.is_none() {
            *cache = Some(Arc::new(self.load_buckets()?));
        }
        let table = cache.as_ref().unwrap();
        Ok(table.get(key as usize).cloned().unwrap_or_default())
    }

    fn load_buckets(&self) -> Result<Vec<Vec<Iper>>> {
        let file = match File::open(&self.inx_path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(vec![Vec::new(); TABLE_SIZE as usize]);
            }
            Err(e) => return Err(e.into()),
        };
        let mut reader = BufReader::new(file);
        let value = iovalue::decode_from(&mut reader)?;
        let outer = value
            .as_array()
            .ok_or_else(|| BaseError::Corrupt("names.inx: not an array".to_string()))?;
        if outer.len() != TABLE_SIZE as usize {
            return Err(BaseError::Corrupt(format!(
                "names.inx: expected {} buckets, found {}",
                TABLE_SIZE,
                outer.len()
            )));
        }
        outer
            .iter()
            .map(|bucket| {
                let items = bucket.as_array().ok_or_else(|| {
                    BaseError::Corrupt("names.inx: bucket is not an array".to_string())
                })?;
                items
                    .iter()
                    .map(|v| {
                        v.as_int().ok_or_else(|| {
                            BaseError::Corrupt("names.inx: non-integer iper".to_string())
                        })
                    })
                    .collect()
            })
            .collect()
    }

    /// The sorted surname index (only in the two newest formats)
    pub fn surnames(&self) -> Result<&SortedNames> {
        if !self.sorted_available {
            return Err(BaseError::NotFound(
                "no sorted surname index in this format version".to_string(),
            ));
        }
        Ok(&self.surnames)
    }

    /// The sorted first-name index (only in the two newest formats)
    pub fn first_names(&self) -> Result<&SortedNames> {
        if !self.sorted_available {
            return Err(BaseError::NotFound(
                "no sorted first-name index in this format version".to_string(),
            ));
        }
        Ok(&self.first_names)
    }

    /// Drop every cached table
    pub fn clear_caches(&self) {
        *self.buckets.lock() = None;
        self.surnames.clear_cache();
        self.first_names.clear_cache();
    }
}

/// One sorted name index: `(istr, offset)` pairs plus a posting-list file
///
/// The `.inx` file is a 4-byte big-endian count followed by that many
/// `(istr, offset)` 4-byte pairs, sorted by the resolved string under the
/// index's comparator. Each offset points into the `.dat` file at a 4-byte
/// count followed by that many 4-byte ipers.
pub struct SortedNames {
    inx_path: PathBuf,
    dat_path: PathBuf,
    entries: Mutex<Option<Arc<Vec<(Istr, u32)>>>>,
}

impl SortedNames {
    fn new(inx_path: PathBuf, dat_path: PathBuf) -> SortedNames {
        SortedNames {
            inx_path,
            dat_path,
            entries: Mutex::new(None),
        }
    }

    /// The sorted `(istr, offset)` table, cached after the first load
    pub fn entries(&self) -> Result<Arc<Vec<(Istr, u32)>>> {
        let mut cache = self.entries.lock();
        if let Some(entries) = cache.as_ref() {
            return Ok(Arc::clone(entries));
        }
        let file = File::open(&self.inx_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BaseError::NotFound(format!("missing index file {}", self.inx_path.display()))
            } else {
                e.into()
            }
        })?;
        let mut reader = BufReader::new(file);
        let count = read_u32(&mut reader)?;
        let mut entries = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let istr = read_u32(&mut reader)? as i32;
            let offset = read_u32(&mut reader)?;
            entries.push((istr, offset));
        }
        let entries = Arc::new(entries);
        *cache = Some(Arc::clone(&entries));
        Ok(entries)
    }

    /// Read the posting list stored at `offset` in the `.dat` file
    pub fn postings(&self, offset: u32) -> Result<Vec<Iper>> {
        let file = File::open(&self.dat_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BaseError::NotFound(format!("missing data file {}", self.dat_path.display()))
            } else {
                e.into()
            }
        })?;
        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(offset as u64))?;
        let count = read_u32(&mut reader)?;
        let mut ipers = Vec::with_capacity(count as usize);
        for _ in 0..count {
            ipers.push(read_u32(&mut reader)? as i32);
        }
        Ok(ipers)
    }

    fn clear_cache(&self) {
        *self.entries.lock() = None;
    }
}

/// First index in `entries` whose resolved string compares `>= target`
///
/// `entries` must be sorted under `cmp` of the resolved strings; this is
/// the shared binary search behind find, cursor and next.
pub fn lower_bound<F, C>(
    entries: &[(Istr, u32)],
    target: &str,
    resolve: &F,
    cmp: &C,
) -> Result<usize>
where
    F: Fn(Istr) -> Result<String>,
    C: Fn(&str, &str) -> Ordering,
{
    let mut lo = 0usize;
    let mut hi = entries.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let s = resolve(entries[mid].0)?;
        if cmp(s.as_str(), target) == Ordering::Less {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    Ok(lo)
}

/// First index in `entries` whose resolved string compares `> target`
pub fn upper_bound<F, C>(
    entries: &[(Istr, u32)],
    target: &str,
    resolve: &F,
    cmp: &C,
) -> Result<usize>
where
    F: Fn(Istr) -> Result<String>,
    C: Fn(&str, &str) -> Ordering,
{
    let mut lo = 0usize;
    let mut hi = entries.len();
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let s = resolve(entries[mid].0)?;
        if cmp(s.as_str(), target) == Ordering::Greater {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    Ok(lo)
}

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            BaseError::Corrupt("truncated name index file".to_string())
        } else {
            BaseError::Io(e)
        }
    })?;
    Ok(u32::from_be_bytes(buf))
}

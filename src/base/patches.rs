//! The patches file
//!
//! All edits ever committed against an immutable base live in one file:
//! magic `GnPa0001`, a CRC32 of the payload, then the bincode-serialized
//! [`PatchesHt`]: one `(length, {index: record})` table per on-disk array.
//! The base file itself is never rewritten.
//!
//! ## File Format
//!
//! ```text
//! ┌────────────┬───────────┬──────────────────────────┐
//! │ "GnPa0001" │ CRC32 (4) │ bincode(PatchesHt)       │
//! └────────────┴───────────┴──────────────────────────┘
//! ```

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BaseError, Result};
use crate::records::{DskAscend, DskCouple, DskDescend, DskFamily, DskPerson, DskUnion};
use crate::segment::PatchTable;

/// Magic prefix of the patches file
pub const PATCHES_MAGIC: &[u8; 8] = b"GnPa0001";

/// Every committed patch, one table per on-disk array
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchesHt {
    pub persons: PatchTable<DskPerson>,
    pub ascends: PatchTable<DskAscend>,
    pub unions: PatchTable<DskUnion>,
    pub families: PatchTable<DskFamily>,
    pub couples: PatchTable<DskCouple>,
    pub descends: PatchTable<DskDescend>,
    pub strings: PatchTable<String>,
}

impl PatchesHt {
    /// An empty patch set over a base with the given table lengths
    pub fn empty(persons_len: u32, families_len: u32, strings_len: u32) -> PatchesHt {
        PatchesHt {
            persons: PatchTable::empty(persons_len),
            ascends: PatchTable::empty(persons_len),
            unions: PatchTable::empty(persons_len),
            families: PatchTable::empty(families_len),
            couples: PatchTable::empty(families_len),
            descends: PatchTable::empty(families_len),
            strings: PatchTable::empty(strings_len),
        }
    }

    /// Load the patches file, if it exists
    pub fn load(path: &Path) -> Result<Option<PatchesHt>> {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if bytes.len() < PATCHES_MAGIC.len() + 4 {
            return Err(BaseError::Corrupt("patches file too short".to_string()));
        }
        if &bytes[..PATCHES_MAGIC.len()] != PATCHES_MAGIC {
            return Err(BaseError::UnsupportedVersion(
                String::from_utf8_lossy(&bytes[..PATCHES_MAGIC.len()]).into_owned(),
            ));
        }
        let crc_start = PATCHES_MAGIC.len();
        let stored_crc = u32::from_be_bytes([
            bytes[crc_start],
            bytes[crc_start + 1],
            bytes[crc_start + 2],
            bytes[crc_start + 3],
        ]);
        let payload = &bytes[crc_start + 4..];
        if crc32fast::hash(payload) != stored_crc {
            return Err(BaseError::Corrupt(
                "patches file checksum mismatch".to_string(),
            ));
        }
        let ht = bincode::deserialize(payload)
            .map_err(|e| BaseError::Corrupt(format!("patches payload: {}", e)))?;
        Ok(Some(ht))
    }

    /// Serialize to the full file image (magic + crc + payload)
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let payload = bincode::serialize(self)
            .map_err(|e| BaseError::Serialization(format!("patches payload: {}", e)))?;
        let mut out = Vec::with_capacity(PATCHES_MAGIC.len() + 4 + payload.len());
        out.extend_from_slice(PATCHES_MAGIC);
        out.extend_from_slice(&crc32fast::hash(&payload).to_be_bytes());
        out.extend_from_slice(&payload);
        Ok(out)
    }

    /// Atomically replace the live patches file
    ///
    /// The temp write must fully succeed (including fsync) before the
    /// backup rotation runs, so a crash at any point leaves either the old
    /// or the new file fully intact. The previous file survives one
    /// generation as `patches~`.
    pub fn save(&self, dir: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        let tmp_path = dir.join("1patches.tmp");
        let live_path = dir.join("patches");
        let backup_path = dir.join("patches~");

        {
            let mut tmp = fs::File::create(&tmp_path)?;
            tmp.write_all(&bytes)?;
            tmp.sync_all()?;
        }

        // Only rotate once the temp file is durable.
        if live_path.exists() {
            fs::rename(&live_path, &backup_path)?;
        }
        fs::rename(&tmp_path, &live_path)?;
        Ok(())
    }
}

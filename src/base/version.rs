//! On-disk format versions
//!
//! The first 8 bytes of the `base` file select one of five formats. The
//! record layout is identical across all five; what differs is the name
//! index surface: only the two newest carry the sorted surname/first-name
//! indices, and `GnWb0023` sorts first names particle-aware where
//! `GnWb0024` uses plain lexical order.

use std::path::Path;

use crate::error::{BaseError, Result};

/// Length of the magic prefix
pub const MAGIC_LEN: usize = 8;

/// A supported base format version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormatVersion {
    GnWb0020,
    GnWb0021,
    GnWb0022,
    GnWb0023,
    GnWb0024,
}

impl FormatVersion {
    /// The version written by the importer
    pub const NEWEST: FormatVersion = FormatVersion::GnWb0024;

    /// Identify a magic prefix
    ///
    /// An unknown `GnWb` magic is a wrong (future or dropped) version;
    /// anything else is not a database at all.
    pub fn from_magic(magic: &[u8; MAGIC_LEN], dir: &Path) -> Result<FormatVersion> {
        match magic {
            b"GnWb0020" => Ok(FormatVersion::GnWb0020),
            b"GnWb0021" => Ok(FormatVersion::GnWb0021),
            b"GnWb0022" => Ok(FormatVersion::GnWb0022),
            b"GnWb0023" => Ok(FormatVersion::GnWb0023),
            b"GnWb0024" => Ok(FormatVersion::GnWb0024),
            m if m.starts_with(b"GnWb") => Err(BaseError::UnsupportedVersion(
                String::from_utf8_lossy(m).into_owned(),
            )),
            _ => Err(BaseError::NotADatabase(dir.to_path_buf())),
        }
    }

    /// The 8-byte magic prefix of this version
    pub fn magic(self) -> &'static [u8; MAGIC_LEN] {
        match self {
            FormatVersion::GnWb0020 => b"GnWb0020",
            FormatVersion::GnWb0021 => b"GnWb0021",
            FormatVersion::GnWb0022 => b"GnWb0022",
            FormatVersion::GnWb0023 => b"GnWb0023",
            FormatVersion::GnWb0024 => b"GnWb0024",
        }
    }

    /// Whether the sorted surname/first-name indices exist in this format
    pub fn has_sorted_names(self) -> bool {
        self >= FormatVersion::GnWb0023
    }

    /// Whether first names sort particle-aware (only `GnWb0023`)
    pub fn particle_first_names(self) -> bool {
        self == FormatVersion::GnWb0023
    }
}

//! # GenBase
//!
//! A genealogical record store with:
//! - Compact binary on-disk format with per-record random access
//! - Copy-on-write patch overlay over an immutable base file
//! - Hashed and sorted name indices with folding-aware lookup
//! - GEDCOM import producing a fully indexed database
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Database                               │
//! │              (BaseFunc: read / patch / commit)               │
//! └──────────┬──────────────────────────────┬───────────────────┘
//!            │                              │
//! ┌──────────▼──────────┐        ┌──────────▼──────────┐
//! │    RecordAccess     │        │      NameIndex      │
//! │  (pending over      │        │  (hash buckets +    │
//! │   committed over    │        │   sorted surname /  │
//! │   disk)             │        │   first-name files) │
//! └──────────┬──────────┘        └──────────┬──────────┘
//!            │                              │
//! ┌──────────▼──────────┐        ┌──────────▼──────────┐
//! │  ImmutableSegment   │        │  names.inx          │
//! │  (base + base.acc)  │        │  snames / fnames    │
//! └─────────────────────┘        └─────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod iovalue;
pub mod records;
pub mod segment;
pub mod name;
pub mod base;
pub mod writer;
pub mod gedcom;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use base::{BaseFunc, Database, FormatVersion};
pub use config::{OpenOptions, OpenOptionsBuilder};
pub use error::{BaseError, Result};
pub use writer::{BaseData, DatabaseBuilder};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of GenBase
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

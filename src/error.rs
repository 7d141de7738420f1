//! Error types for genbase
//!
//! Provides a unified error type for all operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using BaseError
pub type Result<T> = std::result::Result<T, BaseError>;

/// Unified error type for genbase operations
#[derive(Debug, Error)]
pub enum BaseError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Not-Found Errors (missing file/record/key, out-of-range index)
    // -------------------------------------------------------------------------
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{kind} index {index} out of range (len {len})")]
    OutOfRange {
        kind: &'static str,
        index: i32,
        len: u32,
    },

    // -------------------------------------------------------------------------
    // Format Errors (distinguish "not a database" from "wrong version")
    // -------------------------------------------------------------------------
    #[error("Not a genbase database: {0}")]
    NotADatabase(PathBuf),

    #[error("Unsupported database version: {0:?}")]
    UnsupportedVersion(String),

    // -------------------------------------------------------------------------
    // Corruption Errors (offset/boundary mismatch is fatal, never guessed at)
    // -------------------------------------------------------------------------
    #[error("Corrupt data: {0}")]
    Corrupt(String),

    // -------------------------------------------------------------------------
    // Permission Errors
    // -------------------------------------------------------------------------
    #[error("Database is read-only")]
    ReadOnly,

    #[error("Database is locked by another writer: {0}")]
    Locked(PathBuf),

    // -------------------------------------------------------------------------
    // Unimplemented Operations
    // -------------------------------------------------------------------------
    #[error("Operation not implemented: {0}")]
    Unimplemented(&'static str),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),
}

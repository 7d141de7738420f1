//! Open-time options for a genbase database
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Options controlling how a database directory is opened
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    // -------------------------------------------------------------------------
    // Permission Configuration
    // -------------------------------------------------------------------------
    /// Force read-only mode even when no `commit_timestamp` marker exists.
    /// Read-only opens skip the advisory writer lock.
    pub read_only: bool,

    // -------------------------------------------------------------------------
    // Name-Sorting Configuration
    // -------------------------------------------------------------------------
    /// Override the particle file. When `None`, `particles.txt` inside the
    /// database directory is used if present, else the built-in list.
    pub particles_file: Option<PathBuf>,
}

impl OpenOptions {
    /// Create a new options builder
    pub fn builder() -> OpenOptionsBuilder {
        OpenOptionsBuilder::default()
    }
}

/// Builder for OpenOptions
#[derive(Default)]
pub struct OpenOptionsBuilder {
    options: OpenOptions,
}

impl OpenOptionsBuilder {
    /// Request a read-only handle
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.options.read_only = read_only;
        self
    }

    /// Use a specific particle file instead of `particles.txt`
    pub fn particles_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.particles_file = Some(path.into());
        self
    }

    pub fn build(self) -> OpenOptions {
        self.options
    }
}

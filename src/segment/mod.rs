//! Record access over immutable on-disk arrays
//!
//! [`ImmutableSegment`] gives offset-indexed, read-only access to one array
//! inside the `base` file; [`RecordAccess`] composes it with the two patch
//! overlay layers (durable patches and session-only pending edits).

mod access;
mod immutable;

pub use access::{PatchTable, RecordAccess};
pub use immutable::{ImmutableSegment, SharedFile};

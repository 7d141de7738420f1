//! Name normalization and name-search indices
//!
//! Everything person-lookup: casefolding and accent stripping, the phonetic
//! "crush" fold behind the hash buckets, particle-aware surname ordering,
//! and the readers for the four on-disk name index files.

mod index;
mod normalize;
mod particles;

pub use index::{lower_bound, name_index_key, upper_bound, NameIndex, SortedNames, TABLE_SIZE};
pub use normalize::{abbrev, crush, crush_lower, lower};
pub use particles::{
    compare_after_particle, default_particles, load_particles, surname_after_particle,
    DEFAULT_PARTICLES,
};

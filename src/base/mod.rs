//! The database layer
//!
//! [`Database`] aggregates the seven record tables, the patch overlay, the
//! name indices and the mutation/query API. [`BaseFunc`] is the capability
//! trait over that operation set; version-specific behavior hides behind
//! the single version-dispatching [`Database::open`].

mod database;
mod lock;
mod patches;
mod version;

pub use database::Database;
pub use lock::WriterLock;
pub use patches::{PatchesHt, PATCHES_MAGIC};
pub use version::{FormatVersion, MAGIC_LEN};

use crate::error::Result;
use crate::records::{
    DskAscend, DskCouple, DskDescend, DskFamily, DskPerson, DskUnion, Ifam, Iper, Istr,
};

/// The operation set of an open database
///
/// Mutating calls fail with a permission error on a read-only base (opened
/// read-only, or carrying a `commit_timestamp` marker).
pub trait BaseFunc {
    // -------------------------------------------------------------------------
    // Table lengths
    // -------------------------------------------------------------------------
    fn nb_of_persons(&self) -> u32;
    fn nb_of_families(&self) -> u32;
    fn nb_of_strings(&self) -> u32;

    // -------------------------------------------------------------------------
    // Materialization (the explicit I/O point: handles are cheap, records
    // are read on demand)
    // -------------------------------------------------------------------------
    fn person(&self, i: Iper) -> Result<DskPerson>;
    fn ascend(&self, i: Iper) -> Result<DskAscend>;
    fn union_of(&self, i: Iper) -> Result<DskUnion>;
    fn family(&self, i: Ifam) -> Result<DskFamily>;
    fn couple(&self, i: Ifam) -> Result<DskCouple>;
    fn descend(&self, i: Ifam) -> Result<DskDescend>;
    fn string_of(&self, i: Istr) -> Result<String>;
    fn get_father(&self, i: Ifam) -> Result<Iper>;
    fn get_mother(&self, i: Ifam) -> Result<Iper>;

    // -------------------------------------------------------------------------
    // Mutation (pending layer only; durable after commit_patches)
    // -------------------------------------------------------------------------
    fn patch_person(&mut self, i: Iper, p: DskPerson) -> Result<()>;
    fn patch_ascend(&mut self, i: Iper, a: DskAscend) -> Result<()>;
    fn patch_union(&mut self, i: Iper, u: DskUnion) -> Result<()>;
    fn patch_family(&mut self, i: Ifam, f: DskFamily) -> Result<()>;
    fn patch_couple(&mut self, i: Ifam, c: DskCouple) -> Result<()>;
    fn patch_descend(&mut self, i: Ifam, d: DskDescend) -> Result<()>;
    fn insert_string(&mut self, s: &str) -> Result<Istr>;
    fn commit_patches(&mut self) -> Result<()>;

    // -------------------------------------------------------------------------
    // Notes (opaque text files)
    // -------------------------------------------------------------------------
    fn read_notes(&self) -> Result<String>;
    fn read_wiznotes(&self, wizard: &str) -> Result<String>;
    fn commit_notes(&mut self, text: &str) -> Result<()>;
    fn commit_wiznotes(&mut self, wizard: &str, text: &str) -> Result<()>;

    // -------------------------------------------------------------------------
    // Name search
    // -------------------------------------------------------------------------
    /// Hash-bucket lookup: every person indexed under a name folding to the
    /// same bucket as `name`
    fn persons_of_name(&self, name: &str) -> Result<Vec<Iper>>;

    /// Exact key lookup by `(first, surname, occ)`
    fn person_of_key(&self, first: &str, surname: &str, occ: i32) -> Result<Option<Iper>>;

    /// Posting list of one surname
    fn persons_of_surname(&self, i: Istr) -> Result<Vec<Iper>>;

    /// Posting list of one first name
    fn persons_of_first_name(&self, i: Istr) -> Result<Vec<Iper>>;

    /// Smallest indexed surname `>= s` (alphabetic browsing entry point)
    fn surname_cursor(&self, s: &str) -> Result<Option<Istr>>;

    /// Smallest indexed surname strictly after the one behind `i`
    fn surname_next(&self, i: Istr) -> Result<Option<Istr>>;

    /// Smallest indexed first name `>= s`
    fn first_name_cursor(&self, s: &str) -> Result<Option<Istr>>;

    /// Smallest indexed first name strictly after the one behind `i`
    fn first_name_next(&self, i: Istr) -> Result<Option<Istr>>;
}

//! Database writer
//!
//! Produces exactly the file set the engine reads: `base`, `base.acc`, and
//! the four name index files. Every offset is computed by accumulating
//! [`iovalue::size`](crate::iovalue::size) from each section's start; the
//! writer never re-reads bytes it just wrote, which is why the codec's
//! size contract must be exact.

mod base_files;
mod name_files;

use std::fs;
use std::path::Path;

use crate::error::{BaseError, Result};
use crate::records::{
    DskAscend, DskCouple, DskDescend, DskFamily, DskPerson, DskUnion, Istr,
};

/// A complete in-memory base, ready to be written
///
/// The three person-keyed tables must be index-aligned and equally long,
/// as must the three family-keyed ones. Strings must already be interned
/// with `""` at 0 and `"?"` at 1.
pub struct BaseData {
    pub persons: Vec<DskPerson>,
    pub ascends: Vec<DskAscend>,
    pub unions: Vec<DskUnion>,
    pub families: Vec<DskFamily>,
    pub couples: Vec<DskCouple>,
    pub descends: Vec<DskDescend>,
    pub strings: Vec<String>,
    pub origin_file: String,
    /// Particle list used to order the surname index
    pub particles: Vec<String>,
}

/// Writes a [`BaseData`] as a database directory
pub struct DatabaseBuilder;

impl DatabaseBuilder {
    /// Write all files of a fresh database into `dir`
    ///
    /// The directory is created if needed. A fresh import is immediately
    /// queryable: the name index files are regenerated from the persons
    /// array with the same rules the query side uses.
    pub fn write(dir: &Path, data: &BaseData) -> Result<()> {
        Self::validate(data)?;
        fs::create_dir_all(dir)?;

        base_files::write_base_and_acc(dir, data)?;
        name_files::write_hash_index(dir, data)?;
        name_files::write_sorted_indices(dir, data)?;
        Self::write_particles(dir, &data.particles)?;

        tracing::info!(
            dir = %dir.display(),
            persons = data.persons.len(),
            families = data.families.len(),
            strings = data.strings.len(),
            "database written"
        );
        Ok(())
    }

    fn validate(data: &BaseData) -> Result<()> {
        let pl = data.persons.len();
        if data.ascends.len() != pl || data.unions.len() != pl {
            return Err(BaseError::Serialization(format!(
                "person-keyed tables disagree: {} persons, {} ascends, {} unions",
                pl,
                data.ascends.len(),
                data.unions.len()
            )));
        }
        let fl = data.families.len();
        if data.couples.len() != fl || data.descends.len() != fl {
            return Err(BaseError::Serialization(format!(
                "family-keyed tables disagree: {} families, {} couples, {} descends",
                fl,
                data.couples.len(),
                data.descends.len()
            )));
        }
        if data.strings.len() < 2 || data.strings[0] != "" || data.strings[1] != "?" {
            return Err(BaseError::Serialization(
                "strings table must reserve index 0 for \"\" and 1 for \"?\"".to_string(),
            ));
        }

        // Every string handle must resolve; the index builders index the
        // strings table directly.
        let nstrings = data.strings.len();
        let check = |istr: Istr, what: &str, i: usize| -> Result<()> {
            if istr < 0 || istr as usize >= nstrings {
                return Err(BaseError::Serialization(format!(
                    "{} {}: string handle {} out of range ({} strings)",
                    what, i, istr, nstrings
                )));
            }
            Ok(())
        };
        for (i, p) in data.persons.iter().enumerate() {
            let handles = [
                p.first_name,
                p.surname,
                p.public_name,
                p.occupation,
                p.birth_place,
                p.baptism_place,
                p.death_place,
                p.burial_place,
                p.notes,
                p.psources,
            ];
            for istr in handles
                .into_iter()
                .chain(p.qualifiers.iter().copied())
                .chain(p.aliases.iter().copied())
            {
                check(istr, "person", i)?;
            }
        }
        for (i, f) in data.families.iter().enumerate() {
            for istr in [
                f.marriage_place,
                f.marriage_src,
                f.comment,
                f.origin_file,
                f.fsources,
            ] {
                check(istr, "family", i)?;
            }
        }
        Ok(())
    }

    /// Persist the particle list the sorted indices were built with
    ///
    /// The query side must order with the same list; `particles.txt` uses
    /// `_` for spaces, matching the load format.
    fn write_particles(dir: &Path, particles: &[String]) -> Result<()> {
        let mut text = String::with_capacity(particles.len() * 8);
        for p in particles {
            text.push_str(&p.replace(' ', "_"));
            text.push('\n');
        }
        fs::write(dir.join("particles.txt"), text)?;
        Ok(())
    }
}

//! Name index file emission
//!
//! Rebuilds all four name index files from the in-memory persons array
//! using the same folding and ordering rules the query side applies, so a
//! fresh import answers name searches with no further work.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::iovalue::{self, Value, TAG_ARRAY};
use crate::name::{compare_after_particle, name_index_key, TABLE_SIZE};
use crate::records::{DskPerson, Iper, Istr};

use super::BaseData;

/// Build `names.inx`: the flat hash-bucket index
pub(super) fn write_hash_index(dir: &Path, data: &BaseData) -> Result<()> {
    let mut buckets: Vec<Vec<Iper>> = vec![Vec::new(); TABLE_SIZE as usize];
    for (iper, person) in data.persons.iter().enumerate() {
        let iper = iper as Iper;
        for key in misc_names(data, person) {
            let bucket = &mut buckets[name_index_key(&key) as usize];
            if bucket.last() != Some(&iper) && !bucket.contains(&iper) {
                bucket.push(iper);
            }
        }
    }

    let mut out = BufWriter::new(fs::File::create(dir.join("names.inx"))?);
    out.write_all(&[TAG_ARRAY])?;
    out.write_all(&TABLE_SIZE.to_be_bytes())?;
    for bucket in &buckets {
        let value = Value::Array(bucket.iter().map(|&i| Value::Int(i)).collect());
        iovalue::encode_to(&mut out, &value)?;
    }
    out.flush()?;
    Ok(())
}

/// Build the sorted surname and first-name indices
///
/// Surnames order particle-aware; first names plain lexically (the order
/// of the newest format, which is what the importer writes).
pub(super) fn write_sorted_indices(dir: &Path, data: &BaseData) -> Result<()> {
    let surname_cmp =
        |a: &str, b: &str| compare_after_particle(&data.particles, a, b);
    write_sorted(
        dir,
        "snames",
        data,
        |p| p.surname,
        &surname_cmp,
    )?;
    write_sorted(
        dir,
        "fnames",
        data,
        |p| p.first_name,
        &|a: &str, b: &str| a.cmp(b),
    )?;
    Ok(())
}

fn write_sorted<K, C>(
    dir: &Path,
    stem: &str,
    data: &BaseData,
    key_of: K,
    cmp: &C,
) -> Result<()>
where
    K: Fn(&DskPerson) -> Istr,
    C: Fn(&str, &str) -> Ordering,
{
    let mut by_istr: BTreeMap<Istr, Vec<Iper>> = BTreeMap::new();
    for (iper, person) in data.persons.iter().enumerate() {
        by_istr
            .entry(key_of(person))
            .or_default()
            .push(iper as Iper);
    }
    let mut rows: Vec<(Istr, Vec<Iper>)> = by_istr.into_iter().collect();
    rows.sort_by(|a, b| {
        cmp(
            data.strings[a.0 as usize].as_str(),
            data.strings[b.0 as usize].as_str(),
        )
    });

    // Posting lists first; their offsets feed the index file.
    let mut dat = BufWriter::new(fs::File::create(dir.join(format!("{}.dat", stem)))?);
    let mut entries: Vec<(Istr, u32)> = Vec::with_capacity(rows.len());
    let mut pos: u32 = 0;
    for (istr, ipers) in &rows {
        entries.push((*istr, pos));
        dat.write_all(&(ipers.len() as u32).to_be_bytes())?;
        for iper in ipers {
            dat.write_all(&(*iper as u32).to_be_bytes())?;
        }
        pos += 4 + 4 * ipers.len() as u32;
    }
    dat.flush()?;

    let mut inx = BufWriter::new(fs::File::create(dir.join(format!("{}.inx", stem)))?);
    inx.write_all(&(entries.len() as u32).to_be_bytes())?;
    for (istr, offset) in &entries {
        inx.write_all(&(*istr as u32).to_be_bytes())?;
        inx.write_all(&offset.to_be_bytes())?;
    }
    inx.flush()?;
    Ok(())
}

/// All name keys a person is indexed under; must agree with the query side
fn misc_names(data: &BaseData, person: &DskPerson) -> Vec<String> {
    let first = &data.strings[person.first_name as usize];
    let surname = &data.strings[person.surname as usize];
    let mut out = vec![format!("{} {}", first, surname)];
    let public = &data.strings[person.public_name as usize];
    if !public.is_empty() {
        out.push(format!("{} {}", public, surname));
    }
    for &alias in &person.aliases {
        out.push(data.strings[alias as usize].clone());
    }
    out
}

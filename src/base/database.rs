//! The Database handle
//!
//! Open sequence:
//! 1. Read the 8-byte magic of `base` and dispatch on the format version
//! 2. Read three table lengths, seven section offsets and the origin-file
//!    string from the fixed header
//! 3. Open `base.acc` if present (its absence forces whole-array loads)
//! 4. Load the `patches` file into the committed overlay
//! 5. Decide permissions (`commit_timestamp` marker or an explicit
//!    read-only request) and take the advisory writer lock if writable
//! 6. Load the particle list and wire the name indices
//!
//! The base and accessor files are immutable once written by the importer;
//! every later edit lives in the patches file, copy-on-write.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::OpenOptions;
use crate::error::{BaseError, Result};
use crate::iovalue;
use crate::name::{
    compare_after_particle, default_particles, load_particles, lower, lower_bound, name_index_key,
    upper_bound, NameIndex,
};
use crate::records::{
    DskAscend, DskCouple, DskDescend, DskFamily, DskPerson, DskUnion, Ifam, Iper, Istr,
};
use crate::segment::{ImmutableSegment, RecordAccess, SharedFile};

use super::lock::WriterLock;
use super::patches::PatchesHt;
use super::version::{FormatVersion, MAGIC_LEN};
use super::BaseFunc;

/// An open database directory (`*.gwb`)
pub struct Database {
    dir: PathBuf,
    version: FormatVersion,
    read_only: bool,
    origin_file: String,
    particles: Vec<String>,

    persons: RecordAccess<DskPerson>,
    ascends: RecordAccess<DskAscend>,
    unions: RecordAccess<DskUnion>,
    families: RecordAccess<DskFamily>,
    couples: RecordAccess<DskCouple>,
    descends: RecordAccess<DskDescend>,
    strings: RecordAccess<String>,

    names: NameIndex,

    /// Advisory single-writer lock, held while this handle is writable
    _lock: Option<WriterLock>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("dir", &self.dir)
            .field("version", &self.version)
            .field("read_only", &self.read_only)
            .field("persons", &self.persons.len())
            .field("families", &self.families.len())
            .field("strings", &self.strings.len())
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Open a database directory
    pub fn open(dir: &Path, options: OpenOptions) -> Result<Database> {
        let base_path = dir.join("base");
        let file = fs::File::open(&base_path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BaseError::NotFound(format!("no base file in {}", dir.display()))
            } else {
                BaseError::Io(e)
            }
        })?;
        let mut reader = BufReader::new(file);

        // Magic + fixed header: 3 lengths, 7 section offsets, origin string.
        let mut magic = [0u8; MAGIC_LEN];
        reader.read_exact(&mut magic)?;
        let version = FormatVersion::from_magic(&magic, dir)?;

        let persons_len = read_u32(&mut reader)?;
        let families_len = read_u32(&mut reader)?;
        let strings_len = read_u32(&mut reader)?;
        let mut offsets = [0u64; 7];
        for slot in offsets.iter_mut() {
            *slot = read_u32(&mut reader)? as u64;
        }
        let origin_file = iovalue::decode_from(&mut reader)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| BaseError::Corrupt("header origin-file is not a string".to_string()))?;

        let base: SharedFile = Arc::new(Mutex::new(reader));
        let acc: Option<SharedFile> = match fs::File::open(dir.join("base.acc")) {
            Ok(f) => Some(Arc::new(Mutex::new(BufReader::new(f)))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let patches = PatchesHt::load(&dir.join("patches"))?
            .unwrap_or_else(|| PatchesHt::empty(persons_len, families_len, strings_len));

        // Accessor-file layout: seven offset arrays back to back, in table
        // order, 4 bytes per element.
        let pl = persons_len as u64;
        let fl = families_len as u64;
        let shifts = [
            0,
            4 * pl,
            8 * pl,
            12 * pl,
            12 * pl + 4 * fl,
            12 * pl + 8 * fl,
            12 * pl + 12 * fl,
        ];

        // One segment per table, all sharing the two file handles.
        macro_rules! table {
            ($k:expr, $len:expr, $patches:expr) => {
                RecordAccess::new(
                    ImmutableSegment::new(
                        Arc::clone(&base),
                        acc.clone(),
                        offsets[$k],
                        shifts[$k],
                        $len,
                    ),
                    $patches,
                )
            };
        }
        let mut persons = table!(0, persons_len, patches.persons);
        let mut ascends = table!(1, persons_len, patches.ascends);
        let mut unions = table!(2, persons_len, patches.unions);
        let mut families = table!(3, families_len, patches.families);
        let mut couples = table!(4, families_len, patches.couples);
        let mut descends = table!(5, families_len, patches.descends);
        let strings = table!(6, strings_len, patches.strings);

        // The three iper-keyed tables share one logical length, as do the
        // three ifam-keyed ones.
        let iper_len = persons.len().max(ascends.len()).max(unions.len());
        persons.set_min_len(iper_len);
        ascends.set_min_len(iper_len);
        unions.set_min_len(iper_len);
        let ifam_len = families.len().max(couples.len()).max(descends.len());
        families.set_min_len(ifam_len);
        couples.set_min_len(ifam_len);
        descends.set_min_len(ifam_len);

        let read_only = options.read_only || dir.join("commit_timestamp").exists();
        let lock = if read_only {
            None
        } else {
            Some(WriterLock::acquire(dir)?)
        };

        let particles = match &options.particles_file {
            Some(path) => load_particles(path)?,
            None => {
                let default_path = dir.join("particles.txt");
                if default_path.exists() {
                    load_particles(&default_path)?
                } else {
                    default_particles()
                }
            }
        };

        let names = NameIndex::open(dir, version);

        tracing::debug!(
            dir = %dir.display(),
            ?version,
            persons = iper_len,
            families = ifam_len,
            strings = strings.len(),
            read_only,
            "database opened"
        );

        Ok(Database {
            dir: dir.to_path_buf(),
            version,
            read_only,
            origin_file,
            particles,
            persons,
            ascends,
            unions,
            families,
            couples,
            descends,
            strings,
            names,
            _lock: lock,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn version(&self) -> FormatVersion {
        self.version
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn origin_file(&self) -> &str {
        &self.origin_file
    }

    pub fn particles(&self) -> &[String] {
        &self.particles
    }

    /// Drop every whole-array and name-index cache
    pub fn clear_caches(&self) {
        self.persons.clear_array();
        self.ascends.clear_array();
        self.unions.clear_array();
        self.families.clear_array();
        self.couples.clear_array();
        self.descends.clear_array();
        self.strings.clear_array();
        self.names.clear_caches();
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only {
            Err(BaseError::ReadOnly)
        } else {
            Ok(())
        }
    }

    /// All name keys a person is indexed under
    fn misc_names(&self, p: &DskPerson) -> Result<Vec<String>> {
        let first = self.string_of(p.first_name)?;
        let surname = self.string_of(p.surname)?;
        let mut out = vec![format!("{} {}", first, surname)];
        let public = self.string_of(p.public_name)?;
        if !public.is_empty() {
            out.push(format!("{} {}", public, surname));
        }
        for &alias in &p.aliases {
            out.push(self.string_of(alias)?);
        }
        Ok(out)
    }

    /// The comparator of one sorted index
    ///
    /// Surnames are always particle-aware. First names are plain lexical in
    /// the newest format and particle-aware in `GnWb0023`; build and query
    /// must agree or binary search breaks.
    fn cmp_names(&self, surname: bool, a: &str, b: &str) -> Ordering {
        if surname || self.version.particle_first_names() {
            compare_after_particle(&self.particles, a, b)
        } else {
            a.cmp(b)
        }
    }

    /// The in-memory counterpart of one sorted index, built from the
    /// current patch layers: `(resolved string, istr, ipers)` rows in index
    /// order
    fn patched_names(&self, surname: bool) -> Result<Vec<(String, Istr, Vec<Iper>)>> {
        let mut by_istr: std::collections::BTreeMap<Istr, Vec<Iper>> = Default::default();
        for (iper, p) in self.persons.patched() {
            let istr = if surname { p.surname } else { p.first_name };
            by_istr.entry(istr).or_default().push(iper);
        }
        let mut rows = by_istr
            .into_iter()
            .map(|(istr, ipers)| Ok((self.string_of(istr)?, istr, ipers)))
            .collect::<Result<Vec<_>>>()?;
        rows.sort_by(|a, b| self.cmp_names(surname, &a.0, &b.0));
        Ok(rows)
    }

    fn rows_lower_bound(
        &self,
        surname: bool,
        rows: &[(String, Istr, Vec<Iper>)],
        target: &str,
    ) -> usize {
        rows.partition_point(|(s, _, _)| self.cmp_names(surname, s, target) == Ordering::Less)
    }

    fn rows_upper_bound(
        &self,
        surname: bool,
        rows: &[(String, Istr, Vec<Iper>)],
        target: &str,
    ) -> usize {
        rows.partition_point(|(s, _, _)| self.cmp_names(surname, s, target) != Ordering::Greater)
    }

    fn sorted_index(&self, surname: bool) -> Result<&crate::name::SortedNames> {
        if surname {
            self.names.surnames()
        } else {
            self.names.first_names()
        }
    }

    /// Posting-list lookup merging disk and patch layers
    fn sorted_find(&self, surname: bool, istr: Istr) -> Result<Vec<Iper>> {
        let target = self.string_of(istr)?;
        let index = self.sorted_index(surname)?;
        let entries = index.entries()?;
        let resolve = |i: Istr| self.string_of(i);
        let cmp = |a: &str, b: &str| self.cmp_names(surname, a, b);

        let mut disk: Vec<Iper> = Vec::new();
        let mut pos = lower_bound(&entries, &target, &resolve, &cmp)?;
        while pos < entries.len() {
            let s = resolve(entries[pos].0)?;
            if cmp(&s, &target) != Ordering::Equal {
                break;
            }
            disk.extend(index.postings(entries[pos].1)?);
            pos += 1;
        }

        // A patched person's stored posting may be stale; drop it and
        // re-add from the patch rows when the current name still matches.
        let patched_set: HashSet<Iper> = self.persons.patched().map(|(i, _)| i).collect();
        let mut out: Vec<Iper> = disk
            .into_iter()
            .filter(|i| !patched_set.contains(i))
            .collect();

        let rows = self.patched_names(surname)?;
        let lo = self.rows_lower_bound(surname, &rows, &target);
        let hi = self.rows_upper_bound(surname, &rows, &target);
        for (_, _, ipers) in &rows[lo..hi] {
            out.extend(ipers.iter().copied());
        }

        Ok(dedup_keep_order(out))
    }

    /// Ceiling lookup merging disk and patch layers
    fn sorted_cursor(&self, surname: bool, target: &str) -> Result<Option<Istr>> {
        let index = self.sorted_index(surname)?;
        let entries = index.entries()?;
        let resolve = |i: Istr| self.string_of(i);
        let cmp = |a: &str, b: &str| self.cmp_names(surname, a, b);

        let pos = lower_bound(&entries, target, &resolve, &cmp)?;
        let disk = match entries.get(pos) {
            Some(&(istr, _)) => Some((resolve(istr)?, istr)),
            None => None,
        };

        let rows = self.patched_names(surname)?;
        let rpos = self.rows_lower_bound(surname, &rows, target);
        let patch = rows.get(rpos).map(|(s, istr, _)| (s.clone(), *istr));

        Ok(merge_candidates(disk, patch, &cmp))
    }

    /// Strict-successor lookup merging disk and patch layers
    fn sorted_next(&self, surname: bool, istr: Istr) -> Result<Option<Istr>> {
        let target = self.string_of(istr)?;
        let index = self.sorted_index(surname)?;
        let entries = index.entries()?;
        let resolve = |i: Istr| self.string_of(i);
        let cmp = |a: &str, b: &str| self.cmp_names(surname, a, b);

        let pos = upper_bound(&entries, &target, &resolve, &cmp)?;
        let disk = match entries.get(pos) {
            Some(&(i, _)) => Some((resolve(i)?, i)),
            None => None,
        };

        let rows = self.patched_names(surname)?;
        let rpos = self.rows_upper_bound(surname, &rows, &target);
        let patch = rows.get(rpos).map(|(s, i, _)| (s.clone(), *i));

        Ok(merge_candidates(disk, patch, &cmp))
    }
}

impl BaseFunc for Database {
    fn nb_of_persons(&self) -> u32 {
        self.persons.len()
    }

    fn nb_of_families(&self) -> u32 {
        self.families.len()
    }

    fn nb_of_strings(&self) -> u32 {
        self.strings.len()
    }

    fn person(&self, i: Iper) -> Result<DskPerson> {
        self.persons.get(i)
    }

    fn ascend(&self, i: Iper) -> Result<DskAscend> {
        self.ascends.get(i)
    }

    fn union_of(&self, i: Iper) -> Result<DskUnion> {
        self.unions.get(i)
    }

    fn family(&self, i: Ifam) -> Result<DskFamily> {
        self.families.get(i)
    }

    fn couple(&self, i: Ifam) -> Result<DskCouple> {
        self.couples.get(i)
    }

    fn descend(&self, i: Ifam) -> Result<DskDescend> {
        self.descends.get(i)
    }

    fn string_of(&self, i: Istr) -> Result<String> {
        self.strings.get(i)
    }

    fn get_father(&self, i: Ifam) -> Result<Iper> {
        Ok(self.couple(i)?.father)
    }

    fn get_mother(&self, i: Ifam) -> Result<Iper> {
        Ok(self.couple(i)?.mother)
    }

    fn patch_person(&mut self, i: Iper, p: DskPerson) -> Result<()> {
        self.ensure_writable()?;
        self.persons.patch(i, p)?;
        let len = self.persons.len();
        self.ascends.set_min_len(len);
        self.unions.set_min_len(len);
        Ok(())
    }

    fn patch_ascend(&mut self, i: Iper, a: DskAscend) -> Result<()> {
        self.ensure_writable()?;
        self.ascends.patch(i, a)?;
        let len = self.ascends.len();
        self.persons.set_min_len(len);
        self.unions.set_min_len(len);
        Ok(())
    }

    fn patch_union(&mut self, i: Iper, u: DskUnion) -> Result<()> {
        self.ensure_writable()?;
        self.unions.patch(i, u)?;
        let len = self.unions.len();
        self.persons.set_min_len(len);
        self.ascends.set_min_len(len);
        Ok(())
    }

    fn patch_family(&mut self, i: Ifam, f: DskFamily) -> Result<()> {
        self.ensure_writable()?;
        self.families.patch(i, f)?;
        let len = self.families.len();
        self.couples.set_min_len(len);
        self.descends.set_min_len(len);
        Ok(())
    }

    fn patch_couple(&mut self, i: Ifam, c: DskCouple) -> Result<()> {
        self.ensure_writable()?;
        self.couples.patch(i, c)?;
        let len = self.couples.len();
        self.families.set_min_len(len);
        self.descends.set_min_len(len);
        Ok(())
    }

    fn patch_descend(&mut self, i: Ifam, d: DskDescend) -> Result<()> {
        self.ensure_writable()?;
        self.descends.patch(i, d)?;
        let len = self.descends.len();
        self.families.set_min_len(len);
        self.couples.set_min_len(len);
        Ok(())
    }

    fn insert_string(&mut self, s: &str) -> Result<Istr> {
        self.ensure_writable()?;
        self.strings.insert_string(s)
    }

    /// Merge every pending map into the committed patches, then atomically
    /// replace the patches file (temp write, backup rotation)
    fn commit_patches(&mut self) -> Result<()> {
        self.ensure_writable()?;
        self.persons.merge_pending();
        self.ascends.merge_pending();
        self.unions.merge_pending();
        self.families.merge_pending();
        self.couples.merge_pending();
        self.descends.merge_pending();
        self.strings.merge_pending();

        let ht = PatchesHt {
            persons: self.persons.committed_table().clone(),
            ascends: self.ascends.committed_table().clone(),
            unions: self.unions.committed_table().clone(),
            families: self.families.committed_table().clone(),
            couples: self.couples.committed_table().clone(),
            descends: self.descends.committed_table().clone(),
            strings: self.strings.committed_table().clone(),
        };
        ht.save(&self.dir)?;
        tracing::info!(dir = %self.dir.display(), "patches committed");
        Ok(())
    }

    fn read_notes(&self) -> Result<String> {
        read_text_or_empty(&self.dir.join("notes"))
    }

    fn read_wiznotes(&self, wizard: &str) -> Result<String> {
        read_text_or_empty(&self.dir.join("wiznotes").join(format!("{}.txt", wizard)))
    }

    fn commit_notes(&mut self, _text: &str) -> Result<()> {
        self.ensure_writable()?;
        Err(BaseError::Unimplemented("commit_notes"))
    }

    fn commit_wiznotes(&mut self, _wizard: &str, _text: &str) -> Result<()> {
        self.ensure_writable()?;
        Err(BaseError::Unimplemented("commit_wiznotes"))
    }

    fn persons_of_name(&self, name: &str) -> Result<Vec<Iper>> {
        let key = name_index_key(name);
        let mut out = self.names.bucket(key)?;
        for (iper, p) in self.persons.patched() {
            let p = p.clone();
            for name_key in self.misc_names(&p)? {
                if name_index_key(&name_key) == key {
                    out.push(iper);
                    break;
                }
            }
        }
        Ok(dedup_keep_order(out))
    }

    fn person_of_key(&self, first: &str, surname: &str, occ: i32) -> Result<Option<Iper>> {
        let first_key = lower(first);
        let surname_key = lower(surname);
        for iper in self.persons_of_name(&format!("{} {}", first, surname))? {
            let p = self.person(iper)?;
            if p.occ == occ
                && lower(&self.string_of(p.first_name)?) == first_key
                && lower(&self.string_of(p.surname)?) == surname_key
            {
                return Ok(Some(iper));
            }
        }
        Ok(None)
    }

    fn persons_of_surname(&self, i: Istr) -> Result<Vec<Iper>> {
        self.sorted_find(true, i)
    }

    fn persons_of_first_name(&self, i: Istr) -> Result<Vec<Iper>> {
        self.sorted_find(false, i)
    }

    fn surname_cursor(&self, s: &str) -> Result<Option<Istr>> {
        self.sorted_cursor(true, s)
    }

    fn surname_next(&self, i: Istr) -> Result<Option<Istr>> {
        self.sorted_next(true, i)
    }

    fn first_name_cursor(&self, s: &str) -> Result<Option<Istr>> {
        self.sorted_cursor(false, s)
    }

    fn first_name_next(&self, i: Istr) -> Result<Option<Istr>> {
        self.sorted_next(false, i)
    }
}

// =============================================================================
// Free helpers
// =============================================================================

fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            BaseError::Corrupt("truncated base header".to_string())
        } else {
            BaseError::Io(e)
        }
    })?;
    Ok(u32::from_be_bytes(buf))
}

fn read_text_or_empty(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

fn dedup_keep_order(ipers: Vec<Iper>) -> Vec<Iper> {
    let mut seen = HashSet::with_capacity(ipers.len());
    ipers.into_iter().filter(|i| seen.insert(*i)).collect()
}

/// Pick the smaller of two merge candidates; on a tie the disk side wins
fn merge_candidates<C>(
    disk: Option<(String, Istr)>,
    patch: Option<(String, Istr)>,
    cmp: &C,
) -> Option<Istr>
where
    C: Fn(&str, &str) -> Ordering,
{
    match (disk, patch) {
        (None, None) => None,
        (Some((_, i)), None) => Some(i),
        (None, Some((_, i))) => Some(i),
        (Some((ds, di)), Some((ps, pi))) => {
            if cmp(&ps, &ds) == Ordering::Less {
                Some(pi)
            } else {
                Some(di)
            }
        }
    }
}

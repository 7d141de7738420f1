//! Tests for Database open, patching and commit
//!
//! These tests verify:
//! - Opening a freshly written directory and reading every table
//! - Magic/version dispatch on open
//! - Read-only enforcement (explicit and commit_timestamp marker)
//! - Patch visibility before and after commit, across reopen
//! - Deterministic commits and patches-file backup rotation
//! - The advisory single-writer lock

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use genbase::records::{
    Cdate, Date, Dmy, DskAscend, DskCouple, DskDescend, DskFamily, DskPerson, DskUnion,
    Calendar, Sex, DUMMY,
};
use genbase::{BaseData, BaseError, BaseFunc, Database, DatabaseBuilder, OpenOptions};

// =============================================================================
// Helper Functions
// =============================================================================

/// Two spouses and a child, one family
fn sample_data() -> BaseData {
    let strings = vec![
        "".to_string(),
        "?".to_string(),
        "John".to_string(),
        "Doe".to_string(),
        "Jane".to_string(),
        "Smith".to_string(),
        "Springfield".to_string(),
    ];

    let mut john = DskPerson::empty(0);
    john.first_name = 2;
    john.surname = 3;
    john.sex = Sex::Male;
    john.birth = Cdate::Date(Date::Structured(Dmy::exact(12, 1, 1900), Calendar::Gregorian));
    john.birth_place = 6;

    let mut jane = DskPerson::empty(1);
    jane.first_name = 4;
    jane.surname = 5;
    jane.sex = Sex::Female;

    let mut junior = DskPerson::empty(2);
    junior.first_name = 2;
    junior.surname = 3;
    junior.occ = 1;

    BaseData {
        persons: vec![john, jane, junior],
        ascends: vec![
            DskAscend::no_parents(),
            DskAscend::no_parents(),
            DskAscend { parents: 0, consang: -1 },
        ],
        unions: vec![
            DskUnion { families: vec![0] },
            DskUnion { families: vec![0] },
            DskUnion::default(),
        ],
        families: vec![DskFamily::empty(0)],
        couples: vec![DskCouple { father: 0, mother: 1 }],
        descends: vec![DskDescend { children: vec![2] }],
        strings,
        origin_file: "sample.ged".to_string(),
        particles: genbase::name::default_particles(),
    }
}

fn setup_db(dir: &Path) -> Database {
    DatabaseBuilder::write(dir, &sample_data()).unwrap();
    Database::open(dir, OpenOptions::default()).unwrap()
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_reads_every_table() {
    let temp = TempDir::new().unwrap();
    let base = setup_db(temp.path());

    assert_eq!(base.nb_of_persons(), 3);
    assert_eq!(base.nb_of_families(), 1);
    assert_eq!(base.nb_of_strings(), 7);
    assert_eq!(base.origin_file(), "sample.ged");
    assert!(!base.is_read_only());

    let john = base.person(0).unwrap();
    assert_eq!(base.string_of(john.first_name).unwrap(), "John");
    assert_eq!(base.string_of(john.surname).unwrap(), "Doe");
    assert_eq!(john.sex, Sex::Male);
    assert_eq!(base.string_of(john.birth_place).unwrap(), "Springfield");

    assert_eq!(base.ascend(2).unwrap().parents, 0);
    assert_eq!(base.ascend(0).unwrap().parents, DUMMY);
    assert_eq!(base.union_of(0).unwrap().families, vec![0]);
    assert_eq!(base.get_father(0).unwrap(), 0);
    assert_eq!(base.get_mother(0).unwrap(), 1);
    assert_eq!(base.descend(0).unwrap().children, vec![2]);
}

#[test]
fn test_database_handle_is_debuggable() {
    let temp = TempDir::new().unwrap();
    let base = setup_db(temp.path());
    let repr = format!("{:?}", base);
    assert!(repr.contains("Database"), "got {}", repr);
    assert!(repr.contains("read_only: false"), "got {}", repr);
}

#[test]
fn test_write_rejects_out_of_range_string_handle() {
    let temp = TempDir::new().unwrap();
    let mut data = sample_data();
    data.persons[1].surname = 99;
    let err = DatabaseBuilder::write(temp.path(), &data).unwrap_err();
    assert!(matches!(err, BaseError::Serialization(_)), "got {:?}", err);
    // Nothing half-written.
    assert!(!temp.path().join("base").exists());
}

#[test]
fn test_open_missing_directory() {
    let temp = TempDir::new().unwrap();
    let err = Database::open(&temp.path().join("nope"), OpenOptions::default()).unwrap_err();
    assert!(matches!(err, BaseError::NotFound(_)), "got {:?}", err);
}

#[test]
fn test_open_not_a_database() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("base"), b"definitely not a base file").unwrap();
    let err = Database::open(temp.path(), OpenOptions::default()).unwrap_err();
    assert!(matches!(err, BaseError::NotADatabase(_)), "got {:?}", err);
}

#[test]
fn test_open_unsupported_version() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("base"), b"GnWb9999trailing").unwrap();
    let err = Database::open(temp.path(), OpenOptions::default()).unwrap_err();
    assert!(
        matches!(err, BaseError::UnsupportedVersion(_)),
        "got {:?}",
        err
    );
}

// =============================================================================
// Read-only Tests
// =============================================================================

#[test]
fn test_explicit_read_only_rejects_mutation() {
    let temp = TempDir::new().unwrap();
    DatabaseBuilder::write(temp.path(), &sample_data()).unwrap();
    let options = OpenOptions::builder().read_only(true).build();
    let mut base = Database::open(temp.path(), options).unwrap();

    assert!(base.is_read_only());
    let p = base.person(0).unwrap();
    assert!(matches!(
        base.patch_person(0, p).unwrap_err(),
        BaseError::ReadOnly
    ));
    assert!(matches!(
        base.insert_string("x").unwrap_err(),
        BaseError::ReadOnly
    ));
    assert!(matches!(
        base.commit_patches().unwrap_err(),
        BaseError::ReadOnly
    ));
}

#[test]
fn test_commit_timestamp_marker_forces_read_only() {
    let temp = TempDir::new().unwrap();
    DatabaseBuilder::write(temp.path(), &sample_data()).unwrap();
    fs::write(temp.path().join("commit_timestamp"), b"1724457600").unwrap();
    let base = Database::open(temp.path(), OpenOptions::default()).unwrap();
    assert!(base.is_read_only());
}

#[test]
fn test_writer_lock_is_exclusive() {
    let temp = TempDir::new().unwrap();
    let _first = setup_db(temp.path());
    let err = Database::open(temp.path(), OpenOptions::default()).unwrap_err();
    assert!(matches!(err, BaseError::Locked(_)), "got {:?}", err);

    // Read-only opens skip the lock entirely.
    let options = OpenOptions::builder().read_only(true).build();
    Database::open(temp.path(), options).unwrap();
}

#[test]
fn test_writer_lock_released_on_drop() {
    let temp = TempDir::new().unwrap();
    {
        let _base = setup_db(temp.path());
    }
    Database::open(temp.path(), OpenOptions::default()).unwrap();
}

// =============================================================================
// Patch and Commit Tests
// =============================================================================

#[test]
fn test_patch_visible_before_commit() {
    let temp = TempDir::new().unwrap();
    let mut base = setup_db(temp.path());

    let mut jane = base.person(1).unwrap();
    jane.surname = base.insert_string("Doe").unwrap();
    base.patch_person(1, jane.clone()).unwrap();

    let seen = base.person(1).unwrap();
    assert_eq!(base.string_of(seen.surname).unwrap(), "Doe");
}

#[test]
fn test_uncommitted_patch_lost_on_reopen() {
    let temp = TempDir::new().unwrap();
    {
        let mut base = setup_db(temp.path());
        let mut jane = base.person(1).unwrap();
        jane.surname = base.insert_string("Doe").unwrap();
        base.patch_person(1, jane).unwrap();
        // No commit.
    }
    let base = Database::open(temp.path(), OpenOptions::default()).unwrap();
    let jane = base.person(1).unwrap();
    assert_eq!(base.string_of(jane.surname).unwrap(), "Smith");
}

#[test]
fn test_committed_patch_survives_reopen() {
    let temp = TempDir::new().unwrap();
    {
        let mut base = setup_db(temp.path());
        let mut jane = base.person(1).unwrap();
        jane.surname = base.insert_string("Doe").unwrap();
        base.patch_person(1, jane).unwrap();
        base.commit_patches().unwrap();
    }
    let base = Database::open(temp.path(), OpenOptions::default()).unwrap();
    let jane = base.person(1).unwrap();
    assert_eq!(base.string_of(jane.surname).unwrap(), "Doe");
}

#[test]
fn test_append_new_person() {
    let temp = TempDir::new().unwrap();
    let mut base = setup_db(temp.path());

    let mut new = DskPerson::empty(3);
    new.first_name = base.insert_string("Albert").unwrap();
    new.surname = base.insert_string("Einstein").unwrap();
    base.patch_person(3, new).unwrap();
    base.patch_ascend(3, DskAscend::no_parents()).unwrap();
    base.patch_union(3, DskUnion::default()).unwrap();

    // All three person-keyed tables grew together.
    assert_eq!(base.nb_of_persons(), 4);
    assert_eq!(base.ascend(3).unwrap().parents, DUMMY);
    let p = base.person(3).unwrap();
    assert_eq!(base.string_of(p.first_name).unwrap(), "Albert");
}

#[test]
fn test_commit_is_deterministic() {
    let temp = TempDir::new().unwrap();
    let mut base = setup_db(temp.path());

    let mut jane = base.person(1).unwrap();
    jane.surname = base.insert_string("Doe").unwrap();
    base.patch_person(1, jane).unwrap();

    base.commit_patches().unwrap();
    let first = fs::read(temp.path().join("patches")).unwrap();
    base.commit_patches().unwrap();
    let second = fs::read(temp.path().join("patches")).unwrap();
    assert_eq!(first, second, "idempotent commit must be byte-identical");
}

#[test]
fn test_commit_rotates_backup() {
    let temp = TempDir::new().unwrap();
    let mut base = setup_db(temp.path());

    let mut jane = base.person(1).unwrap();
    jane.surname = base.insert_string("Doe").unwrap();
    base.patch_person(1, jane).unwrap();
    base.commit_patches().unwrap();
    let first = fs::read(temp.path().join("patches")).unwrap();

    let mut john = base.person(0).unwrap();
    john.occ = 5;
    base.patch_person(0, john).unwrap();
    base.commit_patches().unwrap();

    // The previous patches file moved aside, and no temp file lingers.
    assert_eq!(fs::read(temp.path().join("patches~")).unwrap(), first);
    assert!(!temp.path().join("1patches.tmp").exists());
}

#[test]
fn test_corrupt_patches_file_rejected() {
    let temp = TempDir::new().unwrap();
    {
        let mut base = setup_db(temp.path());
        let mut jane = base.person(1).unwrap();
        jane.occ = 9;
        base.patch_person(1, jane).unwrap();
        base.commit_patches().unwrap();
    }
    // Flip a payload byte; the checksum must catch it.
    let mut bytes = fs::read(temp.path().join("patches")).unwrap();
    let last = bytes.len() - 1;
    bytes[last] ^= 0xff;
    fs::write(temp.path().join("patches"), &bytes).unwrap();

    let err = Database::open(temp.path(), OpenOptions::default()).unwrap_err();
    assert!(matches!(err, BaseError::Corrupt(_)), "got {:?}", err);
}

// =============================================================================
// Notes Tests
// =============================================================================

#[test]
fn test_read_notes_missing_is_empty() {
    let temp = TempDir::new().unwrap();
    let base = setup_db(temp.path());
    assert_eq!(base.read_notes().unwrap(), "");
    assert_eq!(base.read_wiznotes("merlin").unwrap(), "");
}

#[test]
fn test_read_notes_content() {
    let temp = TempDir::new().unwrap();
    let base = setup_db(temp.path());
    fs::write(temp.path().join("notes"), "base-wide notes\n").unwrap();
    assert_eq!(base.read_notes().unwrap(), "base-wide notes\n");

    fs::create_dir_all(temp.path().join("wiznotes")).unwrap();
    fs::write(temp.path().join("wiznotes").join("merlin.txt"), "hi").unwrap();
    assert_eq!(base.read_wiznotes("merlin").unwrap(), "hi");
}

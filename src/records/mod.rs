//! Disk record definitions
//!
//! The serialized shapes stored in the seven parallel tables, distinct from
//! any richer in-memory view built on top of them. Every record converts to
//! and from an iovalue [`Value`]; the variant discriminants used in those
//! conversions are part of the file format.

mod family;
mod person;
mod types;

pub use family::{DskCouple, DskDescend, DskFamily};
pub use person::{DskAscend, DskPerson, DskUnion};
pub use types::{
    Access, Burial, Calendar, Cdate, Date, Death, DeathReason, Divorce, Dmy, Precision,
    RelationKind, Sex,
};

use crate::error::{BaseError, Result};
use crate::iovalue::Value;

/// Person handle: index into the persons/ascends/unions tables
pub type Iper = i32;
/// Family handle: index into the families/couples/descends tables
pub type Ifam = i32;
/// Interned string handle: index into the strings table
pub type Istr = i32;

/// The dummy sentinel: "no such record"
pub const DUMMY: i32 = -1;
/// Pre-reserved istr for the empty string
pub const ISTR_EMPTY: Istr = 0;
/// Pre-reserved istr for the unknown-name marker `"?"`
pub const ISTR_QUEST: Istr = 1;

/// A record that can live in an on-disk table
pub trait DiskRecord: Sized + Clone {
    /// Table name, used in error messages
    const KIND: &'static str;

    fn to_value(&self) -> Value;
    fn from_value(v: &Value) -> Result<Self>;
}

impl DiskRecord for String {
    const KIND: &'static str = "strings";

    fn to_value(&self) -> Value {
        Value::Str(self.clone())
    }

    fn from_value(v: &Value) -> Result<String> {
        match v {
            Value::Str(s) => Ok(s.clone()),
            other => Err(shape_error("strings", "Str", other)),
        }
    }
}

/// Build a corruption error for an unexpected value shape
pub(crate) fn shape_error(kind: &str, expected: &str, got: &Value) -> BaseError {
    BaseError::Corrupt(format!(
        "{} record: expected {} value, got {:?}",
        kind, expected, got
    ))
}

/// Extract an Int field or fail as corruption
pub(crate) fn field_int(kind: &str, fields: &[Value], i: usize) -> Result<i32> {
    fields
        .get(i)
        .and_then(Value::as_int)
        .ok_or_else(|| BaseError::Corrupt(format!("{} record: field {} is not an Int", kind, i)))
}

/// Extract an Array-of-Int field or fail as corruption
pub(crate) fn field_int_array(kind: &str, fields: &[Value], i: usize) -> Result<Vec<i32>> {
    let items = fields.get(i).and_then(Value::as_array).ok_or_else(|| {
        BaseError::Corrupt(format!("{} record: field {} is not an Array", kind, i))
    })?;
    items
        .iter()
        .map(|v| {
            v.as_int().ok_or_else(|| {
                BaseError::Corrupt(format!("{} record: field {} holds a non-Int element", kind, i))
            })
        })
        .collect()
}

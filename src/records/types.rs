//! Domain enums with stable on-disk discriminants
//!
//! Discriminants are file format, not an implementation detail: they are the
//! variant tags written by the iovalue codec. Reordering a variant here
//! would corrupt every existing base.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::iovalue::Value;

use super::shape_error;

// =============================================================================
// Simple enums
// =============================================================================

/// Sex of a person
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Sex {
    Male = 0,
    Female = 1,
    Neuter = 2,
}

/// Visibility of a person's data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Access {
    IfTitles = 0,
    Public = 1,
    Private = 2,
}

/// Calendar a date was recorded in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Calendar {
    Gregorian = 0,
    Julian = 1,
    French = 2,
    Hebrew = 3,
}

/// How a death was reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DeathReason {
    Killed = 0,
    Murdered = 1,
    Executed = 2,
    Disappeared = 3,
    Unspecified = 4,
}

/// Legal form of a union
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RelationKind {
    Married = 0,
    NotMarried = 1,
    Engaged = 2,
    NoSexesCheckNotMarried = 3,
    NoMention = 4,
    NoSexesCheckMarried = 5,
}

macro_rules! fieldless_value_impl {
    ($ty:ident { $($variant:ident = $tag:literal),+ $(,)? }) => {
        impl $ty {
            pub(crate) fn to_value(self) -> Value {
                Value::unit(self as u8)
            }

            pub(crate) fn from_value(v: &Value) -> Result<$ty> {
                match v.as_tagged() {
                    $(Some(($tag, [])) => Ok($ty::$variant),)+
                    _ => Err(shape_error(stringify!($ty), "fieldless variant", v)),
                }
            }
        }
    };
}

fieldless_value_impl!(Sex { Male = 0, Female = 1, Neuter = 2 });
fieldless_value_impl!(Access { IfTitles = 0, Public = 1, Private = 2 });
fieldless_value_impl!(Calendar { Gregorian = 0, Julian = 1, French = 2, Hebrew = 3 });
fieldless_value_impl!(DeathReason {
    Killed = 0,
    Murdered = 1,
    Executed = 2,
    Disappeared = 3,
    Unspecified = 4,
});
fieldless_value_impl!(RelationKind {
    Married = 0,
    NotMarried = 1,
    Engaged = 2,
    NoSexesCheckNotMarried = 3,
    NoMention = 4,
    NoSexesCheckMarried = 5,
});

// =============================================================================
// Dates
// =============================================================================

/// Precision qualifier on a day/month/year date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Precision {
    Sure,
    About,
    Maybe,
    Before,
    After,
    /// "this year or that one": the alternative year rides in the payload
    OrYear(i32),
    /// year interval upper bound
    YearInt(i32),
}

impl Precision {
    fn to_value(self) -> Value {
        match self {
            Precision::Sure => Value::unit(0),
            Precision::About => Value::unit(1),
            Precision::Maybe => Value::unit(2),
            Precision::Before => Value::unit(3),
            Precision::After => Value::unit(4),
            Precision::OrYear(y) => Value::tagged(5, vec![Value::Int(y)]),
            Precision::YearInt(y) => Value::tagged(6, vec![Value::Int(y)]),
        }
    }

    fn from_value(v: &Value) -> Result<Precision> {
        match v.as_tagged() {
            Some((0, [])) => Ok(Precision::Sure),
            Some((1, [])) => Ok(Precision::About),
            Some((2, [])) => Ok(Precision::Maybe),
            Some((3, [])) => Ok(Precision::Before),
            Some((4, [])) => Ok(Precision::After),
            Some((5, [Value::Int(y)])) => Ok(Precision::OrYear(*y)),
            Some((6, [Value::Int(y)])) => Ok(Precision::YearInt(*y)),
            _ => Err(shape_error("Precision", "variant", v)),
        }
    }
}

/// A day/month/year date; day or month 0 means unknown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dmy {
    pub day: i32,
    pub month: i32,
    pub year: i32,
    pub prec: Precision,
}

impl Dmy {
    pub fn exact(day: i32, month: i32, year: i32) -> Dmy {
        Dmy {
            day,
            month,
            year,
            prec: Precision::Sure,
        }
    }
}

/// A date: structured with a calendar, or free text kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Date {
    Structured(Dmy, Calendar),
    Text(String),
}

impl Date {
    fn to_value(&self) -> Value {
        match self {
            Date::Structured(dmy, cal) => Value::tagged(
                0,
                vec![
                    Value::Int(dmy.day),
                    Value::Int(dmy.month),
                    Value::Int(dmy.year),
                    dmy.prec.to_value(),
                    cal.to_value(),
                ],
            ),
            Date::Text(s) => Value::tagged(1, vec![Value::Str(s.clone())]),
        }
    }

    fn from_value(v: &Value) -> Result<Date> {
        match v.as_tagged() {
            Some((0, [Value::Int(day), Value::Int(month), Value::Int(year), prec, cal])) => {
                Ok(Date::Structured(
                    Dmy {
                        day: *day,
                        month: *month,
                        year: *year,
                        prec: Precision::from_value(prec)?,
                    },
                    Calendar::from_value(cal)?,
                ))
            }
            Some((1, [Value::Str(s)])) => Ok(Date::Text(s.clone())),
            _ => Err(shape_error("Date", "variant", v)),
        }
    }
}

/// An optional date as stored in records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cdate {
    #[default]
    None,
    Date(Date),
}

impl Cdate {
    pub(crate) fn to_value(&self) -> Value {
        match self {
            Cdate::None => Value::unit(0),
            Cdate::Date(d) => Value::tagged(1, vec![d.to_value()]),
        }
    }

    pub(crate) fn from_value(v: &Value) -> Result<Cdate> {
        match v.as_tagged() {
            Some((0, [])) => Ok(Cdate::None),
            Some((1, [d])) => Ok(Cdate::Date(Date::from_value(d)?)),
            _ => Err(shape_error("Cdate", "variant", v)),
        }
    }
}

// =============================================================================
// Life events
// =============================================================================

/// Death status of a person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Death {
    NotDead,
    Dead(DeathReason, Cdate),
    DeadYoung,
    DeadDontKnowWhen,
    DontKnowIfDead,
    OfCourseDead,
}

impl Death {
    pub(crate) fn to_value(&self) -> Value {
        match self {
            Death::NotDead => Value::unit(0),
            Death::Dead(reason, date) => {
                Value::tagged(1, vec![reason.to_value(), date.to_value()])
            }
            Death::DeadYoung => Value::unit(2),
            Death::DeadDontKnowWhen => Value::unit(3),
            Death::DontKnowIfDead => Value::unit(4),
            Death::OfCourseDead => Value::unit(5),
        }
    }

    pub(crate) fn from_value(v: &Value) -> Result<Death> {
        match v.as_tagged() {
            Some((0, [])) => Ok(Death::NotDead),
            Some((1, [reason, date])) => Ok(Death::Dead(
                DeathReason::from_value(reason)?,
                Cdate::from_value(date)?,
            )),
            Some((2, [])) => Ok(Death::DeadYoung),
            Some((3, [])) => Ok(Death::DeadDontKnowWhen),
            Some((4, [])) => Ok(Death::DontKnowIfDead),
            Some((5, [])) => Ok(Death::OfCourseDead),
            _ => Err(shape_error("Death", "variant", v)),
        }
    }
}

/// Burial status of a person
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Burial {
    #[default]
    Unknown,
    Buried(Cdate),
    Cremated(Cdate),
}

impl Burial {
    pub(crate) fn to_value(&self) -> Value {
        match self {
            Burial::Unknown => Value::unit(0),
            Burial::Buried(d) => Value::tagged(1, vec![d.to_value()]),
            Burial::Cremated(d) => Value::tagged(2, vec![d.to_value()]),
        }
    }

    pub(crate) fn from_value(v: &Value) -> Result<Burial> {
        match v.as_tagged() {
            Some((0, [])) => Ok(Burial::Unknown),
            Some((1, [d])) => Ok(Burial::Buried(Cdate::from_value(d)?)),
            Some((2, [d])) => Ok(Burial::Cremated(Cdate::from_value(d)?)),
            _ => Err(shape_error("Burial", "variant", v)),
        }
    }
}

/// Divorce status of a family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Divorce {
    NotDivorced,
    Divorced(Cdate),
    Separated,
}

impl Divorce {
    pub(crate) fn to_value(&self) -> Value {
        match self {
            Divorce::NotDivorced => Value::unit(0),
            Divorce::Divorced(d) => Value::tagged(1, vec![d.to_value()]),
            Divorce::Separated => Value::unit(2),
        }
    }

    pub(crate) fn from_value(v: &Value) -> Result<Divorce> {
        match v.as_tagged() {
            Some((0, [])) => Ok(Divorce::NotDivorced),
            Some((1, [d])) => Ok(Divorce::Divorced(Cdate::from_value(d)?)),
            Some((2, [])) => Ok(Divorce::Separated),
            _ => Err(shape_error("Divorce", "variant", v)),
        }
    }
}

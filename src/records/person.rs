//! Person-side disk records
//!
//! Three index-aligned tables share the iper key space: persons (identity
//! and life events), ascends (parents), unions (families founded).

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::iovalue::Value;

use super::{
    field_int, field_int_array, shape_error, Access, Burial, Cdate, Death, DiskRecord, Ifam, Iper,
    Istr, Sex, DUMMY, ISTR_EMPTY, ISTR_QUEST,
};

/// A person as stored on disk
///
/// Every textual field is an interned string handle; `(first_name, surname,
/// occ)` is the person's key triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DskPerson {
    pub first_name: Istr,
    pub surname: Istr,
    /// Disambiguation number among persons sharing the same name pair
    pub occ: i32,
    pub public_name: Istr,
    pub qualifiers: Vec<Istr>,
    pub aliases: Vec<Istr>,
    pub occupation: Istr,
    pub sex: Sex,
    pub access: Access,
    pub birth: Cdate,
    pub birth_place: Istr,
    pub baptism: Cdate,
    pub baptism_place: Istr,
    pub death: Death,
    pub death_place: Istr,
    pub burial: Burial,
    pub burial_place: Istr,
    pub notes: Istr,
    pub psources: Istr,
    /// The person's own iper, stored redundantly for consistency checks
    pub key_index: Iper,
}

impl DskPerson {
    /// An empty person shell with the unknown-name marker
    pub fn empty(key_index: Iper) -> DskPerson {
        DskPerson {
            first_name: ISTR_QUEST,
            surname: ISTR_QUEST,
            occ: 0,
            public_name: ISTR_EMPTY,
            qualifiers: Vec::new(),
            aliases: Vec::new(),
            occupation: ISTR_EMPTY,
            sex: Sex::Neuter,
            access: Access::IfTitles,
            birth: Cdate::None,
            birth_place: ISTR_EMPTY,
            baptism: Cdate::None,
            baptism_place: ISTR_EMPTY,
            death: Death::DontKnowIfDead,
            death_place: ISTR_EMPTY,
            burial: Burial::Unknown,
            burial_place: ISTR_EMPTY,
            notes: ISTR_EMPTY,
            psources: ISTR_EMPTY,
            key_index,
        }
    }
}

impl DiskRecord for DskPerson {
    const KIND: &'static str = "persons";

    fn to_value(&self) -> Value {
        Value::tagged(
            0,
            vec![
                Value::Int(self.first_name),
                Value::Int(self.surname),
                Value::Int(self.occ),
                Value::Int(self.public_name),
                Value::Array(self.qualifiers.iter().map(|&i| Value::Int(i)).collect()),
                Value::Array(self.aliases.iter().map(|&i| Value::Int(i)).collect()),
                Value::Int(self.occupation),
                self.sex.to_value(),
                self.access.to_value(),
                self.birth.to_value(),
                Value::Int(self.birth_place),
                self.baptism.to_value(),
                Value::Int(self.baptism_place),
                self.death.to_value(),
                Value::Int(self.death_place),
                self.burial.to_value(),
                Value::Int(self.burial_place),
                Value::Int(self.notes),
                Value::Int(self.psources),
                Value::Int(self.key_index),
            ],
        )
    }

    fn from_value(v: &Value) -> Result<DskPerson> {
        let fields = match v.as_tagged() {
            Some((0, fields)) if fields.len() == 20 => fields,
            _ => return Err(shape_error(Self::KIND, "20-field record", v)),
        };
        Ok(DskPerson {
            first_name: field_int(Self::KIND, fields, 0)?,
            surname: field_int(Self::KIND, fields, 1)?,
            occ: field_int(Self::KIND, fields, 2)?,
            public_name: field_int(Self::KIND, fields, 3)?,
            qualifiers: field_int_array(Self::KIND, fields, 4)?,
            aliases: field_int_array(Self::KIND, fields, 5)?,
            occupation: field_int(Self::KIND, fields, 6)?,
            sex: Sex::from_value(&fields[7])?,
            access: Access::from_value(&fields[8])?,
            birth: Cdate::from_value(&fields[9])?,
            birth_place: field_int(Self::KIND, fields, 10)?,
            baptism: Cdate::from_value(&fields[11])?,
            baptism_place: field_int(Self::KIND, fields, 12)?,
            death: Death::from_value(&fields[13])?,
            death_place: field_int(Self::KIND, fields, 14)?,
            burial: Burial::from_value(&fields[15])?,
            burial_place: field_int(Self::KIND, fields, 16)?,
            notes: field_int(Self::KIND, fields, 17)?,
            psources: field_int(Self::KIND, fields, 18)?,
            key_index: field_int(Self::KIND, fields, 19)?,
        })
    }
}

/// Parents of a person
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DskAscend {
    /// Family the person is a child of; `DUMMY` when unknown
    pub parents: Ifam,
    /// Fixed-point consanguinity coefficient; `-1` when not computed
    pub consang: i32,
}

impl DskAscend {
    pub fn no_parents() -> DskAscend {
        DskAscend {
            parents: DUMMY,
            consang: -1,
        }
    }
}

impl DiskRecord for DskAscend {
    const KIND: &'static str = "ascends";

    fn to_value(&self) -> Value {
        Value::tagged(0, vec![Value::Int(self.parents), Value::Int(self.consang)])
    }

    fn from_value(v: &Value) -> Result<DskAscend> {
        match v.as_tagged() {
            Some((0, [Value::Int(parents), Value::Int(consang)])) => Ok(DskAscend {
                parents: *parents,
                consang: *consang,
            }),
            _ => Err(shape_error(Self::KIND, "2-field record", v)),
        }
    }
}

/// Families a person founded, in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DskUnion {
    pub families: Vec<Ifam>,
}

impl DiskRecord for DskUnion {
    const KIND: &'static str = "unions";

    fn to_value(&self) -> Value {
        Value::tagged(
            0,
            vec![Value::Array(
                self.families.iter().map(|&i| Value::Int(i)).collect(),
            )],
        )
    }

    fn from_value(v: &Value) -> Result<DskUnion> {
        let fields = match v.as_tagged() {
            Some((0, fields)) if fields.len() == 1 => fields,
            _ => return Err(shape_error(Self::KIND, "1-field record", v)),
        };
        Ok(DskUnion {
            families: field_int_array(Self::KIND, fields, 0)?,
        })
    }
}

//! Family-side disk records
//!
//! Three index-aligned tables share the ifam key space: families (the event
//! data), couples (father/mother), descends (children).

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::iovalue::Value;

use super::{
    field_int, field_int_array, shape_error, Cdate, DiskRecord, Divorce, Ifam, Iper, Istr,
    RelationKind, DUMMY, ISTR_EMPTY,
};

/// A family as stored on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DskFamily {
    pub marriage: Cdate,
    pub marriage_place: Istr,
    pub marriage_src: Istr,
    pub witnesses: Vec<Iper>,
    pub relation: RelationKind,
    pub divorce: Divorce,
    pub comment: Istr,
    pub origin_file: Istr,
    pub fsources: Istr,
    /// The family's own ifam, stored redundantly for consistency checks
    pub fam_index: Ifam,
}

impl DskFamily {
    /// An empty family shell
    pub fn empty(fam_index: Ifam) -> DskFamily {
        DskFamily {
            marriage: Cdate::None,
            marriage_place: ISTR_EMPTY,
            marriage_src: ISTR_EMPTY,
            witnesses: Vec::new(),
            relation: RelationKind::Married,
            divorce: Divorce::NotDivorced,
            comment: ISTR_EMPTY,
            origin_file: ISTR_EMPTY,
            fsources: ISTR_EMPTY,
            fam_index,
        }
    }
}

impl DiskRecord for DskFamily {
    const KIND: &'static str = "families";

    fn to_value(&self) -> Value {
        Value::tagged(
            0,
            vec![
                self.marriage.to_value(),
                Value::Int(self.marriage_place),
                Value::Int(self.marriage_src),
                Value::Array(self.witnesses.iter().map(|&i| Value::Int(i)).collect()),
                self.relation.to_value(),
                self.divorce.to_value(),
                Value::Int(self.comment),
                Value::Int(self.origin_file),
                Value::Int(self.fsources),
                Value::Int(self.fam_index),
            ],
        )
    }

    fn from_value(v: &Value) -> Result<DskFamily> {
        let fields = match v.as_tagged() {
            Some((0, fields)) if fields.len() == 10 => fields,
            _ => return Err(shape_error(Self::KIND, "10-field record", v)),
        };
        Ok(DskFamily {
            marriage: Cdate::from_value(&fields[0])?,
            marriage_place: field_int(Self::KIND, fields, 1)?,
            marriage_src: field_int(Self::KIND, fields, 2)?,
            witnesses: field_int_array(Self::KIND, fields, 3)?,
            relation: RelationKind::from_value(&fields[4])?,
            divorce: Divorce::from_value(&fields[5])?,
            comment: field_int(Self::KIND, fields, 6)?,
            origin_file: field_int(Self::KIND, fields, 7)?,
            fsources: field_int(Self::KIND, fields, 8)?,
            fam_index: field_int(Self::KIND, fields, 9)?,
        })
    }
}

/// Father and mother of a family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DskCouple {
    pub father: Iper,
    pub mother: Iper,
}

impl DskCouple {
    pub fn unknown() -> DskCouple {
        DskCouple {
            father: DUMMY,
            mother: DUMMY,
        }
    }
}

impl DiskRecord for DskCouple {
    const KIND: &'static str = "couples";

    fn to_value(&self) -> Value {
        Value::tagged(0, vec![Value::Int(self.father), Value::Int(self.mother)])
    }

    fn from_value(v: &Value) -> Result<DskCouple> {
        match v.as_tagged() {
            Some((0, [Value::Int(father), Value::Int(mother)])) => Ok(DskCouple {
                father: *father,
                mother: *mother,
            }),
            _ => Err(shape_error(Self::KIND, "2-field record", v)),
        }
    }
}

/// Children of a family, in birth order as recorded
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DskDescend {
    pub children: Vec<Iper>,
}

impl DiskRecord for DskDescend {
    const KIND: &'static str = "descends";

    fn to_value(&self) -> Value {
        Value::tagged(
            0,
            vec![Value::Array(
                self.children.iter().map(|&i| Value::Int(i)).collect(),
            )],
        )
    }

    fn from_value(v: &Value) -> Result<DskDescend> {
        let fields = match v.as_tagged() {
            Some((0, fields)) if fields.len() == 1 => fields,
            _ => return Err(shape_error(Self::KIND, "1-field record", v)),
        };
        Ok(DskDescend {
            children: field_int_array(Self::KIND, fields, 0)?,
        })
    }
}

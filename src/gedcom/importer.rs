//! Two-pass GEDCOM importer
//!
//! Pass 1 walks the parsed tree into importer-local person/family objects
//! whose cross-references are still strings. Pass 2 assigns each object a
//! dense 0-based index in insertion order, resolves references (missing
//! ones become the dummy sentinel), and interns every string with `""` and
//! `"?"` pre-reserved.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::Result;
use crate::name::{default_particles, lower};
use crate::records::{
    Access, Burial, Calendar, Cdate, Date, DeathReason, Death, Divorce, Dmy, DskAscend,
    DskCouple, DskDescend, DskFamily, DskPerson, DskUnion, Ifam, Iper, Istr, Precision,
    RelationKind, Sex, DUMMY,
};
use crate::writer::BaseData;

use super::parser::{parse_gedcom, GedNode};

/// Import a GEDCOM file into a ready-to-write [`BaseData`]
pub fn import_file(path: &Path) -> Result<BaseData> {
    let bytes = fs::read(path)?;
    // Lenient about encoding too: a stray non-UTF-8 byte should not sink
    // the import.
    let text = String::from_utf8_lossy(&bytes);
    let origin = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    import_str(&text, &origin)
}

/// Import GEDCOM text into a ready-to-write [`BaseData`]
pub fn import_str(text: &str, origin: &str) -> Result<BaseData> {
    let roots = parse_gedcom(text);

    // Pass 1: collect raw records with unresolved xrefs, insertion order.
    let mut raw_persons: Vec<RawPerson> = Vec::new();
    let mut raw_families: Vec<RawFamily> = Vec::new();
    let mut iper_of: HashMap<String, Iper> = HashMap::new();
    let mut ifam_of: HashMap<String, Ifam> = HashMap::new();
    let mut occ_count: HashMap<(String, String), i32> = HashMap::new();

    for node in &roots {
        match node.tag.as_str() {
            "INDI" => {
                let Some(xref) = node.xref.clone() else {
                    warn!("skipping INDI record without xref");
                    continue;
                };
                let mut raw = RawPerson::from_node(node);
                let key = (lower(&raw.first), lower(&raw.surname));
                let occ = occ_count.entry(key).or_insert(0);
                raw.occ = *occ;
                *occ += 1;
                iper_of.insert(xref, raw_persons.len() as Iper);
                raw_persons.push(raw);
            }
            "FAM" => {
                let Some(xref) = node.xref.clone() else {
                    warn!("skipping FAM record without xref");
                    continue;
                };
                ifam_of.insert(xref, raw_families.len() as Ifam);
                raw_families.push(RawFamily::from_node(node));
            }
            // HEAD, TRLR, SOUR, NOTE, SUBM and anything else are ignored.
            _ => {}
        }
    }

    // Pass 2: intern strings and resolve references to dense indices.
    let mut interner = Interner::new();
    let origin_istr = interner.intern(origin);

    let resolve_iper = |xref: &str| -> Iper {
        match iper_of.get(xref) {
            Some(&i) => i,
            None => {
                warn!(xref, "unresolved person reference");
                DUMMY
            }
        }
    };
    let resolve_ifam = |xref: &str| -> Ifam {
        match ifam_of.get(xref) {
            Some(&i) => i,
            None => {
                warn!(xref, "unresolved family reference");
                DUMMY
            }
        }
    };

    let mut persons = Vec::with_capacity(raw_persons.len());
    let mut ascends = Vec::with_capacity(raw_persons.len());
    let mut unions = Vec::with_capacity(raw_persons.len());
    for (i, raw) in raw_persons.iter().enumerate() {
        persons.push(raw.to_disk(i as Iper, &mut interner));
        ascends.push(DskAscend {
            parents: raw.famc.as_deref().map(resolve_ifam).unwrap_or(DUMMY),
            consang: -1,
        });
        unions.push(DskUnion {
            families: raw.fams.iter().map(|x| resolve_ifam(x)).collect(),
        });
    }

    let mut families = Vec::with_capacity(raw_families.len());
    let mut couples = Vec::with_capacity(raw_families.len());
    let mut descends = Vec::with_capacity(raw_families.len());
    for (i, raw) in raw_families.iter().enumerate() {
        families.push(DskFamily {
            marriage: raw.marriage.clone(),
            marriage_place: interner.intern(&raw.marriage_place),
            marriage_src: interner.intern(&raw.marriage_src),
            witnesses: Vec::new(),
            relation: raw.relation,
            divorce: raw.divorce.clone(),
            comment: interner.intern(""),
            origin_file: origin_istr,
            fsources: interner.intern(""),
            fam_index: i as Ifam,
        });
        couples.push(DskCouple {
            father: raw.husb.as_deref().map(resolve_iper).unwrap_or(DUMMY),
            mother: raw.wife.as_deref().map(resolve_iper).unwrap_or(DUMMY),
        });
        descends.push(DskDescend {
            children: raw.children.iter().map(|x| resolve_iper(x)).collect(),
        });
    }

    tracing::info!(
        persons = persons.len(),
        families = families.len(),
        strings = interner.strings.len(),
        origin,
        "GEDCOM import parsed"
    );

    Ok(BaseData {
        persons,
        ascends,
        unions,
        families,
        couples,
        descends,
        strings: interner.strings,
        origin_file: origin.to_string(),
        particles: default_particles(),
    })
}

// =============================================================================
// String interning
// =============================================================================

struct Interner {
    map: HashMap<String, Istr>,
    strings: Vec<String>,
}

impl Interner {
    fn new() -> Interner {
        let mut interner = Interner {
            map: HashMap::new(),
            strings: Vec::new(),
        };
        // istr 0 and 1 are pre-reserved.
        interner.intern("");
        interner.intern("?");
        interner
    }

    fn intern(&mut self, s: &str) -> Istr {
        if let Some(&istr) = self.map.get(s) {
            return istr;
        }
        let istr = self.strings.len() as Istr;
        self.map.insert(s.to_string(), istr);
        self.strings.push(s.to_string());
        istr
    }
}

// =============================================================================
// Raw (pass-1) records
// =============================================================================

#[derive(Default)]
struct RawPerson {
    first: String,
    surname: String,
    occ: i32,
    public_name: String,
    aliases: Vec<String>,
    occupation: String,
    sex: Option<Sex>,
    birth: Cdate,
    birth_place: String,
    baptism: Cdate,
    baptism_place: String,
    death: Option<Death>,
    death_place: String,
    burial: Burial,
    burial_place: String,
    fams: Vec<String>,
    famc: Option<String>,
}

impl RawPerson {
    fn from_node(node: &GedNode) -> RawPerson {
        let mut raw = RawPerson::default();
        let (first, surname) = split_name(node.child_value("NAME"));
        raw.first = first;
        raw.surname = surname;

        for child in &node.children {
            match child.tag.as_str() {
                "SEX" => {
                    raw.sex = match child.value.as_str() {
                        "M" => Some(Sex::Male),
                        "F" => Some(Sex::Female),
                        _ => None,
                    }
                }
                "BIRT" => {
                    raw.birth = parse_date_value(child.child_value("DATE"));
                    raw.birth_place = child.child_value("PLAC").to_string();
                }
                "BAPM" | "CHR" => {
                    raw.baptism = parse_date_value(child.child_value("DATE"));
                    raw.baptism_place = child.child_value("PLAC").to_string();
                }
                "DEAT" => {
                    raw.death = Some(Death::Dead(
                        DeathReason::Unspecified,
                        parse_date_value(child.child_value("DATE")),
                    ));
                    raw.death_place = child.child_value("PLAC").to_string();
                }
                "BURI" => {
                    raw.burial = Burial::Buried(parse_date_value(child.child_value("DATE")));
                    raw.burial_place = child.child_value("PLAC").to_string();
                }
                "CREM" => {
                    raw.burial = Burial::Cremated(parse_date_value(child.child_value("DATE")));
                    raw.burial_place = child.child_value("PLAC").to_string();
                }
                "OCCU" => raw.occupation = child.value.clone(),
                "ALIA" => raw.aliases.push(child.value.clone()),
                "NPFX" | "TITL" => {
                    if raw.public_name.is_empty() {
                        raw.public_name = child.value.clone();
                    }
                }
                "FAMS" => raw.fams.push(strip_at(&child.value)),
                "FAMC" => {
                    if raw.famc.is_none() {
                        raw.famc = Some(strip_at(&child.value));
                    }
                }
                // Anything else is deliberately ignored.
                _ => {}
            }
        }
        raw
    }

    fn to_disk(&self, key_index: Iper, interner: &mut Interner) -> DskPerson {
        DskPerson {
            first_name: interner.intern(&self.first),
            surname: interner.intern(&self.surname),
            occ: self.occ,
            public_name: interner.intern(&self.public_name),
            qualifiers: Vec::new(),
            aliases: self.aliases.iter().map(|a| interner.intern(a)).collect(),
            occupation: interner.intern(&self.occupation),
            sex: self.sex.unwrap_or(Sex::Neuter),
            access: Access::IfTitles,
            birth: self.birth.clone(),
            birth_place: interner.intern(&self.birth_place),
            baptism: self.baptism.clone(),
            baptism_place: interner.intern(&self.baptism_place),
            death: self.death.clone().unwrap_or(Death::DontKnowIfDead),
            death_place: interner.intern(&self.death_place),
            burial: self.burial.clone(),
            burial_place: interner.intern(&self.burial_place),
            notes: interner.intern(""),
            psources: interner.intern(""),
            key_index,
        }
    }
}

struct RawFamily {
    husb: Option<String>,
    wife: Option<String>,
    children: Vec<String>,
    marriage: Cdate,
    marriage_place: String,
    marriage_src: String,
    relation: RelationKind,
    divorce: Divorce,
}

impl RawFamily {
    fn from_node(node: &GedNode) -> RawFamily {
        let mut raw = RawFamily {
            husb: None,
            wife: None,
            children: Vec::new(),
            marriage: Cdate::None,
            marriage_place: String::new(),
            marriage_src: String::new(),
            relation: RelationKind::Married,
            divorce: Divorce::NotDivorced,
        };
        for child in &node.children {
            match child.tag.as_str() {
                "HUSB" => raw.husb = Some(strip_at(&child.value)),
                "WIFE" => raw.wife = Some(strip_at(&child.value)),
                "CHIL" => raw.children.push(strip_at(&child.value)),
                "MARR" => {
                    raw.marriage = parse_date_value(child.child_value("DATE"));
                    raw.marriage_place = child.child_value("PLAC").to_string();
                    raw.marriage_src = child.child_value("SOUR").to_string();
                }
                "ENGA" => raw.relation = RelationKind::Engaged,
                "DIV" => {
                    raw.divorce = Divorce::Divorced(parse_date_value(child.child_value("DATE")));
                }
                _ => {}
            }
        }
        raw
    }
}

// =============================================================================
// Field parsing
// =============================================================================

/// Split a GEDCOM NAME value: the surname sits between slashes
///
/// `"John /Doe/"` gives `("John", "Doe")`. Missing parts become the
/// unknown-name marker.
fn split_name(value: &str) -> (String, String) {
    let (first, surname) = match value.find('/') {
        Some(start) => {
            let first = value[..start].trim();
            let rest = &value[start + 1..];
            let surname = match rest.find('/') {
                Some(end) => rest[..end].trim(),
                None => rest.trim(),
            };
            (first, surname)
        }
        None => (value.trim(), ""),
    };
    let first = if first.is_empty() { "?" } else { first };
    let surname = if surname.is_empty() { "?" } else { surname };
    (first.to_string(), surname.to_string())
}

fn strip_at(value: &str) -> String {
    value.trim().trim_matches('@').to_string()
}

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Parse a GEDCOM date value
///
/// Handles `ABT`/`EST`/`CAL`/`BEF`/`AFT` qualifiers and the
/// `D MMM YYYY` / `MMM YYYY` / `YYYY` forms. Anything else is kept as
/// free text; an unparsable date must never fail an import.
fn parse_date_value(value: &str) -> Cdate {
    let value = value.trim();
    if value.is_empty() {
        return Cdate::None;
    }
    match parse_date_tokens(value) {
        Some(dmy) => Cdate::Date(Date::Structured(dmy, Calendar::Gregorian)),
        None => Cdate::Date(Date::Text(value.to_string())),
    }
}

fn parse_date_tokens(value: &str) -> Option<Dmy> {
    let mut tokens: Vec<&str> = value.split_whitespace().collect();
    let mut prec = Precision::Sure;
    if let Some(first) = tokens.first() {
        let qualifier = match first.to_ascii_uppercase().as_str() {
            "ABT" | "EST" | "CAL" => Some(Precision::About),
            "BEF" => Some(Precision::Before),
            "AFT" => Some(Precision::After),
            _ => None,
        };
        if let Some(q) = qualifier {
            prec = q;
            tokens.remove(0);
        }
    }

    let mut dmy = match tokens.as_slice() {
        [d, m, y] => Dmy {
            day: d.parse().ok()?,
            month: month_number(m)?,
            year: y.parse().ok()?,
            prec: Precision::Sure,
        },
        [m, y] => Dmy {
            day: 0,
            month: month_number(m)?,
            year: y.parse().ok()?,
            prec: Precision::Sure,
        },
        [y] => Dmy {
            day: 0,
            month: 0,
            year: y.parse().ok()?,
            prec: Precision::Sure,
        },
        _ => return None,
    };
    if dmy.day < 0 || dmy.day > 31 {
        return None;
    }
    dmy.prec = prec;
    Some(dmy)
}

fn month_number(token: &str) -> Option<i32> {
    let upper = token.to_ascii_uppercase();
    MONTHS
        .iter()
        .position(|m| *m == upper)
        .map(|i| i as i32 + 1)
}

//! `base` and `base.acc` emission
//!
//! ## base layout
//!
//! ```text
//! ┌──────────┬─────────────────────┬───────────────┬──────────────────┐
//! │ magic(8) │ 10 x u32 BE         │ origin string │ 7 iovalue arrays │
//! │          │ 3 lens + 7 offsets  │ (iovalue)     │ fixed order      │
//! └──────────┴─────────────────────┴───────────────┴──────────────────┘
//! ```
//!
//! Table order everywhere: persons, ascends, unions, families, couples,
//! descends, strings. `base.acc` holds, per table, one 4-byte big-endian
//! absolute offset per element, pointing at the element's start in `base`.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::base::FormatVersion;
use crate::error::Result;
use crate::iovalue::{self, Value, TAG_ARRAY};
use crate::records::DiskRecord;

use super::BaseData;

/// Bytes of the magic + ten header integers
const FIXED_HEADER_SIZE: u64 = 8 + 10 * 4;

struct EncodedTable {
    /// One encoded buffer per element
    elements: Vec<Vec<u8>>,
}

impl EncodedTable {
    fn from_records<R: DiskRecord>(records: &[R]) -> EncodedTable {
        EncodedTable {
            elements: records
                .iter()
                .map(|r| iovalue::encode(&r.to_value()))
                .collect(),
        }
    }

    /// Whole-section size: array header plus every element
    fn section_size(&self) -> u64 {
        iovalue::array_header_size(self.elements.len())
            + self.elements.iter().map(|e| e.len() as u64).sum::<u64>()
    }

    /// Absolute offsets of each element, given the section's start
    fn element_offsets(&self, section_start: u64) -> Vec<u32> {
        let mut pos = section_start + iovalue::array_header_size(self.elements.len());
        self.elements
            .iter()
            .map(|e| {
                let offset = pos as u32;
                pos += e.len() as u64;
                offset
            })
            .collect()
    }

    fn write_to<W: Write>(&self, out: &mut W) -> Result<()> {
        // The array header, then each pre-encoded element: byte-identical
        // to encoding one Value::Array without materializing it.
        out.write_all(&[TAG_ARRAY])?;
        out.write_all(&(self.elements.len() as u32).to_be_bytes())?;
        for element in &self.elements {
            out.write_all(element)?;
        }
        Ok(())
    }
}

pub(super) fn write_base_and_acc(dir: &Path, data: &BaseData) -> Result<()> {
    let origin = Value::Str(data.origin_file.clone());
    let tables = [
        EncodedTable::from_records(&data.persons),
        EncodedTable::from_records(&data.ascends),
        EncodedTable::from_records(&data.unions),
        EncodedTable::from_records(&data.families),
        EncodedTable::from_records(&data.couples),
        EncodedTable::from_records(&data.descends),
        EncodedTable::from_records(&data.strings),
    ];

    // Offsets are pure arithmetic over precomputed sizes; nothing below
    // depends on write positions.
    let mut offsets = [0u64; 7];
    let mut pos = FIXED_HEADER_SIZE + iovalue::size(&origin);
    for (slot, table) in offsets.iter_mut().zip(&tables) {
        *slot = pos;
        pos += table.section_size();
    }

    let mut base = BufWriter::new(fs::File::create(dir.join("base"))?);
    base.write_all(FormatVersion::NEWEST.magic())?;
    base.write_all(&(data.persons.len() as u32).to_be_bytes())?;
    base.write_all(&(data.families.len() as u32).to_be_bytes())?;
    base.write_all(&(data.strings.len() as u32).to_be_bytes())?;
    for offset in &offsets {
        base.write_all(&(*offset as u32).to_be_bytes())?;
    }
    iovalue::encode_to(&mut base, &origin)?;
    for table in &tables {
        table.write_to(&mut base)?;
    }
    base.flush()?;
    base.into_inner()
        .map_err(|e| std::io::Error::from(e.error().kind()))?
        .sync_all()?;

    let mut acc = BufWriter::new(fs::File::create(dir.join("base.acc"))?);
    for (table, &section_start) in tables.iter().zip(&offsets) {
        for offset in table.element_offsets(section_start) {
            acc.write_all(&offset.to_be_bytes())?;
        }
    }
    acc.flush()?;
    Ok(())
}

//! GEDCOM import
//!
//! A deliberately lenient front end for the writer: unrecognized tags are
//! ignored, malformed lines are skipped with a warning, and unparsable
//! dates are stored as free text rather than failing the whole import.

mod importer;
mod parser;

pub use importer::{import_file, import_str};
pub use parser::{parse_gedcom, GedNode};

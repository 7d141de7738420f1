//! Binary tagged-value codec
//!
//! The single source of truth for the on-disk byte layout. Every array in
//! the `base` file, the origin-file string in its header, and the name
//! bucket table are iovalue-encoded. The writer precomputes file offsets
//! from [`size`], so `size(v) == encode(v).len()` must hold exactly for
//! every value shape.

mod codec;
mod value;

pub use codec::{
    array_header_size, decode_from, encode, encode_to, size, TAG_ARRAY, TAG_INT, TAG_STR,
    TAG_VARIANT_BASE,
};
pub use value::Value;

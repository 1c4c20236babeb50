//! Flat-file record store: `=`-delimited blocks of `Label: value` lines with an optional
//! free-text body, parameterized by a label schema.

mod codec;
mod schema;

pub use codec::RecordCodec;
pub use schema::{LabelSchema, TextJoin};

//! Compact binary serialization of JSON-like documents.
//!
//! Documents are built front to back into one contiguous buffer with
//! [`Builder`] and navigated in place with [`Slice`], without unpacking.
//! Containers pick the cheapest of several equivalent encodings when they
//! are closed: arrays of equally sized members drop their offset table
//! entirely, small containers shrink their headers, and objects get a
//! hash table over their keys so lookups probe at most three slots.
//!
//! ```
//! use vpack::{Builder, Value};
//!
//! let mut builder = Builder::new();
//! builder.open_object()?;
//! builder.add_key_value("name", "vpack")?;
//! builder.add_key_value("answer", 42i64)?;
//! builder.close()?;
//!
//! let slice = builder.slice()?;
//! assert_eq!(slice.get("answer")?.unwrap().get_int()?, 42);
//! # Ok::<(), vpack::Error>(())
//! ```

pub mod error;

mod buffer;
mod builder;
mod dump;
mod hash;
mod iterator;
mod options;
mod parse;
mod slice;
mod translator;
mod util;
mod value;

#[cfg(feature = "serde")]
mod ser;

pub use builder::Builder;
pub use dump::{to_json, to_json_pretty};
pub use error::{Error, Result};
pub use iterator::{ArrayIterator, ObjectIterator};
pub use options::Options;
pub use parse::{parse_json, parse_json_with_options};
pub use slice::{SharedSlice, Slice};
pub use translator::{AttributeTranslator, BasicAttributeTranslator, set_attribute_translator};
pub use value::{Value, ValueData, ValuePair, ValueType};

pub(crate) use util::cold_path;

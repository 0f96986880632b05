//! BER-TLV parsing and the typed field-map binding layer built on top of it.

pub mod afl;
pub mod dol;
pub mod elements;
pub mod errors;
pub mod field_map;
pub mod tag_list;
pub mod value;

pub use afl::{ApplicationFile, ApplicationFileList};
pub use dol::{Dol, DolEntry};
pub use elements::{tag_name, DataElement, ElementType, ELEMENTS};
pub use errors::{DecodeError, StringType};
pub use field_map::{decode, encode, pick, FieldMap, FieldMapExt, TlvRecord};
pub use tag_list::TagList;
pub use value::{decode_for_display, DisplayMap, Value};

//! Core of the Bamini to Unicode Tamil converter: the mapping table, the
//! transliteration engine, and the types shared by the container backends.

pub mod error;
pub mod table;
pub mod transliterate;
pub mod types;

pub use error::{Error, Result};
pub use table::MappingTable;
pub use transliterate::{Strategy, Transliterator};
pub use types::{
    ConversionReport, PartKind, PartReport, PresentationFormat, RunColor, RunFormat, RunLocation,
    RunRecord,
};

//! PPTX (Office Open XML) backend for Bamini to Unicode Tamil conversion.
//!
//! Rewrites the text runs of .pptx files, which are ZIP archives containing
//! XML documents, leaving formatting and every other part untouched.

pub mod converter;
pub mod runs;
mod xml;

pub use converter::PptxConverter;
pub use runs::{read_runs, rewrite_part, RewrittenPart};

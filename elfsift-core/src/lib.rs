//! Bounds-checked ELF metadata parser.
//!
//! Reads the file header, program headers, section headers, symbol tables
//! and relocation tables of a 32- or 64-bit ELF image into width-independent
//! records. Every offset/size pair is checked against the image length
//! before the bytes it describes are read.

pub mod binary;
mod bounds;
pub mod error;
pub mod function_signature;
pub mod header;
pub mod parser;
pub mod reader;
pub mod relocations;
pub mod sections;
pub mod segments;
pub mod strtab;
pub mod symbols;
pub mod width;

pub use binary::*;
pub use error::*;
pub use function_signature::*;
pub use header::{classify, Class, FileHeader, Header};
pub use parser::*;
pub use reader::Endian;
pub use relocations::*;
pub use sections::*;
pub use segments::*;
pub use strtab::*;
pub use symbols::*;

use std::fmt;

use thiserror::Error;

/// Pipeline stages, in the order they must run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Header,
    Segments,
    Sections,
    Symbols,
    Relocations,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Header => "file header",
            Stage::Segments => "segment table",
            Stage::Sections => "section table",
            Stage::Symbols => "symbol tables",
            Stage::Relocations => "relocation tables",
        };
        f.write_str(name)
    }
}

/// The structure whose byte range failed a bounds check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    FileHeader,
    ProgramHeaderTable,
    SectionHeaderTable,
    Segment(usize),
    Section(usize),
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::FileHeader => f.write_str("file header"),
            Region::ProgramHeaderTable => f.write_str("program header table"),
            Region::SectionHeaderTable => f.write_str("section header table"),
            Region::Segment(i) => write!(f, "segment {i}"),
            Region::Section(i) => write!(f, "section {i}"),
        }
    }
}

/// Why the identification bytes or header fields were rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderDefect {
    /// The first four bytes are not `\x7fELF` (or the image is shorter than that).
    BadMagic,
    /// The image ends inside `e_ident`.
    TruncatedIdent { len: usize },
    UnsupportedClass(u8),
    UnsupportedEncoding(u8),
    /// A nonzero table count paired with an entry size too small to hold one record.
    EntrySizeTooSmall {
        table: Region,
        declared: u16,
        required: u16,
    },
}

impl fmt::Display for HeaderDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderDefect::BadMagic => f.write_str("bad magic bytes"),
            HeaderDefect::TruncatedIdent { len } => {
                write!(f, "identification truncated at {len} bytes")
            }
            HeaderDefect::UnsupportedClass(c) => write!(f, "unsupported class {c}"),
            HeaderDefect::UnsupportedEncoding(d) => write!(f, "unsupported data encoding {d}"),
            HeaderDefect::EntrySizeTooSmall {
                table,
                declared,
                required,
            } => write!(
                f,
                "{table} entry size {declared} is smaller than the {required}-byte record"
            ),
        }
    }
}

/// Tables that may only be backed by a single section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    SymbolStrings,
    DynamicStrings,
    SymbolTable,
    DynamicSymbolTable,
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TableKind::SymbolStrings => ".strtab",
            TableKind::DynamicStrings => ".dynstr",
            TableKind::SymbolTable => "SHT_SYMTAB",
            TableKind::DynamicSymbolTable => "SHT_DYNSYM",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed header: {0}")]
    MalformedHeader(HeaderDefect),

    #[error("{region} out of file bounds (offset {offset:#x}, size {size:#x}, file length {file_len:#x})")]
    OutOfBounds {
        region: Region,
        offset: u64,
        /// Saturated at `u64::MAX` when the size computation itself overflowed.
        size: u64,
        file_len: u64,
    },

    #[error("cannot parse {stage}: {requires} has not been parsed")]
    MissingPrerequisite { stage: Stage, requires: Stage },

    #[error("{table} is claimed by several sections: {sections:?}")]
    AmbiguousNameTable {
        table: TableKind,
        sections: Vec<usize>,
    },
}

pub type Result<T> = core::result::Result<T, ParseError>;

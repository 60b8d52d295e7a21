use goblin::elf::section_header::{SHT_DYNSYM, SHT_STRTAB, SHT_SYMTAB};
use goblin::elf::sym::{st_bind, st_type, st_visibility};

use crate::bounds;
use crate::error::{ParseError, Region, Result, TableKind};
use crate::header::FileHeader;
use crate::reader::FieldReader;
use crate::sections::SectionTable;
use crate::strtab::{AmbiguityPolicy, StringTable};
use crate::width::WordWidth;

/// A symbol table entry, widened to 64-bit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// Offset of the name in the owning string table.
    pub st_name: u32,
    /// Type in the low nibble, binding in the high nibble.
    pub st_info: u8,
    pub st_other: u8,
    /// Defining section index, or a reserved `SHN_*` value.
    pub st_shndx: u16,
    pub st_value: u64,
    pub st_size: u64,
}

impl Symbol {
    /// `STB_*` value.
    pub fn binding(&self) -> u8 {
        st_bind(self.st_info)
    }

    /// `STT_*` value.
    pub fn kind(&self) -> u8 {
        st_type(self.st_info)
    }

    /// `STV_*` value.
    pub fn visibility(&self) -> u8 {
        st_visibility(self.st_other)
    }
}

/// One decoded symbol table and the string table its names live in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable<'a> {
    /// Backing section, if the image has one.
    pub section: Option<usize>,
    pub symbols: Vec<Symbol>,
    pub strings: Option<StringTable<'a>>,
}

impl<'a> SymbolTable<'a> {
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Symbol> {
        self.symbols.iter()
    }

    pub fn name(&self, symbol: &Symbol) -> Option<&'a str> {
        self.strings?.get(symbol.st_name)
    }
}

/// The static (`SHT_SYMTAB`) and dynamic (`SHT_DYNSYM`) symbol tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTables<'a> {
    pub symtab: SymbolTable<'a>,
    pub dynsym: SymbolTable<'a>,
}

pub(crate) fn parse<'a, W: WordWidth>(
    data: &'a [u8],
    header: &FileHeader,
    sections: &SectionTable<'a>,
    policy: AmbiguityPolicy,
) -> Result<SymbolTables<'a>> {
    let symtab = find(sections, SHT_SYMTAB, TableKind::SymbolTable, policy)?;
    let dynsym = find(sections, SHT_DYNSYM, TableKind::DynamicSymbolTable, policy)?;

    let tables = SymbolTables {
        symtab: decode::<W>(data, header, sections, symtab, sections.strings.symbols)?,
        dynsym: decode::<W>(data, header, sections, dynsym, sections.strings.dynamic)?,
    };
    log::debug!(
        "decoded {} static and {} dynamic symbols",
        tables.symtab.len(),
        tables.dynsym.len()
    );
    Ok(tables)
}

/// Index of the section of type `sh_type`, honouring `policy` when there are several.
fn find(
    sections: &SectionTable<'_>,
    sh_type: u32,
    kind: TableKind,
    policy: AmbiguityPolicy,
) -> Result<Option<usize>> {
    let matches: Vec<usize> = sections
        .iter()
        .enumerate()
        .filter(|(_, s)| s.sh_type == sh_type)
        .map(|(i, _)| i)
        .collect();

    match (matches.len(), policy) {
        (0, _) => Ok(None),
        (1, _) => Ok(Some(matches[0])),
        (_, AmbiguityPolicy::Reject) => Err(ParseError::AmbiguousNameTable {
            table: kind,
            sections: matches,
        }),
        (_, AmbiguityPolicy::LastWins) => {
            let last = matches[matches.len() - 1];
            log::warn!("{kind} found in sections {matches:?}; using section {last}");
            Ok(Some(last))
        }
    }
}

fn decode<'a, W: WordWidth>(
    data: &'a [u8],
    header: &FileHeader,
    sections: &SectionTable<'a>,
    index: Option<usize>,
    strings: Option<StringTable<'a>>,
) -> Result<SymbolTable<'a>> {
    let Some(index) = index else {
        return Ok(SymbolTable::default());
    };
    let section = &sections.headers[index];

    let linked = sections.get(section.sh_link as usize).map(|s| s.sh_type);
    if linked != Some(SHT_STRTAB) {
        log::warn!(
            "symbol table section {index} links to section {} which is not a string table",
            section.sh_link
        );
    }

    let bytes = section.file_bytes(data);
    let count = bytes.len() / W::SYM_SIZE;
    if bytes.len() % W::SYM_SIZE != 0 {
        log::warn!(
            "symbol table section {index} has {} trailing bytes",
            bytes.len() % W::SYM_SIZE
        );
    }

    let mut symbols = Vec::with_capacity(count);
    for chunk in bytes.chunks_exact(W::SYM_SIZE) {
        let symbol = W::symbol(&mut FieldReader::new(chunk, header.endian)).map_err(|_| {
            bounds::short_read(Region::Section(index), section.sh_offset as usize, bytes.len(), data.len())
        })?;
        symbols.push(symbol);
    }

    Ok(SymbolTable {
        section: Some(index),
        symbols,
        strings,
    })
}

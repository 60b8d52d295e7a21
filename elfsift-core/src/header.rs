use goblin::elf::header::{
    EI_ABIVERSION, EI_CLASS, EI_DATA, EI_OSABI, EI_VERSION, ELFCLASS32, ELFCLASS64, ELFDATA2LSB,
    ELFDATA2MSB, ELFMAG, SELFMAG, SIZEOF_IDENT,
};

use crate::bounds;
use crate::error::{HeaderDefect, ParseError, Region, Result};
use crate::reader::{Endian, FieldReader};
use crate::width::{Elf32, Elf64, WordWidth};

pub trait Header: std::fmt::Debug + Send + Sync {
    /// Returns the virtual address of the entry point.
    fn entry_point(&self) -> u64;

    /// Returns the machine architecture identifier.
    fn machine(&self) -> u16;

    /// Returns a short human-readable name, e.g. "ELF32" or "ELF64".
    fn format_name(&self) -> &'static str;
}

/// Word width selected by `e_ident[EI_CLASS]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Elf32,
    Elf64,
}

/// Width-independent ELF file header.
///
/// Field names follow `ElfN_Ehdr`. Addresses and offsets are widened to
/// `u64`; for a 32-bit image they hold exactly the on-disk value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Identification bytes: magic, class, data encoding, version, OS/ABI, ABI version.
    pub e_ident: [u8; SIZEOF_IDENT],
    pub class: Class,
    pub endian: Endian,

    /// Object file type (`ET_REL`, `ET_EXEC`, `ET_DYN`, `ET_CORE`, ...).
    pub e_type: u16,
    pub e_machine: u16,
    pub e_version: u32,
    pub e_entry: u64,
    pub e_phoff: u64,
    pub e_shoff: u64,
    pub e_flags: u32,
    pub e_ehsize: u16,
    pub e_phentsize: u16,
    pub e_phnum: u16,
    pub e_shentsize: u16,
    pub e_shnum: u16,
    /// Index of the section holding section names.
    pub e_shstrndx: u16,
}

impl FileHeader {
    pub fn os_abi(&self) -> u8 {
        self.e_ident[EI_OSABI]
    }

    pub fn abi_version(&self) -> u8 {
        self.e_ident[EI_ABIVERSION]
    }

    pub fn ident_version(&self) -> u8 {
        self.e_ident[EI_VERSION]
    }

    pub fn is_32_bit(&self) -> bool {
        self.class == Class::Elf32
    }

    pub fn is_64_bit(&self) -> bool {
        self.class == Class::Elf64
    }
}

impl Header for FileHeader {
    fn entry_point(&self) -> u64 {
        self.e_entry
    }

    fn machine(&self) -> u16 {
        self.e_machine
    }

    fn format_name(&self) -> &'static str {
        match self.class {
            Class::Elf32 => "ELF32",
            Class::Elf64 => "ELF64",
        }
    }
}

/// Identifies the image and decodes its file header.
///
/// Checks, in order: magic, class, data encoding, that the image holds a
/// full header for its class, `e_ehsize`, the program-header table span,
/// the section-header table span, and finally that nonzero tables declare
/// entries large enough for one record.
pub fn classify(data: &[u8]) -> Result<FileHeader> {
    if data.len() < SELFMAG || &data[..SELFMAG] != ELFMAG {
        return Err(ParseError::MalformedHeader(HeaderDefect::BadMagic));
    }
    if data.len() < SIZEOF_IDENT {
        return Err(ParseError::MalformedHeader(HeaderDefect::TruncatedIdent {
            len: data.len(),
        }));
    }

    let class = data[EI_CLASS];
    let header = match class {
        ELFCLASS32 => decode::<Elf32>(data, Class::Elf32)?,
        ELFCLASS64 => decode::<Elf64>(data, Class::Elf64)?,
        other => return Err(ParseError::MalformedHeader(HeaderDefect::UnsupportedClass(other))),
    };

    log::debug!(
        "{:?} {:?} header: type {}, machine {}, {} segments, {} sections",
        header.class,
        header.endian,
        header.e_type,
        header.e_machine,
        header.e_phnum,
        header.e_shnum
    );
    Ok(header)
}

fn decode<W: WordWidth>(data: &[u8], class: Class) -> Result<FileHeader> {
    let endian = match data[EI_DATA] {
        ELFDATA2LSB => Endian::Little,
        ELFDATA2MSB => Endian::Big,
        other => {
            return Err(ParseError::MalformedHeader(HeaderDefect::UnsupportedEncoding(other)));
        }
    };

    let ehdr_size = usize::from(W::EHDR_SIZE);
    let record = data
        .get(..ehdr_size)
        .ok_or_else(|| bounds::short_read(Region::FileHeader, 0, ehdr_size, data.len()))?;

    let mut e_ident = [0u8; SIZEOF_IDENT];
    e_ident.copy_from_slice(&record[..SIZEOF_IDENT]);

    let mut r = FieldReader::new(&record[SIZEOF_IDENT..], endian);
    let header = read_fields::<W>(&mut r, e_ident, class, endian)
        .map_err(|_| bounds::short_read(Region::FileHeader, 0, ehdr_size, data.len()))?;

    validate::<W>(&header, data.len())?;
    Ok(header)
}

fn read_fields<W: WordWidth>(
    r: &mut FieldReader<'_>,
    e_ident: [u8; SIZEOF_IDENT],
    class: Class,
    endian: Endian,
) -> std::io::Result<FileHeader> {
    Ok(FileHeader {
        e_ident,
        class,
        endian,
        e_type: r.u16()?,
        e_machine: r.u16()?,
        e_version: r.u32()?,
        e_entry: W::word(r)?,
        e_phoff: W::word(r)?,
        e_shoff: W::word(r)?,
        e_flags: r.u32()?,
        e_ehsize: r.u16()?,
        e_phentsize: r.u16()?,
        e_phnum: r.u16()?,
        e_shentsize: r.u16()?,
        e_shnum: r.u16()?,
        e_shstrndx: r.u16()?,
    })
}

fn validate<W: WordWidth>(header: &FileHeader, file_len: usize) -> Result<()> {
    bounds::span(Region::FileHeader, 0, u64::from(header.e_ehsize), file_len)?;
    bounds::table(
        Region::ProgramHeaderTable,
        header.e_phoff,
        header.e_phentsize,
        header.e_phnum,
        file_len,
    )?;
    bounds::table(
        Region::SectionHeaderTable,
        header.e_shoff,
        header.e_shentsize,
        header.e_shnum,
        file_len,
    )?;

    if header.e_phnum > 0 && header.e_phentsize < W::PHDR_SIZE {
        return Err(ParseError::MalformedHeader(HeaderDefect::EntrySizeTooSmall {
            table: Region::ProgramHeaderTable,
            declared: header.e_phentsize,
            required: W::PHDR_SIZE,
        }));
    }
    if header.e_shnum > 0 && header.e_shentsize < W::SHDR_SIZE {
        return Err(ParseError::MalformedHeader(HeaderDefect::EntrySizeTooSmall {
            table: Region::SectionHeaderTable,
            declared: header.e_shentsize,
            required: W::SHDR_SIZE,
        }));
    }
    Ok(())
}

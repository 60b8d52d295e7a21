//! On-disk layouts for the two ELF classes.
//!
//! Every stage after classification is generic over [`WordWidth`]; the
//! class byte picks `Elf32` or `Elf64` once and the choice is threaded
//! through the rest of the pipeline. Records whose field *order* differs
//! between classes (program headers, symbols) get their own decoder;
//! everything else is decoded generically through [`WordWidth::word`].

use std::io;

use crate::reader::FieldReader;
use crate::segments::Segment;
use crate::symbols::Symbol;

pub trait WordWidth {
    /// `e_ident[EI_CLASS]` value for this layout.
    const CLASS: u8;
    const EHDR_SIZE: u16;
    const PHDR_SIZE: u16;
    const SHDR_SIZE: u16;
    const SYM_SIZE: usize;
    const REL_SIZE: usize;
    const RELA_SIZE: usize;

    /// Reads an address, offset or size (`ElfN_Addr`, `ElfN_Off`, `ElfN_Xword`/`Word`).
    fn word(r: &mut FieldReader<'_>) -> io::Result<u64>;

    /// Reads a signed word (`r_addend`).
    fn sword(r: &mut FieldReader<'_>) -> io::Result<i64>;

    /// Splits `r_info` into `(symbol index, relocation type)`.
    fn split_info(info: u64) -> (u32, u32);

    fn segment(r: &mut FieldReader<'_>) -> io::Result<Segment>;

    fn symbol(r: &mut FieldReader<'_>) -> io::Result<Symbol>;
}

#[derive(Debug, Clone, Copy)]
pub struct Elf32;

#[derive(Debug, Clone, Copy)]
pub struct Elf64;

impl WordWidth for Elf32 {
    const CLASS: u8 = goblin::elf::header::ELFCLASS32;
    const EHDR_SIZE: u16 = 52;
    const PHDR_SIZE: u16 = 32;
    const SHDR_SIZE: u16 = 40;
    const SYM_SIZE: usize = 16;
    const REL_SIZE: usize = 8;
    const RELA_SIZE: usize = 12;

    fn word(r: &mut FieldReader<'_>) -> io::Result<u64> {
        r.u32().map(u64::from)
    }

    fn sword(r: &mut FieldReader<'_>) -> io::Result<i64> {
        r.i32().map(i64::from)
    }

    fn split_info(info: u64) -> (u32, u32) {
        // ELF32_R_SYM / ELF32_R_TYPE; `info` was widened from a u32.
        ((info >> 8) as u32, (info & 0xff) as u32)
    }

    fn segment(r: &mut FieldReader<'_>) -> io::Result<Segment> {
        let p_type = r.u32()?;
        let p_offset = Self::word(r)?;
        let p_vaddr = Self::word(r)?;
        let p_paddr = Self::word(r)?;
        let p_filesz = Self::word(r)?;
        let p_memsz = Self::word(r)?;
        let p_flags = r.u32()?;
        let p_align = Self::word(r)?;
        Ok(Segment {
            p_type,
            p_flags,
            p_offset,
            p_vaddr,
            p_paddr,
            p_filesz,
            p_memsz,
            p_align,
        })
    }

    fn symbol(r: &mut FieldReader<'_>) -> io::Result<Symbol> {
        let st_name = r.u32()?;
        let st_value = Self::word(r)?;
        let st_size = Self::word(r)?;
        let st_info = r.u8()?;
        let st_other = r.u8()?;
        let st_shndx = r.u16()?;
        Ok(Symbol {
            st_name,
            st_info,
            st_other,
            st_shndx,
            st_value,
            st_size,
        })
    }
}

impl WordWidth for Elf64 {
    const CLASS: u8 = goblin::elf::header::ELFCLASS64;
    const EHDR_SIZE: u16 = 64;
    const PHDR_SIZE: u16 = 56;
    const SHDR_SIZE: u16 = 64;
    const SYM_SIZE: usize = 24;
    const REL_SIZE: usize = 16;
    const RELA_SIZE: usize = 24;

    fn word(r: &mut FieldReader<'_>) -> io::Result<u64> {
        r.u64()
    }

    fn sword(r: &mut FieldReader<'_>) -> io::Result<i64> {
        r.i64()
    }

    fn split_info(info: u64) -> (u32, u32) {
        ((info >> 32) as u32, info as u32)
    }

    fn segment(r: &mut FieldReader<'_>) -> io::Result<Segment> {
        Ok(Segment {
            p_type: r.u32()?,
            p_flags: r.u32()?,
            p_offset: r.u64()?,
            p_vaddr: r.u64()?,
            p_paddr: r.u64()?,
            p_filesz: r.u64()?,
            p_memsz: r.u64()?,
            p_align: r.u64()?,
        })
    }

    fn symbol(r: &mut FieldReader<'_>) -> io::Result<Symbol> {
        Ok(Symbol {
            st_name: r.u32()?,
            st_info: r.u8()?,
            st_other: r.u8()?,
            st_shndx: r.u16()?,
            st_value: r.u64()?,
            st_size: r.u64()?,
        })
    }
}

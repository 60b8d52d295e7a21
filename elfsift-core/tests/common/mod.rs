//! Synthetic ELF image builder for integration tests.
//!
//! Layout: file header, program headers, section contents (8-byte aligned),
//! section header table. Section 0 is the null section and `.shstrtab` is
//! appended last whenever any section is declared.

#![allow(dead_code)]

use byteorder::{BigEndian, ByteOrder, LittleEndian, WriteBytesExt};

pub const SHT_PROGBITS: u32 = 1;
pub const SHT_SYMTAB: u32 = 2;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_RELA: u32 = 4;
pub const SHT_NOBITS: u32 = 8;
pub const SHT_REL: u32 = 9;
pub const SHT_DYNSYM: u32 = 11;
pub const PT_LOAD: u32 = 1;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    W32,
    W64,
}

impl Width {
    pub fn ehdr_size(self) -> u16 {
        match self {
            Width::W32 => 52,
            Width::W64 => 64,
        }
    }

    pub fn phdr_size(self) -> u16 {
        match self {
            Width::W32 => 32,
            Width::W64 => 56,
        }
    }

    pub fn shdr_size(self) -> u16 {
        match self {
            Width::W32 => 40,
            Width::W64 => 64,
        }
    }

    pub fn sym_size(self) -> u64 {
        match self {
            Width::W32 => 16,
            Width::W64 => 24,
        }
    }

    pub fn rel_size(self) -> u64 {
        match self {
            Width::W32 => 8,
            Width::W64 => 16,
        }
    }

    pub fn rela_size(self) -> u64 {
        match self {
            Width::W32 => 12,
            Width::W64 => 24,
        }
    }

    /// `r_info` for this width.
    pub fn info(self, sym: u32, kind: u32) -> u64 {
        match self {
            Width::W32 => (u64::from(sym) << 8) | u64::from(kind & 0xff),
            Width::W64 => (u64::from(sym) << 32) | u64::from(kind),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Seg {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_paddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Sec {
    pub name: String,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u64,
    pub sh_entsize: u64,
    pub data: Vec<u8>,
    /// Written instead of the real offset/size when set.
    pub offset_override: Option<u64>,
    pub size_override: Option<u64>,
    pub name_override: Option<u32>,
}

impl Sec {
    pub fn new(name: &str, sh_type: u32, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            sh_type,
            sh_addralign: 1,
            data,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Sym {
    pub st_name: u32,
    pub st_info: u8,
    pub st_other: u8,
    pub st_shndx: u16,
    pub st_value: u64,
    pub st_size: u64,
}

#[derive(Debug, Clone)]
pub struct Elf {
    pub width: Width,
    pub big_endian: bool,
    pub e_type: u16,
    pub e_machine: u16,
    pub e_entry: u64,
    pub e_flags: u32,
    pub segments: Vec<Seg>,
    /// User sections; the null section and `.shstrtab` are added around them.
    pub sections: Vec<Sec>,
    pub shstrndx_override: Option<u16>,
    pub shoff_override: Option<u64>,
    pub shnum_override: Option<u16>,
    pub shentsize_override: Option<u16>,
    pub phentsize_override: Option<u16>,
}

/// Field writer honouring width and byte order.
struct Out {
    buf: Vec<u8>,
    width: Width,
    big: bool,
}

impl Out {
    fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn u16(&mut self, v: u16) {
        if self.big {
            self.buf.write_u16::<BigEndian>(v).unwrap();
        } else {
            self.buf.write_u16::<LittleEndian>(v).unwrap();
        }
    }

    fn u32(&mut self, v: u32) {
        if self.big {
            self.buf.write_u32::<BigEndian>(v).unwrap();
        } else {
            self.buf.write_u32::<LittleEndian>(v).unwrap();
        }
    }

    fn u64(&mut self, v: u64) {
        if self.big {
            self.buf.write_u64::<BigEndian>(v).unwrap();
        } else {
            self.buf.write_u64::<LittleEndian>(v).unwrap();
        }
    }

    fn word(&mut self, v: u64) {
        match self.width {
            Width::W32 => self.u32(u32::try_from(v).expect("value does not fit a 32-bit field")),
            Width::W64 => self.u64(v),
        }
    }

    fn sword(&mut self, v: i64) {
        match self.width {
            Width::W32 => self.u32(i32::try_from(v).expect("addend does not fit") as u32),
            Width::W64 => self.u64(v as u64),
        }
    }

    fn pad_to(&mut self, len: usize) {
        assert!(self.buf.len() <= len, "layout overlap");
        self.buf.resize(len, 0);
    }
}

fn align8(v: usize) -> usize {
    (v + 7) & !7
}

impl Elf {
    pub fn new(width: Width) -> Self {
        Self {
            width,
            big_endian: false,
            e_type: 1,
            e_machine: 62,
            e_entry: 0,
            e_flags: 0,
            segments: Vec::new(),
            sections: Vec::new(),
            shstrndx_override: None,
            shoff_override: None,
            shnum_override: None,
            shentsize_override: None,
            phentsize_override: None,
        }
    }

    fn out(&self) -> Out {
        Out {
            buf: Vec::new(),
            width: self.width,
            big: self.big_endian,
        }
    }

    pub fn symbols(&self, syms: &[Sym]) -> Vec<u8> {
        let mut o = self.out();
        for s in syms {
            match self.width {
                Width::W32 => {
                    o.u32(s.st_name);
                    o.word(s.st_value);
                    o.word(s.st_size);
                    o.u8(s.st_info);
                    o.u8(s.st_other);
                    o.u16(s.st_shndx);
                }
                Width::W64 => {
                    o.u32(s.st_name);
                    o.u8(s.st_info);
                    o.u8(s.st_other);
                    o.u16(s.st_shndx);
                    o.u64(s.st_value);
                    o.u64(s.st_size);
                }
            }
        }
        o.buf
    }

    pub fn rels(&self, entries: &[(u64, u32, u32)]) -> Vec<u8> {
        let mut o = self.out();
        for &(offset, sym, kind) in entries {
            o.word(offset);
            o.word(self.width.info(sym, kind));
        }
        o.buf
    }

    pub fn relas(&self, entries: &[(u64, u32, u32, i64)]) -> Vec<u8> {
        let mut o = self.out();
        for &(offset, sym, kind, addend) in entries {
            o.word(offset);
            o.word(self.width.info(sym, kind));
            o.sword(addend);
        }
        o.buf
    }

    /// Index the builder will give user section `i`.
    pub fn index_of(i: usize) -> usize {
        i + 1
    }

    /// Encodes the image.
    pub fn build(&self) -> Vec<u8> {
        let ehdr = usize::from(self.width.ehdr_size());
        let phentsize = self.width.phdr_size();
        let shentsize = self.width.shdr_size();

        let phoff = if self.segments.is_empty() { 0 } else { ehdr };
        let mut cursor = ehdr + self.segments.len() * usize::from(phentsize);

        // Null section, user sections, .shstrtab.
        let mut all: Vec<Sec> = Vec::new();
        let mut shstrtab = vec![0u8];
        let mut names = Vec::new();
        if !self.sections.is_empty() {
            all.push(Sec::default());
            names.push(0u32);
            all.extend(self.sections.iter().cloned());
            all.push(Sec::new(".shstrtab", SHT_STRTAB, Vec::new()));
            for sec in &all[1..] {
                names.push(shstrtab.len() as u32);
                shstrtab.extend_from_slice(sec.name.as_bytes());
                shstrtab.push(0);
            }
            let last = all.len() - 1;
            all[last].data = shstrtab;
        }

        let mut offsets = Vec::with_capacity(all.len());
        for sec in &all {
            cursor = align8(cursor);
            offsets.push(cursor);
            if sec.sh_type != SHT_NOBITS {
                cursor += sec.data.len();
            }
        }
        let shoff = if all.is_empty() { 0 } else { align8(cursor) };

        let mut o = self.out();
        o.buf.extend_from_slice(b"\x7fELF");
        o.u8(match self.width {
            Width::W32 => 1,
            Width::W64 => 2,
        });
        o.u8(if self.big_endian { 2 } else { 1 });
        o.u8(1); // EI_VERSION
        o.u8(3); // EI_OSABI: Linux
        o.u8(0); // EI_ABIVERSION
        o.pad_to(16);
        o.u16(self.e_type);
        o.u16(self.e_machine);
        o.u32(1);
        o.word(self.e_entry);
        o.word(phoff as u64);
        o.word(self.shoff_override.unwrap_or(shoff as u64));
        o.u32(self.e_flags);
        o.u16(ehdr as u16);
        o.u16(self.phentsize_override.unwrap_or(phentsize));
        o.u16(self.segments.len() as u16);
        o.u16(self.shentsize_override.unwrap_or(shentsize));
        o.u16(self.shnum_override.unwrap_or(all.len() as u16));
        o.u16(
            self.shstrndx_override
                .unwrap_or(all.len().saturating_sub(1) as u16),
        );
        assert_eq!(o.buf.len(), ehdr);

        for seg in &self.segments {
            match self.width {
                Width::W32 => {
                    o.u32(seg.p_type);
                    o.word(seg.p_offset);
                    o.word(seg.p_vaddr);
                    o.word(seg.p_paddr);
                    o.word(seg.p_filesz);
                    o.word(seg.p_memsz);
                    o.u32(seg.p_flags);
                    o.word(seg.p_align);
                }
                Width::W64 => {
                    o.u32(seg.p_type);
                    o.u32(seg.p_flags);
                    o.u64(seg.p_offset);
                    o.u64(seg.p_vaddr);
                    o.u64(seg.p_paddr);
                    o.u64(seg.p_filesz);
                    o.u64(seg.p_memsz);
                    o.u64(seg.p_align);
                }
            }
        }

        for (sec, &offset) in all.iter().zip(&offsets) {
            if sec.sh_type != SHT_NOBITS {
                o.pad_to(offset);
                o.buf.extend_from_slice(&sec.data);
            }
        }

        if !all.is_empty() {
            o.pad_to(shoff);
            for (i, sec) in all.iter().enumerate() {
                let (offset, size) = if i == 0 {
                    (0, 0)
                } else {
                    (offsets[i] as u64, sec.data.len() as u64)
                };
                o.u32(sec.name_override.unwrap_or(names[i]));
                o.u32(sec.sh_type);
                o.word(sec.sh_flags);
                o.word(sec.sh_addr);
                o.word(sec.offset_override.unwrap_or(offset));
                o.word(sec.size_override.unwrap_or(size));
                o.u32(sec.sh_link);
                o.u32(sec.sh_info);
                o.word(sec.sh_addralign);
                o.word(sec.sh_entsize);
            }
        }
        o.buf
    }
}

/// Reads a `u16` at `offset` in the image's byte order (for patching tests).
pub fn read_u16(bytes: &[u8], offset: usize, big_endian: bool) -> u16 {
    if big_endian {
        BigEndian::read_u16(&bytes[offset..])
    } else {
        LittleEndian::read_u16(&bytes[offset..])
    }
}

/// A relocatable object with code, data, a symbol table with its string
/// table, one REL and one RELA section, and an executable-style LOAD segment.
pub fn sample_object(width: Width, big_endian: bool) -> Elf {
    let mut elf = Elf::new(width);
    elf.big_endian = big_endian;
    elf.e_entry = 0x1010;

    // User section order: 0 .text, 1 .data, 2 .bss, 3 .symtab, 4 .strtab,
    // 5 .rel.text, 6 .rela.data. Builder indices are one higher.
    let strtab = b"\0main\0counter\0helper\0".to_vec();
    let syms = [
        Sym::default(),
        Sym {
            st_name: 1,
            st_info: 0x12, // GLOBAL FUNC
            st_shndx: 1,
            st_value: 0x1010,
            st_size: 0x20,
            ..Sym::default()
        },
        Sym {
            st_name: 6,
            st_info: 0x11, // GLOBAL OBJECT
            st_other: 2,   // HIDDEN
            st_shndx: 2,
            st_value: 0x2000,
            st_size: 4,
        },
        Sym {
            st_name: 14,
            st_info: 0x02, // LOCAL FUNC
            st_shndx: 1,
            st_value: 0x1000,
            st_size: 0x10,
            ..Sym::default()
        },
    ];

    let mut text = Sec::new(".text", SHT_PROGBITS, vec![0x90; 0x30]);
    text.sh_flags = 0x6;
    text.sh_addr = 0x1000;
    text.sh_addralign = 16;

    let mut data = Sec::new(".data", SHT_PROGBITS, vec![0xaa; 8]);
    data.sh_flags = 0x3;
    data.sh_addr = 0x2000;

    let mut bss = Sec::new(".bss", SHT_NOBITS, Vec::new());
    bss.sh_flags = 0x3;
    bss.sh_addr = 0x3000;
    bss.size_override = Some(0x10_0000);

    let mut symtab = Sec::new(".symtab", SHT_SYMTAB, elf.symbols(&syms));
    symtab.sh_link = 5; // .strtab
    symtab.sh_info = 3;
    symtab.sh_entsize = width.sym_size();
    symtab.sh_addralign = 8;

    let strtab = Sec::new(".strtab", SHT_STRTAB, strtab);

    let mut rel = Sec::new(
        ".rel.text",
        SHT_REL,
        elf.rels(&[(0x1004, 1, 2), (0x1018, 3, 4)]),
    );
    rel.sh_link = 4;
    rel.sh_info = 1;
    rel.sh_entsize = width.rel_size();

    let mut rela = Sec::new(
        ".rela.data",
        SHT_RELA,
        elf.relas(&[(0x2000, 2, 1, -8), (0x2004, 0, 8, 0x40)]),
    );
    rela.sh_link = 4;
    rela.sh_info = 2;
    rela.sh_entsize = width.rela_size();

    elf.sections = vec![text, data, bss, symtab, strtab, rel, rela];
    elf.segments = vec![Seg {
        p_type: PT_LOAD,
        p_flags: 5,
        p_offset: 0,
        p_vaddr: 0x1000,
        p_paddr: 0x1000,
        p_filesz: u64::from(width.ehdr_size()),
        p_memsz: 0x1000,
        p_align: 0x1000,
    }];
    elf
}

//! Table rows and enum-name lookups for the parsed model.

use elfsift_core::{
    ElfFile, Endian, FileHeader, FunctionSignature, Header, RelocationKind, RelocationTable,
    Section, Segment, SymbolTable,
};
use goblin::elf::header::{et_to_str, machine_to_str};
use goblin::elf::program_header::pt_to_str;
use goblin::elf::reloc::r_to_str;
use goblin::elf::section_header::{
    sht_to_str, SHF_ALLOC, SHF_EXECINSTR, SHF_GROUP, SHF_INFO_LINK, SHF_LINK_ORDER, SHF_MERGE,
    SHF_STRINGS, SHF_TLS, SHF_WRITE, SHN_ABS, SHN_COMMON, SHN_UNDEF,
};
use goblin::elf::sym::{bind_to_str, type_to_str, visibility_to_str};
use serde::Serialize;
use tabled::Tabled;

#[derive(Serialize, Tabled)]
pub struct HeaderRow {
    #[tabled(rename = "Field")]
    pub field: &'static str,
    #[tabled(rename = "Value")]
    pub value: String,
}

fn os_abi_name(os_abi: u8) -> &'static str {
    match os_abi {
        0 => "UNIX System V",
        1 => "HP-UX",
        2 => "NetBSD",
        3 => "Linux",
        6 => "Solaris",
        7 => "IBM AIX",
        8 => "IRIX",
        9 => "FreeBSD",
        10 => "TRU64",
        11 => "Novell Modesto",
        12 => "OpenBSD",
        64 => "ARM EABI",
        97 => "ARM",
        255 => "Standalone",
        _ => "Unknown",
    }
}

pub fn header_rows(header: &FileHeader) -> Vec<HeaderRow> {
    let magic = header
        .e_ident
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ");
    let data = match header.endian {
        Endian::Little => "2's complement, little endian",
        Endian::Big => "2's complement, big endian",
    };

    let row = |field, value: String| HeaderRow { field, value };
    vec![
        row("Magic", magic),
        row("Class", header.format_name().to_string()),
        row("Data", data.to_string()),
        row("Version", header.ident_version().to_string()),
        row(
            "OS/ABI",
            format!("{} ({})", header.os_abi(), os_abi_name(header.os_abi())),
        ),
        row("ABI Version", header.abi_version().to_string()),
        row("Type", et_to_str(header.e_type).to_string()),
        row("Machine", machine_to_str(header.machine()).to_string()),
        row("File Version", format!("{:#x}", header.e_version)),
        row("Entry point", format!("{:#x}", header.entry_point())),
        row("Program headers offset", header.e_phoff.to_string()),
        row("Section headers offset", header.e_shoff.to_string()),
        row("Flags", format!("{:#x}", header.e_flags)),
        row("Header size", header.e_ehsize.to_string()),
        row("Program header size", header.e_phentsize.to_string()),
        row("Program header count", header.e_phnum.to_string()),
        row("Section header size", header.e_shentsize.to_string()),
        row("Section header count", header.e_shnum.to_string()),
        row("Section name table index", header.e_shstrndx.to_string()),
    ]
}

#[derive(Serialize, Tabled)]
pub struct SegmentRow {
    #[tabled(rename = "Type")]
    pub kind: String,
    #[tabled(rename = "Offset")]
    pub offset: String,
    #[tabled(rename = "VirtAddr")]
    pub vaddr: String,
    #[tabled(rename = "PhysAddr")]
    pub paddr: String,
    #[tabled(rename = "FileSiz")]
    pub filesz: String,
    #[tabled(rename = "MemSiz")]
    pub memsz: String,
    #[tabled(rename = "Flags")]
    pub flags: String,
    #[tabled(rename = "Align")]
    pub align: String,
}

pub fn segment_row(segment: &Segment) -> SegmentRow {
    let flags = [
        (segment.is_readable(), 'R'),
        (segment.is_writable(), 'W'),
        (segment.is_executable(), 'E'),
    ]
    .iter()
    .map(|&(set, c)| if set { c } else { ' ' })
    .collect();

    SegmentRow {
        kind: pt_to_str(segment.p_type).to_string(),
        offset: format!("{:#x}", segment.p_offset),
        vaddr: format!("{:#x}", segment.p_vaddr),
        paddr: format!("{:#x}", segment.p_paddr),
        filesz: format!("{:#x}", segment.p_filesz),
        memsz: format!("{:#x}", segment.p_memsz),
        flags,
        align: format!("{:#x}", segment.p_align),
    }
}

#[derive(Serialize, Tabled)]
pub struct SectionRow {
    #[tabled(rename = "Nr")]
    pub index: usize,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Type")]
    pub kind: String,
    #[tabled(rename = "Address")]
    pub addr: String,
    #[tabled(rename = "Offset")]
    pub offset: String,
    #[tabled(rename = "Size")]
    pub size: String,
    #[tabled(rename = "EntSize")]
    pub entsize: String,
    #[tabled(rename = "Flags")]
    pub flags: String,
    #[tabled(rename = "Link")]
    pub link: u32,
    #[tabled(rename = "Info")]
    pub info: u32,
    #[tabled(rename = "Align")]
    pub align: u64,
}

fn section_flags(flags: u64) -> String {
    [
        (SHF_WRITE, 'W'),
        (SHF_ALLOC, 'A'),
        (SHF_EXECINSTR, 'X'),
        (SHF_MERGE, 'M'),
        (SHF_STRINGS, 'S'),
        (SHF_INFO_LINK, 'I'),
        (SHF_LINK_ORDER, 'L'),
        (SHF_GROUP, 'G'),
        (SHF_TLS, 'T'),
    ]
    .iter()
    .filter(|(bit, _)| flags & u64::from(*bit) != 0)
    .map(|&(_, c)| c)
    .collect()
}

pub fn section_rows(elf: &ElfFile<'_>) -> Vec<SectionRow> {
    elf.sections()
        .iter()
        .enumerate()
        .map(|(index, section): (usize, &Section)| SectionRow {
            index,
            name: elf.section_name(index).unwrap_or("").to_string(),
            kind: sht_to_str(section.sh_type).to_string(),
            addr: format!("{:#x}", section.sh_addr),
            offset: format!("{:#x}", section.sh_offset),
            size: format!("{:#x}", section.sh_size),
            entsize: format!("{:#x}", section.sh_entsize),
            flags: section_flags(section.sh_flags),
            link: section.sh_link,
            info: section.sh_info,
            align: section.sh_addralign,
        })
        .collect()
}

#[derive(Serialize, Tabled)]
pub struct SymbolRow {
    #[tabled(rename = "Num")]
    pub index: usize,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Size")]
    pub size: u64,
    #[tabled(rename = "Type")]
    pub kind: &'static str,
    #[tabled(rename = "Bind")]
    pub bind: &'static str,
    #[tabled(rename = "Vis")]
    pub visibility: &'static str,
    #[tabled(rename = "Ndx")]
    pub section: String,
    #[tabled(rename = "Name")]
    pub name: String,
}

fn section_index_name(shndx: u16) -> String {
    match u32::from(shndx) {
        SHN_UNDEF => "UND".to_string(),
        SHN_ABS => "ABS".to_string(),
        SHN_COMMON => "COM".to_string(),
        other => other.to_string(),
    }
}

pub fn symbol_rows(table: &SymbolTable<'_>) -> Vec<SymbolRow> {
    table
        .iter()
        .enumerate()
        .map(|(index, symbol)| SymbolRow {
            index,
            value: format!("{:#018x}", symbol.st_value),
            size: symbol.st_size,
            kind: type_to_str(symbol.kind()),
            bind: bind_to_str(symbol.binding()),
            visibility: visibility_to_str(symbol.visibility()),
            section: section_index_name(symbol.st_shndx),
            name: table.name(symbol).unwrap_or("").to_string(),
        })
        .collect()
}

#[derive(Serialize, Tabled)]
pub struct RelocationRow {
    #[tabled(rename = "Offset")]
    pub offset: String,
    #[tabled(rename = "Info")]
    pub info: String,
    #[tabled(rename = "Type")]
    pub kind: &'static str,
    #[tabled(rename = "Sym")]
    pub symbol: u32,
    #[tabled(rename = "Addend")]
    pub addend: String,
}

pub fn relocation_rows(table: &RelocationTable, machine: u16) -> Vec<RelocationRow> {
    table
        .entries
        .iter()
        .map(|reloc| RelocationRow {
            offset: format!("{:#018x}", reloc.r_offset),
            info: format!("{:#018x}", reloc.r_info),
            kind: r_to_str(reloc.r_type, machine),
            symbol: reloc.symbol,
            addend: match (table.kind, reloc.r_addend) {
                (RelocationKind::Rela, Some(addend)) => format!("{addend:#x}"),
                _ => String::new(),
            },
        })
        .collect()
}

#[derive(Serialize, Tabled)]
pub struct FunctionRow {
    #[tabled(rename = "Function")]
    pub name: String,
    #[tabled(rename = "Start")]
    pub start: String,
    #[tabled(rename = "End")]
    pub end: String,
    #[tabled(rename = "Size")]
    pub size: u64,
}

pub fn function_row(func: &FunctionSignature) -> FunctionRow {
    FunctionRow {
        name: func.function_identifier.clone(),
        start: format!("{:#x}", func.start),
        end: format!("{:#x}", func.end),
        size: func.size,
    }
}

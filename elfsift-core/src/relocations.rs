use goblin::elf::section_header::{SHT_DYNSYM, SHT_REL, SHT_RELA, SHT_SYMTAB};

use crate::bounds;
use crate::error::{Region, Result};
use crate::header::FileHeader;
use crate::reader::FieldReader;
use crate::sections::{Section, SectionTable};
use crate::width::WordWidth;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationKind {
    /// `SHT_REL`: addend stored at the patched location.
    Rel,
    /// `SHT_RELA`: explicit addend in the entry.
    Rela,
}

/// A relocation entry, widened to 64-bit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    /// Location to patch.
    pub r_offset: u64,
    /// Raw `r_info` as stored on disk.
    pub r_info: u64,
    /// Only present for `SHT_RELA` entries.
    pub r_addend: Option<i64>,
    /// Symbol index split from `r_info` for this image's width.
    pub symbol: u32,
    /// Relocation type split from `r_info` for this image's width.
    pub r_type: u32,
}

/// Entries of one relocation section, in on-disk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocationTable {
    pub section: usize,
    pub kind: RelocationKind,
    /// Symbol table the entries index into.
    pub link: u32,
    /// Section the relocations apply to.
    pub info: u32,
    pub entries: Vec<Relocation>,
}

/// All relocation sections, split by kind, each in section-table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relocations {
    pub rel: Vec<RelocationTable>,
    pub rela: Vec<RelocationTable>,
}

impl Relocations {
    /// Every table in section-table order regardless of kind.
    pub fn tables(&self) -> impl Iterator<Item = &RelocationTable> {
        let mut all: Vec<&RelocationTable> = self.rel.iter().chain(self.rela.iter()).collect();
        all.sort_by_key(|t| t.section);
        all.into_iter()
    }

    pub fn is_empty(&self) -> bool {
        self.rel.is_empty() && self.rela.is_empty()
    }
}

pub(crate) fn parse<W: WordWidth>(
    data: &[u8],
    header: &FileHeader,
    sections: &SectionTable<'_>,
) -> Result<Relocations> {
    let rel_count = sections.iter().filter(|s| s.sh_type == SHT_REL).count();
    let rela_count = sections.iter().filter(|s| s.sh_type == SHT_RELA).count();

    let mut relocations = Relocations {
        rel: Vec::with_capacity(rel_count),
        rela: Vec::with_capacity(rela_count),
    };

    for (index, section) in sections.iter().enumerate() {
        let kind = match section.sh_type {
            SHT_REL => RelocationKind::Rel,
            SHT_RELA => RelocationKind::Rela,
            _ => continue,
        };
        check_link(sections, index, section);

        let table = decode::<W>(data, header, index, section, kind)?;
        log::trace!(
            "relocation section {index}: {} {kind:?} entries",
            table.entries.len()
        );
        match kind {
            RelocationKind::Rel => relocations.rel.push(table),
            RelocationKind::Rela => relocations.rela.push(table),
        }
    }

    log::debug!(
        "decoded {} REL and {} RELA sections",
        relocations.rel.len(),
        relocations.rela.len()
    );
    Ok(relocations)
}

fn check_link(sections: &SectionTable<'_>, index: usize, section: &Section) {
    let linked = sections.get(section.sh_link as usize).map(|s| s.sh_type);
    if !matches!(linked, Some(SHT_SYMTAB) | Some(SHT_DYNSYM)) {
        log::warn!(
            "relocation section {index} links to section {} which is not a symbol table",
            section.sh_link
        );
    }
}

fn decode<W: WordWidth>(
    data: &[u8],
    header: &FileHeader,
    index: usize,
    section: &Section,
    kind: RelocationKind,
) -> Result<RelocationTable> {
    let entry_size = match kind {
        RelocationKind::Rel => W::REL_SIZE,
        RelocationKind::Rela => W::RELA_SIZE,
    };
    let bytes = section.file_bytes(data);
    if bytes.len() % entry_size != 0 {
        log::warn!(
            "relocation section {index} has {} trailing bytes",
            bytes.len() % entry_size
        );
    }

    let mut entries = Vec::with_capacity(bytes.len() / entry_size);
    for chunk in bytes.chunks_exact(entry_size) {
        let entry = read_entry::<W>(&mut FieldReader::new(chunk, header.endian), kind).map_err(|_| {
            bounds::short_read(Region::Section(index), section.sh_offset as usize, bytes.len(), data.len())
        })?;
        entries.push(entry);
    }

    Ok(RelocationTable {
        section: index,
        kind,
        link: section.sh_link,
        info: section.sh_info,
        entries,
    })
}

fn read_entry<W: WordWidth>(r: &mut FieldReader<'_>, kind: RelocationKind) -> std::io::Result<Relocation> {
    let r_offset = W::word(r)?;
    let r_info = W::word(r)?;
    let r_addend = match kind {
        RelocationKind::Rel => None,
        RelocationKind::Rela => Some(W::sword(r)?),
    };
    let (symbol, r_type) = W::split_info(r_info);
    Ok(Relocation {
        r_offset,
        r_info,
        r_addend,
        symbol,
        r_type,
    })
}

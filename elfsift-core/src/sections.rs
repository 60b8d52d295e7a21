use goblin::elf::section_header::SHT_NOBITS;

use crate::bounds;
use crate::error::{Region, Result};
use crate::header::FileHeader;
use crate::reader::FieldReader;
use crate::strtab::{self, AmbiguityPolicy, NamedStringTables, StringTable};
use crate::width::WordWidth;

/// A section header, widened to 64-bit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    /// Offset of the name in the section-name string table.
    pub sh_name: u32,
    pub sh_type: u32,
    pub sh_flags: u64,
    pub sh_addr: u64,
    pub sh_offset: u64,
    pub sh_size: u64,
    /// Index of an associated section; meaning depends on `sh_type`.
    pub sh_link: u32,
    pub sh_info: u32,
    pub sh_addralign: u64,
    pub sh_entsize: u64,
}

impl Section {
    /// Bytes this section occupies in the file; zero for `SHT_NOBITS`.
    pub fn file_size(&self) -> u64 {
        if self.sh_type == SHT_NOBITS {
            0
        } else {
            self.sh_size
        }
    }

    /// The section's bytes, or an empty slice if its range is not inside `data`.
    pub fn file_bytes<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        bounds::range(self.sh_offset, self.file_size(), data.len())
            .and_then(|range| data.get(range))
            .unwrap_or(&[])
    }
}

/// Section headers plus the string tables located through them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionTable<'a> {
    pub headers: Vec<Section>,
    /// Section-name table (`e_shstrndx`); unset when the index is out of range.
    pub names: Option<StringTable<'a>>,
    pub strings: NamedStringTables<'a>,
}

impl<'a> SectionTable<'a> {
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Section> {
        self.headers.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Section> {
        self.headers.iter()
    }

    pub fn name(&self, index: usize) -> Option<&'a str> {
        let section = self.headers.get(index)?;
        self.names?.get(section.sh_name)
    }

    /// First section whose name equals `name`.
    pub fn by_name(&self, name: &str) -> Option<(usize, &Section)> {
        self.headers
            .iter()
            .enumerate()
            .find(|(i, _)| self.name(*i) == Some(name))
    }
}

/// Decodes the section-header table, checks every section's range, and
/// resolves the section-name, `.strtab` and `.dynstr` tables.
pub(crate) fn parse<'a, W: WordWidth>(
    data: &'a [u8],
    header: &FileHeader,
    policy: AmbiguityPolicy,
) -> Result<SectionTable<'a>> {
    let table = bounds::table(
        Region::SectionHeaderTable,
        header.e_shoff,
        header.e_shentsize,
        header.e_shnum,
        data.len(),
    )?;
    let stride = usize::from(header.e_shentsize);
    let record = usize::from(W::SHDR_SIZE);

    let mut headers = Vec::with_capacity(usize::from(header.e_shnum));
    for i in 0..usize::from(header.e_shnum) {
        let start = table.start + i * stride;
        let bytes = data
            .get(start..start + record)
            .ok_or_else(|| bounds::short_read(Region::Section(i), start, record, data.len()))?;
        let section = read_section::<W>(&mut FieldReader::new(bytes, header.endian))
            .map_err(|_| bounds::short_read(Region::Section(i), start, record, data.len()))?;
        log::trace!("section {i}: {section:x?}");
        headers.push(section);
    }

    for (i, section) in headers.iter().enumerate() {
        bounds::span(Region::Section(i), section.sh_offset, section.file_size(), data.len())?;
    }

    let shstrndx = usize::from(header.e_shstrndx);
    let names = headers
        .get(shstrndx)
        .map(|section| StringTable::new(shstrndx, section.file_bytes(data)));
    if names.is_none() && !headers.is_empty() {
        log::warn!(
            "section name table index {shstrndx} is outside {} sections; names unresolved",
            headers.len()
        );
    }

    let strings = strtab::resolve(data, &headers, names.as_ref(), policy)?;

    log::debug!(
        "decoded {} sections (.strtab: {:?}, .dynstr: {:?})",
        headers.len(),
        strings.symbols.map(|t| t.section()),
        strings.dynamic.map(|t| t.section())
    );
    Ok(SectionTable {
        headers,
        names,
        strings,
    })
}

fn read_section<W: WordWidth>(r: &mut FieldReader<'_>) -> std::io::Result<Section> {
    Ok(Section {
        sh_name: r.u32()?,
        sh_type: r.u32()?,
        sh_flags: W::word(r)?,
        sh_addr: W::word(r)?,
        sh_offset: W::word(r)?,
        sh_size: W::word(r)?,
        sh_link: r.u32()?,
        sh_info: r.u32()?,
        sh_addralign: W::word(r)?,
        sh_entsize: W::word(r)?,
    })
}

use goblin::elf::program_header::{PF_R, PF_W, PF_X};

use crate::bounds;
use crate::error::{Region, Result};
use crate::header::FileHeader;
use crate::reader::FieldReader;
use crate::width::WordWidth;

/// A program header, widened to 64-bit fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub p_type: u32,
    pub p_flags: u32,
    pub p_offset: u64,
    pub p_vaddr: u64,
    pub p_paddr: u64,
    pub p_filesz: u64,
    pub p_memsz: u64,
    pub p_align: u64,
}

impl Segment {
    pub fn is_readable(&self) -> bool {
        self.p_flags & PF_R != 0
    }

    pub fn is_writable(&self) -> bool {
        self.p_flags & PF_W != 0
    }

    pub fn is_executable(&self) -> bool {
        self.p_flags & PF_X != 0
    }
}

/// Decodes the whole program-header table, then checks every segment's file range.
///
/// The bounds pass runs after the decode pass so that nothing is returned
/// unless every entry is in range.
pub(crate) fn parse<W: WordWidth>(data: &[u8], header: &FileHeader) -> Result<Vec<Segment>> {
    let table = bounds::table(
        Region::ProgramHeaderTable,
        header.e_phoff,
        header.e_phentsize,
        header.e_phnum,
        data.len(),
    )?;
    let stride = usize::from(header.e_phentsize);
    let record = usize::from(W::PHDR_SIZE);

    let mut segments = Vec::with_capacity(usize::from(header.e_phnum));
    for i in 0..usize::from(header.e_phnum) {
        let start = table.start + i * stride;
        let bytes = data
            .get(start..start + record)
            .ok_or_else(|| bounds::short_read(Region::Segment(i), start, record, data.len()))?;
        let segment = W::segment(&mut FieldReader::new(bytes, header.endian))
            .map_err(|_| bounds::short_read(Region::Segment(i), start, record, data.len()))?;
        log::trace!("segment {i}: {segment:x?}");
        segments.push(segment);
    }

    for (i, segment) in segments.iter().enumerate() {
        bounds::span(Region::Segment(i), segment.p_offset, segment.p_filesz, data.len())?;
    }

    log::debug!("decoded {} segments", segments.len());
    Ok(segments)
}

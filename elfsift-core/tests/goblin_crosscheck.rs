//! Decodes the same synthetic images with goblin and compares field by field.

mod common;

use common::{sample_object, Width};
use elfsift_core::ElfFile;

fn compare(width: Width, big_endian: bool) {
    let bytes = sample_object(width, big_endian).build();
    let ours = ElfFile::parse(&bytes).unwrap();
    let theirs = goblin::elf::Elf::parse(&bytes).unwrap();

    let h = ours.header();
    assert_eq!(h.e_type, theirs.header.e_type);
    assert_eq!(h.e_machine, theirs.header.e_machine);
    assert_eq!(h.e_entry, theirs.header.e_entry);
    assert_eq!(h.e_phoff, theirs.header.e_phoff);
    assert_eq!(h.e_shoff, theirs.header.e_shoff);
    assert_eq!(h.e_phnum, theirs.header.e_phnum);
    assert_eq!(h.e_shnum, theirs.header.e_shnum);
    assert_eq!(h.e_shstrndx, theirs.header.e_shstrndx);
    assert_eq!(ours.is_64_bit(), theirs.is_64);
    assert_eq!(ours.header().endian == elfsift_core::Endian::Little, theirs.little_endian);

    assert_eq!(ours.segments().len(), theirs.program_headers.len());
    for (a, b) in ours.segments().iter().zip(&theirs.program_headers) {
        assert_eq!(a.p_type, b.p_type);
        assert_eq!(a.p_flags, b.p_flags);
        assert_eq!(a.p_offset, b.p_offset);
        assert_eq!(a.p_vaddr, b.p_vaddr);
        assert_eq!(a.p_filesz, b.p_filesz);
        assert_eq!(a.p_memsz, b.p_memsz);
    }

    assert_eq!(ours.sections().len(), theirs.section_headers.len());
    for (i, (a, b)) in ours.sections().iter().zip(&theirs.section_headers).enumerate() {
        assert_eq!(a.sh_type, b.sh_type);
        assert_eq!(a.sh_offset, b.sh_offset);
        assert_eq!(a.sh_size, b.sh_size);
        assert_eq!(a.sh_link, b.sh_link);
        assert_eq!(ours.section_name(i), theirs.shdr_strtab.get_at(b.sh_name));
    }

    let symtab = ours.static_symbols();
    assert_eq!(symtab.len(), theirs.syms.len());
    for (a, b) in symtab.iter().zip(theirs.syms.iter()) {
        assert_eq!(a.st_value, b.st_value);
        assert_eq!(a.st_size, b.st_size);
        assert_eq!(a.st_info, b.st_info);
        assert_eq!(a.st_other, b.st_other);
        assert_eq!(a.st_shndx as usize, b.st_shndx);
        assert_eq!(symtab.name(a), theirs.strtab.get_at(b.st_name));
    }
}

#[test]
fn matches_goblin_on_little_endian_64_bit() {
    compare(Width::W64, false);
}

#[test]
fn matches_goblin_on_big_endian_32_bit() {
    compare(Width::W32, true);
}

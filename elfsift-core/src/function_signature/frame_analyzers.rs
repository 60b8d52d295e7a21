pub mod eh_frame;
pub mod symtab;

use std::fmt;

use anyhow::Result;

use crate::parser::ElfFile;
use crate::FunctionSignature;

/// Where function boundaries are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PossibleFrames {
    Symtab, // .symtab symbol table
    DynSym, // .dynsym dynamic symbol table
    EhFrame, // .eh_frame
}

impl std::str::FromStr for PossibleFrames {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "symtab" | ".symtab" => Ok(PossibleFrames::Symtab),
            "dynsym" | ".dynsym" => Ok(PossibleFrames::DynSym),
            "ehframe" | "eh-frame" | ".eh_frame" => Ok(PossibleFrames::EhFrame),
            _ => Err(format!("Unknown frame type: {}", s)),
        }
    }
}

impl fmt::Display for PossibleFrames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PossibleFrames::Symtab => ".symtab",
            PossibleFrames::DynSym => ".dynsym",
            PossibleFrames::EhFrame => ".eh_frame",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug)]
pub struct FrameAnalyzer<'e, 'a> {
    pub elf: &'e ElfFile<'a>,
}

impl<'e, 'a> FrameAnalyzer<'e, 'a> {
    pub fn new(elf: &'e ElfFile<'a>) -> Self {
        Self { elf }
    }

    /// Functions described by `source`; empty if the image lacks it.
    pub fn analyze(&self, source: PossibleFrames) -> Result<Vec<FunctionSignature>> {
        let functions = match source {
            PossibleFrames::Symtab => symtab::parse_symtab(self.elf.static_symbols()),
            PossibleFrames::DynSym => symtab::parse_symtab(self.elf.dynamic_symbols()),
            PossibleFrames::EhFrame => match self.elf.section_by_name(".eh_frame") {
                Some((index, section)) => {
                    let data = self.elf.section_data(index).unwrap_or_default();
                    let address_size = if self.elf.is_64_bit() { 8 } else { 4 };
                    eh_frame::parse_eh_frame(
                        data,
                        section.sh_addr,
                        self.elf.header().endian,
                        address_size,
                    )?
                }
                None => Vec::new(),
            },
        };
        log::info!("Found {} functions in {}", functions.len(), source);
        Ok(functions)
    }
}

pub mod frame_analyzers;
pub use frame_analyzers::*;

use anyhow::Result;

use crate::header::Header;
use crate::parser::ElfFile;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub function_identifier: String,
    pub start: u64,
    pub end: u64,
    pub size: u64,
}

/// Lists functions from the first source in `sources` that yields any, then
/// labels the one at the entry point `entry`.
pub fn discover_functions(
    elf: &ElfFile<'_>,
    sources: &[PossibleFrames],
) -> Result<Vec<FunctionSignature>> {
    let analyzer = FrameAnalyzer::new(elf);
    let mut functions = Vec::new();
    for &source in sources {
        functions = analyzer.analyze(source)?;
        if !functions.is_empty() {
            break;
        }
        log::warn!("{source} yielded no functions");
    }

    let entry_addr = elf.header().entry_point();
    if entry_addr == 0 {
        return Ok(functions);
    }
    if let Some(entry_func) = functions.iter_mut().find(|f| f.start == entry_addr) {
        log::info!(
            "Entry function found at {:#x}, renaming {} -> entry",
            entry_func.start,
            entry_func.function_identifier
        );
        entry_func.function_identifier = "entry".to_string();
    } else {
        functions.push(FunctionSignature {
            function_identifier: "entry".to_string(),
            start: entry_addr,
            end: entry_addr,
            size: 0,
        });
        log::warn!(
            "Entry address {:#x} not found among functions; added synthetic entry function",
            entry_addr
        );
    }
    Ok(functions)
}

/// Default source order: symbol tables first, unwind info for stripped images.
pub const DEFAULT_SOURCES: [PossibleFrames; 3] = [
    PossibleFrames::Symtab,
    PossibleFrames::DynSym,
    PossibleFrames::EhFrame,
];

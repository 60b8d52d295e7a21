use crate::symbols::{Symbol, SymbolTable};
use crate::FunctionSignature;
use goblin::elf::section_header::SHN_UNDEF;
use goblin::elf::sym::STT_FUNC;

/// Defined functions with a known address and size.
pub fn is_function(symbol: &Symbol) -> bool {
    symbol.kind() == STT_FUNC
        && u32::from(symbol.st_shndx) != SHN_UNDEF
        && symbol.st_value != 0
        && symbol.st_size != 0
}

pub fn name_from_symtab(table: &SymbolTable<'_>, symbol: &Symbol) -> String {
    match table.name(symbol) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("FUNC_{:#x}", symbol.st_value),
    }
}

pub fn parse_symtab(table: &SymbolTable<'_>) -> Vec<FunctionSignature> {
    let mut signatures: Vec<FunctionSignature> = table
        .iter()
        .filter(|symbol| is_function(symbol))
        .map(|symbol| FunctionSignature {
            function_identifier: name_from_symtab(table, symbol),
            start: symbol.st_value,
            end: symbol.st_value.wrapping_add(symbol.st_size),
            size: symbol.st_size,
        })
        .collect();

    signatures.sort_by_key(|sig| sig.start);
    signatures
}

use crate::error::{ParseError, Result, TableKind};
use crate::sections::Section;

/// Name of the static symbol string table.
pub const SYMBOL_STRINGS: &str = ".strtab";
/// Name of the dynamic symbol string table.
pub const DYNAMIC_STRINGS: &str = ".dynstr";

/// What to do when more than one section claims a table that must be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AmbiguityPolicy {
    /// Fail with [`ParseError::AmbiguousNameTable`].
    #[default]
    Reject,
    /// Keep the last matching section in table order.
    LastWins,
}

/// A string table bounded to its own section's bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringTable<'a> {
    section: usize,
    data: &'a [u8],
}

impl<'a> StringTable<'a> {
    pub fn new(section: usize, data: &'a [u8]) -> Self {
        Self { section, data }
    }

    /// Index of the backing section.
    pub fn section(&self) -> usize {
        self.section
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Raw bytes of the NUL-terminated string at `offset`.
    ///
    /// Returns `None` if the offset is outside the table or no terminator
    /// follows it inside the table.
    pub fn get_bytes(&self, offset: u32) -> Option<&'a [u8]> {
        let start = usize::try_from(offset).ok()?;
        let tail = self.data.get(start..)?;
        let end = tail.iter().position(|&b| b == 0)?;
        Some(&tail[..end])
    }

    pub fn get(&self, offset: u32) -> Option<&'a str> {
        self.get_bytes(offset)
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
    }
}

/// String tables located by section name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NamedStringTables<'a> {
    pub symbols: Option<StringTable<'a>>,
    pub dynamic: Option<StringTable<'a>>,
}

/// Finds `.strtab` and `.dynstr` by comparing each section's name.
///
/// Without a section-name table nothing can be matched and both stay unset.
pub(crate) fn resolve<'a>(
    data: &'a [u8],
    sections: &[Section],
    names: Option<&StringTable<'a>>,
    policy: AmbiguityPolicy,
) -> Result<NamedStringTables<'a>> {
    let Some(names) = names else {
        return Ok(NamedStringTables::default());
    };

    let mut symbols = Vec::new();
    let mut dynamic = Vec::new();
    for (i, section) in sections.iter().enumerate() {
        match names.get_bytes(section.sh_name) {
            Some(name) if name == SYMBOL_STRINGS.as_bytes() => symbols.push(i),
            Some(name) if name == DYNAMIC_STRINGS.as_bytes() => dynamic.push(i),
            _ => {}
        }
    }

    let pick = |kind: TableKind, matches: Vec<usize>| -> Result<Option<StringTable<'a>>> {
        let Some(&last) = matches.last() else {
            return Ok(None);
        };
        if matches.len() > 1 {
            match policy {
                AmbiguityPolicy::Reject => {
                    return Err(ParseError::AmbiguousNameTable {
                        table: kind,
                        sections: matches,
                    });
                }
                AmbiguityPolicy::LastWins => {
                    log::warn!("{kind} claimed by sections {matches:?}; using section {last}");
                }
            }
        }
        Ok(Some(StringTable::new(last, sections[last].file_bytes(data))))
    };

    Ok(NamedStringTables {
        symbols: pick(TableKind::SymbolStrings, symbols)?,
        dynamic: pick(TableKind::DynamicStrings, dynamic)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_within_table() {
        let table = StringTable::new(1, b"\0.text\0.data\0");
        assert_eq!(table.get(0), Some(""));
        assert_eq!(table.get(1), Some(".text"));
        assert_eq!(table.get(3), Some("ext"));
        assert_eq!(table.get(7), Some(".data"));
    }

    #[test]
    fn lookup_past_end_is_none() {
        let table = StringTable::new(1, b"\0abc\0");
        assert_eq!(table.get(5), None);
        assert_eq!(table.get(u32::MAX), None);
    }

    #[test]
    fn unterminated_tail_is_none() {
        // The byte after the table might be a NUL in the file; it must not be used.
        let file = b"\0name\0tail\0";
        let table = StringTable::new(2, &file[..9]);
        assert_eq!(table.get(1), Some("name"));
        assert_eq!(table.get(6), None);
    }

    #[test]
    fn invalid_utf8_only_fails_str_lookup() {
        let table = StringTable::new(0, b"\xff\xfe\0");
        assert_eq!(table.get_bytes(0), Some(&b"\xff\xfe"[..]));
        assert_eq!(table.get(0), None);
    }
}

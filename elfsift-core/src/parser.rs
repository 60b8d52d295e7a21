//! The parse context and its stage state machine.
//!
//! `Unparsed -> HeaderValid -> SegmentsValid -> SectionsValid ->
//! SymbolsResolved -> RelocationsResolved`, with any failure moving to the
//! terminal `Failed` state. Every derived table lives in the [`Parser`] (and
//! then in the [`ElfFile`] it produces), so independent images can be parsed
//! concurrently and dropping the context releases everything at once.

use crate::error::{ParseError, Result, Stage};
use crate::header::{self, Class, FileHeader};
use crate::relocations::{self, Relocations};
use crate::sections::{self, Section, SectionTable};
use crate::segments::{self, Segment};
use crate::strtab::AmbiguityPolicy;
use crate::symbols::{self, SymbolTable, SymbolTables};
use crate::width::{Elf32, Elf64};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub ambiguity: AmbiguityPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseState {
    Unparsed,
    HeaderValid,
    SegmentsValid,
    SectionsValid,
    SymbolsResolved,
    RelocationsResolved,
    /// A stage failed; nothing after it will run.
    Failed(Stage),
}

impl ParseState {
    fn completed(self) -> Option<Stage> {
        match self {
            ParseState::Unparsed | ParseState::Failed(_) => None,
            ParseState::HeaderValid => Some(Stage::Header),
            ParseState::SegmentsValid => Some(Stage::Segments),
            ParseState::SectionsValid => Some(Stage::Sections),
            ParseState::SymbolsResolved => Some(Stage::Symbols),
            ParseState::RelocationsResolved => Some(Stage::Relocations),
        }
    }

    fn after(stage: Stage) -> Self {
        match stage {
            Stage::Header => ParseState::HeaderValid,
            Stage::Segments => ParseState::SegmentsValid,
            Stage::Sections => ParseState::SectionsValid,
            Stage::Symbols => ParseState::SymbolsResolved,
            Stage::Relocations => ParseState::RelocationsResolved,
        }
    }
}

impl Stage {
    fn previous(self) -> Option<Stage> {
        match self {
            Stage::Header => None,
            Stage::Segments => Some(Stage::Header),
            Stage::Sections => Some(Stage::Segments),
            Stage::Symbols => Some(Stage::Sections),
            Stage::Relocations => Some(Stage::Symbols),
        }
    }
}

/// Per-image parse context.
///
/// Stages can be driven one at a time or all at once with [`Parser::finish`].
/// Asking for a stage that already ran returns its stored result; asking for
/// one whose predecessor has not run is [`ParseError::MissingPrerequisite`].
#[derive(Debug)]
pub struct Parser<'a> {
    data: &'a [u8],
    options: ParseOptions,
    state: ParseState,
    failure: Option<ParseError>,
    header: Option<FileHeader>,
    segments: Vec<Segment>,
    sections: Option<SectionTable<'a>>,
    symbols: SymbolTables<'a>,
    relocations: Relocations,
}

impl<'a> Parser<'a> {
    pub fn new(data: &'a [u8], options: ParseOptions) -> Self {
        Self {
            data,
            options,
            state: ParseState::Unparsed,
            failure: None,
            header: None,
            segments: Vec::new(),
            sections: None,
            symbols: SymbolTables::default(),
            relocations: Relocations::default(),
        }
    }

    pub fn state(&self) -> ParseState {
        self.state
    }

    /// Whether `stage` needs to run now, or an error if it cannot.
    fn enter(&self, stage: Stage) -> Result<bool> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }
        let done = self.state.completed();
        if done >= Some(stage) {
            return Ok(false);
        }
        match stage.previous() {
            Some(requires) if done != Some(requires) => {
                Err(ParseError::MissingPrerequisite { stage, requires })
            }
            _ => Ok(true),
        }
    }

    fn record<T>(&mut self, stage: Stage, result: Result<T>) -> Result<T> {
        match result {
            Ok(value) => {
                self.state = ParseState::after(stage);
                Ok(value)
            }
            Err(err) => {
                log::error!("{stage} failed: {err}");
                self.state = ParseState::Failed(stage);
                self.failure = Some(err.clone());
                Err(err)
            }
        }
    }

    fn validated_header(&self, stage: Stage) -> Result<&FileHeader> {
        self.header.as_ref().ok_or(ParseError::MissingPrerequisite {
            stage,
            requires: Stage::Header,
        })
    }

    pub fn parse_header(&mut self) -> Result<&FileHeader> {
        if self.enter(Stage::Header)? {
            let header = header::classify(self.data);
            self.header = Some(self.record(Stage::Header, header)?);
        }
        self.validated_header(Stage::Header)
    }

    pub fn parse_segments(&mut self) -> Result<&[Segment]> {
        if self.enter(Stage::Segments)? {
            let header = *self.validated_header(Stage::Segments)?;
            let segments = match header.class {
                Class::Elf32 => segments::parse::<Elf32>(self.data, &header),
                Class::Elf64 => segments::parse::<Elf64>(self.data, &header),
            };
            self.segments = self.record(Stage::Segments, segments)?;
        }
        Ok(&self.segments)
    }

    pub fn parse_sections(&mut self) -> Result<&SectionTable<'a>> {
        if self.enter(Stage::Sections)? {
            let header = *self.validated_header(Stage::Sections)?;
            let policy = self.options.ambiguity;
            let sections = match header.class {
                Class::Elf32 => sections::parse::<Elf32>(self.data, &header, policy),
                Class::Elf64 => sections::parse::<Elf64>(self.data, &header, policy),
            };
            self.sections = Some(self.record(Stage::Sections, sections)?);
        }
        self.validated_sections(Stage::Sections)
    }

    fn validated_sections(&self, stage: Stage) -> Result<&SectionTable<'a>> {
        self.sections.as_ref().ok_or(ParseError::MissingPrerequisite {
            stage,
            requires: Stage::Sections,
        })
    }

    pub fn parse_symbols(&mut self) -> Result<&SymbolTables<'a>> {
        if self.enter(Stage::Symbols)? {
            let header = *self.validated_header(Stage::Symbols)?;
            let sections = self.validated_sections(Stage::Symbols)?;
            let policy = self.options.ambiguity;
            let symbols = match header.class {
                Class::Elf32 => symbols::parse::<Elf32>(self.data, &header, sections, policy),
                Class::Elf64 => symbols::parse::<Elf64>(self.data, &header, sections, policy),
            };
            self.symbols = self.record(Stage::Symbols, symbols)?;
        }
        Ok(&self.symbols)
    }

    pub fn parse_relocations(&mut self) -> Result<&Relocations> {
        if self.enter(Stage::Relocations)? {
            let header = *self.validated_header(Stage::Relocations)?;
            let sections = self.validated_sections(Stage::Relocations)?;
            let relocations = match header.class {
                Class::Elf32 => relocations::parse::<Elf32>(self.data, &header, sections),
                Class::Elf64 => relocations::parse::<Elf64>(self.data, &header, sections),
            };
            self.relocations = self.record(Stage::Relocations, relocations)?;
        }
        Ok(&self.relocations)
    }

    /// Runs every remaining stage and hands over the finished model.
    pub fn finish(mut self) -> Result<ElfFile<'a>> {
        self.parse_header()?;
        self.parse_segments()?;
        self.parse_sections()?;
        self.parse_symbols()?;
        self.parse_relocations()?;

        let header = *self.validated_header(Stage::Relocations)?;
        let sections = self
            .sections
            .take()
            .ok_or(ParseError::MissingPrerequisite {
                stage: Stage::Relocations,
                requires: Stage::Sections,
            })?;
        Ok(ElfFile {
            data: self.data,
            header,
            segments: self.segments,
            sections,
            symbols: self.symbols,
            relocations: self.relocations,
        })
    }
}

/// A fully parsed and validated image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfFile<'a> {
    data: &'a [u8],
    header: FileHeader,
    segments: Vec<Segment>,
    sections: SectionTable<'a>,
    symbols: SymbolTables<'a>,
    relocations: Relocations,
}

impl<'a> ElfFile<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        Self::parse_with(data, ParseOptions::default())
    }

    pub fn parse_with(data: &'a [u8], options: ParseOptions) -> Result<Self> {
        Parser::new(data, options).finish()
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn is_32_bit(&self) -> bool {
        self.header.is_32_bit()
    }

    pub fn is_64_bit(&self) -> bool {
        self.header.is_64_bit()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn sections(&self) -> &SectionTable<'a> {
        &self.sections
    }

    pub fn section_name(&self, index: usize) -> Option<&'a str> {
        self.sections.name(index)
    }

    pub fn section_by_name(&self, name: &str) -> Option<(usize, &Section)> {
        self.sections.by_name(name)
    }

    /// File bytes of section `index`; empty for `SHT_NOBITS`.
    pub fn section_data(&self, index: usize) -> Option<&'a [u8]> {
        self.sections.get(index).map(|s| s.file_bytes(self.data))
    }

    pub fn static_symbols(&self) -> &SymbolTable<'a> {
        &self.symbols.symtab
    }

    pub fn dynamic_symbols(&self) -> &SymbolTable<'a> {
        &self.symbols.dynsym
    }

    pub fn relocations(&self) -> &Relocations {
        &self.relocations
    }

    /// Drops every derived table. The image itself belongs to the loader.
    pub fn release(self) {
        log::debug!(
            "releasing parse of {} byte image ({} sections)",
            self.data.len(),
            self.sections.len()
        );
    }
}

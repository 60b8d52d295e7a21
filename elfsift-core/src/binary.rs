use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

use crate::parser::{ElfFile, ParseOptions};

/// An object file read into memory.
///
/// Owns the image; every [`ElfFile`] parsed from it borrows these bytes and
/// must be gone before [`Binary::close`].
#[derive(Debug)]
pub struct Binary {
    pub path: String,
    data: Vec<u8>,
}

impl Binary {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut file = std::fs::File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .with_context(|| format!("failed to read {}", path.display()))?;
        log::info!("loaded {} ({} bytes)", path.display(), data.len());

        Ok(Self {
            path: path.display().to_string(),
            data,
        })
    }

    pub fn from_bytes(path: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn parse(&self, options: ParseOptions) -> crate::Result<ElfFile<'_>> {
        ElfFile::parse_with(&self.data, options)
    }

    /// Releases the image.
    pub fn close(self) {
        log::debug!("closing {}", self.path);
    }
}

//! Offset/size arithmetic against the file length.
//!
//! All values come straight from the file, so every addition and
//! multiplication is checked. A range is only returned once its end is known
//! to lie within the image and to fit a host `usize`.

use std::ops::Range;

use crate::error::{ParseError, Region, Result};

fn out_of_bounds(region: Region, offset: u64, size: u64, file_len: usize) -> ParseError {
    ParseError::OutOfBounds {
        region,
        offset,
        size,
        file_len: file_len as u64,
    }
}

/// The byte range `offset..offset + size` if it lies within `file_len`.
pub(crate) fn range(offset: u64, size: u64, file_len: usize) -> Option<Range<usize>> {
    let end = offset.checked_add(size)?;
    if end > file_len as u64 {
        return None;
    }
    // end <= file_len, so both fit in usize.
    Some(usize::try_from(offset).ok()?..usize::try_from(end).ok()?)
}

/// Validates `offset + size <= file_len` and returns the byte range.
pub(crate) fn span(region: Region, offset: u64, size: u64, file_len: usize) -> Result<Range<usize>> {
    range(offset, size, file_len).ok_or_else(|| out_of_bounds(region, offset, size, file_len))
}

/// Validates a table of `count` entries of `entsize` bytes starting at `offset`.
pub(crate) fn table(
    region: Region,
    offset: u64,
    entsize: u16,
    count: u16,
    file_len: usize,
) -> Result<Range<usize>> {
    let size = u64::from(entsize)
        .checked_mul(u64::from(count))
        .ok_or_else(|| out_of_bounds(region, offset, u64::MAX, file_len))?;
    span(region, offset, size, file_len)
}

/// Error for a record that could not be read from an already-validated range.
pub(crate) fn short_read(region: Region, offset: usize, size: usize, file_len: usize) -> ParseError {
    out_of_bounds(region, offset as u64, size as u64, file_len)
}

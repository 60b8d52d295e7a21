use byteorder::{BigEndian, LittleEndian, ReadBytesExt};
use std::io::{self, Cursor};

/// Byte order named by `e_ident[EI_DATA]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

/// Sequential field reader over one on-disk record.
///
/// Callers hand it a slice that was already bounds-checked, so a short read
/// only happens when a record is truncated by its own slice.
pub struct FieldReader<'a> {
    cursor: Cursor<&'a [u8]>,
    endian: Endian,
}

impl<'a> FieldReader<'a> {
    pub fn new(data: &'a [u8], endian: Endian) -> Self {
        Self {
            cursor: Cursor::new(data),
            endian,
        }
    }

    pub fn u8(&mut self) -> io::Result<u8> {
        self.cursor.read_u8()
    }

    pub fn u16(&mut self) -> io::Result<u16> {
        match self.endian {
            Endian::Little => self.cursor.read_u16::<LittleEndian>(),
            Endian::Big => self.cursor.read_u16::<BigEndian>(),
        }
    }

    pub fn u32(&mut self) -> io::Result<u32> {
        match self.endian {
            Endian::Little => self.cursor.read_u32::<LittleEndian>(),
            Endian::Big => self.cursor.read_u32::<BigEndian>(),
        }
    }

    pub fn u64(&mut self) -> io::Result<u64> {
        match self.endian {
            Endian::Little => self.cursor.read_u64::<LittleEndian>(),
            Endian::Big => self.cursor.read_u64::<BigEndian>(),
        }
    }

    pub fn i32(&mut self) -> io::Result<i32> {
        match self.endian {
            Endian::Little => self.cursor.read_i32::<LittleEndian>(),
            Endian::Big => self.cursor.read_i32::<BigEndian>(),
        }
    }

    pub fn i64(&mut self) -> io::Result<i64> {
        match self.endian {
            Endian::Little => self.cursor.read_i64::<LittleEndian>(),
            Endian::Big => self.cursor.read_i64::<BigEndian>(),
        }
    }

    pub fn bytes<const N: usize>(&mut self) -> io::Result<[u8; N]> {
        let mut out = [0u8; N];
        io::Read::read_exact(&mut self.cursor, &mut out)?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_fields_in_sequence() {
        let data = [0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0xff];
        let mut r = FieldReader::new(&data, Endian::Little);
        assert_eq!(r.u16().unwrap(), 0x1234);
        assert_eq!(r.u32().unwrap(), 0x1234_5678);
        assert_eq!(r.u8().unwrap(), 0xff);
    }

    #[test]
    fn reads_big_endian_fields() {
        let data = [0x12, 0x34, 0xff, 0xff, 0xff, 0xfe];
        let mut r = FieldReader::new(&data, Endian::Big);
        assert_eq!(r.u16().unwrap(), 0x1234);
        assert_eq!(r.i32().unwrap(), -2);
    }

    #[test]
    fn short_read_is_an_error() {
        let data = [0u8; 3];
        let mut r = FieldReader::new(&data, Endian::Little);
        assert!(r.u32().is_err());
    }

    #[test]
    fn fixed_byte_arrays() {
        let data = *b"\x7fELF\x02";
        let mut r = FieldReader::new(&data, Endian::Big);
        assert_eq!(&r.bytes::<4>().unwrap(), b"\x7fELF");
        assert_eq!(r.u8().unwrap(), 2);
    }
}

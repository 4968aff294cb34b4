//! Bit-level reading of frame headers.
//!
//! Frame headers of the elementary streams handled here are big-endian bit
//! fields that never straddle more than a handful of bytes, so a thin wrapper
//! over `bitstream_io` is enough.

use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader, UnsignedInteger};

#[derive(Debug)]
pub struct BitstreamIoReader<R: io::Read> {
    bs: BitReader<R, BigEndian>,
    len: u64,
    pos: u64,
}

pub type BsIoSliceReader<'a> = BitstreamIoReader<io::Cursor<&'a [u8]>>;

impl<'a> BsIoSliceReader<'a> {
    pub fn from_slice(bytes: &'a [u8]) -> Self {
        Self::new(io::Cursor::new(bytes), bytes.len() as u64)
    }
}

impl<R: io::Read> BitstreamIoReader<R> {
    pub fn new(read: R, len_bytes: u64) -> Self {
        Self {
            bs: BitReader::new(read),
            len: len_bytes << 3,
            pos: 0,
        }
    }

    #[inline(always)]
    pub fn get(&mut self) -> io::Result<bool> {
        let bit = self.bs.read_bit()?;
        self.pos += 1;
        Ok(bit)
    }

    #[inline(always)]
    pub fn get_n<I: UnsignedInteger>(&mut self, n: u32) -> io::Result<I> {
        if u64::from(n) > self.available() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("get_n({n}): out of bounds bits at {}", self.pos),
            ));
        }
        let value = self.bs.read_unsigned_var(n)?;
        self.pos += u64::from(n);
        Ok(value)
    }

    #[inline(always)]
    pub fn skip(&mut self, n: u32) -> io::Result<()> {
        if u64::from(n) > self.available() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("skip({n}): out of bounds bits at {}", self.pos),
            ));
        }
        self.bs.skip(n)?;
        self.pos += u64::from(n);
        Ok(())
    }

    #[inline(always)]
    pub fn position(&self) -> u64 {
        self.pos
    }

    #[inline(always)]
    pub fn available(&self) -> u64 {
        self.len - self.pos
    }
}

#[test]
fn read_header_fields() -> io::Result<()> {
    let mut reader = BsIoSliceReader::from_slice(&[0xFF, 0xF1, 0x50]);
    assert_eq!(reader.get_n::<u16>(12)?, 0xFFF);
    assert!(!reader.get()?);
    reader.skip(3)?;
    assert_eq!(reader.get_n::<u8>(2)?, 1);
    assert_eq!(reader.available(), 6);
    assert!(reader.get_n::<u8>(7).is_err());
    Ok(())
}

//! Bitstream I/O utilities for header and metadata parsing.
//!
//! Provides big-endian bitstream reading and writing with Exp-Golomb
//! coding as used by HEVC syntax structures.

use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter, SignedInteger, UnsignedInteger};

#[derive(Debug)]
pub struct BitstreamIoReader<R: io::Read + io::Seek> {
    bs: BitReader<R, BigEndian>,
    len: u64,
}

pub type BsIoSliceReader<'a> = BitstreamIoReader<io::Cursor<&'a [u8]>>;

impl<R> BitstreamIoReader<R>
where
    R: io::Read + io::Seek,
{
    pub fn new(read: R, len_bytes: u64) -> Self {
        Self {
            bs: BitReader::new(read),
            len: len_bytes << 3,
        }
    }

    #[inline(always)]
    pub fn get(&mut self) -> io::Result<bool> {
        self.bs.read_bit()
    }

    #[inline(always)]
    pub fn get_n<I: UnsignedInteger>(&mut self, n: u32) -> io::Result<I> {
        // Skip bounds check for small reads - bitstream_io handles EOF internally
        if n <= 32 {
            match self.bs.read_unsigned_var(n) {
                Ok(val) => Ok(val),
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    // Only call position() on error path to avoid overhead
                    Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!(
                            "get_n({}): out of bounds bits at {}",
                            n,
                            self.bs.position_in_bits().unwrap_or(0)
                        ),
                    ))
                }
                Err(e) => Err(e),
            }
        } else {
            // For larger reads, keep bounds check
            self.available().and_then(|avail| {
                if n as u64 > avail {
                    Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        format!(
                            "get_n({}): out of bounds bits at {}",
                            n,
                            self.bs.position_in_bits().unwrap_or(0)
                        ),
                    ))
                } else {
                    self.bs.read_unsigned_var(n)
                }
            })
        }
    }

    /// Reads an unsigned Exp-Golomb coded value.
    #[inline(always)]
    pub fn get_ue(&mut self) -> io::Result<u32> {
        let mut leading = 0u32;
        while !self.get()? {
            leading += 1;
            if leading > 31 {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "get_ue: code exceeds 32 bits",
                ));
            }
        }

        if leading == 0 {
            return Ok(0);
        }

        let rest: u32 = self.get_n(leading)?;
        Ok((1 << leading) - 1 + rest)
    }

    #[inline(always)]
    pub fn available(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits().map(|pos| self.len - pos)
    }

    #[inline(always)]
    pub fn skip_n(&mut self, n: u32) -> io::Result<()> {
        // Skip bounds check for small skips - bitstream_io handles EOF internally
        if n <= 64 {
            self.bs.skip(n)
        } else {
            // For larger skips, keep bounds check
            self.available().and_then(|avail| {
                if n as u64 > avail {
                    Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "skip_n: out of bounds bits",
                    ))
                } else {
                    self.bs.skip(n)
                }
            })
        }
    }

    #[inline(always)]
    pub fn position(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits()
    }
}

impl<'a> BsIoSliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        let len = buf.len() as u64;
        let read = io::Cursor::new(buf);

        Self::new(read, len)
    }
}

impl Default for BsIoSliceReader<'_> {
    fn default() -> Self {
        Self::from_slice(&[])
    }
}

/// Big-endian bit writer over a growable byte buffer.
///
/// Tracks the number of bits written so alignment can be checked without
/// touching the underlying writer.
pub struct BsIoWriter {
    bs: BitWriter<Vec<u8>, BigEndian>,
    bits: u64,
}

impl BsIoWriter {
    pub fn with_capacity(len_bytes: usize) -> Self {
        Self {
            bs: BitWriter::new(Vec::with_capacity(len_bytes)),
            bits: 0,
        }
    }

    #[inline(always)]
    pub fn put(&mut self, bit: bool) -> io::Result<()> {
        self.bits += 1;
        self.bs.write_bit(bit)
    }

    #[inline(always)]
    pub fn put_n<I: UnsignedInteger>(&mut self, n: u32, value: I) -> io::Result<()> {
        self.bits += n as u64;
        self.bs.write_unsigned_var(n, value)
    }

    #[inline(always)]
    pub fn put_s<S: SignedInteger>(&mut self, n: u32, value: S) -> io::Result<()> {
        self.bits += n as u64;
        self.bs.write_signed_var(n, value)
    }

    /// Writes an unsigned Exp-Golomb coded value.
    #[inline(always)]
    pub fn put_ue(&mut self, value: u32) -> io::Result<()> {
        // ue(v) is v+1 in its minimal binary width, preceded by width-1 zeros
        let width = 32 - (value + 1).leading_zeros();
        self.put_n(2 * width - 1, value + 1)
    }

    /// Writes a signed Exp-Golomb coded value.
    #[inline(always)]
    pub fn put_se(&mut self, value: i32) -> io::Result<()> {
        let code = if value > 0 {
            (value as u32) * 2 - 1
        } else {
            value.unsigned_abs() * 2
        };

        self.put_ue(code)
    }

    /// Pads with zero bits up to the next byte boundary.
    #[inline(always)]
    pub fn byte_align(&mut self) -> io::Result<()> {
        let pad = (8 - (self.bits & 7)) & 7;
        if pad > 0 {
            self.put_n(pad as u32, 0u8)?;
        }

        Ok(())
    }

    #[inline(always)]
    pub fn is_aligned(&self) -> bool {
        self.bits & 7 == 0
    }

    #[inline(always)]
    pub fn position(&self) -> u64 {
        self.bits
    }

    /// Consumes the writer and returns the written bytes.
    pub fn into_inner(self) -> io::Result<Vec<u8>> {
        if !self.is_aligned() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "into_inner: writer holds a partial byte",
            ));
        }

        Ok(self.bs.into_writer())
    }
}

impl Default for BsIoWriter {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

#[test]
fn exp_golomb_roundtrip() {
    let mut writer = BsIoWriter::default();
    let values = [0u32, 1, 2, 3, 7, 8, 254, 255, 4095];

    for &value in &values {
        writer.put_ue(value).unwrap();
    }
    writer.byte_align().unwrap();

    let bytes = writer.into_inner().unwrap();
    let mut reader = BsIoSliceReader::from_slice(&bytes);

    for &value in &values {
        assert_eq!(reader.get_ue().unwrap(), value);
    }
}

#[test]
fn writer_rejects_unaligned_take() {
    let mut writer = BsIoWriter::default();
    writer.put_n(3, 0b101u8).unwrap();

    assert!(!writer.is_aligned());
    assert!(writer.into_inner().is_err());
}

#[test]
fn reader_bounds() {
    let mut reader = BsIoSliceReader::from_slice(&[0xAB, 0xCD]);

    assert_eq!(reader.get_n::<u32>(12).unwrap(), 0xABC);
    assert_eq!(reader.available().unwrap(), 4);
    assert!(reader.get_n::<u32>(8).is_err());
}

#[test]
fn byte_align_pads_with_zeros() {
    let mut writer = BsIoWriter::default();
    writer.put_n(4, 0xFu8).unwrap();
    writer.byte_align().unwrap();

    assert_eq!(writer.position(), 8);
    assert_eq!(writer.into_inner().unwrap(), vec![0xF0]);
}

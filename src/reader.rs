use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};

use crate::boxes::FourCC;
use crate::parser::ParseError;

/// Byte-source contract. File-backed sources go through `BufReader<File>`,
/// memory-backed ones through `Cursor`; both read the same way.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// String flavour preference for decoders that accept either encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringType {
    /// NUL-terminated C string.
    #[default]
    NulTerminated,
    /// Length-prefixed Pascal string.
    Pascal,
}

/// Bounded view over a byte source.
///
/// Carries a hard end offset and refuses to read across it, so a typed
/// decoder can never consume bytes belonging to a sibling box. Under-reads
/// are fine; the framer advances past the declared size regardless.
pub struct BodyReader<'a> {
    src: &'a mut dyn ReadSeek,
    end: u64,
}

impl<'a> BodyReader<'a> {
    pub fn new(src: &'a mut dyn ReadSeek, end: u64) -> Self {
        BodyReader { src, end }
    }

    /// View bounded by the current stream length.
    pub fn to_stream_end(src: &'a mut dyn ReadSeek) -> Result<Self, ParseError> {
        let pos = src.stream_position()?;
        let end = src.seek(SeekFrom::End(0))?;
        src.seek(SeekFrom::Start(pos))?;
        Ok(BodyReader { src, end })
    }

    /// Re-bounded child view over the same source. The child bound never
    /// exceeds this reader's own bound.
    pub fn sub(&mut self, end: u64) -> BodyReader<'_> {
        BodyReader {
            src: &mut *self.src,
            end: end.min(self.end),
        }
    }

    pub fn bound(&self) -> u64 {
        self.end
    }

    pub fn tell(&mut self) -> Result<u64, ParseError> {
        Ok(self.src.stream_position()?)
    }

    pub fn seek(&mut self, pos: u64) -> Result<(), ParseError> {
        self.src.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    pub fn remaining(&mut self) -> Result<u64, ParseError> {
        let pos = self.tell()?;
        Ok(self.end.saturating_sub(pos))
    }

    pub fn has_bytes(&mut self) -> Result<bool, ParseError> {
        Ok(self.remaining()? > 0)
    }

    fn check(&mut self, n: u64) -> Result<(), ParseError> {
        if self.remaining()? < n {
            return Err(ParseError::UnexpectedEof);
        }
        Ok(())
    }

    pub fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ParseError> {
        self.check(buf.len() as u64)?;
        self.src.read_exact(buf)?;
        Ok(())
    }

    pub fn skip(&mut self, n: u64) -> Result<(), ParseError> {
        self.check(n)?;
        self.src.seek(SeekFrom::Current(n as i64))?;
        Ok(())
    }

    /// Remaining body bytes up to the bound.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>, ParseError> {
        let n = self.remaining()?;
        let mut buf = vec![0u8; n as usize];
        self.src.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn read_u8(&mut self) -> Result<u8, ParseError> {
        self.check(1)?;
        Ok(self.src.read_u8()?)
    }

    pub fn read_u16(&mut self) -> Result<u16, ParseError> {
        self.check(2)?;
        Ok(self.src.read_u16::<BigEndian>()?)
    }

    pub fn read_u24(&mut self) -> Result<u32, ParseError> {
        self.check(3)?;
        Ok(self.src.read_u24::<BigEndian>()?)
    }

    pub fn read_u32(&mut self) -> Result<u32, ParseError> {
        self.check(4)?;
        Ok(self.src.read_u32::<BigEndian>()?)
    }

    pub fn read_u64(&mut self) -> Result<u64, ParseError> {
        self.check(8)?;
        Ok(self.src.read_u64::<BigEndian>()?)
    }

    pub fn read_i16(&mut self) -> Result<i16, ParseError> {
        self.check(2)?;
        Ok(self.src.read_i16::<BigEndian>()?)
    }

    pub fn read_i32(&mut self) -> Result<i32, ParseError> {
        self.check(4)?;
        Ok(self.src.read_i32::<BigEndian>()?)
    }

    /// Signed 16.16 fixed-point.
    pub fn read_fixed_16_16(&mut self) -> Result<f64, ParseError> {
        Ok(self.read_i32()? as f64 / 65536.0)
    }

    /// Signed 8.8 fixed-point.
    pub fn read_fixed_8_8(&mut self) -> Result<f64, ParseError> {
        Ok(self.read_i16()? as f64 / 256.0)
    }

    pub fn read_fourcc(&mut self) -> Result<FourCC, ParseError> {
        let mut b = [0u8; 4];
        self.read_exact(&mut b)?;
        Ok(FourCC(b))
    }

    /// Full-box preamble: one version byte plus 24 bits of flags.
    pub fn read_version_flags(&mut self) -> Result<(u8, u32), ParseError> {
        let version = self.read_u8()?;
        let flags = self.read_u24()?;
        Ok((version, flags))
    }

    /// Big-endian unsigned integer of `size` bytes (0..=8). Size 0 reads
    /// nothing and yields 0, matching the `iloc` nibble-width encoding.
    pub fn read_sized_uint(&mut self, size: u8) -> Result<u64, ParseError> {
        let mut v = 0u64;
        for _ in 0..size {
            v = (v << 8) | self.read_u8()? as u64;
        }
        Ok(v)
    }

    /// NUL-terminated string, consuming the terminator. Fails with
    /// `UnexpectedEof` when the bound is reached before a NUL.
    pub fn read_cstring(&mut self) -> Result<String, ParseError> {
        let mut bytes = Vec::new();
        loop {
            let b = self.read_u8()?;
            if b == 0 {
                break;
            }
            bytes.push(b);
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Length-prefixed Pascal string; no trailing NUL.
    pub fn read_pstring(&mut self) -> Result<String, ParseError> {
        let len = self.read_u8()? as u64;
        self.check(len)?;
        let mut bytes = vec![0u8; len as usize];
        self.src.read_exact(&mut bytes)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Preference-ordered string read: try the preferred flavour first and
    /// fall back to the other, rewinding in between.
    pub fn read_string(&mut self, preferred: StringType) -> Result<String, ParseError> {
        let mark = self.tell()?;
        let first = match preferred {
            StringType::NulTerminated => self.read_cstring(),
            StringType::Pascal => self.read_pstring(),
        };
        match first {
            Ok(s) => Ok(s),
            Err(_) => {
                self.seek(mark)?;
                match preferred {
                    StringType::NulTerminated => self.read_pstring(),
                    StringType::Pascal => self.read_cstring(),
                }
            }
        }
    }
}

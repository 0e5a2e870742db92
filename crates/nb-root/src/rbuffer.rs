//! Cursor over ROOT's big-endian streamer encoding.

use crate::error::{Result, RootError};

/// `kByteCountMask`: set on the leading word of a byte-counted object.
pub(crate) const BYTE_COUNT_MASK: u32 = 0x4000_0000;

/// `kIsReferenced` bit of `TObject::fBits`.
const IS_REFERENCED: u32 = 0x0000_0010;

/// Version header in front of a streamed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Versioned {
    /// Class version.
    pub version: u16,
    /// Absolute position just past the object, when a byte count was written.
    pub end: Option<usize>,
}

/// Reader over a byte slice with a moving position.
pub struct RBuffer<'a> {
    data: &'a [u8],
    pos: usize,
}

macro_rules! read_be {
    ($name:ident, $ty:ty) => {
        #[doc = concat!("Read a big-endian `", stringify!($ty), "`.")]
        pub fn $name(&mut self) -> Result<$ty> {
            const N: usize = std::mem::size_of::<$ty>();
            let b = self.read_bytes(N)?;
            let mut raw = [0u8; N];
            raw.copy_from_slice(b);
            Ok(<$ty>::from_be_bytes(raw))
        }
    };
}

impl<'a> RBuffer<'a> {
    /// Reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Reader positioned at `pos`.
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    /// Current position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Length of the underlying buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the underlying buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left after the current position.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Jump to an absolute position.
    pub fn set_pos(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(RootError::BufferUnderflow {
                offset: self.pos,
                need: pos - self.pos.min(pos),
                have: self.remaining(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Advance by `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.pos += n;
        Ok(())
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.ensure(n)?;
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    read_be!(read_u8, u8);
    read_be!(read_u16, u16);
    read_be!(read_i16, i16);
    read_be!(read_u32, u32);
    read_be!(read_i32, i32);
    read_be!(read_u64, u64);
    read_be!(read_i64, i64);
    read_be!(read_f64, f64);

    /// Read a `TString`: one length byte, or `255` followed by a u32 length.
    pub fn read_string(&mut self) -> Result<String> {
        let short = self.read_u8()?;
        let len = if short == 255 { self.read_u32()? as usize } else { short as usize };
        let bytes = self.read_bytes(len)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    /// Read a NUL-terminated C string (class names after a new-class tag).
    pub fn read_cstring(&mut self) -> Result<String> {
        let rest = &self.data[self.pos.min(self.data.len())..];
        let Some(nul) = rest.iter().position(|&b| b == 0) else {
            return Err(RootError::Deserialization(format!(
                "unterminated class name at offset {}",
                self.pos
            )));
        };
        let s = String::from_utf8_lossy(&rest[..nul]).into_owned();
        self.pos += nul + 1;
        Ok(s)
    }

    /// Read a streamer version header.
    ///
    /// When the leading u32 carries [`BYTE_COUNT_MASK`], the byte count
    /// (measured from just after that u32) gives the object's end. Otherwise
    /// only a bare u16 version was written.
    pub fn read_version(&mut self) -> Result<Versioned> {
        let start = self.pos;
        let word = self.read_u32()?;
        if word & BYTE_COUNT_MASK != 0 {
            let count = (word & !BYTE_COUNT_MASK) as usize;
            let version = self.read_u16()?;
            Ok(Versioned { version, end: Some(start + 4 + count) })
        } else {
            self.pos = start;
            let version = self.read_u16()?;
            Ok(Versioned { version, end: None })
        }
    }

    /// Move to the end of an object whose header was already read.
    pub fn finish(&mut self, header: Versioned) -> Result<()> {
        match header.end {
            Some(end) => self.set_pos(end),
            None => Ok(()),
        }
    }

    /// Skip a whole byte-counted object (header included).
    pub fn skip_object(&mut self) -> Result<()> {
        let header = self.read_version()?;
        if header.end.is_none() {
            return Err(RootError::Deserialization(format!(
                "cannot skip object without byte count at offset {}",
                self.pos
            )));
        }
        self.finish(header)
    }

    /// Read a `TObject` base: version, fUniqueID, fBits (+ pidf when referenced).
    pub fn read_tobject(&mut self) -> Result<u32> {
        let _version = self.read_u16()?;
        let _unique_id = self.read_u32()?;
        let bits = self.read_u32()?;
        if bits & IS_REFERENCED != 0 {
            self.skip(2)?;
        }
        Ok(bits)
    }

    /// Read a `TNamed` base and return `(name, title)`.
    pub fn read_tnamed(&mut self) -> Result<(String, String)> {
        let header = self.read_version()?;
        self.read_tobject()?;
        let name = self.read_string()?;
        let title = self.read_string()?;
        self.finish(header)?;
        Ok((name, title))
    }

    /// Read a fixed-size basic array preceded by its one-byte "is present" flag
    /// (the layout of `Int_t* fBasketBytes //[fMaxBaskets]` and friends).
    pub fn read_flagged_array<T>(
        &mut self,
        n: usize,
        mut read: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let present = self.read_u8()?;
        if present == 0 {
            return Ok(Vec::new());
        }
        let mut out = Vec::with_capacity(n.min(self.remaining()));
        for _ in 0..n {
            out.push(read(self)?);
        }
        Ok(out)
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if self.pos.checked_add(n).is_none_or(|end| end > self.data.len()) {
            return Err(RootError::BufferUnderflow { offset: self.pos, need: n, have: self.remaining() });
        }
        Ok(())
    }
}

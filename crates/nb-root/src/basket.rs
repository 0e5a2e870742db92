//! `TBasket` reading: one compressed block of consecutive branch entries.

use std::borrow::Cow;

use crate::error::{Result, RootError};
use crate::key::Key;
use crate::rbuffer::RBuffer;

/// A decompressed basket.
#[derive(Debug, Clone)]
pub struct Basket<'f> {
    /// Number of entries in the basket (`fNevBuf`).
    pub n_entries: usize,
    /// Entry data, without the trailing offset table.
    pub data: Cow<'f, [u8]>,
    /// Start of each entry in `data`, plus `data.len()` as the last element.
    /// `None` for fixed-size entries.
    pub entry_offsets: Option<Vec<usize>>,
}

impl Basket<'_> {
    /// Bytes of entry `i` (variable-size baskets only).
    pub fn entry(&self, i: usize) -> Option<&[u8]> {
        let offsets = self.entry_offsets.as_ref()?;
        let (start, end) = (*offsets.get(i)?, *offsets.get(i + 1)?);
        self.data.get(start..end)
    }
}

/// Read the basket whose key starts at `seek`.
pub fn read_basket(file: &[u8], seek: u64) -> Result<Basket<'_>> {
    let pos = usize::try_from(seek)
        .map_err(|_| RootError::Deserialization(format!("basket seek {seek} out of range")))?;
    let mut r = RBuffer::at(file, pos);
    let key = Key::read(&mut r)?;

    let _version = r.read_u16()?;
    let _buffer_size = r.read_i32()?;
    let _nev_buf_size = r.read_i32()?;
    let nev_buf = r.read_i32()?.max(0) as usize;
    let last = r.read_i32()?.max(0) as usize;
    let _flag = r.read_u8()?;

    let key_len = key.key_len as usize;
    let payload = key.payload(file)?;
    let border = last.saturating_sub(key_len).min(payload.len());

    let entry_offsets = if payload.len() > border {
        Some(read_entry_offsets(&payload[border..], nev_buf, key_len, border)?)
    } else {
        None
    };

    let data = match payload {
        Cow::Borrowed(b) => Cow::Borrowed(&b[..border]),
        Cow::Owned(mut v) => {
            v.truncate(border);
            Cow::Owned(v)
        }
    };

    Ok(Basket { n_entries: nev_buf, data, entry_offsets })
}

/// Parse the `fEntryOffset` table written after the entry data.
///
/// Offsets are positions in the key buffer, so `key_len` is subtracted to
/// make them relative to the payload.
fn read_entry_offsets(tail: &[u8], n_entries: usize, key_len: usize, border: usize) -> Result<Vec<usize>> {
    let mut r = RBuffer::new(tail);
    let count = r.read_i32()?.max(0) as usize;
    if count < n_entries {
        return Err(RootError::Deserialization(format!(
            "entry offset table has {count} values for {n_entries} entries"
        )));
    }
    let mut offsets = Vec::with_capacity(n_entries.min(r.remaining() / 4) + 1);
    for _ in 0..n_entries {
        let raw = r.read_i32()?.max(0) as usize;
        let start = raw.checked_sub(key_len).filter(|&s| s <= border).ok_or_else(|| {
            RootError::Deserialization(format!(
                "entry offset {raw} outside basket data (key_len {key_len}, data {border})"
            ))
        })?;
        offsets.push(start);
    }
    offsets.push(border);
    if offsets.windows(2).any(|w| w[0] > w[1]) {
        return Err(RootError::Deserialization("entry offsets are not ascending".into()));
    }
    Ok(offsets)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::key::tests::key_bytes;

    /// Serialize an uncompressed basket whose key sits at file offset `seek`.
    pub(crate) fn basket_bytes(
        seek: u32,
        data: &[u8],
        entry_starts: Option<&[usize]>,
        n_entries: usize,
    ) -> Vec<u8> {
        let key_len = key_bytes(0, 0, 0, "TBasket", "b").len() + 2 + 4 * 4 + 1;
        let mut object = data.to_vec();
        if let Some(starts) = entry_starts {
            object.extend_from_slice(&((starts.len() + 1) as i32).to_be_bytes());
            for s in starts {
                object.extend_from_slice(&((s + key_len) as i32).to_be_bytes());
            }
            object.extend_from_slice(&0i32.to_be_bytes());
        }
        let n_bytes = (key_len + object.len()) as u32;
        let mut out = key_bytes(n_bytes, object.len() as u32, seek, "TBasket", "b");
        // key_bytes computed key_len without the basket header; patch it.
        out[14..16].copy_from_slice(&(key_len as u16).to_be_bytes());
        out.extend_from_slice(&3u16.to_be_bytes());
        out.extend_from_slice(&32000i32.to_be_bytes());
        out.extend_from_slice(&(if entry_starts.is_some() { 1000i32 } else { 4i32 }).to_be_bytes());
        out.extend_from_slice(&(n_entries as i32).to_be_bytes());
        out.extend_from_slice(&((key_len + data.len()) as i32).to_be_bytes());
        out.push(0);
        assert_eq!(out.len(), key_len);
        out.extend_from_slice(&object);
        out
    }

    #[test]
    fn oversized_entry_table_fails_cleanly() {
        let mut tail = i32::MAX.to_be_bytes().to_vec();
        tail.extend_from_slice(&0i32.to_be_bytes());
        let err = read_entry_offsets(&tail, usize::MAX >> 8, 0, 0).unwrap_err();
        assert!(matches!(err, RootError::BufferUnderflow { .. }), "{err}");
    }

    #[test]
    fn fixed_size_basket() {
        let mut data = Vec::new();
        for v in [3i32, 1, 4] {
            data.extend_from_slice(&v.to_be_bytes());
        }
        let file = basket_bytes(0, &data, None, 3);
        let basket = read_basket(&file, 0).unwrap();
        assert_eq!(basket.n_entries, 3);
        assert_eq!(&*basket.data, &data[..]);
        assert!(basket.entry_offsets.is_none());
        assert!(basket.entry(0).is_none());
    }

    #[test]
    fn variable_size_basket_offsets() {
        let data: Vec<u8> = (0u8..20).collect();
        let file = basket_bytes(0, &data, Some(&[0, 8, 8]), 3);
        let basket = read_basket(&file, 0).unwrap();
        assert_eq!(basket.entry_offsets.as_deref(), Some(&[0, 8, 8, 20][..]));
        assert_eq!(basket.entry(0), Some(&data[0..8]));
        assert_eq!(basket.entry(1), Some(&[][..]));
        assert_eq!(basket.entry(2), Some(&data[8..20]));
        assert!(basket.entry(3).is_none());
    }

    #[test]
    fn offsets_outside_data_rejected() {
        let tail_key_len = 10;
        let mut tail = 2i32.to_be_bytes().to_vec();
        tail.extend_from_slice(&5i32.to_be_bytes());
        tail.extend_from_slice(&0i32.to_be_bytes());
        assert!(read_entry_offsets(&tail, 1, tail_key_len, 4).is_err());
    }
}

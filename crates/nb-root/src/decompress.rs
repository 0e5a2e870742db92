//! Decoding of ROOT compression blocks.
//!
//! A compressed object is a sequence of blocks, each with a 9-byte header:
//! ```text
//! bytes 0-1:  algorithm ("ZL" zlib, "L4" lz4, "ZS" zstd, "XZ" lzma)
//! byte  2:    method
//! bytes 3-5:  compressed size   (little-endian u24)
//! bytes 6-8:  uncompressed size (little-endian u24)
//! ```
//! Blocks are at most 16 MiB uncompressed, so large objects span several.

use std::io::Read;

use crate::error::{Result, RootError};

const BLOCK_HEADER_LEN: usize = 9;

/// Bytes of xxhash64 checksum ROOT puts in front of every LZ4 block.
const LZ4_CHECKSUM_LEN: usize = 8;

/// Upper bound on the output preallocated per compressed input byte; the
/// expected length comes from the key header and may be corrupt.
const MAX_PREALLOC_RATIO: usize = 32;

/// Compression algorithm of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// zlib (`ZL`)
    Zlib,
    /// LZ4 with checksum prefix (`L4`)
    Lz4,
    /// Zstandard (`ZS`)
    Zstd,
    /// XZ / LZMA (`XZ`)
    Xz,
}

impl Algorithm {
    fn from_tag(tag: &[u8]) -> Result<Self> {
        match tag {
            b"ZL" => Ok(Self::Zlib),
            b"L4" => Ok(Self::Lz4),
            b"ZS" => Ok(Self::Zstd),
            b"XZ" => Ok(Self::Xz),
            other => Err(RootError::Decompression(format!(
                "unsupported compression algorithm {:?}",
                String::from_utf8_lossy(other)
            ))),
        }
    }
}

/// Decompress a ROOT payload that is known to unpack to `expected_len` bytes.
pub fn decompress(src: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(expected_len.min(src.len().saturating_mul(MAX_PREALLOC_RATIO)));
    let mut offset = 0;

    while out.len() < expected_len {
        let Some(header) = src.get(offset..offset + BLOCK_HEADER_LEN) else {
            return Err(RootError::Decompression(format!(
                "truncated block header at offset {offset} ({} of {expected_len} bytes decoded)",
                out.len()
            )));
        };
        let algorithm = Algorithm::from_tag(&header[0..2])?;
        let c_size = le24(&header[3..6]);
        let u_size = le24(&header[6..9]);
        offset += BLOCK_HEADER_LEN;

        let Some(block) = src.get(offset..offset + c_size) else {
            return Err(RootError::Decompression(format!(
                "block claims {c_size} compressed bytes but only {} remain",
                src.len().saturating_sub(offset)
            )));
        };

        let before = out.len();
        decompress_block(algorithm, block, u_size, &mut out)?;
        let produced = out.len() - before;
        if produced != u_size {
            return Err(RootError::Decompression(format!(
                "{algorithm:?} block produced {produced} bytes, header says {u_size}"
            )));
        }
        offset += c_size;
    }

    if out.len() != expected_len {
        return Err(RootError::Decompression(format!(
            "decompressed {} bytes, expected {expected_len}",
            out.len()
        )));
    }
    Ok(out)
}

fn decompress_block(algorithm: Algorithm, block: &[u8], u_size: usize, out: &mut Vec<u8>) -> Result<()> {
    let err = |e: &dyn std::fmt::Display| RootError::Decompression(format!("{algorithm:?}: {e}"));
    match algorithm {
        Algorithm::Zlib => {
            flate2::read::ZlibDecoder::new(block).read_to_end(out).map_err(|e| err(&e))?;
        }
        Algorithm::Lz4 => {
            let body = block
                .get(LZ4_CHECKSUM_LEN..)
                .ok_or_else(|| err(&"block shorter than checksum header"))?;
            let decoded = lz4_flex::block::decompress(body, u_size).map_err(|e| err(&e))?;
            out.extend_from_slice(&decoded);
        }
        Algorithm::Zstd => {
            let mut decoder =
                ruzstd::decoding::StreamingDecoder::new(block).map_err(|e| err(&e))?;
            decoder.read_to_end(out).map_err(|e| err(&e))?;
        }
        Algorithm::Xz => {
            let mut input = std::io::BufReader::new(block);
            lzma_rs::xz_decompress(&mut input, out).map_err(|e| err(&e))?;
        }
    }
    Ok(())
}

fn le24(b: &[u8]) -> usize {
    b[0] as usize | (b[1] as usize) << 8 | (b[2] as usize) << 16
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn root_block(tag: &[u8; 2], compressed: &[u8], u_len: usize) -> Vec<u8> {
        let mut block = tag.to_vec();
        block.push(0x01);
        let c_len = compressed.len();
        block.extend_from_slice(&(c_len as u32).to_le_bytes()[..3]);
        block.extend_from_slice(&(u_len as u32).to_le_bytes()[..3]);
        block.extend_from_slice(compressed);
        block
    }

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn sample(n: usize) -> Vec<u8> {
        (0..n).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn le24_values() {
        assert_eq!(le24(&[0x10, 0x00, 0x00]), 16);
        assert_eq!(le24(&[0x00, 0x01, 0x00]), 256);
        assert_eq!(le24(&[0xff, 0xff, 0xff]), 0xFF_FFFF);
    }

    #[test]
    fn zlib_single_block() {
        let original = sample(3000);
        let block = root_block(b"ZL", &zlib(&original), original.len());
        assert_eq!(decompress(&block, original.len()).unwrap(), original);
    }

    #[test]
    fn zlib_two_blocks_concatenate() {
        let first = sample(700);
        let second: Vec<u8> = sample(300).into_iter().rev().collect();
        let mut src = root_block(b"ZL", &zlib(&first), first.len());
        src.extend(root_block(b"ZL", &zlib(&second), second.len()));
        let out = decompress(&src, 1000).unwrap();
        assert_eq!(&out[..700], &first[..]);
        assert_eq!(&out[700..], &second[..]);
    }

    #[test]
    fn lz4_skips_checksum() {
        let original = sample(512);
        let mut body = vec![0xEE; LZ4_CHECKSUM_LEN];
        body.extend(lz4_flex::block::compress(&original));
        let block = root_block(b"L4", &body, original.len());
        assert_eq!(decompress(&block, original.len()).unwrap(), original);
    }

    #[test]
    fn zstd_block() {
        let original = sample(2048);
        let compressed = ruzstd::encoding::compress_to_vec(
            &original[..],
            ruzstd::encoding::CompressionLevel::Fastest,
        );
        let block = root_block(b"ZS", &compressed, original.len());
        assert_eq!(decompress(&block, original.len()).unwrap(), original);
    }

    #[test]
    fn xz_block() {
        let original = sample(1024);
        let mut compressed = Vec::new();
        lzma_rs::xz_compress(&mut std::io::BufReader::new(&original[..]), &mut compressed).unwrap();
        let block = root_block(b"XZ", &compressed, original.len());
        assert_eq!(decompress(&block, original.len()).unwrap(), original);
    }

    #[test]
    fn unknown_tag_and_truncation_fail() {
        let block = root_block(b"CS", &[1, 2, 3], 3);
        assert!(matches!(decompress(&block, 3), Err(RootError::Decompression(_))));

        let original = sample(100);
        let mut block = root_block(b"ZL", &zlib(&original), original.len());
        block.truncate(block.len() - 4);
        assert!(decompress(&block, original.len()).is_err());
    }
}

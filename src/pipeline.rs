//! Encode/decode driver: splits a source into blocks, applies the codec
//! chain, computes/verifies checksums, and handles `AUTO`'s per-block
//! codec override.
//!
//! Grounded on `io_stream::{SixCyWriter, SixCyReader}`'s streaming loop
//! shape.

use crate::codec::{decode_chain, encode_chain, CodecId};
use crate::error::{read_error_to_corrupt, Result, SqshError};
use crate::frame::{self, BlockHeader, ChecksumMode, Header};
use crc32fast::Hasher;
use std::io::{Read, Write};

pub const DEFAULT_BLOCK_SIZE: usize = 1 << 20;

fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Pack the uncompressed/compressed CRCs into the on-wire checksum field
/// per the header's checksum mode (0, 4, or 8 bytes).
fn pack_checksum(mode: ChecksumMode, uncomp_crc: Option<u32>, comp_crc: Option<u32>) -> u64 {
    match (mode.uncomp, mode.comp) {
        (false, false) => 0,
        (true, false) => uncomp_crc.expect("uncomp checksum requested") as u64,
        (false, true) => comp_crc.expect("comp checksum requested") as u64,
        (true, true) => {
            let u = uncomp_crc.expect("uncomp checksum requested") as u64;
            let c = comp_crc.expect("comp checksum requested") as u64;
            (u << 32) | c
        }
    }
}

fn unpack_checksum(mode: ChecksumMode, packed: u64) -> (Option<u32>, Option<u32>) {
    match (mode.uncomp, mode.comp) {
        (false, false) => (None, None),
        (true, false) => (Some(packed as u32), None),
        (false, true) => (None, Some(packed as u32)),
        (true, true) => (Some((packed >> 32) as u32), Some(packed as u32)),
    }
}

/// Encode `src` into `sink` using `codec_chain`, reading up to
/// `block_size` bytes per block (clamped to `MAX_BLOCK`).
pub fn encode<R: Read, W: Write>(
    src: &mut R,
    sink: &mut W,
    codec_chain: &[CodecId],
    block_size: usize,
    checksum_mode: ChecksumMode,
) -> Result<()> {
    encode_verbose(src, sink, codec_chain, block_size, checksum_mode, false)
}

/// Same as [`encode`], additionally tracing one line per block to stderr
/// (block index, effective codec chain, uncompressed/compressed sizes)
/// when `verbose` is set.
pub fn encode_verbose<R: Read, W: Write>(
    src: &mut R,
    sink: &mut W,
    codec_chain: &[CodecId],
    block_size: usize,
    checksum_mode: ChecksumMode,
    verbose: bool,
) -> Result<()> {
    if codec_chain.is_empty() {
        return Err(SqshError::Usage("codec chain must not be empty".into()));
    }
    if codec_chain[1..].contains(&CodecId::Auto) {
        return Err(SqshError::Usage(
            "AUTO may only appear as the first codec in a chain".into(),
        ));
    }

    let header = Header {
        checksum_mode,
        codecs: codec_chain.to_vec(),
    };
    header.write(sink)?;

    let effective_block_size = block_size.min(frame::MAX_BLOCK as usize).max(1);
    let mut buf = vec![0u8; effective_block_size];
    let mut block_index = 0u64;

    loop {
        let n = read_fill(src, &mut buf)?;
        if n == 0 {
            frame::write_eos(sink)?;
            return Ok(());
        }
        let raw = &buf[..n];

        let uncomp_crc = checksum_mode.uncomp.then(|| crc32(raw));

        let (codecs_override, encoded) = if codec_chain[0] == CodecId::Auto {
            let auto = crate::codec::auto::AutoCodec;
            let (chain, output) = auto.resolve(raw)?;
            (Some(chain), output)
        } else {
            (None, encode_chain(codec_chain, raw)?)
        };

        let comp_crc = checksum_mode.comp.then(|| crc32(&encoded));
        let packed = pack_checksum(checksum_mode, uncomp_crc, comp_crc);

        if verbose {
            let chain = codecs_override.as_deref().unwrap_or(codec_chain);
            let names: Vec<&str> = chain.iter().map(|c| c.name()).collect();
            eprintln!(
                "block {block_index}: [{}] {} -> {} bytes",
                names.join("-"),
                n,
                encoded.len()
            );
        }

        frame::write_block(
            sink,
            codecs_override.as_deref(),
            n as u64,
            checksum_mode,
            packed,
            &encoded,
        )?;
        block_index += 1;
    }
}

/// Read until `buf` is full or the source is exhausted; returns the number
/// of bytes actually read (may be less than `buf.len()` only at EOF).
fn read_fill<R: Read>(src: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = src.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

/// Decode a SQSH stream from `src` into `sink`.
pub fn decode<R: Read, W: Write>(src: &mut R, sink: &mut W) -> Result<()> {
    decode_verbose(src, sink, false)
}

/// Same as [`decode`], additionally tracing one line per block to stderr
/// (block index, codec chain, on-wire/decoded sizes) when `verbose` is set.
pub fn decode_verbose<R: Read, W: Write>(src: &mut R, sink: &mut W, verbose: bool) -> Result<()> {
    let header = Header::read(src)?;
    let mut reader = frame::FrameReader::new(src, header.checksum_mode);
    let mut block_index = 0u64;

    loop {
        let (codecs, usize_, checksum, csize) = match reader.next_block()? {
            BlockHeader::Eos => return Ok(()),
            BlockHeader::Data {
                codecs,
                usize,
                checksum,
                csize,
            } => (codecs, usize, checksum, csize),
        };

        let mut payload = vec![0u8; csize as usize];
        reader
            .payload_view()
            .read_exact(&mut payload)
            .map_err(|e| read_error_to_corrupt(e, "reading block payload"))?;

        let (uncomp_crc, comp_crc) = unpack_checksum(header.checksum_mode, checksum);

        if let Some(expected) = comp_crc {
            let actual = crc32(&payload);
            if actual != expected {
                return Err(SqshError::Corrupt(format!(
                    "compressed CRC mismatch: expected {expected:#010x}, got {actual:#010x}"
                )));
            }
        }

        let chain = codecs.as_deref().unwrap_or(&header.codecs);
        let (decoded, lossless) = decode_chain(chain, &payload)?;

        if lossless {
            if let Some(expected) = uncomp_crc {
                let actual = crc32(&decoded);
                if actual != expected {
                    return Err(SqshError::Corrupt(format!(
                        "uncompressed CRC mismatch: expected {expected:#010x}, got {actual:#010x}"
                    )));
                }
            }
            if decoded.len() as u64 != usize_ {
                return Err(SqshError::Corrupt(format!(
                    "decoded length {} does not match USize {usize_}",
                    decoded.len()
                )));
            }
        }

        if verbose {
            let chain = codecs.as_deref().unwrap_or(&header.codecs);
            let names: Vec<&str> = chain.iter().map(|c| c.name()).collect();
            eprintln!(
                "block {block_index}: [{}] {} -> {} bytes",
                names.join("-"),
                payload.len(),
                decoded.len()
            );
        }

        sink.write_all(&decoded)?;
        block_index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::CodecId;

    fn round_trip(data: &[u8], chain: &[CodecId], mode: ChecksumMode, block_size: usize) -> Vec<u8> {
        let mut compressed = Vec::new();
        encode(&mut &data[..], &mut compressed, chain, block_size, mode).unwrap();
        let mut decompressed = Vec::new();
        decode(&mut &compressed[..], &mut decompressed).unwrap();
        decompressed
    }

    #[test]
    fn raw_round_trips_hello_world() {
        let data = b"Hello, World!";
        let out = round_trip(data, &[CodecId::Raw], ChecksumMode::NONE, DEFAULT_BLOCK_SIZE);
        assert_eq!(out, data);
    }

    #[test]
    fn rle_round_trips_with_checksums() {
        let data = b"aaaabbbbcccc";
        let mode = ChecksumMode {
            uncomp: true,
            comp: true,
        };
        let out = round_trip(data, &[CodecId::Rle], mode, DEFAULT_BLOCK_SIZE);
        assert_eq!(out, data);
    }

    #[test]
    fn multi_block_round_trips() {
        let data = vec![b'x'; 10];
        let out = round_trip(&data, &[CodecId::Raw], ChecksumMode::NONE, 3);
        assert_eq!(out, data);
    }

    #[test]
    fn auto_as_first_codec_resolves_per_block_override() {
        let data = "hello hello hello hello ".repeat(50);
        let out = round_trip(
            data.as_bytes(),
            &[CodecId::Auto],
            ChecksumMode::NONE,
            DEFAULT_BLOCK_SIZE,
        );
        assert_eq!(out, data.as_bytes());
    }

    #[test]
    fn auto_as_non_first_codec_is_rejected() {
        let mut sink = Vec::new();
        let err = encode(
            &mut &b"data"[..],
            &mut sink,
            &[CodecId::Rle, CodecId::Auto],
            DEFAULT_BLOCK_SIZE,
            ChecksumMode::NONE,
        )
        .unwrap_err();
        assert!(matches!(err, SqshError::Usage(_)));
    }

    #[test]
    fn bit_flip_in_payload_is_detected_by_checksum() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let mode = ChecksumMode {
            uncomp: false,
            comp: true,
        };
        let mut compressed = Vec::new();
        encode(
            &mut &data[..],
            &mut compressed,
            &[CodecId::Raw],
            DEFAULT_BLOCK_SIZE,
            mode,
        )
        .unwrap();
        let flip_pos = compressed.len() - 5;
        compressed[flip_pos] ^= 0x01;
        let mut out = Vec::new();
        let err = decode(&mut &compressed[..], &mut out).unwrap_err();
        assert!(matches!(err, SqshError::Corrupt(_)));
    }
}

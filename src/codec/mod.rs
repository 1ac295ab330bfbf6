//! Codec registry and the shared [`Codec`] interface.
//!
//! Keeps the `codec::{Codec trait, CodecId, get_codec}` dispatch shape,
//! generalised from a thin wrapper over third-party compressors to the
//! hand-rolled bit-granular transforms below. Codec identity is a single
//! byte, not a UUID — this format has no archive/superblock layer
//! requiring long-lived cross-build identity.

pub mod auto;
pub mod bwt;
pub mod huffman;
pub mod lzss;
pub mod mtf;
pub mod raw;
pub mod rle;
pub mod zrle;

use crate::error::{Result, SqshError};

/// Every codec exposes exactly these three operations. `encode`/`decode`
/// are pure functions of their input; no state survives a call. An empty
/// input must encode to an empty output and vice versa.
pub trait Codec {
    fn encode(&self, block: &[u8]) -> Result<Vec<u8>>;
    fn decode(&self, block: &[u8]) -> Result<Vec<u8>>;
    fn is_lossless(&self) -> bool;
}

/// One-byte on-wire codec identity. Stable within a major version;
/// decoders MUST reject unknown IDs as `Unsupported`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CodecId {
    Raw = 0,
    Rle = 1,
    Rle2 = 2,
    Rle3 = 3,
    Rle4 = 4,
    Lrle = 5,
    Lrle2 = 6,
    Lrle3 = 7,
    Lrle4 = 8,
    Zrle = 9,
    Huffman = 10,
    Lzss = 11,
    Auto = 12,
    Mtf = 13,
    Bwt = 14,
}

impl CodecId {
    pub fn from_u8(v: u8) -> Result<Self> {
        Ok(match v {
            0 => CodecId::Raw,
            1 => CodecId::Rle,
            2 => CodecId::Rle2,
            3 => CodecId::Rle3,
            4 => CodecId::Rle4,
            5 => CodecId::Lrle,
            6 => CodecId::Lrle2,
            7 => CodecId::Lrle3,
            8 => CodecId::Lrle4,
            9 => CodecId::Zrle,
            10 => CodecId::Huffman,
            11 => CodecId::Lzss,
            12 => CodecId::Auto,
            13 => CodecId::Mtf,
            14 => CodecId::Bwt,
            other => return Err(SqshError::Unsupported(format!("unknown codec ID {other}"))),
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            CodecId::Raw => "RAW",
            CodecId::Rle => "RLE",
            CodecId::Rle2 => "RLE2",
            CodecId::Rle3 => "RLE3",
            CodecId::Rle4 => "RLE4",
            CodecId::Lrle => "LRLE",
            CodecId::Lrle2 => "LRLE2",
            CodecId::Lrle3 => "LRLE3",
            CodecId::Lrle4 => "LRLE4",
            CodecId::Zrle => "ZRLE",
            CodecId::Huffman => "HUFFMAN",
            CodecId::Lzss => "LZSS",
            CodecId::Auto => "AUTO",
            CodecId::Mtf => "MTF",
            CodecId::Bwt => "BWT",
        }
    }

    pub fn from_name(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "RAW" => Ok(CodecId::Raw),
            "RLE" => Ok(CodecId::Rle),
            "RLE2" => Ok(CodecId::Rle2),
            "RLE3" => Ok(CodecId::Rle3),
            "RLE4" => Ok(CodecId::Rle4),
            "LRLE" => Ok(CodecId::Lrle),
            "LRLE2" => Ok(CodecId::Lrle2),
            "LRLE3" => Ok(CodecId::Lrle3),
            "LRLE4" => Ok(CodecId::Lrle4),
            "ZRLE" => Ok(CodecId::Zrle),
            "HUFFMAN" => Ok(CodecId::Huffman),
            "LZSS" => Ok(CodecId::Lzss),
            "AUTO" => Ok(CodecId::Auto),
            "MTF" => Ok(CodecId::Mtf),
            "BWT" => Ok(CodecId::Bwt),
            other => Err(SqshError::Usage(format!("unknown codec name {other:?}"))),
        }
    }
}

/// Resolve a [`CodecId`] to its implementation.
pub fn get_codec(id: CodecId) -> Box<dyn Codec> {
    match id {
        CodecId::Raw => Box::new(raw::RawCodec),
        CodecId::Rle => Box::new(rle::RleCodec::new(1, true)),
        CodecId::Rle2 => Box::new(rle::RleCodec::new(2, true)),
        CodecId::Rle3 => Box::new(rle::RleCodec::new(3, true)),
        CodecId::Rle4 => Box::new(rle::RleCodec::new(4, true)),
        CodecId::Lrle => Box::new(rle::RleCodec::new(1, false)),
        CodecId::Lrle2 => Box::new(rle::RleCodec::new(2, false)),
        CodecId::Lrle3 => Box::new(rle::RleCodec::new(3, false)),
        CodecId::Lrle4 => Box::new(rle::RleCodec::new(4, false)),
        CodecId::Zrle => Box::new(zrle::ZrleCodec),
        CodecId::Huffman => Box::new(huffman::HuffmanCodec),
        CodecId::Lzss => Box::new(lzss::LzssCodec),
        CodecId::Auto => Box::new(auto::AutoCodec),
        CodecId::Mtf => Box::new(mtf::MtfCodec),
        CodecId::Bwt => Box::new(bwt::BwtCodec),
    }
}

/// Apply a chain of codec IDs left-to-right (encode direction).
pub fn encode_chain(ids: &[CodecId], data: &[u8]) -> Result<Vec<u8>> {
    let mut cur = data.to_vec();
    for &id in ids {
        cur = get_codec(id).encode(&cur)?;
    }
    Ok(cur)
}

/// Apply a chain of codec IDs right-to-left (decode direction). Returns
/// the decoded bytes and whether every codec in the chain was lossless.
pub fn decode_chain(ids: &[CodecId], data: &[u8]) -> Result<(Vec<u8>, bool)> {
    let mut cur = data.to_vec();
    let mut lossless = true;
    for &id in ids.iter().rev() {
        let codec = get_codec(id);
        if !codec.is_lossless() {
            lossless = false;
        }
        cur = codec.decode(&cur)?;
    }
    Ok((cur, lossless))
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const LOSSLESS: &[CodecId] = &[
        CodecId::Raw,
        CodecId::Rle,
        CodecId::Rle2,
        CodecId::Rle3,
        CodecId::Rle4,
        CodecId::Zrle,
        CodecId::Huffman,
        CodecId::Lzss,
        CodecId::Mtf,
        CodecId::Bwt,
    ];

    proptest! {
        #[test]
        fn lossless_codecs_round_trip_arbitrary_bytes(data in prop::collection::vec(any::<u8>(), 0..512)) {
            for &id in LOSSLESS {
                let codec = get_codec(id);
                let encoded = codec.encode(&data).unwrap();
                let decoded = codec.decode(&encoded).unwrap();
                prop_assert_eq!(&decoded, &data, "codec {} failed to round trip", id.name());
            }
        }

        #[test]
        fn encode_chain_and_decode_chain_are_inverses(
            data in prop::collection::vec(any::<u8>(), 0..256),
            a in 0..LOSSLESS.len(),
            b in 0..LOSSLESS.len(),
        ) {
            let chain = [LOSSLESS[a], LOSSLESS[b]];
            let encoded = encode_chain(&chain, &data).unwrap();
            let (decoded, lossless) = decode_chain(&chain, &encoded).unwrap();
            prop_assert!(lossless);
            prop_assert_eq!(decoded, data);
        }
    }
}

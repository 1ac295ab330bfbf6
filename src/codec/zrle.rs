//! Zero-RLE: runs of `0x00` collapse to `[0x00, varint(run_len)]`. Non-zero
//! bytes pass through literally. Perfectly lossless.

use super::Codec;
use crate::error::{Result, SqshError};
use crate::varint::{read_uvarint, write_uvarint};

pub struct ZrleCodec;

impl Codec for ZrleCodec {
    fn encode(&self, block: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut i = 0usize;
        while i < block.len() {
            if block[i] == 0 {
                let start = i;
                while i < block.len() && block[i] == 0 {
                    i += 1;
                }
                out.push(0x00);
                write_uvarint(&mut out, (i - start) as u64);
            } else {
                out.push(block[i]);
                i += 1;
            }
        }
        Ok(out)
    }

    fn decode(&self, block: &[u8]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        let mut i = 0usize;
        while i < block.len() {
            if block[i] == 0 {
                i += 1;
                let (run_len, consumed) = read_uvarint(&block[i..])
                    .map_err(|_| SqshError::Corrupt("ZRLE: truncated run length".into()))?;
                i += consumed;
                out.extend(std::iter::repeat_n(0u8, run_len as usize));
            } else {
                out.push(block[i]);
                i += 1;
            }
        }
        Ok(out)
    }

    fn is_lossless(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_runs_collapse() {
        let codec = ZrleCodec;
        let data = [0u8, 0, 0, 0, 1, 2, 0, 0, 3];
        let encoded = codec.encode(&data).unwrap();
        assert!(encoded.len() < data.len());
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn no_zeros_is_pass_through() {
        let codec = ZrleCodec;
        let data = b"hello world";
        assert_eq!(codec.encode(data).unwrap(), data);
        assert_eq!(codec.decode(data).unwrap(), data);
    }

    #[test]
    fn long_zero_run_uses_multibyte_varint() {
        let codec = ZrleCodec;
        let data = vec![0u8; 1000];
        let encoded = codec.encode(&data).unwrap();
        assert_eq!(encoded[0], 0x00);
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn empty_round_trips() {
        let codec = ZrleCodec;
        assert_eq!(codec.encode(&[]).unwrap(), Vec::<u8>::new());
        assert_eq!(codec.decode(&[]).unwrap(), Vec::<u8>::new());
    }
}

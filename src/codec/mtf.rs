//! Move-to-front over the full byte alphabet. State resets at the start
//! of every block; lossless.

use super::Codec;
use crate::error::Result;

/// `[255, 254, ..., 0]`, a high-to-low insertion order.
fn initial_alphabet() -> Vec<u8> {
    (0u8..=255).rev().collect()
}

pub struct MtfCodec;

impl Codec for MtfCodec {
    fn encode(&self, block: &[u8]) -> Result<Vec<u8>> {
        let mut alphabet = initial_alphabet();
        let mut out = Vec::with_capacity(block.len());
        for &b in block {
            let idx = alphabet.iter().position(|&s| s == b).expect("full byte alphabet");
            out.push(idx as u8);
            let symbol = alphabet.remove(idx);
            alphabet.insert(0, symbol);
        }
        Ok(out)
    }

    fn decode(&self, block: &[u8]) -> Result<Vec<u8>> {
        let mut alphabet = initial_alphabet();
        let mut out = Vec::with_capacity(block.len());
        for &i in block {
            let symbol = alphabet[i as usize];
            out.push(symbol);
            alphabet.remove(i as usize);
            alphabet.insert(0, symbol);
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
    fn round_trips_mixed_input() {
        let codec = MtfCodec;
        let data = b"banana bread and butter";
        let encoded = codec.encode(data).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn repeated_byte_collapses_to_zero_after_first() {
        let codec = MtfCodec;
        let data = [5u8, 5, 5, 5];
        let encoded = codec.encode(&data).unwrap();
        assert_eq!(&encoded[1..], &[0, 0, 0]);
    }

    #[test]
    fn empty_round_trips() {
        let codec = MtfCodec;
        assert_eq!(codec.encode(&[]).unwrap(), Vec::<u8>::new());
        assert_eq!(codec.decode(&[]).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn state_resets_between_calls() {
        let codec = MtfCodec;
        let first = codec.encode(b"zzzz").unwrap();
        let second = codec.encode(b"zzzz").unwrap();
        assert_eq!(first, second);
    }
}

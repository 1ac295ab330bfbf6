//! RAW: the identity transform. Exists so a pipeline can name "no
//! transformation" explicitly and so `AUTO` has a baseline to beat.

use super::Codec;
use crate::error::Result;

pub struct RawCodec;

impl Codec for RawCodec {
    fn encode(&self, block: &[u8]) -> Result<Vec<u8>> {
        Ok(block.to_vec())
    }

    fn decode(&self, block: &[u8]) -> Result<Vec<u8>> {
        Ok(block.to_vec())
    }

    fn is_lossless(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_identity() {
        let data = b"the quick brown fox";
        let codec = RawCodec;
        let encoded = codec.encode(data).unwrap();
        assert_eq!(encoded, data);
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn empty_round_trips_to_empty() {
        let codec = RawCodec;
        assert_eq!(codec.encode(&[]).unwrap(), Vec::<u8>::new());
        assert_eq!(codec.decode(&[]).unwrap(), Vec::<u8>::new());
    }
}

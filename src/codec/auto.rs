//! AUTO meta-codec: picks a concrete codec chain by competitive probing,
//! then records the winning chain as a `BLOCK_CODEC` override rather than
//! a fixed identity of its own.

use super::{get_codec, Codec, CodecId};
use crate::error::{Result, SqshError};

const DEPTH: usize = 3;
const KEEP_ALONGSIDE: usize = 3;
const PROBE_MIN: usize = 16 * 1024;
const PROBE_MAX: usize = 64 * 1024;

const PRIMARY_CANDIDATES: [CodecId; 6] = [
    CodecId::Huffman,
    CodecId::Lzss,
    CodecId::Rle,
    CodecId::Rle2,
    CodecId::Rle3,
    CodecId::Rle4,
];
const EXTENSION_CANDIDATES: [CodecId; 2] = [CodecId::Huffman, CodecId::Lzss];

struct Candidate {
    chain: Vec<CodecId>,
    output: Vec<u8>,
}

fn probe_slice(block: &[u8]) -> (&[u8], bool) {
    if block.len() <= PROBE_MIN {
        return (block, true);
    }
    let probe_len = (block.len() / 8).clamp(PROBE_MIN, PROBE_MAX);
    let start = (block.len() - probe_len) / 2;
    (&block[start..start + probe_len], false)
}

/// Run the competitive-probing procedure over `probe` and return the
/// winning codec chain plus its probe-encoded output (smallest output
/// first).
fn pick_winning_chain(probe: &[u8]) -> Result<(Vec<CodecId>, Vec<u8>)> {
    let mut kept: Vec<Candidate> = Vec::new();
    for &c in &PRIMARY_CANDIDATES {
        let output = get_codec(c).encode(probe)?;
        kept.push(Candidate {
            chain: vec![c],
            output,
        });
    }
    kept.sort_by_key(|c| c.output.len());
    kept.truncate(KEEP_ALONGSIDE);

    for _round in 1..DEPTH {
        let mut next_round: Vec<Candidate> = Vec::new();
        for cand in &kept {
            let last_is_huffman = cand.chain.last() == Some(&CodecId::Huffman);
            if last_is_huffman {
                next_round.push(Candidate {
                    chain: cand.chain.clone(),
                    output: cand.output.clone(),
                });
                continue;
            }
            for &ext in &EXTENSION_CANDIDATES {
                let output = get_codec(ext).encode(&cand.output)?;
                let mut chain = cand.chain.clone();
                chain.push(ext);
                next_round.push(Candidate { chain, output });
            }
        }
        next_round.sort_by_key(|c| c.output.len());
        next_round.truncate(KEEP_ALONGSIDE);
        kept = next_round;
    }

    kept.sort_by_key(|c| c.output.len());
    let winner = kept.into_iter().next().expect("at least one candidate");
    Ok((winner.chain, winner.output))
}

pub struct AutoCodec;

impl AutoCodec {
    /// Resolve the winning chain for `block` without re-encoding the full
    /// block when the probe already covered it. The pipeline driver uses
    /// this to learn the `BLOCK_CODEC` override to record.
    pub fn resolve(&self, block: &[u8]) -> Result<(Vec<CodecId>, Vec<u8>)> {
        if block.is_empty() {
            return Ok((vec![CodecId::Raw], Vec::new()));
        }
        let (probe, is_whole_block) = probe_slice(block);
        let (chain, probe_output) = pick_winning_chain(probe)?;
        let output = if is_whole_block {
            probe_output
        } else {
            super::encode_chain(&chain, block)?
        };
        Ok((chain, output))
    }
}

impl Codec for AutoCodec {
    fn encode(&self, block: &[u8]) -> Result<Vec<u8>> {
        let (_, output) = self.resolve(block)?;
        Ok(output)
    }

    fn decode(&self, _block: &[u8]) -> Result<Vec<u8>> {
        Err(SqshError::Unsupported(
            "AUTO has no standalone decode; the recorded BLOCK_CODEC chain drives decoding".into(),
        ))
    }

    fn is_lossless(&self) -> bool {
        PRIMARY_CANDIDATES
            .iter()
            .chain(EXTENSION_CANDIDATES.iter())
            .all(|&c| get_codec(c).is_lossless())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_a_winning_chain_for_repetitive_data() {
        let auto = AutoCodec;
        let data = "abcabcabcabcabcabcabcabcabcabc".repeat(20);
        let (chain, output) = auto.resolve(data.as_bytes()).unwrap();
        assert!(!chain.is_empty());
        let (decoded, lossless) = super::super::decode_chain(&chain, &output).unwrap();
        assert!(lossless);
        assert_eq!(decoded, data.as_bytes());
    }

    #[test]
    fn empty_block_resolves_to_raw() {
        let auto = AutoCodec;
        let (chain, output) = auto.resolve(&[]).unwrap();
        assert_eq!(chain, vec![CodecId::Raw]);
        assert!(output.is_empty());
    }

    #[test]
    fn is_lossless_reflects_candidate_set() {
        let auto = AutoCodec;
        assert!(auto.is_lossless());
    }

    #[test]
    fn large_block_probes_a_slice_not_the_whole_input() {
        let auto = AutoCodec;
        let data = vec![7u8; PROBE_MAX * 3];
        let (chain, output) = auto.resolve(&data).unwrap();
        let (decoded, _) = super::super::decode_chain(&chain, &output).unwrap();
        assert_eq!(decoded, data);
    }
}

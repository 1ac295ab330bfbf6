//! Burrows-Wheeler Transform via prefix-doubling suffix array. The primary
//! index is appended as a trailing big-endian `u64`.

use super::Codec;
use crate::error::{Result, SqshError};
use byteorder::{BigEndian, ByteOrder};

/// Prefix-doubling sort of the `n` cyclic rotations of `s`: sort by
/// `rank[(i+k) % n]` then `rank[i]`, renumbering ranks each round until
/// either all rotations are distinct or `k >= n` (full cycle compared —
/// remaining ties are genuine duplicate rotations, e.g. a periodic `s`).
/// Comparisons wrap modulo `n` rather than treating the tail as a unique
/// terminator, since BWT without a sentinel byte sorts whole rotations.
fn suffix_array(s: &[u8]) -> Vec<usize> {
    let n = s.len();
    if n == 0 {
        return Vec::new();
    }
    let mut sa: Vec<usize> = (0..n).collect();
    let mut rank: Vec<i64> = s.iter().map(|&b| b as i64).collect();
    let mut tmp = vec![0i64; n];
    let mut k = 1usize;

    let rank_at = |rank: &[i64], i: usize, k: usize, n: usize| -> i64 { rank[(i + k) % n] };

    loop {
        sa.sort_by(|&a, &b| {
            (rank[a], rank_at(&rank, a, k, n)).cmp(&(rank[b], rank_at(&rank, b, k, n)))
        });

        tmp[sa[0]] = 0;
        for i in 1..n {
            let prev = sa[i - 1];
            let cur = sa[i];
            let same = rank[prev] == rank[cur]
                && rank_at(&rank, prev, k, n) == rank_at(&rank, cur, k, n);
            tmp[cur] = tmp[prev] + if same { 0 } else { 1 };
        }
        rank.copy_from_slice(&tmp);

        if rank[sa[n - 1]] as usize == n - 1 || k >= n {
            break;
        }
        k *= 2;
    }

    sa
}

pub struct BwtCodec;

impl Codec for BwtCodec {
    fn encode(&self, block: &[u8]) -> Result<Vec<u8>> {
        let n = block.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        let sa = suffix_array(block);
        let mut out = Vec::with_capacity(n + 8);
        let mut primary = 0usize;
        for (i, &suffix_start) in sa.iter().enumerate() {
            out.push(block[(suffix_start + n - 1) % n]);
            if suffix_start == 0 {
                primary = i;
            }
        }
        let mut trailer = [0u8; 8];
        BigEndian::write_u64(&mut trailer, primary as u64);
        out.extend_from_slice(&trailer);
        Ok(out)
    }

    fn decode(&self, block: &[u8]) -> Result<Vec<u8>> {
        if block.is_empty() {
            return Ok(Vec::new());
        }
        if block.len() < 8 {
            return Err(SqshError::Corrupt("BWT: block shorter than trailer".into()));
        }
        let split = block.len() - 8;
        let s = &block[..split];
        let n = s.len();
        let p = BigEndian::read_u64(&block[split..]) as usize;
        if p >= n {
            return Err(SqshError::Corrupt("BWT: primary index out of range".into()));
        }

        let mut counts = [0u32; 256];
        for &b in s {
            counts[b as usize] += 1;
        }
        let mut c = [0u32; 256];
        let mut total = 0u32;
        for (i, &count) in counts.iter().enumerate() {
            c[i] = total;
            total += count;
        }

        let mut occ = vec![0u32; n];
        let mut running = [0u32; 256];
        for (i, &b) in s.iter().enumerate() {
            occ[i] = running[b as usize];
            running[b as usize] += 1;
        }

        let mut out = vec![0u8; n];
        let mut row = p;
        for i in (0..n).rev() {
            out[i] = s[row];
            row = (c[s[row] as usize] + occ[row]) as usize;
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
    fn round_trips_banana() {
        let codec = BwtCodec;
        let data = b"banana";
        let encoded = codec.encode(data).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn round_trips_repetitive_text() {
        let codec = BwtCodec;
        let data = b"abababababababababab";
        let encoded = codec.encode(data).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn empty_round_trips() {
        let codec = BwtCodec;
        assert_eq!(codec.encode(&[]).unwrap(), Vec::<u8>::new());
        assert_eq!(codec.decode(&[]).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn single_byte_round_trips() {
        let codec = BwtCodec;
        let encoded = codec.encode(b"x").unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded, b"x");
    }
}

//! Byte-grouped, flag-byte framed RLE family: `RLE..RLE4` are lossless
//! (`tol = 0`), `LRLE..LRLE4` accept an adaptive per-byte tolerance and
//! are therefore lossy.

use super::Codec;
use crate::error::{Result, SqshError};

const ALPHA: f64 = 0.15;
const TOL_MIN: f64 = 2.0;
const TOL_MAX: f64 = 6.0;

/// Adaptive tolerance state tracked independently per byte position within
/// a group.
#[derive(Clone, Copy)]
struct ToleranceState {
    anchor: u8,
    sigma: f64,
    seen_near: u8,
}

impl ToleranceState {
    fn new(anchor: u8) -> Self {
        Self {
            anchor,
            sigma: 0.0,
            seen_near: 0,
        }
    }

    fn tol(&self) -> f64 {
        (TOL_MIN + 1.5 * self.sigma).clamp(TOL_MIN, TOL_MAX)
    }

    /// Returns true if `x` matches the anchor within tolerance, updating
    /// the adaptive state as a side effect.
    fn accept(&mut self, x: u8) -> bool {
        let res = (self.anchor as f64 - x as f64).abs();
        let tol = self.tol();
        if res <= tol {
            self.sigma = (1.0 - ALPHA) * self.sigma + ALPHA * res;
            if res <= 1.0 {
                self.seen_near = self.seen_near.saturating_add(1);
                if self.seen_near >= 3 {
                    self.anchor = x;
                }
            }
            true
        } else {
            self.anchor = x;
            self.sigma = 0.0;
            self.seen_near = 0;
            false
        }
    }
}

pub struct RleCodec {
    group: usize,
    lossless: bool,
}

impl RleCodec {
    pub fn new(group: usize, lossless: bool) -> Self {
        assert!((1..=4).contains(&group));
        Self { group, lossless }
    }

    /// Groups equal under this codec's matching rule. Lossless variants
    /// require exact equality; lossy variants use the adaptive tolerance
    /// state, mutating it as a side effect of the comparison.
    fn groups_match(&self, states: &mut [ToleranceState], candidate: &[u8]) -> bool {
        if self.lossless {
            return states
                .iter()
                .zip(candidate)
                .all(|(s, &x)| s.anchor == x);
        }
        let mut all_ok = true;
        for (s, &x) in states.iter_mut().zip(candidate) {
            if !s.accept(x) {
                all_ok = false;
            }
        }
        all_ok
    }
}

impl Codec for RleCodec {
    fn encode(&self, block: &[u8]) -> Result<Vec<u8>> {
        let group = self.group;
        let mut out = Vec::new();
        let mut flag: u8 = 0;
        let mut item_count: u8 = 0;
        let mut items: Vec<u8> = Vec::new();

        let flush_item = |flag: &mut u8, item_count: &mut u8, items: &mut Vec<u8>, out: &mut Vec<u8>| {
            if *item_count == 8 {
                out.push(*flag);
                out.extend_from_slice(items);
                *flag = 0;
                *item_count = 0;
                items.clear();
            }
        };

        let mut i = 0usize;
        let mut run_states: Option<Vec<ToleranceState>> = None;
        let mut run_group: Vec<u8> = Vec::new();
        let mut run_len: u32 = 0;

        let emit_run =
            |flag: &mut u8, item_count: &mut u8, items: &mut Vec<u8>,
             run_group: &Vec<u8>, run_len: u32| {
                if run_len == 0 {
                    return;
                }
                let bit_pos = 7 - *item_count;
                if run_len >= 2 {
                    *flag |= 1 << bit_pos;
                    items.push(run_len as u8);
                    items.extend_from_slice(run_group);
                } else {
                    items.extend_from_slice(run_group);
                }
                *item_count += 1;
            };

        while i < block.len() {
            if i + group > block.len() {
                // Trailing partial group: final literal, byte-for-byte.
                if run_states.take().is_some() {
                    emit_run(&mut flag, &mut item_count, &mut items, &run_group, run_len);
                    flush_item(&mut flag, &mut item_count, &mut items, &mut out);
                    run_len = 0;
                }
                let bit_pos = 7 - item_count;
                flag &= !(1 << bit_pos);
                items.extend_from_slice(&block[i..]);
                item_count += 1;
                flush_item(&mut flag, &mut item_count, &mut items, &mut out);
                break;
            }

            let candidate = &block[i..i + group];
            match run_states.as_mut() {
                None => {
                    run_states = Some(candidate.iter().map(|&b| ToleranceState::new(b)).collect());
                    run_group = candidate.to_vec();
                    run_len = 1;
                }
                Some(states) => {
                    if run_len < 255 && self.groups_match(states, candidate) {
                        run_len += 1;
                    } else {
                        emit_run(&mut flag, &mut item_count, &mut items, &run_group, run_len);
                        flush_item(&mut flag, &mut item_count, &mut items, &mut out);
                        run_states = Some(candidate.iter().map(|&b| ToleranceState::new(b)).collect());
                        run_group = candidate.to_vec();
                        run_len = 1;
                    }
                }
            }
            i += group;
        }

        if run_len > 0 {
            emit_run(&mut flag, &mut item_count, &mut items, &run_group, run_len);
        }
        if item_count > 0 {
            out.push(flag);
            out.extend_from_slice(&items);
        }

        Ok(out)
    }

    fn decode(&self, block: &[u8]) -> Result<Vec<u8>> {
        let group = self.group;
        let mut out = Vec::new();
        let mut pos = 0usize;

        while pos < block.len() {
            let flag = block[pos];
            pos += 1;
            for bit_idx in 0..8u8 {
                if pos >= block.len() {
                    break;
                }
                let bit = (flag >> (7 - bit_idx)) & 1;
                if bit == 1 {
                    if pos >= block.len() {
                        return Err(SqshError::Corrupt("RLE: truncated run length".into()));
                    }
                    let length = block[pos];
                    pos += 1;
                    if pos + group > block.len() {
                        return Err(SqshError::Corrupt("RLE: truncated run group".into()));
                    }
                    let g = &block[pos..pos + group];
                    for _ in 0..length {
                        out.extend_from_slice(g);
                    }
                    pos += group;
                } else {
                    let remaining = block.len() - pos;
                    let take = remaining.min(group);
                    out.extend_from_slice(&block[pos..pos + take]);
                    pos += take;
                }
            }
        }

        Ok(out)
    }

    fn is_lossless(&self) -> bool {
        self.lossless
    }
}

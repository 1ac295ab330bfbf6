//! Canonical Huffman over a 256-symbol alphabet, per block.
//!
//! The decode trie is arena-indexed (`Vec<Node>` with child indices) rather
//! than pointer-linked; this avoids `Rc`/`RefCell` for a structure that is
//! built once and walked read-only.
//!
//! Pad bits precede the meaningful bits in the first emitted byte, the
//! opposite of a bit writer's default trailing flush padding; the encoder
//! front-loads zero pad bits so the natural trailing flush is a no-op.

use super::Codec;
use crate::bitio::{BitReader, BitWriter};
use crate::error::{Result, SqshError};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

#[derive(Clone, Copy)]
enum Node {
    Leaf(u8),
    Branch(usize, usize),
}

struct HeapEntry {
    freq: u64,
    order: u64,
    node: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.freq == other.freq && self.order == other.order
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.freq, self.order).cmp(&(other.freq, other.order))
    }
}

/// Build the Huffman tree arena and return `(arena, root)`, or `None` for
/// an empty input.
fn build_tree(freq: &[u64; 256]) -> Option<(Vec<Node>, usize)> {
    let mut arena = Vec::new();
    let mut heap = BinaryHeap::new();
    let mut order = 0u64;
    for sym in 0..256u16 {
        if freq[sym as usize] > 0 {
            let idx = arena.len();
            arena.push(Node::Leaf(sym as u8));
            heap.push(Reverse(HeapEntry {
                freq: freq[sym as usize],
                order,
                node: idx,
            }));
            order += 1;
        }
    }
    if heap.is_empty() {
        return None;
    }
    if heap.len() == 1 {
        let Reverse(only) = heap.into_iter().next().unwrap();
        return Some((arena, only.node));
    }

    while heap.len() > 1 {
        let Reverse(a) = heap.pop().unwrap();
        let Reverse(b) = heap.pop().unwrap();
        let idx = arena.len();
        arena.push(Node::Branch(a.node, b.node));
        heap.push(Reverse(HeapEntry {
            freq: a.freq + b.freq,
            order,
            node: idx,
        }));
        order += 1;
    }
    let Reverse(root) = heap.pop().unwrap();
    Some((arena, root.node))
}

/// Code length per symbol via DFS; a single-symbol tree yields length 1.
fn code_lengths(arena: &[Node], root: usize, single_symbol: bool) -> [u8; 256] {
    let mut lengths = [0u8; 256];
    if single_symbol {
        if let Node::Leaf(sym) = arena[root] {
            lengths[sym as usize] = 1;
        }
        return lengths;
    }
    let mut stack = vec![(root, 0u8)];
    while let Some((node, depth)) = stack.pop() {
        match arena[node] {
            Node::Leaf(sym) => lengths[sym as usize] = depth,
            Node::Branch(l, r) => {
                stack.push((l, depth + 1));
                stack.push((r, depth + 1));
            }
        }
    }
    lengths
}

/// Canonical codes: ascending `(length, symbol)` order, first code of each
/// length is `(previous code + 1) << (length_increase)`.
fn canonical_codes(lengths: &[u8; 256]) -> Vec<(u8, u64, u8)> {
    let mut symbols: Vec<(u8, u8)> = lengths
        .iter()
        .enumerate()
        .filter(|&(_, &len)| len > 0)
        .map(|(sym, &len)| (sym as u8, len))
        .collect();
    symbols.sort_by_key(|&(sym, len)| (len, sym));

    let mut out = Vec::with_capacity(symbols.len());
    let mut code: u64 = 0;
    let mut prev_len = 0u8;
    for (sym, len) in symbols {
        if prev_len != 0 {
            code = (code + 1) << (len - prev_len);
        }
        out.push((sym, code, len));
        prev_len = len;
    }
    out
}

fn serialize_length_table(codes: &[(u8, u64, u8)]) -> Vec<u8> {
    let mut by_len: Vec<(u8, u8)> = codes.iter().map(|&(sym, _, len)| (len, sym)).collect();
    by_len.sort();
    let mut out = Vec::new();
    for (len, sym) in by_len {
        out.push(len);
        out.push(sym);
    }
    out.push(0);
    out.push(0);
    out
}

fn deserialize_length_table(buf: &[u8]) -> Result<([u8; 256], usize)> {
    let mut lengths = [0u8; 256];
    let mut i = 0usize;
    loop {
        if i + 2 > buf.len() {
            return Err(SqshError::Corrupt("Huffman: truncated length table".into()));
        }
        let len = buf[i];
        let sym = buf[i + 1];
        i += 2;
        if len == 0 && sym == 0 {
            break;
        }
        lengths[sym as usize] = len;
    }
    Ok((lengths, i))
}

/// Rebuild a binary decode trie (arena, root) from canonical codes.
fn build_decode_trie(codes: &[(u8, u64, u8)]) -> (Vec<Node>, usize) {
    let mut arena = vec![Node::Branch(usize::MAX, usize::MAX)];
    let root = 0usize;
    for &(sym, code, len) in codes {
        let mut cur = root;
        for bit_pos in (0..len).rev() {
            let bit = (code >> bit_pos) & 1;
            let (l, r) = match arena[cur] {
                Node::Branch(l, r) => (l, r),
                Node::Leaf(_) => unreachable!("prefix-free code collided with a leaf"),
            };
            let next = if bit == 0 { l } else { r };
            let next = if next == usize::MAX {
                let idx = arena.len();
                arena.push(Node::Branch(usize::MAX, usize::MAX));
                if bit == 0 {
                    arena[cur] = Node::Branch(idx, r);
                } else {
                    arena[cur] = Node::Branch(l, idx);
                }
                idx
            } else {
                next
            };
            cur = next;
        }
        arena[cur] = Node::Leaf(sym);
    }
    (arena, root)
}

pub struct HuffmanCodec;

impl Codec for HuffmanCodec {
    fn encode(&self, block: &[u8]) -> Result<Vec<u8>> {
        if block.is_empty() {
            return Ok(Vec::new());
        }
        let mut freq = [0u64; 256];
        for &b in block {
            freq[b as usize] += 1;
        }
        let (arena, root) = build_tree(&freq).expect("non-empty block has at least one symbol");
        let single_symbol = matches!(arena[root], Node::Leaf(_));
        let lengths = code_lengths(&arena, root, single_symbol);
        let codes = canonical_codes(&lengths);
        let length_table = serialize_length_table(&codes);

        let mut code_map: [(u64, u8); 256] = [(0, 0); 256];
        for &(sym, code, len) in &codes {
            code_map[sym as usize] = (code, len);
        }

        let total_bits: u64 = block
            .iter()
            .map(|&b| code_map[b as usize].1 as u64)
            .sum();
        let pad_bits = ((8 - (total_bits % 8)) % 8) as u8;

        let mut payload = Vec::new();
        {
            let mut writer = BitWriter::new(&mut payload);
            if pad_bits > 0 {
                writer
                    .write_bits(0, pad_bits)
                    .map_err(|_| SqshError::Internal("Huffman: bit writer overflow".into()))?;
            }
            for &b in block {
                let (code, len) = code_map[b as usize];
                writer
                    .write_bits(code, len)
                    .map_err(|_| SqshError::Internal("Huffman: bit writer overflow".into()))?;
            }
            writer
                .flush()
                .map_err(|_| SqshError::Internal("Huffman: bit writer flush failed".into()))?;
        }

        let mut out = Vec::with_capacity(1 + length_table.len() + payload.len());
        out.push(pad_bits);
        out.extend_from_slice(&length_table);
        out.extend_from_slice(&payload);
        Ok(out)
    }

    fn decode(&self, block: &[u8]) -> Result<Vec<u8>> {
        if block.is_empty() {
            return Ok(Vec::new());
        }
        let pad_bits = block[0];
        let (lengths, table_len) = deserialize_length_table(&block[1..])?;
        let codes = canonical_codes(&lengths);
        let total_symbols: u32 = lengths.iter().filter(|&&l| l > 0).count() as u32;
        if total_symbols == 0 {
            return Err(SqshError::Corrupt("Huffman: empty length table".into()));
        }
        let (arena, root) = build_decode_trie(&codes);

        let payload = &block[1 + table_len..];
        let mut reader = BitReader::new(payload);

        // Pad bits precede the meaningful bits in the first emitted byte;
        // skip them before trie traversal starts so codes are read from
        // exactly the bit positions the encoder wrote them at.
        if pad_bits > 0 {
            reader
                .read_bits(pad_bits)
                .map_err(|e| crate::error::read_error_to_corrupt(e, "Huffman pad bits"))?;
        }

        let total_payload_bits = (payload.len() as u64) * 8;
        let mut bits_consumed = pad_bits as u64;

        let mut out = Vec::new();
        let mut cur = root;
        while bits_consumed < total_payload_bits {
            let bit = reader
                .read_bits(1)
                .map_err(|e| crate::error::read_error_to_corrupt(e, "Huffman payload bit"))?;
            bits_consumed += 1;

            cur = match arena[cur] {
                Node::Branch(l, r) => {
                    if bit == 0 {
                        l
                    } else {
                        r
                    }
                }
                Node::Leaf(_) => unreachable!(),
            };
            if let Node::Leaf(sym) = arena[cur] {
                out.push(sym);
                cur = root;
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
    fn round_trips_fibonacci_run_sequence() {
        let codec = HuffmanCodec;
        // Frequencies shaped like a Fibonacci sequence so the tree has
        // multiple depths, exercising canonicalisation.
        let mut data = Vec::new();
        let counts = [1usize, 1, 2, 3, 5, 8, 13, 21];
        for (sym, &count) in counts.iter().enumerate() {
            data.extend(std::iter::repeat_n(sym as u8, count));
        }
        let encoded = codec.encode(&data).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn single_symbol_gets_length_one() {
        let codec = HuffmanCodec;
        let data = vec![42u8; 10];
        let encoded = codec.encode(&data).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn empty_round_trips() {
        let codec = HuffmanCodec;
        assert_eq!(codec.encode(&[]).unwrap(), Vec::<u8>::new());
        assert_eq!(codec.decode(&[]).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn all_256_symbols_round_trip() {
        let codec = HuffmanCodec;
        let data: Vec<u8> = (0u8..=255).chain(0u8..=255).chain(0u8..10).collect();
        let encoded = codec.encode(&data).unwrap();
        let decoded = codec.decode(&encoded).unwrap();
        assert_eq!(decoded, data);
    }
}

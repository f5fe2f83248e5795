//! Static per-file Huffman entropy coder (HUF1 format).
//!
//! The compressed file is fully self-describing:
//!
//! ```text
//! magic "HUF1" | orig_size:u32 LE | symbol_count:u16 LE
//! symbol_count x (symbol:u8, frequency:u32 LE)     ascending symbol order
//! MSB-first Huffman bitstream, final byte zero-padded
//! ```
//!
//! The decoder rebuilds the tree from the frequency pairs with the same
//! deterministic merge order the encoder used, so both sides always agree
//! on the code assignment without shipping the codes themselves.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs;
use std::path::Path;

use crunch_core::bitio::{BitReader, BitWriter};
use crunch_core::codec::{Algorithm, Codec};
use crunch_core::error::{Error, HuffmanError};
use crunch_core::outcome::Stats;
use crunch_core::path;

pub const HUFFMAN_MAGIC: &[u8; 4] = b"HUF1";

/// Bytes before the symbol table: magic + orig_size + symbol_count.
const FIXED_HEADER_LEN: usize = 4 + 4 + 2;

/// Bytes per symbol table entry: symbol + frequency.
const TABLE_ENTRY_LEN: usize = 1 + 4;

/// Static (per-file) Huffman entropy coder.
pub struct HuffmanCodec;

impl Codec for HuffmanCodec {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Huffman
    }

    fn name(&self) -> &'static str {
        "huffman"
    }

    fn compress_file(&self, input: &Path) -> Result<Stats, Error> {
        let data = fs::read(input).map_err(HuffmanError::InputUnreadable)?;
        let orig_size = u32::try_from(data.len())
            .map_err(|_| HuffmanError::InputTooLarge { len: data.len() as u64 })?;
        let out_path = path::compressed_output(Algorithm::Huffman, input);

        let mut out = Vec::new();
        out.extend_from_slice(HUFFMAN_MAGIC);
        out.extend_from_slice(&orig_size.to_le_bytes());

        if data.is_empty() {
            // Degenerate but valid: header only, zero symbols, no bitstream.
            out.extend_from_slice(&0u16.to_le_bytes());
            fs::write(&out_path, &out).map_err(HuffmanError::OutputUnwritable)?;
            return Ok(Stats::new(0, out.len() as u64));
        }

        let freqs = count_frequencies(&data);
        let Some(tree) = Tree::build(&freqs) else {
            // Unreachable with non-empty data; kept as a graceful failure.
            return Err(HuffmanError::BadHeader.into());
        };
        let codes = tree.derive_codes();

        let symbol_count = freqs.iter().filter(|&&f| f > 0).count() as u16;
        out.extend_from_slice(&symbol_count.to_le_bytes());
        for (symbol, &freq) in freqs.iter().enumerate() {
            if freq > 0 {
                out.push(symbol as u8);
                out.extend_from_slice(&(freq as u32).to_le_bytes());
            }
        }

        let mut bits = BitWriter::new();
        for &byte in &data {
            let code = codes[byte as usize];
            bits.push_bits(code.bits, code.len);
        }
        out.extend_from_slice(&bits.finish());

        fs::write(&out_path, &out).map_err(HuffmanError::OutputUnwritable)?;
        Ok(Stats::new(data.len() as u64, out.len() as u64))
    }

    fn decompress_file(&self, input: &Path) -> Result<Stats, Error> {
        let data = fs::read(input).map_err(HuffmanError::InputUnreadable)?;
        let (orig_size, freqs, body) = parse_header(&data)?;
        let out_path = path::decompressed_output(Algorithm::Huffman, input);

        if orig_size == 0 {
            fs::write(&out_path, []).map_err(HuffmanError::OutputUnwritable)?;
            return Ok(Stats::new(data.len() as u64, 0));
        }

        // A non-empty original with an empty frequency table cannot decode.
        let Some(tree) = Tree::build(&freqs) else {
            return Err(HuffmanError::BadHeader.into());
        };

        let mut bits = BitReader::new(&data[body..]);
        // The declared size is untrusted; reserve a bounded amount and let
        // the vector grow if the stream really does produce that much.
        let mut out = Vec::with_capacity((orig_size as usize).min(1 << 20));
        while out.len() < orig_size as usize {
            // Walk from the root to a leaf, one bit per branch. A root that
            // is already a leaf (single-symbol file) consumes no bits.
            let mut node = tree.root;
            loop {
                match tree.nodes[node] {
                    Node::Leaf { symbol } => {
                        out.push(symbol);
                        break;
                    }
                    Node::Internal { left, right } => {
                        let Some(bit) = bits.next_bit() else {
                            return Err(HuffmanError::TruncatedStream {
                                remaining: orig_size - out.len() as u32,
                            }
                            .into());
                        };
                        node = if bit { right } else { left };
                    }
                }
            }
        }

        fs::write(&out_path, &out).map_err(HuffmanError::OutputUnwritable)?;
        Ok(Stats::new(data.len() as u64, out.len() as u64))
    }
}

// ── Frequency table and header ─────────────────────────────────────────────

fn count_frequencies(data: &[u8]) -> [u64; 256] {
    let mut freqs = [0u64; 256];
    for &byte in data {
        freqs[byte as usize] += 1;
    }
    freqs
}

fn read_u16_le(data: &[u8], at: usize) -> Option<u16> {
    Some(u16::from_le_bytes([*data.get(at)?, *data.get(at + 1)?]))
}

fn read_u32_le(data: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_le_bytes([
        *data.get(at)?,
        *data.get(at + 1)?,
        *data.get(at + 2)?,
        *data.get(at + 3)?,
    ]))
}

/// Parse the HUF1 header. Returns the declared original size, the
/// reconstructed frequency table, and the offset of the bitstream.
fn parse_header(data: &[u8]) -> Result<(u32, [u64; 256], usize), HuffmanError> {
    if data.len() < FIXED_HEADER_LEN || &data[..4] != HUFFMAN_MAGIC {
        return Err(HuffmanError::BadHeader);
    }
    let orig_size = read_u32_le(data, 4).ok_or(HuffmanError::BadHeader)?;
    let symbol_count = read_u16_le(data, 8).ok_or(HuffmanError::BadHeader)?;

    let mut freqs = [0u64; 256];
    let mut at = FIXED_HEADER_LEN;
    for _ in 0..symbol_count {
        let symbol = *data.get(at).ok_or(HuffmanError::BadHeader)?;
        let freq = read_u32_le(data, at + 1).ok_or(HuffmanError::BadHeader)?;
        freqs[symbol as usize] = freq as u64;
        at += TABLE_ENTRY_LEN;
    }
    Ok((orig_size, freqs, at))
}

// ── Tree arena ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf { symbol: u8 },
    Internal { left: usize, right: usize },
}

/// Huffman tree stored in an arena of tagged nodes. Handles are indices
/// into `nodes`; dropping the tree frees everything at once.
struct Tree {
    nodes: Vec<Node>,
    root: usize,
}

impl Tree {
    /// Build the tree by repeatedly merging the two lowest-weight roots.
    ///
    /// Ties on weight are broken by insertion sequence: leaves enter the
    /// heap in ascending symbol order and merged nodes in creation order.
    /// The rule is arbitrary but deterministic, so the decoder rebuilds
    /// the exact tree the encoder used. `None` for an all-zero table.
    fn build(freqs: &[u64; 256]) -> Option<Tree> {
        let mut nodes = Vec::new();
        let mut heap: BinaryHeap<Reverse<(u64, u32, usize)>> = BinaryHeap::new();
        let mut seq = 0u32;

        for (symbol, &freq) in freqs.iter().enumerate() {
            if freq > 0 {
                heap.push(Reverse((freq, seq, nodes.len())));
                nodes.push(Node::Leaf {
                    symbol: symbol as u8,
                });
                seq += 1;
            }
        }

        while let Some(Reverse((weight_a, _, a))) = heap.pop() {
            let Some(Reverse((weight_b, _, b))) = heap.pop() else {
                // Last root standing; also the single-symbol case.
                return Some(Tree { nodes, root: a });
            };
            heap.push(Reverse((weight_a + weight_b, seq, nodes.len())));
            nodes.push(Node::Internal { left: a, right: b });
            seq += 1;
        }
        None
    }

    /// Depth-first code derivation: left appends 0, right appends 1.
    /// The lone leaf of a single-symbol tree gets the 1-bit code 0.
    fn derive_codes(&self) -> [Code; 256] {
        let mut table = [Code::default(); 256];
        if let Node::Leaf { symbol } = self.nodes[self.root] {
            table[symbol as usize] = Code { bits: 0, len: 1 };
            return table;
        }
        let mut stack = vec![(self.root, 0u64, 0u8)];
        while let Some((node, bits, len)) = stack.pop() {
            match self.nodes[node] {
                Node::Leaf { symbol } => table[symbol as usize] = Code { bits, len },
                Node::Internal { left, right } => {
                    debug_assert!(len < 64, "code length bounded by u32 frequencies");
                    stack.push((left, bits << 1, len + 1));
                    stack.push((right, (bits << 1) | 1, len + 1));
                }
            }
        }
        table
    }
}

/// One symbol's code: the lowest `len` bits of `bits`, MSB emitted first.
#[derive(Debug, Clone, Copy, Default)]
struct Code {
    bits: u64,
    len: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_symbol_gets_a_one_bit_code() {
        let mut freqs = [0u64; 256];
        freqs[b'x' as usize] = 42;
        let tree = Tree::build(&freqs).unwrap();
        let codes = tree.derive_codes();
        assert_eq!(codes[b'x' as usize].len, 1);
        assert_eq!(codes[b'x' as usize].bits, 0);
    }

    #[test]
    fn equal_weights_merge_deterministically() {
        let mut freqs = [0u64; 256];
        for symbol in b'a'..=b'h' {
            freqs[symbol as usize] = 10;
        }
        let first = Tree::build(&freqs).unwrap().derive_codes();
        let second = Tree::build(&freqs).unwrap().derive_codes();
        for symbol in b'a'..=b'h' {
            assert_eq!(first[symbol as usize].bits, second[symbol as usize].bits);
            assert_eq!(first[symbol as usize].len, second[symbol as usize].len);
            // 8 equal weights give a perfectly balanced 3-level tree.
            assert_eq!(first[symbol as usize].len, 3);
        }
    }

    #[test]
    fn codes_are_prefix_free() {
        let mut freqs = [0u64; 256];
        freqs[b'a' as usize] = 45;
        freqs[b'b' as usize] = 13;
        freqs[b'c' as usize] = 12;
        freqs[b'd' as usize] = 16;
        freqs[b'e' as usize] = 9;
        freqs[b'f' as usize] = 5;
        let codes = Tree::build(&freqs).unwrap().derive_codes();

        let assigned: Vec<(u64, u8)> = [b'a', b'b', b'c', b'd', b'e', b'f']
            .iter()
            .map(|&s| (codes[s as usize].bits, codes[s as usize].len))
            .collect();
        for (i, &(bits_a, len_a)) in assigned.iter().enumerate() {
            for (j, &(bits_b, len_b)) in assigned.iter().enumerate() {
                if i == j {
                    continue;
                }
                let (short, long) = if len_a <= len_b {
                    ((bits_a, len_a), (bits_b, len_b))
                } else {
                    ((bits_b, len_b), (bits_a, len_a))
                };
                assert_ne!(
                    short.0,
                    long.0 >> (long.1 - short.1),
                    "one code is a prefix of another"
                );
            }
        }
    }

    #[test]
    fn header_parse_rejects_short_input() {
        assert!(matches!(
            parse_header(b"HUF1\x00\x00"),
            Err(HuffmanError::BadHeader)
        ));
        assert!(matches!(
            parse_header(b"NOPE\x00\x00\x00\x00\x00\x00"),
            Err(HuffmanError::BadHeader)
        ));
    }
}

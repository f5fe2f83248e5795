//! Sliding-window LZSS dictionary coder.
//!
//! The token stream has no file header. Tokens come in groups of up to
//! eight under one flag byte; bit i set means token i is a match. A match
//! is 3 bytes (offset lo, offset hi, length), a literal is the byte
//! itself. Offsets count back from the end of the output produced so far.
//!
//! The parse is greedy and single-pass with no lazy matching. That is a
//! deliberate simplicity/ratio tradeoff, and the wire output is stable
//! byte for byte, so it must not be "improved" into an optimal parser.

use std::fs;
use std::path::Path;

use crunch_core::codec::{Algorithm, Codec};
use crunch_core::error::{Error, LzssError};
use crunch_core::outcome::Stats;
use crunch_core::path;

/// Sliding-window LZSS coder.
///
/// The defaults are the wire-format parameters (4096-byte window, matches
/// of 3..=18 bytes). Decompression is parameter-free; a decoder accepts
/// any stream regardless of the window the encoder used.
pub struct LzssCodec {
    /// Dictionary size: how far back a match may reach.
    pub window_size: usize,
    /// Longest match the encoder will emit. Must fit the length byte.
    pub max_match: usize,
    /// Shortest match worth a 3-byte token; anything shorter is a literal.
    pub min_match: usize,
}

impl Default for LzssCodec {
    fn default() -> Self {
        Self {
            window_size: 4096,
            max_match: 18,
            min_match: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Match {
    offset: usize,
    length: usize,
}

impl LzssCodec {
    /// Longest match for `input[pos..]` in the preceding window.
    ///
    /// Scans from the oldest window position forward and keeps the first
    /// match of each improving length, so ties go to the earliest offset.
    /// Greedy first-improvement, not globally optimal.
    fn find_best_match(&self, input: &[u8], pos: usize) -> Match {
        let mut best = Match::default();
        if pos == 0 {
            return best;
        }

        let window_start = pos.saturating_sub(self.window_size);
        let max_len = self.max_match.min(input.len() - pos);

        for candidate in window_start..pos {
            let mut len = 0;
            while len < max_len && input[candidate + len] == input[pos + len] {
                len += 1;
            }
            if len > best.length {
                best = Match {
                    offset: pos - candidate,
                    length: len,
                };
                if len == max_len {
                    break;
                }
            }
        }

        if best.length < self.min_match {
            return Match::default();
        }
        best
    }

    fn compress_buffer(&self, input: &[u8]) -> Vec<u8> {
        debug_assert!(self.max_match <= u8::MAX as usize);
        debug_assert!(self.window_size <= u16::MAX as usize);

        let mut out = Vec::new();
        let n = input.len();
        let mut pos = 0;

        while pos < n {
            // Reserve the flag byte, fill it in once the group is known.
            let flag_index = out.len();
            out.push(0);
            let mut flags = 0u8;

            let mut bit = 0;
            while bit < 8 && pos < n {
                let best = self.find_best_match(input, pos);
                if best.length > 0 {
                    flags |= 1 << bit;
                    let offset = best.offset as u16;
                    out.push((offset & 0xFF) as u8);
                    out.push((offset >> 8) as u8);
                    out.push(best.length as u8);
                    pos += best.length;
                } else {
                    out.push(input[pos]);
                    pos += 1;
                }
                bit += 1;
            }

            out[flag_index] = flags;
        }

        out
    }

    fn decompress_buffer(input: &[u8]) -> Result<Vec<u8>, LzssError> {
        let mut out = Vec::new();
        let n = input.len();
        let mut pos = 0;

        while pos < n {
            let flags = input[pos];
            pos += 1;

            // Flag bits with no bytes left describe nothing; a trailing
            // lone flag byte is tolerated, a cut-off match record is not.
            let mut bit = 0;
            while bit < 8 && pos < n {
                if (flags >> bit) & 1 == 1 {
                    if pos + 3 > n {
                        return Err(LzssError::TruncatedToken { at: pos });
                    }
                    let offset = u16::from_le_bytes([input[pos], input[pos + 1]]);
                    let length = input[pos + 2];
                    pos += 3;

                    if offset == 0 || length == 0 || offset as usize > out.len() {
                        return Err(LzssError::BadReference {
                            at: pos - 3,
                            offset,
                            length,
                            produced: out.len(),
                        });
                    }

                    // Byte at a time: when offset < length the match reads
                    // bytes it has just produced (run continuation).
                    let start = out.len() - offset as usize;
                    for k in 0..length as usize {
                        let byte = out[start + k];
                        out.push(byte);
                    }
                } else {
                    out.push(input[pos]);
                    pos += 1;
                }
                bit += 1;
            }
        }

        Ok(out)
    }
}

impl Codec for LzssCodec {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Lzss
    }

    fn name(&self) -> &'static str {
        "lzss"
    }

    fn compress_file(&self, input: &Path) -> Result<Stats, Error> {
        let data = fs::read(input).map_err(LzssError::InputUnreadable)?;
        let compressed = self.compress_buffer(&data);

        let out_path = path::compressed_output(Algorithm::Lzss, input);
        fs::write(&out_path, &compressed).map_err(LzssError::OutputUnwritable)?;
        Ok(Stats::new(data.len() as u64, compressed.len() as u64))
    }

    fn decompress_file(&self, input: &Path) -> Result<Stats, Error> {
        let data = fs::read(input).map_err(LzssError::InputUnreadable)?;
        let restored = Self::decompress_buffer(&data)?;

        let out_path = path::decompressed_output(Algorithm::Lzss, input);
        fs::write(&out_path, &restored).map_err(LzssError::OutputUnwritable)?;
        Ok(Stats::new(data.len() as u64, restored.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(input: &[u8]) -> Vec<u8> {
        let codec = LzssCodec::default();
        LzssCodec::decompress_buffer(&codec.compress_buffer(input)).unwrap()
    }

    #[test]
    fn empty_input_produces_empty_stream() {
        let codec = LzssCodec::default();
        assert!(codec.compress_buffer(b"").is_empty());
        assert_eq!(round_trip(b""), b"");
    }

    #[test]
    fn run_compresses_to_overlapping_match() {
        let codec = LzssCodec::default();
        let compressed = codec.compress_buffer(b"aaaaaaaaaa");
        // flag byte, literal 'a', then one match: offset 1, length 9.
        assert_eq!(compressed, vec![0b0000_0010, b'a', 1, 0, 9]);
        assert_eq!(
            LzssCodec::decompress_buffer(&compressed).unwrap(),
            b"aaaaaaaaaa"
        );
    }

    #[test]
    fn repeated_sequence_becomes_a_match() {
        let codec = LzssCodec::default();
        let compressed = codec.compress_buffer(b"abcabc");
        assert_eq!(compressed, vec![0b0000_1000, b'a', b'b', b'c', 3, 0, 3]);
    }

    #[test]
    fn ties_resolve_to_the_earliest_offset() {
        let codec = LzssCodec::default();
        // At pos 8 the window holds "abc" at offsets 8 and 4; the scan
        // from the oldest candidate keeps offset 8 and stops early once
        // the match hits max length.
        let compressed = codec.compress_buffer(b"abcXabcZabc");
        assert_eq!(
            compressed,
            vec![
                0b0101_0000,
                b'a', b'b', b'c', b'X',
                4, 0, 3, // "abc" at pos 4, offset 4
                b'Z',
                8, 0, 3, // "abc" at pos 8, earliest offset wins
            ]
        );
    }

    #[test]
    fn short_matches_stay_literal() {
        let codec = LzssCodec::default();
        // "abab": the repeat is only 2 long, below min_match.
        let compressed = codec.compress_buffer(b"abab");
        assert_eq!(compressed, vec![0, b'a', b'b', b'a', b'b']);
    }

    #[test]
    fn trailing_flag_byte_is_tolerated() {
        assert_eq!(LzssCodec::decompress_buffer(&[0x00]).unwrap(), b"");
    }
}

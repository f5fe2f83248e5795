//! Algorithm-to-codec dispatch behind the uniform [`Outcome`] contract.
//!
//! This is the boundary the command adapter calls through: every function
//! here returns an `Outcome` and never panics. The `*_by_id` variants take
//! the raw algorithm id off the wire and reject anything outside the
//! closed set before a codec (or the filesystem) is touched.

use std::path::Path;

use crunch_core::{Algorithm, Codec, Error, Outcome};

use crate::{DctCodec, HuffmanCodec, LzssCodec};

/// Resolve the codec for a validated algorithm selector.
pub fn codec_for(algo: Algorithm) -> Box<dyn Codec> {
    match algo {
        Algorithm::Huffman => Box::new(HuffmanCodec),
        Algorithm::Lzss => Box::new(LzssCodec::default()),
        Algorithm::Dct => Box::new(DctCodec),
    }
}

/// Compress the file at `input` with the selected algorithm.
pub fn compress_file(algo: Algorithm, input: &Path) -> Outcome {
    codec_for(algo).compress_file(input).into()
}

/// Decompress the file at `input` with the selected algorithm.
pub fn decompress_file(algo: Algorithm, input: &Path) -> Outcome {
    codec_for(algo).decompress_file(input).into()
}

/// Recursive folder compression is part of the command surface but has no
/// implementation; it fails with the fixed not-implemented code without
/// touching the filesystem.
pub fn compress_folder(_algo: Algorithm, _folder: &Path) -> Outcome {
    Outcome::failure(&Error::NotImplemented("folder compression"))
}

// ── Raw-id entry points for the command adapter ────────────────────────────

pub fn compress_file_by_id(id: u8, input: &Path) -> Outcome {
    match Algorithm::from_id(id) {
        Some(algo) => compress_file(algo, input),
        None => Outcome::failure(&Error::UnknownAlgorithm(id)),
    }
}

pub fn decompress_file_by_id(id: u8, input: &Path) -> Outcome {
    match Algorithm::from_id(id) {
        Some(algo) => decompress_file(algo, input),
        None => Outcome::failure(&Error::UnknownAlgorithm(id)),
    }
}

pub fn compress_folder_by_id(id: u8, folder: &Path) -> Outcome {
    match Algorithm::from_id(id) {
        Some(algo) => compress_folder(algo, folder),
        None => Outcome::failure(&Error::UnknownAlgorithm(id)),
    }
}

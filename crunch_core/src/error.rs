//! Error types for the compression library.
//!
//! Each codec family has its own error enum because the numeric codes the
//! command adapter relies on are historical and differ between families
//! (the image codec reports an unwritable output as -3 where the text
//! codecs use -2). Every variant maps to exactly one stable code via
//! [`Error::code`]; the dispatch layer folds that code into the uniform
//! [`crate::Outcome`] so nothing crosses the adapter boundary as a panic
//! or an unstructured error.

use std::io;

use thiserror::Error;

/// Error code for an algorithm id outside the closed set.
pub const CODE_UNKNOWN_ALGORITHM: i32 = -99;

/// Error code for operations that are deliberately unimplemented: folder
/// compression, and decompression of JPEG-delegated preview artifacts.
pub const CODE_NOT_IMPLEMENTED: i32 = -100;

/// Top-level error type for all codec operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("huffman codec: {0}")]
    Huffman(#[from] HuffmanError),

    #[error("lzss codec: {0}")]
    Lzss(#[from] LzssError),

    #[error("image codec: {0}")]
    Image(#[from] ImageError),

    /// Algorithm id received from the adapter is outside the closed set.
    #[error("unknown algorithm id {0}")]
    UnknownAlgorithm(u8),

    /// The operation exists in the command surface but has no
    /// implementation, and callers must be told so.
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}

impl Error {
    /// Stable negative code reported through the `Outcome` contract.
    pub fn code(&self) -> i32 {
        match self {
            Error::Huffman(e) => e.code(),
            Error::Lzss(e) => e.code(),
            Error::Image(e) => e.code(),
            Error::UnknownAlgorithm(_) => CODE_UNKNOWN_ALGORITHM,
            Error::NotImplemented(_) => CODE_NOT_IMPLEMENTED,
        }
    }
}

/// Huffman codec failures.
#[derive(Debug, Error)]
pub enum HuffmanError {
    /// Input file missing or unreadable.
    #[error("cannot read input: {0}")]
    InputUnreadable(#[source] io::Error),

    /// Input exceeds the 4 GiB the header's u32 size field can describe.
    #[error("input of {len} bytes exceeds the format's u32 size field")]
    InputTooLarge { len: u64 },

    /// Output file could not be created or written.
    #[error("cannot write output: {0}")]
    OutputUnwritable(#[source] io::Error),

    /// Missing magic, short header, or a header that contradicts itself
    /// (e.g. a non-empty file with an empty frequency table).
    #[error("missing or malformed HUF1 header")]
    BadHeader,

    /// Bitstream ended before `orig_size` bytes were reconstructed.
    #[error("bitstream exhausted with {remaining} bytes still to decode")]
    TruncatedStream { remaining: u32 },
}

impl HuffmanError {
    pub fn code(&self) -> i32 {
        match self {
            HuffmanError::InputUnreadable(_) | HuffmanError::InputTooLarge { .. } => -1,
            HuffmanError::OutputUnwritable(_) => -2,
            HuffmanError::BadHeader | HuffmanError::TruncatedStream { .. } => -3,
        }
    }
}

/// LZSS codec failures.
#[derive(Debug, Error)]
pub enum LzssError {
    /// Input file missing or unreadable.
    #[error("cannot read input: {0}")]
    InputUnreadable(#[source] io::Error),

    /// Output file could not be created or written.
    #[error("cannot write output: {0}")]
    OutputUnwritable(#[source] io::Error),

    /// A match token was cut off before its offset/length bytes.
    #[error("match token truncated at input byte {at}")]
    TruncatedToken { at: usize },

    /// A match token referenced data that does not exist: zero offset,
    /// zero length, or an offset pointing before the start of the output
    /// produced so far.
    #[error(
        "invalid back-reference at input byte {at}: offset {offset}, length {length}, \
         only {produced} bytes produced"
    )]
    BadReference {
        at: usize,
        offset: u16,
        length: u8,
        produced: usize,
    },
}

impl LzssError {
    pub fn code(&self) -> i32 {
        match self {
            LzssError::InputUnreadable(_) => -1,
            LzssError::OutputUnwritable(_) => -2,
            LzssError::TruncatedToken { .. } | LzssError::BadReference { .. } => -3,
        }
    }
}

/// Image codec failures. Codes follow the image codec's own historical
/// numbering, which is not aligned with the text codecs.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Input file missing or unreadable.
    #[error("cannot read input: {0}")]
    InputUnreadable(#[source] io::Error),

    /// Input file exists but holds zero bytes.
    #[error("input file is empty")]
    EmptyInput,

    /// Input announced itself as PPM P6 but the header or pixel data is
    /// malformed.
    #[error("malformed PPM image: {0}")]
    MalformedPpm(&'static str),

    /// Output file could not be created or written.
    #[error("cannot write output: {0}")]
    OutputUnwritable(#[source] io::Error),

    /// Missing DCT1 magic, short header, or zero width/height.
    #[error("missing or malformed DCT1 header")]
    BadHeader,

    /// The DCT1 header declares a channel count the decoder does not
    /// support (only 1 = grayscale).
    #[error("unsupported channel count {0}, only grayscale is supported")]
    UnsupportedChannels(u8),

    /// Coefficient payload ends mid-block.
    #[error("coefficient data ends mid-block")]
    TruncatedCoefficients,

    /// The external decoder could not make sense of the input image.
    #[error("image decode failed: {0}")]
    Decode(String),

    /// The external JPEG encoder failed while writing the preview.
    #[error("jpeg encode failed: {0}")]
    Encode(String),

    /// The input is a JPEG produced by the delegating preview path; there
    /// is no decoder for it here.
    #[error("input is a delegated JPEG artifact; no decoder is implemented for it")]
    JpegArtifact,
}

impl ImageError {
    pub fn code(&self) -> i32 {
        match self {
            ImageError::InputUnreadable(_) | ImageError::EmptyInput => -1,
            ImageError::MalformedPpm(_) => -2,
            ImageError::OutputUnwritable(_) => -3,
            ImageError::BadHeader => -4,
            ImageError::UnsupportedChannels(_) => -5,
            ImageError::TruncatedCoefficients => -6,
            ImageError::Decode(_) | ImageError::Encode(_) => -7,
            ImageError::JpegArtifact => CODE_NOT_IMPLEMENTED,
        }
    }
}

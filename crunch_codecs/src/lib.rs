mod dct;
mod huffman;
mod lzss;

pub mod dispatch;

pub use dct::{DctCodec, DCT_MAGIC, JPEG_PREVIEW_QUALITY};
pub use dispatch::codec_for;
pub use huffman::{HuffmanCodec, HUFFMAN_MAGIC};
pub use lzss::LzssCodec;

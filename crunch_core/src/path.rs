//! Output-path derivation for every codec operation.
//!
//! Each operation derives its output path from the input path alone, by
//! total functions with fixed fallback rules. Nothing here touches the
//! filesystem, and existing files at the derived path are overwritten by
//! the codecs without warning.
//!
//! Compression appends the algorithm suffix (`x.txt` -> `x.txt.huff`).
//! Decompression reverses it:
//! - Huffman: strip `.huff`; if the remaining file name has a trailing
//!   extension, insert `_DC` before it (`x_DC.txt`), otherwise append
//!   `_DC`. Inputs without the `.huff` suffix fall back to `<input>_DC`.
//! - LZSS: strip `.lzss`; inputs without the suffix fall back to
//!   `<input>.orig`.
//! - DCT: the decoder always writes a grayscale PGM at `<input>.pgm`.
//!
//! The JPEG preview is one-way and writes `<input>.jpg`.

use std::path::{Path, PathBuf};

use crate::codec::Algorithm;

/// Suffix appended to compressed artifacts for each algorithm.
pub fn compressed_suffix(algo: Algorithm) -> &'static str {
    match algo {
        Algorithm::Huffman => ".huff",
        Algorithm::Lzss => ".lzss",
        Algorithm::Dct => ".dct",
    }
}

/// Marker inserted into Huffman decompression outputs so they do not
/// overwrite the original file.
pub const DECOMPRESSED_MARKER: &str = "_DC";

/// Fallback suffix when an LZSS input lacks the expected `.lzss` suffix.
pub const LZSS_FALLBACK_SUFFIX: &str = ".orig";

/// Path the compressor writes for `input`.
pub fn compressed_output(algo: Algorithm, input: &Path) -> PathBuf {
    append(input, compressed_suffix(algo))
}

/// Path the decompressor writes for `input`.
pub fn decompressed_output(algo: Algorithm, input: &Path) -> PathBuf {
    let text = input.to_string_lossy();
    match algo {
        Algorithm::Huffman => PathBuf::from(huffman_decompressed(&text)),
        Algorithm::Lzss => match text.strip_suffix(compressed_suffix(Algorithm::Lzss)) {
            Some(stripped) => PathBuf::from(stripped),
            None => append(input, LZSS_FALLBACK_SUFFIX),
        },
        Algorithm::Dct => append(input, ".pgm"),
    }
}

/// Path the one-way JPEG preview writes for `input`.
pub fn preview_output(input: &Path) -> PathBuf {
    append(input, ".jpg")
}

fn append(path: &Path, suffix: &str) -> PathBuf {
    let mut text = path.as_os_str().to_os_string();
    text.push(suffix);
    PathBuf::from(text)
}

fn huffman_decompressed(input: &str) -> String {
    let stripped = match input.strip_suffix(compressed_suffix(Algorithm::Huffman)) {
        Some(s) => s,
        // No .huff suffix at all: distinct fallback on the unmodified input.
        None => return format!("{input}{DECOMPRESSED_MARKER}"),
    };

    // Look for a trailing extension in the final component only; a leading
    // dot (hidden file) does not count as an extension.
    let name_start = stripped
        .rfind(std::path::MAIN_SEPARATOR)
        .map(|i| i + 1)
        .unwrap_or(0);
    match stripped[name_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let dot = name_start + dot;
            format!(
                "{}{}{}",
                &stripped[..dot],
                DECOMPRESSED_MARKER,
                &stripped[dot..]
            )
        }
        _ => format!("{stripped}{DECOMPRESSED_MARKER}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn huff_out(input: &str) -> String {
        decompressed_output(Algorithm::Huffman, Path::new(input))
            .to_string_lossy()
            .into_owned()
    }

    #[test]
    fn compression_appends_the_algorithm_suffix() {
        assert_eq!(
            compressed_output(Algorithm::Huffman, Path::new("/data/dickens.txt")),
            PathBuf::from("/data/dickens.txt.huff")
        );
        assert_eq!(
            compressed_output(Algorithm::Lzss, Path::new("a.bin")),
            PathBuf::from("a.bin.lzss")
        );
        assert_eq!(
            compressed_output(Algorithm::Dct, Path::new("img.ppm")),
            PathBuf::from("img.ppm.dct")
        );
    }

    #[test]
    fn huffman_marker_goes_before_the_original_extension() {
        assert_eq!(huff_out("/data/dickens.txt.huff"), "/data/dickens_DC.txt");
    }

    #[test]
    fn huffman_marker_is_appended_when_no_extension_remains() {
        assert_eq!(huff_out("/data/dickens.huff"), "/data/dickens_DC");
    }

    #[test]
    fn huffman_falls_back_when_the_suffix_is_missing() {
        assert_eq!(huff_out("/data/dickens.txt"), "/data/dickens.txt_DC");
    }

    #[test]
    fn huffman_ignores_dots_in_directory_names() {
        assert_eq!(huff_out("/da.ta/dickens.huff"), "/da.ta/dickens_DC");
    }

    #[test]
    fn huffman_treats_hidden_files_as_extensionless() {
        assert_eq!(huff_out("/home/.bashrc.huff"), "/home/.bashrc_DC");
    }

    #[test]
    fn lzss_strips_the_suffix() {
        assert_eq!(
            decompressed_output(Algorithm::Lzss, Path::new("a.bin.lzss")),
            PathBuf::from("a.bin")
        );
    }

    #[test]
    fn lzss_falls_back_to_orig() {
        assert_eq!(
            decompressed_output(Algorithm::Lzss, Path::new("a.bin")),
            PathBuf::from("a.bin.orig")
        );
    }

    #[test]
    fn dct_always_writes_a_pgm_next_to_the_input() {
        assert_eq!(
            decompressed_output(Algorithm::Dct, Path::new("img.ppm.dct")),
            PathBuf::from("img.ppm.dct.pgm")
        );
    }

    #[test]
    fn preview_writes_a_jpg_next_to_the_input() {
        assert_eq!(preview_output(Path::new("img.ppm")), PathBuf::from("img.ppm.jpg"));
    }
}

//! 8x8 block-transform image coder (DCT1 format).
//!
//! Compression decodes the source image to RGB (native fast path for
//! binary PPM, everything else through the `image` crate), converts to
//! Rec.601 luma, zero-pads to multiples of 8, and runs a forward 2-D DCT
//! plus quantization per 8x8 block:
//!
//! ```text
//! magic "DCT1" | width:u16 LE | height:u16 LE | channels:u8 = 1
//! per block, raster order: 64 x coeff:i16 LE
//! ```
//!
//! The decoder reverses exactly that and writes a binary PGM. It only
//! understands DCT1; the JPEG files produced by
//! [`DctCodec::compress_jpeg_preview`] are a one-way output with no
//! decoder here, and feeding one back is reported as such rather than
//! misparsed.

use std::fs;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crunch_core::codec::{Algorithm, Codec};
use crunch_core::error::{Error, ImageError};
use crunch_core::outcome::Stats;
use crunch_core::path;

pub const DCT_MAGIC: &[u8; 4] = b"DCT1";

/// Quality passed to the external JPEG encoder for preview output.
pub const JPEG_PREVIEW_QUALITY: u8 = 85;

const BLOCK: usize = 8;

/// magic + width + height + channels.
const HEADER_LEN: usize = 4 + 2 + 2 + 1;

/// Serialized size of one quantized block: 64 coefficients, 2 bytes each.
const BLOCK_BYTES: usize = BLOCK * BLOCK * 2;

/// JPEG-style luminance quantization matrix, shared by quantize and
/// dequantize.
const LUMA_QUANT: [i32; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61, //
    12, 12, 14, 19, 26, 58, 60, 55, //
    14, 13, 16, 24, 40, 57, 69, 56, //
    14, 17, 22, 29, 51, 87, 80, 62, //
    18, 22, 37, 56, 68, 109, 103, 77, //
    24, 35, 55, 64, 81, 104, 113, 92, //
    49, 64, 78, 87, 103, 121, 120, 101, //
    72, 92, 95, 98, 112, 100, 103, 99, //
];

/// Block-transform image coder.
pub struct DctCodec;

impl Codec for DctCodec {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Dct
    }

    fn name(&self) -> &'static str {
        "dct"
    }

    fn compress_file(&self, input: &Path) -> Result<Stats, Error> {
        let data = fs::read(input).map_err(ImageError::InputUnreadable)?;
        if data.is_empty() {
            return Err(ImageError::EmptyInput.into());
        }

        let (width, height, rgb) = decode_rgb(&data)?;
        let luma = rgb_to_luma(&rgb);
        let (padded_w, padded_h, padded) = pad_to_blocks(&luma, width, height);

        let blocks_x = padded_w / BLOCK;
        let blocks_y = padded_h / BLOCK;

        let mut out = Vec::with_capacity(HEADER_LEN + blocks_x * blocks_y * BLOCK_BYTES);
        out.extend_from_slice(DCT_MAGIC);
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.push(1); // channels: grayscale

        for block_y in 0..blocks_y {
            for block_x in 0..blocks_x {
                let spatial = extract_block(&padded, padded_w, block_x, block_y);
                let quantized = quantize(&forward_dct(&spatial));
                for coeff in quantized {
                    out.extend_from_slice(&coeff.to_le_bytes());
                }
            }
        }

        let out_path = path::compressed_output(Algorithm::Dct, input);
        fs::write(&out_path, &out).map_err(ImageError::OutputUnwritable)?;
        Ok(Stats::new(data.len() as u64, out.len() as u64))
    }

    fn decompress_file(&self, input: &Path) -> Result<Stats, Error> {
        let data = fs::read(input).map_err(ImageError::InputUnreadable)?;
        if data.is_empty() {
            return Err(ImageError::EmptyInput.into());
        }
        // JPEG SOI marker: this is preview output, which has no decoder.
        if data.starts_with(&[0xFF, 0xD8]) {
            return Err(ImageError::JpegArtifact.into());
        }
        if data.len() < HEADER_LEN || &data[..4] != DCT_MAGIC {
            return Err(ImageError::BadHeader.into());
        }

        let width = u16::from_le_bytes([data[4], data[5]]);
        let height = u16::from_le_bytes([data[6], data[7]]);
        let channels = data[8];
        if width == 0 || height == 0 {
            return Err(ImageError::BadHeader.into());
        }
        if channels != 1 {
            return Err(ImageError::UnsupportedChannels(channels).into());
        }

        // Padded dimensions recomputed exactly as the encoder did.
        let w = width as usize;
        let h = height as usize;
        let padded_w = w.div_ceil(BLOCK) * BLOCK;
        let padded_h = h.div_ceil(BLOCK) * BLOCK;

        let mut padded = vec![0.0f32; padded_w * padded_h];
        let mut at = HEADER_LEN;
        for block_y in 0..padded_h / BLOCK {
            for block_x in 0..padded_w / BLOCK {
                let Some(raw) = data.get(at..at + BLOCK_BYTES) else {
                    return Err(ImageError::TruncatedCoefficients.into());
                };
                at += BLOCK_BYTES;

                let mut quantized = [0i16; BLOCK * BLOCK];
                for (i, pair) in raw.chunks_exact(2).enumerate() {
                    quantized[i] = i16::from_le_bytes([pair[0], pair[1]]);
                }
                let spatial = inverse_dct(&dequantize(&quantized));
                place_block(&mut padded, padded_w, block_x, block_y, &spatial);
            }
        }

        // Crop the padding away and clamp samples back to 8 bits.
        let mut pixels = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                pixels.push(padded[y * padded_w + x].round().clamp(0.0, 255.0) as u8);
            }
        }

        let mut out = format!("P5\n{width} {height}\n255\n").into_bytes();
        out.extend_from_slice(&pixels);

        let out_path = path::decompressed_output(Algorithm::Dct, input);
        fs::write(&out_path, &out).map_err(ImageError::OutputUnwritable)?;
        Ok(Stats::new(data.len() as u64, out.len() as u64))
    }
}

impl DctCodec {
    /// One-way preview: re-encode the source pixels through the external
    /// JPEG encoder at a fixed quality instead of the DCT1 format.
    ///
    /// There is no matching decoder; [`Codec::decompress_file`] refuses
    /// the resulting files. The DCT1 pair above remains the round-trip
    /// contract.
    pub fn compress_jpeg_preview(&self, input: &Path) -> Result<Stats, Error> {
        let data = fs::read(input).map_err(ImageError::InputUnreadable)?;
        if data.is_empty() {
            return Err(ImageError::EmptyInput.into());
        }

        let (width, height, rgb) = decode_rgb(&data)?;

        let mut jpeg = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, JPEG_PREVIEW_QUALITY);
        encoder
            .encode(&rgb, width as u32, height as u32, ExtendedColorType::Rgb8)
            .map_err(|e| ImageError::Encode(e.to_string()))?;

        let out_path = path::preview_output(input);
        fs::write(&out_path, &jpeg).map_err(ImageError::OutputUnwritable)?;
        Ok(Stats::new(data.len() as u64, jpeg.len() as u64))
    }
}

// ── Image loading ──────────────────────────────────────────────────────────

/// Decode the input bytes to interleaved RGB.
///
/// Files announcing themselves as binary PPM go through the native loader;
/// everything else is handed to the external decoder. Either way the
/// dimensions must fit the format's u16 fields.
fn decode_rgb(data: &[u8]) -> Result<(u16, u16, Vec<u8>), ImageError> {
    if data.starts_with(b"P6") {
        return parse_ppm_p6(data);
    }

    let decoded = image::load_from_memory(data).map_err(|e| ImageError::Decode(e.to_string()))?;
    let rgb = decoded.to_rgb8();
    let (w, h) = rgb.dimensions();
    let width =
        u16::try_from(w).map_err(|_| ImageError::Decode("width exceeds 65535".to_string()))?;
    let height =
        u16::try_from(h).map_err(|_| ImageError::Decode("height exceeds 65535".to_string()))?;
    Ok((width, height, rgb.into_raw()))
}

/// Minimal binary PPM loader: `P6`, whitespace-separated width, height,
/// maxval (<= 255), one whitespace byte, then width*height*3 samples.
/// Comment lines are not supported.
fn parse_ppm_p6(data: &[u8]) -> Result<(u16, u16, Vec<u8>), ImageError> {
    let mut at = 2; // past "P6"
    let width = read_ppm_number(data, &mut at).ok_or(ImageError::MalformedPpm("bad width"))?;
    let height = read_ppm_number(data, &mut at).ok_or(ImageError::MalformedPpm("bad height"))?;
    let maxval = read_ppm_number(data, &mut at).ok_or(ImageError::MalformedPpm("bad maxval"))?;

    if width == 0 || height == 0 || maxval == 0 || maxval > 255 {
        return Err(ImageError::MalformedPpm("header values out of range"));
    }
    if width > u16::MAX as u64 || height > u16::MAX as u64 {
        return Err(ImageError::MalformedPpm("dimensions exceed 65535"));
    }

    // Exactly one whitespace byte separates the header from the samples.
    match data.get(at) {
        Some(b) if b.is_ascii_whitespace() => at += 1,
        _ => return Err(ImageError::MalformedPpm("missing header terminator")),
    }

    let expected = width as usize * height as usize * 3;
    let pixels = data
        .get(at..at + expected)
        .ok_or(ImageError::MalformedPpm("truncated pixel data"))?;
    Ok((width as u16, height as u16, pixels.to_vec()))
}

/// Skip whitespace, then parse an unsigned decimal number at `*at`.
fn read_ppm_number(data: &[u8], at: &mut usize) -> Option<u64> {
    while data.get(*at)?.is_ascii_whitespace() {
        *at += 1;
    }
    let start = *at;
    while data.get(*at).is_some_and(u8::is_ascii_digit) {
        *at += 1;
    }
    if *at == start {
        return None;
    }
    let mut value: u64 = 0;
    for &digit in &data[start..*at] {
        value = value.saturating_mul(10).saturating_add((digit - b'0') as u64);
    }
    Some(value)
}

// ── Luma and block layout ──────────────────────────────────────────────────

/// Rec.601 luma from interleaved RGB.
fn rgb_to_luma(rgb: &[u8]) -> Vec<f32> {
    rgb.chunks_exact(3)
        .map(|p| 0.299 * p[0] as f32 + 0.587 * p[1] as f32 + 0.114 * p[2] as f32)
        .collect()
}

/// Zero-pad to the next multiple of 8 in both dimensions.
fn pad_to_blocks(luma: &[f32], width: u16, height: u16) -> (usize, usize, Vec<f32>) {
    let w = width as usize;
    let h = height as usize;
    let padded_w = w.div_ceil(BLOCK) * BLOCK;
    let padded_h = h.div_ceil(BLOCK) * BLOCK;

    let mut padded = vec![0.0f32; padded_w * padded_h];
    for y in 0..h {
        padded[y * padded_w..y * padded_w + w].copy_from_slice(&luma[y * w..(y + 1) * w]);
    }
    (padded_w, padded_h, padded)
}

fn extract_block(
    padded: &[f32],
    padded_w: usize,
    block_x: usize,
    block_y: usize,
) -> [f32; BLOCK * BLOCK] {
    let mut block = [0.0f32; BLOCK * BLOCK];
    for y in 0..BLOCK {
        let row = (block_y * BLOCK + y) * padded_w + block_x * BLOCK;
        block[y * BLOCK..(y + 1) * BLOCK].copy_from_slice(&padded[row..row + BLOCK]);
    }
    block
}

fn place_block(
    padded: &mut [f32],
    padded_w: usize,
    block_x: usize,
    block_y: usize,
    block: &[f32; BLOCK * BLOCK],
) {
    for y in 0..BLOCK {
        let row = (block_y * BLOCK + y) * padded_w + block_x * BLOCK;
        padded[row..row + BLOCK].copy_from_slice(&block[y * BLOCK..(y + 1) * BLOCK]);
    }
}

// ── Transform and quantization ─────────────────────────────────────────────

fn alpha(k: usize) -> f64 {
    if k == 0 {
        std::f64::consts::FRAC_1_SQRT_2
    } else {
        1.0
    }
}

fn cos_term(x: usize, u: usize) -> f64 {
    ((2 * x + 1) as f64 * u as f64 * std::f64::consts::PI / 16.0).cos()
}

/// Forward 2-D DCT of one block, samples centered by subtracting 128.
fn forward_dct(block: &[f32; BLOCK * BLOCK]) -> [f32; BLOCK * BLOCK] {
    let mut out = [0.0f32; BLOCK * BLOCK];
    for v in 0..BLOCK {
        for u in 0..BLOCK {
            let mut sum = 0.0f64;
            for y in 0..BLOCK {
                for x in 0..BLOCK {
                    let sample = block[y * BLOCK + x] as f64 - 128.0;
                    sum += sample * cos_term(x, u) * cos_term(y, v);
                }
            }
            out[v * BLOCK + u] = (0.25 * alpha(u) * alpha(v) * sum) as f32;
        }
    }
    out
}

/// Inverse 2-D DCT of one block, re-adding the 128 bias.
fn inverse_dct(coeffs: &[f32; BLOCK * BLOCK]) -> [f32; BLOCK * BLOCK] {
    let mut out = [0.0f32; BLOCK * BLOCK];
    for y in 0..BLOCK {
        for x in 0..BLOCK {
            let mut sum = 0.0f64;
            for v in 0..BLOCK {
                for u in 0..BLOCK {
                    sum += alpha(u)
                        * alpha(v)
                        * coeffs[v * BLOCK + u] as f64
                        * cos_term(x, u)
                        * cos_term(y, v);
                }
            }
            out[y * BLOCK + x] = (0.25 * sum + 128.0) as f32;
        }
    }
    out
}

/// Element-wise division by the quantization matrix, round to nearest,
/// clamped to the i16 range.
fn quantize(coeffs: &[f32; BLOCK * BLOCK]) -> [i16; BLOCK * BLOCK] {
    let mut out = [0i16; BLOCK * BLOCK];
    for i in 0..BLOCK * BLOCK {
        let scaled = (coeffs[i] / LUMA_QUANT[i] as f32).round();
        out[i] = scaled.clamp(i16::MIN as f32, i16::MAX as f32) as i16;
    }
    out
}

/// Element-wise multiplication by the quantization matrix.
fn dequantize(quantized: &[i16; BLOCK * BLOCK]) -> [f32; BLOCK * BLOCK] {
    let mut out = [0.0f32; BLOCK * BLOCK];
    for i in 0..BLOCK * BLOCK {
        out[i] = quantized[i] as f32 * LUMA_QUANT[i] as f32;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_block_transforms_to_a_lone_dc_coefficient() {
        let block = [200.0f32; 64];
        let coeffs = forward_dct(&block);
        // DC = 0.25 * (1/sqrt2)^2 * 64 * (200 - 128) = 576.
        assert!((coeffs[0] - 576.0).abs() < 1e-3);
        for &ac in &coeffs[1..] {
            assert!(ac.abs() < 1e-3);
        }
    }

    #[test]
    fn transform_round_trips_within_float_noise() {
        let mut block = [0.0f32; 64];
        for (i, sample) in block.iter_mut().enumerate() {
            *sample = ((i * 37) % 256) as f32;
        }
        let restored = inverse_dct(&forward_dct(&block));
        for (orig, back) in block.iter().zip(restored.iter()) {
            assert!((orig - back).abs() < 1e-2, "{orig} vs {back}");
        }
    }

    #[test]
    fn ppm_parser_reads_a_minimal_image() {
        let mut ppm = b"P6\n2 1\n255\n".to_vec();
        ppm.extend_from_slice(&[255, 0, 0, 0, 255, 0]);
        let (w, h, rgb) = parse_ppm_p6(&ppm).unwrap();
        assert_eq!((w, h), (2, 1));
        assert_eq!(rgb, vec![255, 0, 0, 0, 255, 0]);
    }

    #[test]
    fn ppm_parser_rejects_truncated_pixels() {
        let ppm = b"P6\n4 4\n255\nxx".to_vec();
        assert!(matches!(
            parse_ppm_p6(&ppm),
            Err(ImageError::MalformedPpm("truncated pixel data"))
        ));
    }

    #[test]
    fn ppm_parser_rejects_oversized_maxval() {
        let ppm = b"P6\n1 1\n65535\n\x00\x00".to_vec();
        assert!(matches!(parse_ppm_p6(&ppm), Err(ImageError::MalformedPpm(_))));
    }

    #[test]
    fn luma_weights_sum_to_unity_on_gray() {
        let luma = rgb_to_luma(&[128, 128, 128]);
        assert!((luma[0] - 128.0).abs() < 1e-3);
    }
}

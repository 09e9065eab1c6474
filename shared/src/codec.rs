use std::fmt;
use std::string::FromUtf16Error;

use thiserror::Error;

use crate::{PointStream, StrokePoint};

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("compressed drawing is malformed or truncated")]
    Decompress,
    #[error("decompressed drawing is not valid UTF-16: {0}")]
    Utf16(#[from] FromUtf16Error),
    #[error("drawing payload is not a point stream: {0}")]
    Json(#[from] serde_json::Error),
}

/// Lossless text compression whose output survives a 16-bit code unit transport.
pub trait Compressor {
    fn compress(&self, text: &str) -> String;
    fn decompress(&self, text: &str) -> Result<String, CodecError>;
}

/// LZ-String `compressToUTF16` / `decompressFromUTF16`.
///
/// Every output code unit lies in `0x20..=0x801f`, so the result never
/// contains surrogates and embeds in JSON as-is.
#[derive(Clone, Copy, Debug, Default)]
pub struct LzUtf16;

impl Compressor for LzUtf16 {
    fn compress(&self, text: &str) -> String {
        lz_str::compress_to_utf16(text)
    }

    fn decompress(&self, text: &str) -> Result<String, CodecError> {
        if text.encode_utf16().any(|unit| unit < 0x20) {
            return Err(CodecError::Decompress);
        }
        let wide = lz_str::decompress_from_utf16(text).ok_or(CodecError::Decompress)?;
        Ok(String::from_utf16(&wide)?)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PointCodec<C = LzUtf16> {
    compressor: C,
}

impl<C: Compressor> PointCodec<C> {
    pub fn new(compressor: C) -> Self {
        Self { compressor }
    }

    pub fn encode(&self, points: &[StrokePoint]) -> String {
        self.compressor.compress(&raw_json(points))
    }

    pub fn decode(&self, text: &str) -> Result<PointStream, CodecError> {
        let raw = self.compressor.decompress(text)?;
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn decode_or_empty(&self, text: &str) -> PointStream {
        match self.decode(text) {
            Ok(points) => points,
            Err(error) => {
                log::error!("Discarding unreadable drawing: {error}");
                Vec::new()
            }
        }
    }

    pub fn stats(&self, points: &[StrokePoint]) -> CompressionStats {
        let raw = raw_json(points);
        let compressed = self.compressor.compress(&raw);
        CompressionStats {
            raw: raw.encode_utf16().count(),
            compressed: compressed.encode_utf16().count(),
        }
    }
}

fn raw_json(points: &[StrokePoint]) -> String {
    serde_json::to_string(points).unwrap_or_default()
}

pub fn encode(points: &[StrokePoint]) -> String {
    PointCodec::<LzUtf16>::default().encode(points)
}

pub fn decode(text: &str) -> Result<PointStream, CodecError> {
    PointCodec::<LzUtf16>::default().decode(text)
}

pub fn decode_or_empty(text: &str) -> PointStream {
    PointCodec::<LzUtf16>::default().decode_or_empty(text)
}

/// Sizes in UTF-16 code units, for the live readout in draw mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompressionStats {
    pub raw: usize,
    pub compressed: usize,
}

impl CompressionStats {
    pub fn measure(points: &[StrokePoint]) -> Self {
        PointCodec::<LzUtf16>::default().stats(points)
    }

    pub fn ratio(&self) -> f64 {
        if self.compressed == 0 {
            return 0.0;
        }
        self.raw as f64 / self.compressed as f64
    }
}

impl fmt::Display for CompressionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Raw: {}, Compressed: {}, Ratio: {:.2}",
            self.raw,
            self.compressed,
            self.ratio()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_stream() -> PointStream {
        vec![
            StrokePoint::tagged(10, 10, 1.0, "red"),
            StrokePoint::sample(20, 10, 1.0),
            StrokePoint::sample(20, 20, 1.0),
            StrokePoint::Boundary,
            StrokePoint::tagged(40, 40, 0.8125, "transparent"),
            StrokePoint::sample(41, 43, 0.859375),
            StrokePoint::Boundary,
        ]
    }

    #[test]
    fn decode_inverts_encode() {
        let points = sample_stream();
        assert_eq!(decode(&encode(&points)).unwrap(), points);
    }

    #[test]
    fn empty_stream_round_trips() {
        assert_eq!(decode(&encode(&[])).unwrap(), Vec::<StrokePoint>::new());
    }

    #[test]
    fn compressed_text_has_no_surrogates() {
        let encoded = encode(&sample_stream());
        assert!(encoded
            .encode_utf16()
            .all(|unit| !(0xD800..=0xDFFF).contains(&unit)));
    }

    #[test]
    fn garbage_decodes_to_empty() {
        assert!(decode("definitely not lz").is_err());
        assert!(decode_or_empty("definitely not lz").is_empty());
    }

    #[test]
    fn truncated_text_decodes_to_empty() {
        let encoded = encode(&sample_stream());
        let truncated: String = encoded.chars().take(encoded.chars().count() / 2).collect();
        assert!(decode_or_empty(&truncated).is_empty());
    }

    #[test]
    fn valid_compression_of_non_stream_is_an_error() {
        let text = LzUtf16.compress("{\"not\":\"points\"}");
        assert!(matches!(decode(&text), Err(CodecError::Json(_))));
    }

    #[test]
    fn stats_report_sizes() {
        let points = sample_stream();
        let stats = CompressionStats::measure(&points);
        assert_eq!(stats.raw, serde_json::to_string(&points).unwrap().len());
        assert!(stats.compressed > 0);
        assert!(stats.to_string().starts_with(&format!("Raw: {}", stats.raw)));
    }
}

//! Payload encoding: `DynamicImage` → JPEG bytes under the service size ceiling.
//!
//! The extraction service rejects requests whose image exceeds 5 MiB. The
//! encoder downscales once to at most 1600 px on either edge, then walks the
//! JPEG quality down from 85 in steps of 5 until the payload fits. Quality 20
//! is the last attempt; if that still overflows the page fails with
//! [`ExtractorError::SizeBudgetExceeded`].
//!
//! The search is a fixed greedy walk rather than a bisection so that the
//! chosen quality for a given page is reproducible.

use crate::error::ExtractorError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

/// Service payload ceiling in bytes.
pub const MAX_PAYLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Longest permitted edge after downscaling.
pub const MAX_DIMENSION: u32 = 1600;

/// First JPEG quality tried.
pub const START_QUALITY: u8 = 85;

/// Quality decrement between attempts.
pub const QUALITY_STEP: u8 = 5;

/// Lowest quality attempted.
pub const MIN_QUALITY: u8 = 20;

/// An encoded page ready for transmission.
#[derive(Debug, Clone)]
pub struct EncodedPayload {
    /// Raw JPEG bytes; `bytes.len() <= budget`.
    pub bytes: Vec<u8>,
    /// Quality the bytes were produced at.
    pub quality: u8,
    pub width: u32,
    pub height: u32,
}

impl EncodedPayload {
    /// Wrap the JPEG as base64 for a multimodal chat message.
    pub fn to_image_data(&self) -> ImageData {
        ImageData::new(STANDARD.encode(&self.bytes), "image/jpeg").with_detail("high")
    }
}

/// Size-bounded JPEG encoder.
#[derive(Debug, Clone, Copy)]
pub struct PayloadEncoder {
    budget: usize,
}

impl Default for PayloadEncoder {
    fn default() -> Self {
        Self {
            budget: MAX_PAYLOAD_BYTES,
        }
    }
}

impl PayloadEncoder {
    /// Encoder with a non-default ceiling.
    pub fn with_budget(budget: usize) -> Self {
        Self { budget }
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Encode `image` for page `page` of `filename`.
    pub fn encode(
        &self,
        image: &DynamicImage,
        filename: &str,
        page: usize,
    ) -> Result<EncodedPayload, ExtractorError> {
        let scaled = downscale(image);
        let rgb = scaled.to_rgb8();

        let (bytes, quality) = search_quality(self.budget, |quality| {
            let mut buf = Vec::new();
            JpegEncoder::new_with_quality(&mut buf, quality).encode_image(&rgb)?;
            Ok(buf)
        })
        .map_err(|e| match e {
            SearchError::Encode(source) => ExtractorError::ImageEncoding { page, source },
            SearchError::OverBudget { smallest } => ExtractorError::SizeBudgetExceeded {
                filename: filename.to_string(),
                page,
                budget: self.budget,
                smallest,
                floor: MIN_QUALITY,
            },
        })?;

        debug!(
            "Encoded page {} → {}x{} JPEG, {} bytes at quality {}",
            page,
            rgb.width(),
            rgb.height(),
            bytes.len(),
            quality
        );

        Ok(EncodedPayload {
            bytes,
            quality,
            width: rgb.width(),
            height: rgb.height(),
        })
    }
}

/// Shrink so neither edge exceeds [`MAX_DIMENSION`], keeping aspect ratio.
pub fn downscale(image: &DynamicImage) -> DynamicImage {
    if image.width() <= MAX_DIMENSION && image.height() <= MAX_DIMENSION {
        return image.clone();
    }
    image.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Lanczos3)
}

#[derive(Debug)]
enum SearchError {
    Encode(image::ImageError),
    OverBudget { smallest: usize },
}

impl From<image::ImageError> for SearchError {
    fn from(e: image::ImageError) -> Self {
        SearchError::Encode(e)
    }
}

/// Walk quality 85, 80, …, 20 until `encode` returns something within `budget`.
fn search_quality<F>(budget: usize, mut encode: F) -> Result<(Vec<u8>, u8), SearchError>
where
    F: FnMut(u8) -> Result<Vec<u8>, image::ImageError>,
{
    let mut quality = START_QUALITY;
    let mut smallest = usize::MAX;
    loop {
        let bytes = encode(quality)?;
        if bytes.len() <= budget {
            return Ok((bytes, quality));
        }
        smallest = smallest.min(bytes.len());
        if quality < MIN_QUALITY + QUALITY_STEP {
            return Err(SearchError::OverBudget { smallest });
        }
        quality -= QUALITY_STEP;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    /// Deterministic pseudo-random noise; JPEG compresses it poorly.
    fn noise(width: u32, height: u32) -> DynamicImage {
        let mut state: u32 = 0x1234_5678;
        let img = RgbImage::from_fn(width, height, |_, _| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let b = state.to_le_bytes();
            Rgb([b[1], b[2], b[3]])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn quality_sequence_is_85_down_to_20() {
        let mut tried = Vec::new();
        let result = search_quality(10, |q| {
            tried.push(q);
            Ok(vec![0u8; 100])
        });
        assert!(matches!(result, Err(SearchError::OverBudget { smallest: 100 })));
        assert_eq!(
            tried,
            vec![85, 80, 75, 70, 65, 60, 55, 50, 45, 40, 35, 30, 25, 20]
        );
    }

    #[test]
    fn search_stops_at_first_fit() {
        let mut tried = Vec::new();
        let (bytes, quality) = search_quality(50, |q| {
            tried.push(q);
            Ok(vec![0u8; q as usize])
        })
        .unwrap();
        assert_eq!(quality, 50);
        assert_eq!(bytes.len(), 50);
        assert_eq!(tried, vec![85, 80, 75, 70, 65, 60, 55, 50]);
    }

    #[test]
    fn downscale_caps_longest_edge() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(3200, 1000));
        let out = downscale(&img);
        assert_eq!(out.width(), 1600);
        assert_eq!(out.height(), 500);
    }

    #[test]
    fn downscale_leaves_small_images() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(800, 1200));
        let out = downscale(&img);
        assert_eq!((out.width(), out.height()), (800, 1200));
    }

    #[test]
    fn small_image_encodes_at_start_quality() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255])));
        let payload = PayloadEncoder::default().encode(&img, "a.pdf", 1).unwrap();
        assert_eq!(payload.quality, START_QUALITY);
        assert!(payload.bytes.len() <= MAX_PAYLOAD_BYTES);
        // JPEG SOI marker
        assert_eq!(&payload.bytes[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn tight_budget_lowers_quality() {
        let img = noise(200, 200);
        let full = PayloadEncoder::with_budget(usize::MAX)
            .encode(&img, "a.pdf", 1)
            .unwrap();
        let tight = PayloadEncoder::with_budget(full.bytes.len() - 1)
            .encode(&img, "a.pdf", 1)
            .unwrap();
        assert!(tight.quality < START_QUALITY);
        assert!(tight.bytes.len() < full.bytes.len());
    }

    #[test]
    fn impossible_budget_is_an_error() {
        let err = PayloadEncoder::with_budget(64)
            .encode(&noise(64, 64), "big.pdf", 7)
            .unwrap_err();
        match err {
            ExtractorError::SizeBudgetExceeded {
                filename,
                page,
                budget,
                floor,
                ..
            } => {
                assert_eq!(filename, "big.pdf");
                assert_eq!(page, 7);
                assert_eq!(budget, 64);
                assert_eq!(floor, MIN_QUALITY);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn image_data_is_base64_jpeg() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(8, 8));
        let data = PayloadEncoder::default()
            .encode(&img, "a.pdf", 1)
            .unwrap()
            .to_image_data();
        assert_eq!(data.mime_type, "image/jpeg");
        let decoded = STANDARD.decode(&data.data).expect("valid base64");
        assert_eq!(&decoded[..2], &[0xFF, 0xD8]);
    }
}

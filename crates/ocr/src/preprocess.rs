//! Image preparation ahead of text recognition.
//!
//! Phone photos of bills arrive with status bars at the top, uneven
//! lighting, and low contrast around currency symbols. The sequence
//! here — top crop, grayscale, contrast stretch, binary threshold,
//! upscale — measurably improves symbol recognition on such shots.

use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use std::io::Cursor;
use thiserror::Error;

/// Fraction of image height cropped off the top (status bars, headers).
const TOP_CROP: f32 = 0.15;
/// Binarization cutoff.
const THRESHOLD: u8 = 128;
/// Upscale factor applied last; recognition backends resolve small
/// glyphs better at 1.5×.
const UPSCALE: f32 = 1.5;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
    #[error("Image too small to process ({width}x{height})")]
    TooSmall { width: u32, height: u32 },
}

/// Decode raw image bytes (JPEG / PNG / WEBP / …), normalize for text
/// recognition, and return PNG bytes.
pub fn prepare_for_recognition(data: &[u8]) -> Result<Vec<u8>, PreprocessError> {
    let img = image::load_from_memory(data)?;
    if img.width() < 8 || img.height() < 8 {
        return Err(PreprocessError::TooSmall {
            width: img.width(),
            height: img.height(),
        });
    }

    let cropped = crop_top(&img);
    let binary = binarize(stretch_contrast(cropped.to_luma8()));
    let upscaled = upscale(DynamicImage::ImageLuma8(binary));
    encode_png(upscaled)
}

/// Drop the top 15% of the image.
fn crop_top(img: &DynamicImage) -> DynamicImage {
    let skip = (img.height() as f32 * TOP_CROP) as u32;
    img.crop_imm(0, skip, img.width(), img.height() - skip)
}

/// Stretch pixel values to the full 0–255 range.
fn stretch_contrast(gray: GrayImage) -> GrayImage {
    let (min_px, max_px) = gray
        .pixels()
        .fold((255u8, 0u8), |(mn, mx), p| (mn.min(p[0]), mx.max(p[0])));

    if max_px == min_px {
        // Uniform image — nothing to stretch.
        return gray;
    }

    let range = (max_px - min_px) as u32;
    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        Luma([((p - min_px) as u32 * 255 / range) as u8])
    })
}

/// Hard black/white threshold; keeps glyph shapes, kills paper texture.
fn binarize(gray: GrayImage) -> GrayImage {
    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] >= THRESHOLD {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

fn upscale(img: DynamicImage) -> DynamicImage {
    let w = (img.width() as f32 * UPSCALE) as u32;
    let h = (img.height() as f32 * UPSCALE) as u32;
    img.resize_exact(w, h, image::imageops::FilterType::Lanczos3)
}

fn encode_png(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

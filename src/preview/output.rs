//! Thumbnail raster output
//!
//! Fits a decoded raster into the thumbnail box, encodes it as JPEG and writes it
//! next to the source. Writes go through a temp file in the destination directory
//! followed by a rename, so readers never observe a half-written thumbnail.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView, Rgb, RgbImage};
use std::io::Write;
use std::path::Path;
use thiserror::Error;

use crate::core::types::{ResizeMode, ThumbnailSpec};

/// Colour behind transparent pixels and letterbox padding
pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

#[derive(Error, Debug)]
pub enum OutputError {
    #[error("JPEG encoding failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Scale a raster to exactly the thumbnail size
pub fn fit_to_spec(img: &DynamicImage, spec: &ThumbnailSpec) -> RgbImage {
    match spec.resize_mode {
        ResizeMode::Stretch => {
            let resized = img.resize_exact(spec.width, spec.height, FilterType::Triangle);
            flatten(&resized)
        }
        ResizeMode::Letterbox => {
            let resized = flatten(&img.resize(spec.width, spec.height, FilterType::Triangle));
            let mut canvas = RgbImage::from_pixel(spec.width, spec.height, BACKGROUND);
            let x = (spec.width - resized.width()) / 2;
            let y = (spec.height - resized.height()) / 2;
            image::imageops::overlay(&mut canvas, &resized, x as i64, y as i64);
            canvas
        }
    }
}

/// Drop alpha by compositing over the background colour
fn flatten(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }

    let (width, height) = img.dimensions();
    let rgba = img.to_rgba8();
    RgbImage::from_fn(width, height, |x, y| {
        let px = rgba.get_pixel(x, y);
        let alpha = px[3] as u32;
        let blend = |c: u8, bg: u8| ((c as u32 * alpha + bg as u32 * (255 - alpha)) / 255) as u8;
        Rgb([
            blend(px[0], BACKGROUND[0]),
            blend(px[1], BACKGROUND[1]),
            blend(px[2], BACKGROUND[2]),
        ])
    })
}

/// Encode an RGB canvas as JPEG
pub fn encode_jpeg(canvas: &RgbImage, quality: u8) -> Result<Vec<u8>, OutputError> {
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder.encode(
        canvas.as_raw(),
        canvas.width(),
        canvas.height(),
        ColorType::Rgb8,
    )?;
    Ok(buffer)
}

/// Replace `path` with `bytes` via a sibling temp file and a rename
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), OutputError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::Builder::new()
        .prefix(".thumb-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Encode and atomically write a finished thumbnail canvas
pub fn write_jpeg(canvas: &RgbImage, quality: u8, path: &Path) -> Result<(), OutputError> {
    let bytes = encode_jpeg(canvas, quality)?;
    write_atomic(path, &bytes)
}

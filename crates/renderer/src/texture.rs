//! Image decoding and mip chain generation.
//!
//! The GPU upload lives in `gpu::textures`; this module turns a file into
//! tightly packed pixel rows, and decides when to fall back to the
//! placeholder, so both can be tested without a device.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to load texture {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("texture {path} has zero size ({width}x{height})")]
    Empty {
        path: PathBuf,
        width: u32,
        height: u32,
    },
    #[error("texture {path} is {width}x{height}, larger than the GPU limit of {max}")]
    TooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max: u32,
    },
}

/// Upload format chosen from the decoded channel count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// One channel, sampled as `(r, 0, 0, 1)`.
    Red,
    /// Three channels. Uploaded with an opaque alpha byte appended per texel.
    Rgb,
    Rgba,
}

impl PixelFormat {
    /// Two-channel (luma + alpha) images are expanded to RGBA.
    pub fn from_channel_count(channels: u8) -> Self {
        match channels {
            1 => Self::Red,
            3 => Self::Rgb,
            _ => Self::Rgba,
        }
    }

    /// Bytes per texel in the uploaded data.
    pub fn bytes_per_texel(self) -> u32 {
        match self {
            Self::Red => 1,
            Self::Rgb | Self::Rgba => 4,
        }
    }

    pub fn wgpu_format(self) -> wgpu::TextureFormat {
        match self {
            Self::Red => wgpu::TextureFormat::R8Unorm,
            Self::Rgb | Self::Rgba => wgpu::TextureFormat::Rgba8Unorm,
        }
    }
}

/// One mip level: dimensions plus tightly packed rows.
#[derive(Debug, Clone)]
pub struct MipLevel {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// A decoded image with its full mip chain, level 0 first.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub format: PixelFormat,
    pub levels: Vec<MipLevel>,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.levels[0].width
    }

    pub fn height(&self) -> u32 {
        self.levels[0].height
    }

    pub fn mip_level_count(&self) -> u32 {
        self.levels.len() as u32
    }

    /// All levels concatenated in upload order.
    pub fn packed_levels(&self) -> Vec<u8> {
        let total = self.levels.iter().map(|level| level.data.len()).sum();
        let mut data = Vec::with_capacity(total);
        for level in &self.levels {
            data.extend_from_slice(&level.data);
        }
        data
    }

    /// Builds the mip chain for an already decoded image.
    pub fn from_image(image: DynamicImage) -> Self {
        let format = PixelFormat::from_channel_count(image.color().channel_count());
        let (width, height) = image.dimensions();
        let base = match format {
            PixelFormat::Red => image.into_luma8().into_raw(),
            PixelFormat::Rgb | PixelFormat::Rgba => image.into_rgba8().into_raw(),
        };
        let levels = build_levels(base, width, height, format.bytes_per_texel() as usize);
        Self { format, levels }
    }
}

/// `floor(log2(max(width, height))) + 1`.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    let largest = width.max(height).max(1);
    u32::BITS - largest.leading_zeros()
}

fn build_levels(base: Vec<u8>, width: u32, height: u32, channels: usize) -> Vec<MipLevel> {
    let count = mip_level_count(width, height);
    let mut levels = Vec::with_capacity(count as usize);
    levels.push(MipLevel {
        width,
        height,
        data: base,
    });
    for _ in 1..count {
        let Some(previous) = levels.last() else {
            break;
        };
        let next = box_downsample(previous, channels);
        levels.push(next);
    }
    levels
}

/// Averages each 2×2 block of `source` into one texel. A one-texel-wide or
/// one-texel-tall source averages pairs along the other axis.
fn box_downsample(source: &MipLevel, channels: usize) -> MipLevel {
    let width = (source.width / 2).max(1);
    let height = (source.height / 2).max(1);
    let src_width = source.width as usize;
    let last_x = src_width - 1;
    let last_y = source.height as usize - 1;
    let texel = |x: usize, y: usize, c: usize| u32::from(source.data[(y * src_width + x) * channels + c]);

    let mut data = Vec::with_capacity(width as usize * height as usize * channels);
    for y in 0..height as usize {
        let (y0, y1) = ((2 * y).min(last_y), (2 * y + 1).min(last_y));
        for x in 0..width as usize {
            let (x0, x1) = ((2 * x).min(last_x), (2 * x + 1).min(last_x));
            for c in 0..channels {
                let sum = texel(x0, y0, c) + texel(x1, y0, c) + texel(x0, y1, c) + texel(x1, y1, c);
                data.push(((sum + 2) / 4) as u8);
            }
        }
    }
    MipLevel {
        width,
        height,
        data,
    }
}

/// Decodes `path` and builds its mip chain.
///
/// # Errors
///
/// Returns [`TextureError::Decode`] when the file cannot be opened or
/// decoded, [`TextureError::Empty`] for zero-sized images and
/// [`TextureError::TooLarge`] when either side exceeds `max_dimension`.
pub fn decode_image(path: &Path, max_dimension: u32) -> Result<DecodedImage, TextureError> {
    let image = image::open(path).map_err(|source| TextureError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(TextureError::Empty {
            path: path.to_path_buf(),
            width,
            height,
        });
    }
    if width > max_dimension || height > max_dimension {
        return Err(TextureError::TooLarge {
            path: path.to_path_buf(),
            width,
            height,
            max: max_dimension,
        });
    }
    let decoded = DecodedImage::from_image(image);
    tracing::debug!(
        path = %path.display(),
        width,
        height,
        format = ?decoded.format,
        mips = decoded.mip_level_count(),
        "decoded texture"
    );
    Ok(decoded)
}

/// The 1×1 opaque black texel used when a texture fails to load.
pub fn placeholder_image() -> DecodedImage {
    let pixel = image::RgbaImage::from_pixel(1, 1, image::Rgba([0, 0, 0, 255]));
    DecodedImage::from_image(DynamicImage::ImageRgba8(pixel))
}

/// Decodes `path`, or logs the failure and returns the placeholder.
///
/// The flag is `true` when the placeholder was substituted.
pub fn load_or_placeholder(path: &Path, max_dimension: u32) -> (DecodedImage, bool) {
    match decode_image(path, max_dimension) {
        Ok(image) => (image, false),
        Err(err) => {
            tracing::error!(path = %path.display(), "{err}; using a black placeholder");
            (placeholder_image(), true)
        }
    }
}

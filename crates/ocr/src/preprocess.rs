use image::{DynamicImage, ImageFormat};
use placard_core::{Dimensions, FormLayout};
use rust_decimal::Decimal;
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("Width to Height ratio is not equal to {expected}, width: {width} height: {height} width/height: {ratio}")]
    AspectRatio {
        expected: Decimal,
        width: u32,
        height: u32,
        ratio: Decimal,
    },
    #[error("Image has no height")]
    Empty,
}

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to load image: {0}")]
    Load(#[from] image::ImageError),
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// How an image is brought to canonical size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizePlan {
    /// Both sides larger than canonical: area-averaged shrink.
    Downscale,
    /// Both sides smaller than canonical: linear enlarge.
    Upscale,
    /// Already canonical, or one side larger and one smaller.
    Keep,
}

pub fn plan_resize(width: u32, height: u32, target: Dimensions) -> ResizePlan {
    if width > target.width && height > target.height {
        ResizePlan::Downscale
    } else if width < target.width && height < target.height {
        ResizePlan::Upscale
    } else {
        ResizePlan::Keep
    }
}

/// `width / height` rounded to three decimal places.
pub fn aspect_ratio(width: u32, height: u32) -> Option<Decimal> {
    if height == 0 {
        return None;
    }
    Some((Decimal::from(width) / Decimal::from(height)).round_dp(3))
}

pub fn check_aspect_ratio(width: u32, height: u32, expected: Decimal) -> Result<(), GeometryError> {
    let ratio = aspect_ratio(width, height).ok_or(GeometryError::Empty)?;
    if ratio != expected {
        return Err(GeometryError::AspectRatio { expected, width, height, ratio });
    }
    Ok(())
}

/// A decoded form image at canonical geometry.
#[derive(Debug, Clone)]
pub struct CanonicalImage {
    pub image: DynamicImage,
    /// Format the source was encoded in; re-encoding keeps it.
    pub format: ImageFormat,
    pub plan: ResizePlan,
}

impl CanonicalImage {
    pub fn was_resized(&self) -> bool {
        self.plan != ResizePlan::Keep
    }

    pub fn encode(&self) -> Result<Vec<u8>, PreprocessError> {
        encode_image(&self.image, self.format)
    }
}

/// Decode, validate the aspect ratio, and rescale to the layout's canonical size.
pub fn normalize_geometry(data: &[u8], layout: &FormLayout) -> Result<CanonicalImage, PreprocessError> {
    let format = image::guess_format(data)?;
    let img = image::load_from_memory_with_format(data, format)?;
    check_aspect_ratio(img.width(), img.height(), layout.aspect_ratio)?;

    let plan = plan_resize(img.width(), img.height(), layout.canonical);
    let image = resize(img, plan, layout.canonical);
    Ok(CanonicalImage { image, format, plan })
}

fn resize(img: DynamicImage, plan: ResizePlan, target: Dimensions) -> DynamicImage {
    match plan {
        ResizePlan::Downscale => img.thumbnail_exact(target.width, target.height),
        ResizePlan::Upscale => {
            img.resize_exact(target.width, target.height, image::imageops::FilterType::Triangle)
        }
        ResizePlan::Keep => img,
    }
}

/// Encode `img` as `format`. JPEG has no alpha channel, so it is dropped first.
pub fn encode_image(img: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, PreprocessError> {
    let rgb;
    let img = if format == ImageFormat::Jpeg && img.color().has_alpha() {
        rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        &rgb
    } else {
        img
    };
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), format)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

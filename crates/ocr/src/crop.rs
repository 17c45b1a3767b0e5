use image::DynamicImage;
use placard_core::{ObjectRef, RegionSpec};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CropError {
    #[error("Region '{name}' at ({x}, {y}) lies outside the {image_width}x{image_height} image")]
    OutOfBounds {
        name: String,
        x: u32,
        y: u32,
        image_width: u32,
        image_height: u32,
    },
}

/// One field's sub-image, cut from the canonical image.
#[derive(Debug, Clone)]
pub struct CroppedRegion {
    pub name: String,
    pub image: DynamicImage,
}

/// Where the crops of one source image were uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedRegions {
    pub bucket: String,
    /// Region names, in layout order.
    pub names: Vec<String>,
    /// Name of the source object the crops were cut from.
    pub filename: String,
}

impl StagedRegions {
    pub fn object(&self, region: &str) -> ObjectRef {
        ObjectRef::new(&self.bucket, staged_name(region, &self.filename))
    }
}

/// Staging name for a crop: `"{region}_{filename}"`.
pub fn staged_name(region: &str, filename: &str) -> String {
    format!("{region}_{filename}")
}

/// Cut `spec`'s rectangle out of `image`.
///
/// A rectangle that runs past the image edge is truncated to the overlap,
/// like slicing `[y..y + height, x..x + width]`. A rectangle with no overlap
/// at all is an error, since there is nothing to encode.
pub fn crop_region(image: &DynamicImage, spec: &RegionSpec) -> Result<CroppedRegion, CropError> {
    let width = spec.width.min(image.width().saturating_sub(spec.x));
    let height = spec.height.min(image.height().saturating_sub(spec.y));

    if width == 0 || height == 0 {
        return Err(CropError::OutOfBounds {
            name: spec.name.clone(),
            x: spec.x,
            y: spec.y,
            image_width: image.width(),
            image_height: image.height(),
        });
    }
    if width < spec.width || height < spec.height {
        tracing::warn!(
            "Region {} truncated to {}x{} (declared {}x{})",
            spec.name, width, height, spec.width, spec.height
        );
    }

    Ok(CroppedRegion {
        name: spec.name.clone(),
        image: image.crop_imm(spec.x, spec.y, width, height),
    })
}

pub fn crop_regions(image: &DynamicImage, regions: &[RegionSpec]) -> Result<Vec<CroppedRegion>, CropError> {
    regions.iter().map(|spec| crop_region(image, spec)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb, RgbImage};
    use placard_core::FormLayout;

    fn canonical() -> DynamicImage {
        let img: RgbImage = ImageBuffer::from_fn(1584, 1224, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 0]));
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn crops_match_declared_dimensions() {
        let layout = FormLayout::placard();
        let crops = crop_regions(&canonical(), &layout.regions).unwrap();
        assert_eq!(crops.len(), 4);
        for (crop, spec) in crops.iter().zip(&layout.regions) {
            assert_eq!(crop.name, spec.name);
            assert_eq!((crop.image.width(), crop.image.height()), (spec.width, spec.height));
        }
    }

    #[test]
    fn crop_starts_at_region_origin() {
        let spec = RegionSpec::new("renew_size", 171, 405, 111, 57);
        let crop = crop_region(&canonical(), &spec).unwrap();
        let rgb = crop.image.to_rgb8();
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([171, (405 % 256) as u8, 0]));
        assert_eq!(rgb.get_pixel(110, 56), &Rgb([(281 % 256) as u8, (461 % 256) as u8, 0]));
    }

    #[test]
    fn partial_overlap_is_truncated() {
        let spec = RegionSpec::new("edge", 1500, 1200, 200, 100);
        let crop = crop_region(&canonical(), &spec).unwrap();
        assert_eq!((crop.image.width(), crop.image.height()), (84, 24));
    }

    #[test]
    fn no_overlap_is_an_error() {
        let spec = RegionSpec::new("outside", 2000, 10, 50, 50);
        let err = crop_region(&canonical(), &spec).unwrap_err();
        assert!(matches!(err, CropError::OutOfBounds { ref name, .. } if name == "outside"));
    }

    #[test]
    fn staged_object_names() {
        let staged = StagedRegions {
            bucket: "processed".into(),
            names: vec!["house_number".into()],
            filename: "placard.png".into(),
        };
        assert_eq!(staged.object("house_number"), ObjectRef::new("processed", "house_number_placard.png"));
    }
}

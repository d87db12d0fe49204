use image::DynamicImage;

/// Image preprocessing applied to each capture before recognition
pub struct PreprocessingService {
    upscale: f64,
}

impl PreprocessingService {
    pub fn new(upscale: f64) -> Self {
        Self { upscale }
    }

    /// Full preprocessing pipeline: grayscale → scale
    pub fn preprocess(&self, image: &DynamicImage) -> DynamicImage {
        let gray = self.to_grayscale(image);
        if self.upscale > 1.0 {
            self.scale(&gray, self.upscale)
        } else {
            gray
        }
    }

    pub fn to_grayscale(&self, image: &DynamicImage) -> DynamicImage {
        DynamicImage::ImageLuma8(image.to_luma8())
    }

    /// Scale image by factor
    pub fn scale(&self, image: &DynamicImage, factor: f64) -> DynamicImage {
        let new_width = ((image.width() as f64 * factor) as u32).max(1);
        let new_height = ((image.height() as f64 * factor) as u32).max(1);

        image.resize_exact(new_width, new_height, image::imageops::FilterType::Lanczos3)
    }
}

impl Default for PreprocessingService {
    fn default() -> Self {
        Self::new(1.0)
    }
}

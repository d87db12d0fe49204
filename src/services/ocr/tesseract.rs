use image::{DynamicImage, ImageFormat};
use rusty_tesseract::{Args, Image};
use std::collections::HashMap;
use std::path::Path;

use super::engine::{RecognitionMode, TextRecognizer};
use super::preprocessing::PreprocessingService;
use crate::errors::{AutofillError, AutofillResult};
use crate::models::config::OcrConfig;

const DIGIT_WHITELIST: &str = "0123456789";

/// Tesseract OCR engine implementation (runs the tesseract executable)
pub struct TesseractRecognizer {
    lang: String,
    psm: i32,
    oem: i32,
    preprocessing: PreprocessingService,
}

impl TesseractRecognizer {
    /// Create a new recognizer, failing if tesseract is not reachable
    pub fn new(config: &OcrConfig) -> AutofillResult<Self> {
        if let Some(dir) = &config.tesseract_dir {
            prepend_to_path(dir)?;
        }

        if !Self::is_available() {
            return Err(AutofillError::Recognition(
                "tesseract executable not found on PATH".to_string(),
            ));
        }

        Ok(Self {
            lang: config.lang.clone(),
            psm: config.psm,
            oem: config.oem,
            preprocessing: PreprocessingService::new(config.upscale),
        })
    }

    pub fn is_available() -> bool {
        rusty_tesseract::get_tesseract_version().is_ok()
    }

    fn args_for(&self, mode: RecognitionMode) -> Args {
        let mut config_variables = HashMap::new();
        if mode == RecognitionMode::Digits {
            config_variables.insert(
                "tessedit_char_whitelist".to_string(),
                DIGIT_WHITELIST.to_string(),
            );
        }

        Args {
            lang: self.lang.clone(),
            config_variables,
            dpi: Some(150),
            psm: Some(self.psm),
            oem: Some(self.oem),
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &DynamicImage, mode: RecognitionMode) -> AutofillResult<String> {
        let prepared = self.preprocessing.preprocess(image);

        // tesseract reads from disk; the file lives until `file` drops
        let file = tempfile::Builder::new()
            .prefix("specimen-ocr-")
            .suffix(".png")
            .tempfile()?;
        prepared.save_with_format(file.path(), ImageFormat::Png)?;

        let tess_image = Image::from_path(file.path())
            .map_err(|e| AutofillError::Recognition(format!("Failed to load capture: {}", e)))?;

        rusty_tesseract::image_to_string(&tess_image, &self.args_for(mode))
            .map_err(|e| AutofillError::Recognition(format!("Failed to recognize text: {}", e)))
    }
}

/// Make a bundled tesseract install visible to the process
fn prepend_to_path(dir: &Path) -> AutofillResult<()> {
    let mut paths = vec![dir.to_path_buf()];
    if let Some(existing) = std::env::var_os("PATH") {
        paths.extend(std::env::split_paths(&existing));
    }
    let joined = std::env::join_paths(paths)
        .map_err(|e| AutofillError::Config(format!("Invalid tesseract_dir: {}", e)))?;
    std::env::set_var("PATH", joined);
    tracing::debug!(dir = %dir.display(), "tesseract directory added to PATH");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn create_engine() -> Option<TesseractRecognizer> {
        match TesseractRecognizer::new(&OcrConfig::default()) {
            Ok(engine) => Some(engine),
            Err(_) => {
                println!("Skipping test - tesseract not available");
                None
            }
        }
    }

    #[test]
    fn test_digit_mode_sets_whitelist() {
        let Some(engine) = create_engine() else { return };
        let args = engine.args_for(RecognitionMode::Digits);
        assert_eq!(
            args.config_variables.get("tessedit_char_whitelist").map(String::as_str),
            Some(DIGIT_WHITELIST)
        );
        assert_eq!(args.psm, Some(6));
        assert_eq!(args.oem, Some(3));

        let text_args = engine.args_for(RecognitionMode::Text);
        assert!(text_args.config_variables.is_empty());
    }

    #[test]
    fn test_blank_image_recognizes_without_error() {
        let Some(engine) = create_engine() else { return };
        let blank = DynamicImage::ImageRgb8(RgbImage::from_pixel(200, 80, Rgb([255, 255, 255])));

        let result = engine.recognize(&blank, RecognitionMode::Digits);
        assert!(result.is_ok(), "Recognition should succeed even on blank image");
    }
}

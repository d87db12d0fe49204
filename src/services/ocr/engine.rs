use image::DynamicImage;

use crate::errors::AutofillResult;

/// Character set the recognizer should restrict itself to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionMode {
    /// Digits only (specimen numbers)
    Digits,
    /// Unrestricted text
    Text,
}

/// Text recognizer trait - abstraction for different OCR implementations
pub trait TextRecognizer: Send + Sync {
    /// Recognize raw text in `image`. The caller cleans the result.
    fn recognize(&self, image: &DynamicImage, mode: RecognitionMode) -> AutofillResult<String>;
}

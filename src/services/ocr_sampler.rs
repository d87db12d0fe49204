use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::errors::{AutofillError, AutofillResult};
use crate::models::config::{DigitHeuristics, SamplingConfig};
use crate::models::ocr_result::{OcrResult, OcrSample};
use crate::models::point::{Offset, Point};
use crate::models::roi::ScreenRegion;
use crate::services::clipboard::Clipboard;
use crate::services::ocr::{clean_text, RecognitionMode, TextRecognizer};
use crate::services::pointer::PointerControl;
use crate::services::screen_capture::ScreenGrabber;

/// Reads one specimen number from the screen by repeated jittered captures.
///
/// Samples are taken strictly one after another. A successful result is
/// also written to the clipboard, where the form-filling macros pick it up.
pub struct OcrSampler<'a, R = StdRng> {
    screen: &'a dyn ScreenGrabber,
    recognizer: &'a dyn TextRecognizer,
    pointer: &'a dyn PointerControl,
    clipboard: &'a dyn Clipboard,
    heuristics: DigitHeuristics,
    rng: R,
}

impl<'a> OcrSampler<'a, StdRng> {
    pub fn new(
        screen: &'a dyn ScreenGrabber,
        recognizer: &'a dyn TextRecognizer,
        pointer: &'a dyn PointerControl,
        clipboard: &'a dyn Clipboard,
        heuristics: DigitHeuristics,
    ) -> Self {
        Self::with_rng(screen, recognizer, pointer, clipboard, heuristics, StdRng::from_entropy())
    }
}

impl<'a, R: Rng> OcrSampler<'a, R> {
    pub fn with_rng(
        screen: &'a dyn ScreenGrabber,
        recognizer: &'a dyn TextRecognizer,
        pointer: &'a dyn PointerControl,
        clipboard: &'a dyn Clipboard,
        heuristics: DigitHeuristics,
        rng: R,
    ) -> Self {
        Self {
            screen,
            recognizer,
            pointer,
            clipboard,
            heuristics,
            rng,
        }
    }

    /// Sample around `center`, or around the pointer when `center` is `None`.
    ///
    /// Stops early once `min_samples` valid readings agree. Failed captures
    /// and unreadable text count as invalid samples; only pointer and
    /// clipboard failures are returned as errors.
    pub fn sample(
        &mut self,
        center: Option<Point>,
        params: &SamplingConfig,
    ) -> AutofillResult<OcrResult> {
        if params.width == 0 || params.height == 0 {
            return Err(AutofillError::Config(format!(
                "Sampling area must not be empty, got {}x{}",
                params.width, params.height
            )));
        }

        let center = match center {
            Some(point) => point,
            None => self.pointer.position()?,
        };
        let min_samples = params.min_samples.unwrap_or(params.num_samples) as usize;
        let jitter = params.jitter.abs();

        debug!(x = center.x, y = center.y, "capturing around position");

        let mut samples = Vec::with_capacity(params.num_samples as usize);
        let mut valid = Vec::new();

        for attempt in 1..=params.num_samples {
            let offset = Offset::new(
                self.rng.gen_range(-jitter..=jitter),
                self.rng.gen_range(-jitter..=jitter),
            );
            let region =
                ScreenRegion::from_center(center.offset(offset), params.width, params.height);

            let sample = self.read_region(&region, attempt);
            samples.push(sample);

            if let OcrSample::Valid(value) = sample {
                valid.push(value);
                if valid.len() >= min_samples && is_unanimous(&valid) {
                    debug!(attempt, value, "samples agree, stopping early");
                    break;
                }
            }
        }

        let value = majority_vote(&valid);
        match value {
            Some(number) => {
                info!(value = number, attempts = samples.len(), valid = valid.len(), "OCR result");
                self.clipboard.write(&number.to_string())?;
            }
            None => warn!(attempts = samples.len(), "no valid OCR results"),
        }

        Ok(OcrResult { value, samples })
    }

    fn read_region(&self, region: &ScreenRegion, attempt: u32) -> OcrSample {
        let image = match self.screen.grab(region) {
            Ok(image) => image,
            Err(e) => {
                warn!(attempt, error = %e, "capture failed, sample discarded");
                return OcrSample::Invalid;
            }
        };

        let text = match self.recognizer.recognize(&image, RecognitionMode::Digits) {
            Ok(text) => text,
            Err(e) => {
                warn!(attempt, error = %e, "recognition failed, sample discarded");
                return OcrSample::Invalid;
            }
        };

        let sample = OcrSample::from(clean_text(&text, &self.heuristics));
        debug!(
            attempt,
            x = region.x,
            y = region.y,
            raw = %text.trim(),
            value = ?sample.value(),
            "OCR sample"
        );
        sample
    }
}

fn is_unanimous(values: &[u32]) -> bool {
    values.iter().collect::<HashSet<_>>().len() == 1
}

/// Most frequent value; ties go to the value seen first
pub fn majority_vote(values: &[u32]) -> Option<u32> {
    let mut counts: HashMap<u32, usize> = HashMap::new();
    for value in values {
        *counts.entry(*value).or_insert(0) += 1;
    }

    let max = counts.values().copied().max()?;
    values.iter().copied().find(|v| counts.get(v) == Some(&max))
}

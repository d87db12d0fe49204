use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::errors::{AutofillError, AutofillResult};
use crate::models::config::AppConfig;
use crate::models::coordinate_map::{CalibrationReport, CoordinateMap};
use crate::models::ocr_result::OcrResult;
use crate::models::point::Point;
use crate::services::clipboard::{Clipboard, SystemClipboard};
use crate::services::form_filler::FormFiller;
use crate::services::ocr::{clean_text, TesseractRecognizer, TextRecognizer};
use crate::services::ocr_sampler::OcrSampler;
use crate::services::pointer::{EnigoPointer, PointerControl};
use crate::services::resolver::{
    default_plan, default_required_keys, CoordinateResolver, GRID_OPEN_KEY,
};
use crate::services::screen_capture::{ScreenCapture, ScreenGrabber};
use crate::services::tag_locator::TagLocator;
use crate::services::template_locator::{ScreenLocator, TemplateLocator};

/// Host capabilities a session drives
pub struct Capabilities {
    pub screen: Arc<dyn ScreenGrabber>,
    /// Locator over the anchor template directory
    pub locator: Arc<dyn ScreenLocator>,
    /// Locator over the tag digit images; needed only for auto-locate OCR
    pub tag_locator: Option<Arc<dyn ScreenLocator>>,
    /// Needed only by the OCR operations
    pub recognizer: Option<Arc<dyn TextRecognizer>>,
    pub pointer: Arc<dyn PointerControl>,
    pub clipboard: Arc<dyn Clipboard>,
}

impl Capabilities {
    /// Real desktop backends. Tesseract is only started when `with_ocr` is set.
    pub fn system(config: &AppConfig, with_ocr: bool) -> AutofillResult<Self> {
        let screen: Arc<dyn ScreenGrabber> = Arc::new(ScreenCapture::new()?);
        let locator: Arc<dyn ScreenLocator> =
            Arc::new(TemplateLocator::new(&config.templates.dir, Arc::clone(&screen))?);

        let tag_locator: Option<Arc<dyn ScreenLocator>> =
            match TemplateLocator::new(&config.templates.tag_digits_dir, Arc::clone(&screen)) {
                Ok(locator) => Some(Arc::new(locator)),
                Err(e) => {
                    warn!(error = %e, "tag images unavailable, auto-locate OCR disabled");
                    None
                }
            };

        let recognizer: Option<Arc<dyn TextRecognizer>> = if with_ocr {
            Some(Arc::new(TesseractRecognizer::new(&config.ocr)?))
        } else {
            None
        };

        Ok(Self {
            screen,
            locator,
            tag_locator,
            recognizer,
            pointer: Arc::new(EnigoPointer::new()?),
            clipboard: Arc::new(SystemClipboard::new()?),
        })
    }
}

/// Where the session's coordinates come from
pub enum CoordinateSource {
    /// Run a calibration pass now
    Calibrate,
    /// Reuse a saved calibration
    Saved(CalibrationReport),
}

/// One automation session: the capabilities plus the coordinate map built
/// once by [`AutomationSession::initialize`]. The map is never modified
/// afterwards; a new layout needs a new session.
pub struct AutomationSession {
    config: AppConfig,
    caps: Capabilities,
    report: CalibrationReport,
}

impl AutomationSession {
    /// Build the coordinate map (or adopt a saved one) and validate it
    /// against every key the form actions need
    pub fn initialize(
        config: AppConfig,
        caps: Capabilities,
        source: CoordinateSource,
    ) -> AutofillResult<Self> {
        let required = required_keys(&config);

        let report = match source {
            CoordinateSource::Calibrate => {
                let mut resolver = CoordinateResolver::new(
                    caps.locator.as_ref(),
                    caps.pointer.as_ref(),
                    default_plan(),
                );
                if config.resolver.extended {
                    resolver = resolver.with_grid(config.resolver.grid.clone());
                }

                resolver
                    .resolve(config.resolver.confidence, &required)?
                    .into_report(config.resolver.confidence, config.resolver.extended)
            }
            CoordinateSource::Saved(report) => {
                let keys: Vec<&str> = required.iter().map(String::as_str).collect();
                report.coordinates.require(&keys)?;
                info!(
                    keys = report.coordinates.len(),
                    resolved_at = %report.resolved_at,
                    "using saved calibration"
                );
                report
            }
        };

        Ok(Self {
            config,
            caps,
            report,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn coordinates(&self) -> &CoordinateMap {
        &self.report.coordinates
    }

    pub fn report(&self) -> &CalibrationReport {
        &self.report
    }

    pub fn form(&self) -> FormFiller<'_> {
        FormFiller::new(
            &self.report.coordinates,
            self.caps.pointer.as_ref(),
            self.caps.clipboard.as_ref(),
        )
        .with_action_delay(Duration::from_millis(self.config.input.action_delay_ms))
        .with_paste_settle(Duration::from_millis(self.config.input.paste_settle_ms))
        .with_grid(self.config.resolver.grid.clone())
    }

    fn sampler(&self) -> AutofillResult<OcrSampler<'_>> {
        let recognizer = self
            .caps
            .recognizer
            .as_deref()
            .ok_or_else(|| AutofillError::Recognition("OCR backend not initialized".to_string()))?;

        Ok(OcrSampler::new(
            self.caps.screen.as_ref(),
            recognizer,
            self.caps.pointer.as_ref(),
            self.caps.clipboard.as_ref(),
            self.config.heuristics,
        ))
    }

    /// Read the specimen number around `center` (default: pointer position)
    pub fn ocr(&self, center: Option<Point>) -> AutofillResult<OcrResult> {
        self.sampler()?.sample(center, &self.config.sampling)
    }

    /// Find the specimen tag on screen and read the number there.
    /// `None` when no tag is visible; nothing is sampled in that case.
    pub fn auto_ocr(&self) -> AutofillResult<Option<OcrResult>> {
        let locator = self.caps.tag_locator.as_deref().ok_or_else(|| {
            AutofillError::Template(format!(
                "Tag image directory not available: {}",
                self.config.templates.tag_digits_dir.display()
            ))
        })?;

        let Some(center) = TagLocator::new(locator, self.config.tag.confidence).find_tag()? else {
            warn!("no tag found");
            return Ok(None);
        };

        Ok(Some(self.ocr(Some(center))?))
    }

    /// Clean a typed specimen number, put it on the clipboard and run the
    /// number macro. Invalid input leaves clipboard and form untouched.
    pub fn enter_number(&self, text: &str) -> AutofillResult<Option<u32>> {
        let Some(number) = clean_text(text, &self.config.heuristics) else {
            warn!(input = %text, "not a valid specimen number");
            return Ok(None);
        };

        self.caps.clipboard.write(&number.to_string())?;
        info!(value = number, "copied to clipboard");

        self.number_macro()?;
        Ok(Some(number))
    }

    /// Enter the number from the clipboard with the configured number type,
    /// fill the configured collection and save
    pub fn number_macro(&self) -> AutofillResult<()> {
        let number = self.caps.clipboard.read()?;
        let number = number.trim();
        if number.is_empty() {
            return Err(AutofillError::Clipboard("Clipboard holds no specimen number".to_string()));
        }

        let form = self.form();
        form.numbers_more(number, &self.config.macro_values.number_type)?;
        form.collection(&self.config.macro_values.collection)?;
        form.save()
    }

    /// Where navigation leaves the pointer: over the specimen tag, or back
    /// where it was
    fn park_position(&self, to_tag: bool) -> AutofillResult<Option<Point>> {
        if to_tag {
            Ok(Some(self.coordinates().get("tag_approximate")?))
        } else {
            Ok(None)
        }
    }

    pub fn previous(&self, to_tag: bool) -> AutofillResult<()> {
        self.form().previous(self.park_position(to_tag)?, true)
    }

    pub fn next(&self, to_tag: bool) -> AutofillResult<()> {
        self.form().next(self.park_position(to_tag)?, true)
    }
}

/// Keys the form actions need for this configuration
pub fn required_keys(config: &AppConfig) -> Vec<String> {
    let mut keys = default_required_keys();
    if config.resolver.extended {
        keys.push(GRID_OPEN_KEY.to_string());
        keys.extend(config.resolver.grid.fields.iter().map(|f| f.name.clone()));
    }
    keys
}

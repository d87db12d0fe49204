use tracing::{info, warn};

use crate::errors::AutofillResult;
use crate::models::config::AppConfig;
use crate::models::coordinate_map::CalibrationReport;
use crate::services::config::ConfigManager;
use crate::services::session::{AutomationSession, Capabilities, CoordinateSource};

/// How a command wants its session set up
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// Ignore any saved calibration
    pub recalibrate: bool,
    /// Start the OCR backend
    pub with_ocr: bool,
}

/// Pick the saved calibration when it fits the configuration: same
/// confidence threshold, and extended when extended mode is on
pub fn coordinate_source(
    saved: Option<CalibrationReport>,
    config: &AppConfig,
    options: SessionOptions,
) -> CoordinateSource {
    let Some(report) = saved else {
        return CoordinateSource::Calibrate;
    };
    if options.recalibrate {
        return CoordinateSource::Calibrate;
    }

    if (report.confidence - config.resolver.confidence).abs() > f32::EPSILON {
        warn!(
            saved = report.confidence,
            configured = config.resolver.confidence,
            "saved calibration used another confidence, recalibrating"
        );
        return CoordinateSource::Calibrate;
    }
    if config.resolver.extended && !report.extended {
        info!("saved calibration lacks the determination grid, recalibrating");
        return CoordinateSource::Calibrate;
    }

    CoordinateSource::Saved(report)
}

/// Start a session on the real desktop. Fresh calibrations are saved.
pub fn open_session(
    manager: &ConfigManager,
    config: AppConfig,
    options: SessionOptions,
) -> AutofillResult<AutomationSession> {
    let caps = Capabilities::system(&config, options.with_ocr)?;

    let saved = if options.recalibrate {
        None
    } else {
        manager.load_calibration()?
    };
    let source = coordinate_source(saved, &config, options);
    let fresh = matches!(source, CoordinateSource::Calibrate);

    let session = AutomationSession::initialize(config, caps, source)?;
    if fresh {
        manager.save_calibration(session.report())?;
    }
    Ok(session)
}

/// Run a calibration pass and print the resulting map
pub fn calibrate(manager: &ConfigManager, config: AppConfig, save: bool) -> AutofillResult<()> {
    let caps = Capabilities::system(&config, false)?;
    let session = AutomationSession::initialize(config, caps, CoordinateSource::Calibrate)?;
    let report = session.report();

    println!("Coordinates:");
    for (key, point) in report.coordinates.iter() {
        println!("{}: {}", key, point);
    }
    if !report.unresolved.is_empty() {
        println!("Unresolved: {}", report.unresolved.join(", "));
    }
    println!("{}", "-".repeat(40));

    if save {
        manager.save_calibration(report)?;
    } else {
        info!("calibration not saved");
    }
    Ok(())
}

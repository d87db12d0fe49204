use image::DynamicImage;
use xcap::Monitor;

use crate::errors::{AutofillError, AutofillResult};
use crate::models::point::Point;
use crate::models::roi::ScreenRegion;

/// A full-screen capture plus what is needed to map its pixels back to
/// logical screen coordinates
pub struct ScreenFrame {
    pub image: DynamicImage,
    pub scale_factor: f64,
    /// Logical position of the monitor's top-left corner
    pub origin: Point,
}

impl ScreenFrame {
    /// Convert a physical pixel position inside `image` to a logical screen point
    pub fn to_logical(&self, px: f64, py: f64) -> Point {
        Point::new(
            self.origin.x + (px / self.scale_factor).round() as i32,
            self.origin.y + (py / self.scale_factor).round() as i32,
        )
    }
}

/// Screen grabbing capability
pub trait ScreenGrabber: Send + Sync {
    /// Capture `region` (logical pixels), clamped to the screen
    fn grab(&self, region: &ScreenRegion) -> AutofillResult<DynamicImage>;

    fn grab_full(&self) -> AutofillResult<ScreenFrame>;
}

/// Thread-safe wrapper for xcap::Monitor
///
/// SAFETY: Monitor is a handle to OS display resources, only used here for
/// read-only capture calls.
struct SendSyncMonitor(Monitor);

// SAFETY: Monitor handles are thread-safe at the OS level.
unsafe impl Send for SendSyncMonitor {}

// SAFETY: xcap capture calls are internally synchronized.
unsafe impl Sync for SendSyncMonitor {}

/// Screen capture service using xcap
pub struct ScreenCapture {
    monitor: SendSyncMonitor,
    scale_factor: f64,
    origin: Point,
}

impl ScreenCapture {
    /// Create a new screen capture instance using the primary monitor
    pub fn new() -> AutofillResult<Self> {
        let monitor = Monitor::all()
            .map_err(|e| AutofillError::Capture(format!("Failed to get monitors: {}", e)))?
            .into_iter()
            .find(|m| m.is_primary().unwrap_or(false))
            .ok_or_else(|| AutofillError::Capture("No primary monitor found".to_string()))?;

        Ok(Self::from_monitor(monitor))
    }

    fn from_monitor(monitor: Monitor) -> Self {
        // xcap returns physical pixels; the rest of the crate speaks logical ones
        let scale_factor = monitor.scale_factor().unwrap_or(1.0) as f64;
        let origin = Point::new(monitor.x().unwrap_or(0), monitor.y().unwrap_or(0));

        tracing::debug!(
            scale_factor,
            width = monitor.width().unwrap_or(0),
            height = monitor.height().unwrap_or(0),
            "screen capture initialized"
        );

        Self {
            monitor: SendSyncMonitor(monitor),
            scale_factor,
            origin,
        }
    }

    fn capture_image(&self) -> AutofillResult<DynamicImage> {
        let rgba_image = self
            .monitor
            .0
            .capture_image()
            .map_err(|e| AutofillError::Capture(format!("Failed to capture screen: {}", e)))?;
        Ok(DynamicImage::ImageRgba8(rgba_image))
    }
}

impl ScreenGrabber for ScreenCapture {
    fn grab(&self, region: &ScreenRegion) -> AutofillResult<DynamicImage> {
        if !region.is_valid() {
            return Err(AutofillError::Capture(format!(
                "Empty capture region {:?}",
                region
            )));
        }

        let image = self.capture_image()?;
        let (width, height) = (image.width(), image.height());
        let crop = physical_crop(region, self.origin, self.scale_factor, width, height)
            .ok_or_else(|| {
                AutofillError::Capture(format!("Region {:?} lies outside the screen", region))
            })?;

        Ok(image.crop_imm(crop.0, crop.1, crop.2, crop.3))
    }

    fn grab_full(&self) -> AutofillResult<ScreenFrame> {
        Ok(ScreenFrame {
            image: self.capture_image()?,
            scale_factor: self.scale_factor,
            origin: self.origin,
        })
    }
}

/// Map a logical region to a physical crop `(x, y, w, h)` clamped to an
/// image of `img_w` x `img_h`. Returns `None` when nothing is left.
pub fn physical_crop(
    region: &ScreenRegion,
    origin: Point,
    scale_factor: f64,
    img_w: u32,
    img_h: u32,
) -> Option<(u32, u32, u32, u32)> {
    let to_px = |v: i32| (v as f64 * scale_factor).round() as i64;

    let x1 = to_px(region.x - origin.x).clamp(0, img_w as i64);
    let y1 = to_px(region.y - origin.y).clamp(0, img_h as i64);
    let x2 = to_px(region.x2() - origin.x).clamp(0, img_w as i64);
    let y2 = to_px(region.y2() - origin.y).clamp(0, img_h as i64);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    Some((x1 as u32, y1 as u32, (x2 - x1) as u32, (y2 - y1) as u32))
}

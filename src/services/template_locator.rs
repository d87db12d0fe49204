use image::imageops::{self, FilterType};
use image::GrayImage;
use imageproc::template_matching::{match_template, MatchTemplateMethod};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::{AutofillError, AutofillResult};
use crate::models::point::Point;
use crate::services::screen_capture::{ScreenFrame, ScreenGrabber};

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Coarse candidates refined at full resolution
const COARSE_CANDIDATES: usize = 3;

/// Finds template images on screen.
///
/// `Ok(None)` means the template was searched for and did not reach the
/// confidence threshold. Errors are reserved for broken templates and
/// capture failures.
pub trait ScreenLocator: Send + Sync {
    /// Center of the best match of `template` with similarity >= `confidence`
    fn locate(&self, template: &str, confidence: f32) -> AutofillResult<Option<Point>>;

    /// Locate several templates, in order
    fn locate_many(
        &self,
        templates: &[String],
        confidence: f32,
    ) -> AutofillResult<Vec<(String, Option<Point>)>> {
        templates
            .iter()
            .map(|name| Ok((name.clone(), self.locate(name, confidence)?)))
            .collect()
    }

    /// Names of every template image this locator can search for
    fn list_templates(&self) -> AutofillResult<Vec<String>>;
}

/// Template locator over a directory of reference images
pub struct TemplateLocator {
    root: PathBuf,
    grabber: Arc<dyn ScreenGrabber>,
    templates: Mutex<HashMap<String, Arc<GrayImage>>>,
}

impl TemplateLocator {
    pub fn new<P: AsRef<Path>>(root: P, grabber: Arc<dyn ScreenGrabber>) -> AutofillResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(AutofillError::Template(format!(
                "Template directory not found: {}",
                root.display()
            )));
        }

        Ok(Self {
            root,
            grabber,
            templates: Mutex::new(HashMap::new()),
        })
    }

    /// Load (and cache) a grayscale template by file name
    fn template(&self, name: &str) -> AutofillResult<Arc<GrayImage>> {
        if let Some(template) = self.templates.lock().get(name) {
            return Ok(Arc::clone(template));
        }

        let path = self.root.join(name);
        let image = image::open(&path).map_err(|e| {
            AutofillError::Template(format!("Failed to load template {}: {}", path.display(), e))
        })?;
        let gray = Arc::new(image.to_luma8());

        self.templates
            .lock()
            .insert(name.to_string(), Arc::clone(&gray));
        Ok(gray)
    }

    fn locate_in_frame(
        &self,
        frame: &ScreenFrame,
        screen: &GrayImage,
        name: &str,
        confidence: f32,
    ) -> AutofillResult<Option<Point>> {
        let template = self.template(name)?;

        let Some(found) = find_template(screen, &template) else {
            tracing::debug!(template = name, "template larger than screen");
            return Ok(None);
        };

        tracing::debug!(
            template = name,
            score = found.score,
            x = found.x,
            y = found.y,
            "best template match"
        );

        if found.score < confidence {
            return Ok(None);
        }

        let cx = found.x as f64 + template.width() as f64 / 2.0;
        let cy = found.y as f64 + template.height() as f64 / 2.0;
        Ok(Some(frame.to_logical(cx, cy)))
    }
}

impl ScreenLocator for TemplateLocator {
    fn locate(&self, template: &str, confidence: f32) -> AutofillResult<Option<Point>> {
        let frame = self.grabber.grab_full()?;
        let screen = frame.image.to_luma8();
        self.locate_in_frame(&frame, &screen, template, confidence)
    }

    /// One capture, templates scored in parallel
    fn locate_many(
        &self,
        templates: &[String],
        confidence: f32,
    ) -> AutofillResult<Vec<(String, Option<Point>)>> {
        let frame = self.grabber.grab_full()?;
        let screen = frame.image.to_luma8();

        templates
            .par_iter()
            .map(|name| {
                let hit = self.locate_in_frame(&frame, &screen, name, confidence)?;
                Ok((name.clone(), hit))
            })
            .collect()
    }

    fn list_templates(&self) -> AutofillResult<Vec<String>> {
        let mut names = Vec::new();

        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !path.is_file() || !is_image_file(&path) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Best match of a template: top-left corner and similarity in [-1, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemplateMatch {
    pub x: u32,
    pub y: u32,
    pub score: f32,
}

/// Find the best match of `template` in `screen`.
///
/// Candidate positions are ranked by normalized squared error, on a
/// downscaled pair when the template is large enough. Each candidate is then
/// scored at full resolution with the zero-mean normalized correlation in a
/// small window around it. Returns `None` when the template does not fit
/// inside the screen.
pub fn find_template(screen: &GrayImage, template: &GrayImage) -> Option<TemplateMatch> {
    if template.width() == 0
        || template.height() == 0
        || template.width() > screen.width()
        || template.height() > screen.height()
    {
        return None;
    }

    let factor = pyramid_factor(template);
    let candidates = if factor == 1 {
        ranked_positions(screen, template, COARSE_CANDIDATES, (template.width() / 2).max(1))
    } else {
        let small_screen = downscale(screen, factor);
        let small_template = downscale(template, factor);
        ranked_positions(
            &small_screen,
            &small_template,
            COARSE_CANDIDATES,
            (small_template.width() / 2).max(1),
        )
        .into_iter()
        .map(|(x, y)| (x * factor, y * factor))
        .collect()
    };

    let scorer = ZeroMeanTemplate::new(template);
    let margin = 2 * factor;

    candidates
        .into_iter()
        .filter_map(|(cx, cy)| {
            let x0 = cx.saturating_sub(margin);
            let y0 = cy.saturating_sub(margin);
            let x_last = (cx + margin).min(screen.width() - template.width());
            let y_last = (cy + margin).min(screen.height() - template.height());
            scorer.best_in(screen, x0..=x_last, y0..=y_last)
        })
        .max_by(|a, b| a.score.total_cmp(&b.score))
}

/// Downscale factor keeping the template's short side at >= 8 px
fn pyramid_factor(template: &GrayImage) -> u32 {
    (template.width().min(template.height()) / 8).clamp(1, 4)
}

fn downscale(image: &GrayImage, factor: u32) -> GrayImage {
    imageops::resize(
        image,
        (image.width() / factor).max(1),
        (image.height() / factor).max(1),
        FilterType::Triangle,
    )
}

/// Up to `count` lowest-error positions, at least `spacing` px apart on one axis
fn ranked_positions(
    screen: &GrayImage,
    template: &GrayImage,
    count: usize,
    spacing: u32,
) -> Vec<(u32, u32)> {
    if template.width() > screen.width() || template.height() > screen.height() {
        return Vec::new();
    }

    let errors = match_template(
        screen,
        template,
        MatchTemplateMethod::SumOfSquaredErrorsNormalized,
    );

    // All-black windows divide by zero; those are not finite and never rank
    let mut ranked: Vec<(u32, u32, f32)> = errors
        .enumerate_pixels()
        .filter(|(_, _, p)| p[0].is_finite())
        .map(|(x, y, p)| (x, y, p[0]))
        .collect();
    ranked.sort_by(|a, b| a.2.total_cmp(&b.2));

    let mut picked: Vec<(u32, u32)> = Vec::with_capacity(count);
    for (x, y, _) in ranked {
        if picked.len() == count {
            break;
        }
        let far_enough = picked
            .iter()
            .all(|(px, py)| px.abs_diff(x) >= spacing || py.abs_diff(y) >= spacing);
        if far_enough {
            picked.push((x, y));
        }
    }
    picked
}

/// Template prepared for zero-mean normalized correlation
struct ZeroMeanTemplate {
    width: u32,
    height: u32,
    deviations: Vec<f64>,
    norm: f64,
}

impl ZeroMeanTemplate {
    fn new(template: &GrayImage) -> Self {
        let n = (template.width() * template.height()) as f64;
        let mean = template.pixels().map(|p| p[0] as f64).sum::<f64>() / n;
        let deviations: Vec<f64> = template.pixels().map(|p| p[0] as f64 - mean).collect();
        let norm = deviations.iter().map(|d| d * d).sum::<f64>().sqrt();

        Self {
            width: template.width(),
            height: template.height(),
            deviations,
            norm,
        }
    }

    /// Similarity of the window with top-left `(x, y)`; flat windows score 0
    fn score_at(&self, screen: &GrayImage, x: u32, y: u32) -> f32 {
        let n = self.deviations.len() as f64;
        let mut sum = 0.0;
        for ty in 0..self.height {
            for tx in 0..self.width {
                sum += screen.get_pixel(x + tx, y + ty)[0] as f64;
            }
        }
        let mean = sum / n;

        let mut cross = 0.0;
        let mut energy = 0.0;
        for ty in 0..self.height {
            for tx in 0..self.width {
                let d = screen.get_pixel(x + tx, y + ty)[0] as f64 - mean;
                cross += d * self.deviations[(ty * self.width + tx) as usize];
                energy += d * d;
            }
        }

        let denom = energy.sqrt() * self.norm;
        if denom < f64::EPSILON {
            return 0.0;
        }
        (cross / denom) as f32
    }

    fn best_in(
        &self,
        screen: &GrayImage,
        xs: std::ops::RangeInclusive<u32>,
        ys: std::ops::RangeInclusive<u32>,
    ) -> Option<TemplateMatch> {
        let mut best: Option<TemplateMatch> = None;
        for y in ys {
            for x in xs.clone() {
                let score = self.score_at(screen, x, y);
                if best.map_or(true, |b| score > b.score) {
                    best = Some(TemplateMatch { x, y, score });
                }
            }
        }
        best
    }
}

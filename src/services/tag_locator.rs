use tracing::{debug, info, warn};

use crate::errors::AutofillResult;
use crate::models::point::Point;
use crate::services::template_locator::ScreenLocator;

/// Finds the specimen tag by searching for every known tag digit image
pub struct TagLocator<'a> {
    locator: &'a dyn ScreenLocator,
    confidence: f32,
}

impl<'a> TagLocator<'a> {
    pub fn new(locator: &'a dyn ScreenLocator, confidence: f32) -> Self {
        Self { locator, confidence }
    }

    /// Center of the tag, or `None` when no tag image is on screen
    pub fn find_tag(&self) -> AutofillResult<Option<Point>> {
        let templates = self.locator.list_templates()?;
        debug!(count = templates.len(), "searching for tag images");

        let hits = match self.locator.locate_many(&templates, self.confidence) {
            Ok(hits) => hits,
            Err(e) => {
                // One unreadable image should not hide the others
                warn!(error = %e, "batch tag search failed, searching one by one");
                self.locate_each(&templates)?
            }
        };

        let centers: Vec<Point> = hits
            .into_iter()
            .filter_map(|(name, hit)| {
                match hit {
                    Some(p) => debug!(template = %name, x = p.x, y = p.y, "tag image found"),
                    None => debug!(template = %name, "tag image not on screen"),
                }
                hit
            })
            .collect();

        let center = tag_center(&centers);
        match center {
            Some(p) => info!(x = p.x, y = p.y, found = centers.len(), "specimen tag located"),
            None => warn!("no tags found"),
        }
        Ok(center)
    }

    fn locate_each(&self, templates: &[String]) -> AutofillResult<Vec<(String, Option<Point>)>> {
        let mut hits = Vec::with_capacity(templates.len());
        for name in templates {
            match self.locator.locate(name, self.confidence) {
                Ok(hit) => hits.push((name.clone(), hit)),
                Err(e) => warn!(template = %name, error = %e, "skipping tag image"),
            }
        }
        Ok(hits)
    }
}

/// Horizontal midpoint of the outermost hits and the mean height of all hits
pub fn tag_center(points: &[Point]) -> Option<Point> {
    let min_x = points.iter().map(|p| p.x).min()?;
    let max_x = points.iter().map(|p| p.x).max()?;
    let sum_y: i64 = points.iter().map(|p| p.y as i64).sum();

    Some(Point::new(
        (min_x + max_x) / 2,
        (sum_y / points.len() as i64) as i32,
    ))
}

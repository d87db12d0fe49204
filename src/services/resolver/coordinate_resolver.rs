use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::iter;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::errors::{AutofillError, AutofillResult};
use crate::models::config::GridConfig;
use crate::models::coordinate_map::{CalibrationReport, CoordinateMap};
use crate::models::point::Point;
use crate::services::pointer::PointerControl;
use crate::services::resolver::grid::grid_layout;
use crate::services::resolver::plan::{ResolutionPlan, Source};
use crate::services::template_locator::ScreenLocator;

/// Key the grid's open button is stored under
pub const GRID_OPEN_KEY: &str = "det_add";

/// Outcome of one calibration pass
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub map: CoordinateMap,
    /// Optional keys that did not resolve, in resolution order
    pub unresolved: Vec<String>,
}

impl Resolution {
    pub fn into_report(self, confidence: f32, extended: bool) -> CalibrationReport {
        CalibrationReport {
            resolved_at: Utc::now(),
            confidence,
            extended,
            unresolved: self.unresolved,
            coordinates: self.map,
        }
    }
}

/// Turns a resolution plan into a coordinate map by locating anchors.
///
/// With a grid configured (extended mode) it also opens the determination
/// grid, derives the grid field coordinates and closes it again.
pub struct CoordinateResolver<'a> {
    locator: &'a dyn ScreenLocator,
    pointer: &'a dyn PointerControl,
    plan: ResolutionPlan,
    grid: Option<GridConfig>,
}

impl<'a> CoordinateResolver<'a> {
    pub fn new(
        locator: &'a dyn ScreenLocator,
        pointer: &'a dyn PointerControl,
        plan: ResolutionPlan,
    ) -> Self {
        Self {
            locator,
            pointer,
            plan,
            grid: None,
        }
    }

    /// Enable extended mode
    pub fn with_grid(mut self, grid: GridConfig) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Every key this resolver can produce
    pub fn known_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.plan.entries().iter().map(|e| e.key.clone()).collect();
        if let Some(grid) = &self.grid {
            keys.push(GRID_OPEN_KEY.to_string());
            keys.extend(grid.fields.iter().map(|f| f.name.clone()));
        }
        keys
    }

    /// Locate every anchor and derive the dependent keys.
    ///
    /// Keys listed in `required` must resolve, otherwise the whole pass
    /// fails naming the key. Other keys that cannot be resolved are
    /// reported in [`Resolution::unresolved`].
    pub fn resolve(&self, confidence: f32, required: &[String]) -> AutofillResult<Resolution> {
        if !(confidence > 0.0 && confidence <= 1.0) {
            return Err(AutofillError::Config(format!(
                "Confidence must be in (0, 1], got {}",
                confidence
            )));
        }

        let known: HashSet<String> = self.known_keys().into_iter().collect();
        if let Some(unknown) = required.iter().find(|k| !known.contains(*k)) {
            return Err(AutofillError::Config(format!(
                "Required key '{}' is not part of the resolution plan",
                unknown
            )));
        }
        let required: HashSet<&str> = required.iter().map(String::as_str).collect();

        let order = self.plan.ordered()?;
        self.check_grid_keys()?;

        info!(
            keys = order.len(),
            confidence,
            extended = self.grid.is_some(),
            "determining coordinates, don't move the mouse or change the screen layout"
        );

        let found = self.locate_anchors(confidence)?;

        let mut map = CoordinateMap::default();
        let mut unresolved = Vec::new();

        for entry in order {
            let key = entry.key.as_str();
            match &entry.source {
                Source::Anchor { candidates } => match found.get(key) {
                    Some(point) => {
                        debug!(key, x = point.x, y = point.y, "anchor resolved");
                        map.insert(key, *point);
                    }
                    None if required.contains(key) => {
                        error!(key, candidates = ?candidates, "required anchor not found");
                        return Err(AutofillError::AnchorNotFound {
                            key: key.to_string(),
                            candidates: candidates.clone(),
                        });
                    }
                    None => {
                        warn!(key, "optional anchor not found");
                        unresolved.push(key.to_string());
                    }
                },
                Source::Derived { base, offset } => match map.try_get(base) {
                    Some(base_point) => {
                        let point = base_point.offset(*offset);
                        debug!(key, base = %base, x = point.x, y = point.y, "derived coordinate");
                        map.insert(key, point);
                    }
                    None if required.contains(key) => {
                        error!(key, base = %base, "base of required key did not resolve");
                        return Err(AutofillError::DependencyUnresolved {
                            key: key.to_string(),
                            base: base.clone(),
                        });
                    }
                    None => {
                        warn!(key, base = %base, "dependency unresolved");
                        unresolved.push(key.to_string());
                    }
                },
            }
        }

        if let Some(grid) = &self.grid {
            self.resolve_grid(grid, confidence, &required, &mut map, &mut unresolved)?;
        }

        info!(
            resolved = map.len(),
            unresolved = unresolved.len(),
            "finished determining coordinates"
        );

        Ok(Resolution { map, unresolved })
    }

    /// Grid keys must not shadow plan keys or each other
    fn check_grid_keys(&self) -> AutofillResult<()> {
        let Some(grid) = &self.grid else {
            return Ok(());
        };

        let mut seen: HashSet<&str> = self.plan.entries().iter().map(|e| e.key.as_str()).collect();
        let grid_keys =
            iter::once(GRID_OPEN_KEY).chain(grid.fields.iter().map(|f| f.name.as_str()));
        for key in grid_keys {
            if !seen.insert(key) {
                error!(key, "grid key collides with another coordinate key");
                return Err(AutofillError::DuplicateKey(key.to_string()));
            }
        }
        Ok(())
    }

    /// Primary templates are searched in one batch; fallbacks are only
    /// tried, in order, for the keys whose primary was not found
    fn locate_anchors(&self, confidence: f32) -> AutofillResult<HashMap<String, Point>> {
        let anchors: Vec<(&str, &[String])> = self
            .plan
            .entries()
            .iter()
            .filter_map(|e| match &e.source {
                Source::Anchor { candidates } if !candidates.is_empty() => {
                    Some((e.key.as_str(), candidates.as_slice()))
                }
                _ => None,
            })
            .collect();

        let primaries: Vec<String> = anchors.iter().map(|(_, c)| c[0].clone()).collect();
        let primary_hits = self.locator.locate_many(&primaries, confidence)?;

        let mut found = HashMap::with_capacity(anchors.len());
        for ((key, candidates), (_, hit)) in anchors.iter().zip(primary_hits) {
            if let Some(point) = hit {
                found.insert(key.to_string(), point);
                continue;
            }

            for fallback in &candidates[1..] {
                if let Some(point) = self.locator.locate(fallback, confidence)? {
                    warn!(
                        key = *key,
                        template = %fallback,
                        "primary anchor missing, using fallback"
                    );
                    found.insert(key.to_string(), point);
                    break;
                }
            }
        }

        Ok(found)
    }

    /// Open the grid, derive its fields from the first column anchor, close it.
    ///
    /// The close button is clicked whenever the grid was opened, even if
    /// the column anchor could not be found.
    fn resolve_grid(
        &self,
        grid: &GridConfig,
        confidence: f32,
        required: &HashSet<&str>,
        map: &mut CoordinateMap,
        unresolved: &mut Vec<String>,
    ) -> AutofillResult<()> {
        let field_names: Vec<&str> = grid.fields.iter().map(|f| f.name.as_str()).collect();
        let needs_grid = required.contains(GRID_OPEN_KEY)
            || field_names.iter().any(|k| required.contains(k));

        let Some(open) = self.locator.locate(&grid.open_template, confidence)? else {
            if needs_grid {
                error!(key = GRID_OPEN_KEY, "determination grid button not found");
                return Err(AutofillError::AnchorNotFound {
                    key: GRID_OPEN_KEY.to_string(),
                    candidates: vec![grid.open_template.clone()],
                });
            }
            warn!("determination grid button not found, skipping grid");
            unresolved.push(GRID_OPEN_KEY.to_string());
            unresolved.extend(field_names.iter().map(|k| k.to_string()));
            return Ok(());
        };
        map.insert(GRID_OPEN_KEY, open);

        self.pointer.left_click(open)?;
        if grid.settle_ms > 0 {
            thread::sleep(Duration::from_millis(grid.settle_ms));
        }

        let anchor = self.locator.locate(&grid.anchor_template, confidence);
        let close = self.locator.locate(&grid.close_template, confidence);

        match close {
            Ok(Some(close_point)) => self.pointer.left_click(close_point)?,
            Ok(None) => warn!(
                template = %grid.close_template,
                "grid close button not found, grid left open"
            ),
            Err(ref e) => warn!(error = %e, "grid close button lookup failed, grid left open"),
        }

        match anchor? {
            Some(anchor) => {
                let fields: Vec<(&str, u32)> =
                    grid.fields.iter().map(|f| (f.name.as_str(), f.column)).collect();
                let points = grid_layout(anchor, grid.column_width, grid.row_offset, &fields);
                for (name, point) in points {
                    debug!(key = %name, x = point.x, y = point.y, "grid coordinate");
                    map.insert(name, point);
                }
            }
            None if field_names.iter().any(|k| required.contains(k)) => {
                error!(template = %grid.anchor_template, "determination grid anchor not found");
                return Err(AutofillError::AnchorNotFound {
                    key: field_names.first().map(|k| k.to_string()).unwrap_or_default(),
                    candidates: vec![grid.anchor_template.clone()],
                });
            }
            None => {
                warn!("determination grid anchor not found");
                unresolved.extend(field_names.iter().map(|k| k.to_string()));
            }
        }

        close.map(|_| ())
    }
}

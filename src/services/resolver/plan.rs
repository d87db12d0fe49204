use std::collections::{HashMap, HashSet, VecDeque};

use crate::errors::{AutofillError, AutofillResult};
use crate::models::point::Offset;

/// Where a key's point comes from
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// Template images tried in order; the first one found wins
    Anchor { candidates: Vec<String> },
    /// Fixed offset from another key's point
    Derived { base: String, offset: Offset },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanEntry {
    pub key: String,
    pub source: Source,
}

/// Declared coordinate vocabulary plus how each key is obtained.
///
/// Entries may be declared in any order; [`ResolutionPlan::ordered`] puts
/// every derived key after its base and rejects plans that cannot be
/// ordered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionPlan {
    entries: Vec<PlanEntry>,
}

impl ResolutionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key located from one template
    pub fn anchor(self, key: &str, template: &str) -> Self {
        self.anchor_with_fallbacks(key, &[template])
    }

    /// Key located from the first of `candidates` found on screen
    pub fn anchor_with_fallbacks(mut self, key: &str, candidates: &[&str]) -> Self {
        self.entries.push(PlanEntry {
            key: key.to_string(),
            source: Source::Anchor {
                candidates: candidates.iter().map(|c| c.to_string()).collect(),
            },
        });
        self
    }

    /// Key computed as `base + (dx, dy)`
    pub fn derived(mut self, key: &str, base: &str, dx: i32, dy: i32) -> Self {
        self.entries.push(PlanEntry {
            key: key.to_string(),
            source: Source::Derived {
                base: base.to_string(),
                offset: Offset::new(dx, dy),
            },
        });
        self
    }

    /// Input field `dx` px right of a located label; the label itself is
    /// stored under `<key>_label`
    pub fn label_field(self, key: &str, template: &str, dx: i32) -> Self {
        let label = format!("{}_label", key);
        self.anchor(&label, template).derived(key, &label, dx, 0)
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    /// Entries sorted so that every base precedes the keys derived from it.
    ///
    /// Order among independent entries follows declaration order.
    pub fn ordered(&self) -> AutofillResult<Vec<&PlanEntry>> {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(self.entries.len());
        for (i, entry) in self.entries.iter().enumerate() {
            if index.insert(entry.key.as_str(), i).is_some() {
                return Err(AutofillError::DuplicateKey(entry.key.clone()));
            }
        }

        let mut pending = vec![0usize; self.entries.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.entries.len()];
        for (i, entry) in self.entries.iter().enumerate() {
            if let Source::Derived { base, .. } = &entry.source {
                let base_idx = *index.get(base.as_str()).ok_or_else(|| AutofillError::UnknownBase {
                    key: entry.key.clone(),
                    base: base.clone(),
                })?;
                pending[i] += 1;
                dependents[base_idx].push(i);
            }
        }

        let mut ready: VecDeque<usize> =
            (0..self.entries.len()).filter(|&i| pending[i] == 0).collect();
        let mut ordered = Vec::with_capacity(self.entries.len());

        while let Some(i) = ready.pop_front() {
            ordered.push(&self.entries[i]);
            for &dependent in &dependents[i] {
                pending[dependent] -= 1;
                if pending[dependent] == 0 {
                    ready.push_back(dependent);
                }
            }
        }

        if ordered.len() < self.entries.len() {
            return Err(AutofillError::CyclicPlan(self.cycle_members(&pending)));
        }

        Ok(ordered)
    }

    /// Walk base links from a stuck entry until a key repeats
    fn cycle_members(&self, pending: &[usize]) -> Vec<String> {
        let by_key: HashMap<&str, &PlanEntry> =
            self.entries.iter().map(|e| (e.key.as_str(), e)).collect();

        let Some(start) = self
            .entries
            .iter()
            .enumerate()
            .find(|(i, _)| pending[*i] > 0)
            .map(|(_, e)| e)
        else {
            return Vec::new();
        };

        let mut path: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = start;

        while seen.insert(current.key.as_str()) {
            path.push(current.key.clone());
            match &current.source {
                Source::Derived { base, .. } => match by_key.get(base.as_str()) {
                    Some(next) => current = *next,
                    None => break,
                },
                Source::Anchor { .. } => break,
            }
        }

        // Trim the lead-in so the path starts at the repeated key
        if let Some(pos) = path.iter().position(|k| *k == current.key) {
            path.drain(..pos);
        }
        path.push(current.key.clone());
        path
    }
}

/// The data-entry form's coordinate vocabulary
pub fn default_plan() -> ResolutionPlan {
    ResolutionPlan::new()
        .anchor_with_fallbacks("previous", &["previous.png", "previous_deactivated.png"])
        .anchor_with_fallbacks("next", &["next.png", "next_deactivated.png"])
        .anchor("save", "save.png")
        .anchor("pinlabels", "pinlabels.png")
        .anchor("count", "images.png")
        .anchor("numbers_more_button", "numbers_more_button.png")
        .derived("numbers_more_number", "numbers_more_button", 100, 0)
        .derived("numbers_more_type", "numbers_more_button", 600, 0)
        .anchor("collector_add", "collector.png")
        .derived("collector_name", "collector_add", 65, 0)
        .label_field("workflow_status", "workflow_status.png", 100)
        .label_field("collection", "collection.png", 100)
        .label_field("date_verbatim", "date_verbatim.png", 100)
        .label_field("date_interpreted", "date_interpreted.png", 100)
        .label_field("taxon", "associated_taxon.png", 100)
        .label_field("elevation_from", "elevation_from.png", 100)
        .label_field("elevation_to", "elevation_to.png", 100)
        .label_field("specimen_notes", "notes.png", 100)
        .label_field("sex", "sex.png", 100)
        .derived("tag_approximate", "pinlabels", 250, 260)
}

/// Keys every form action needs: all field coordinates of the default plan
pub fn default_required_keys() -> Vec<String> {
    default_plan()
        .entries()
        .iter()
        .filter(|e| !e.key.ends_with("_label"))
        .map(|e| e.key.clone())
        .collect()
}

use std::fs;
use std::path::Path;

use crate::errors::{AutofillError, AutofillResult};
use crate::models::form_entry::FormEntry;
use crate::services::session::AutomationSession;

/// Load a form entry from a JSON file
pub fn load_entry(path: &Path) -> AutofillResult<FormEntry> {
    let content = fs::read_to_string(path).map_err(|e| {
        AutofillError::Config(format!("Failed to read entry file {}: {}", path.display(), e))
    })?;
    Ok(serde_json::from_str(&content)?)
}

/// Fill the form from a JSON file
pub fn fill(session: &AutomationSession, path: &Path) -> AutofillResult<()> {
    let entry = load_entry(path)?;
    session.form().fill(&entry)
}

pub fn previous(session: &AutomationSession, to_tag: bool) -> AutofillResult<()> {
    session.previous(to_tag)
}

pub fn next(session: &AutomationSession, to_tag: bool) -> AutofillResult<()> {
    session.next(to_tag)
}

pub fn save(session: &AutomationSession) -> AutofillResult<()> {
    session.form().save()
}

use arboard::Clipboard as ArboardClipboard;
use parking_lot::Mutex;

use crate::errors::{AutofillError, AutofillResult};

/// The system clipboard, a single shared text register
pub trait Clipboard: Send + Sync {
    /// Current text content; empty when the clipboard holds no text
    fn read(&self) -> AutofillResult<String>;

    fn write(&self, text: &str) -> AutofillResult<()>;
}

/// Clipboard backed by arboard
pub struct SystemClipboard {
    inner: Mutex<ArboardClipboard>,
}

impl SystemClipboard {
    pub fn new() -> AutofillResult<Self> {
        let clipboard = ArboardClipboard::new()
            .map_err(|e| AutofillError::Clipboard(format!("Failed to open clipboard: {}", e)))?;

        Ok(Self {
            inner: Mutex::new(clipboard),
        })
    }
}

impl Clipboard for SystemClipboard {
    fn read(&self) -> AutofillResult<String> {
        match self.inner.lock().get_text() {
            Ok(text) => Ok(text),
            // Images or an empty register are not errors for text users
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(AutofillError::Clipboard(format!("Failed to read clipboard: {}", e))),
        }
    }

    fn write(&self, text: &str) -> AutofillResult<()> {
        self.inner
            .lock()
            .set_text(text)
            .map_err(|e| AutofillError::Clipboard(format!("Failed to write clipboard: {}", e)))
    }
}

/// Put `text` on the clipboard, run `paste`, then put the previous content
/// back. The restore runs even when `paste` fails.
pub fn with_clipboard_text<F>(clipboard: &dyn Clipboard, text: &str, paste: F) -> AutofillResult<()>
where
    F: FnOnce() -> AutofillResult<()>,
{
    let saved = clipboard.read()?;
    clipboard.write(text)?;

    let pasted = paste();
    let restored = clipboard.write(&saved);

    pasted?;
    restored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::FakeClipboard;

    #[test]
    fn test_previous_content_is_restored() {
        let clipboard = FakeClipboard::with_text("keep me");

        let mut seen = String::new();
        with_clipboard_text(&clipboard, "12093", || {
            seen = clipboard.read()?;
            Ok(())
        })
        .unwrap();

        assert_eq!(seen, "12093", "text should be on the clipboard during paste");
        assert_eq!(clipboard.read().unwrap(), "keep me");
    }

    #[test]
    fn test_restore_runs_when_paste_fails() {
        let clipboard = FakeClipboard::with_text("keep me");

        let result = with_clipboard_text(&clipboard, "x", || {
            Err(AutofillError::Input("paste failed".to_string()))
        });

        assert!(matches!(result, Err(AutofillError::Input(_))));
        assert_eq!(clipboard.read().unwrap(), "keep me");
    }

    #[test]
    fn test_system_clipboard_creation() {
        let result = SystemClipboard::new();
        if result.is_err() {
            println!("Skipping test - no clipboard available");
            return;
        }

        let clipboard = result.unwrap();
        assert!(clipboard.read().is_ok());
    }
}

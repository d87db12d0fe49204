//! In-memory capability fakes for unit tests

use image::DynamicImage;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};

use crate::errors::{AutofillError, AutofillResult};
use crate::models::point::Point;
use crate::models::roi::ScreenRegion;
use crate::services::clipboard::Clipboard;
use crate::services::ocr::{RecognitionMode, TextRecognizer};
use crate::services::pointer::{MouseButton, PointerControl};
use crate::services::screen_capture::{ScreenFrame, ScreenGrabber};
use crate::services::template_locator::ScreenLocator;

/// Everything the fake desktop was asked to do, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Locate(String),
    Move(Point),
    Click(Point, MouseButton, u32),
    Type(String),
    Key(String),
}

/// A fake screen: templates visible at fixed points, plus a pointer.
///
/// Clicking a registered trigger point reveals or hides templates, which is
/// enough to model a panel that must be opened before its anchors exist.
pub struct FakeDesktop {
    visible: Mutex<HashMap<String, Point>>,
    catalog: Mutex<Vec<String>>,
    reveals: Mutex<HashMap<Point, Vec<(String, Point)>>>,
    hides: Mutex<HashMap<Point, Vec<String>>>,
    pointer: Mutex<Point>,
    events: Mutex<Vec<Event>>,
}

impl FakeDesktop {
    pub fn new() -> Self {
        Self {
            visible: Mutex::new(HashMap::new()),
            catalog: Mutex::new(Vec::new()),
            reveals: Mutex::new(HashMap::new()),
            hides: Mutex::new(HashMap::new()),
            pointer: Mutex::new(Point::new(0, 0)),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Make `template` visible at `point`
    pub fn show(self, template: &str, point: Point) -> Self {
        self.visible.lock().insert(template.to_string(), point);
        self.register(template);
        self
    }

    /// A template that exists on disk but is never on screen
    pub fn register(&self, template: &str) {
        let mut catalog = self.catalog.lock();
        if !catalog.iter().any(|t| t == template) {
            catalog.push(template.to_string());
        }
    }

    /// Clicking `trigger` makes `template` appear at `point`
    pub fn reveal_on_click(self, trigger: Point, template: &str, point: Point) -> Self {
        self.reveals
            .lock()
            .entry(trigger)
            .or_default()
            .push((template.to_string(), point));
        self.register(template);
        self
    }

    /// Clicking `trigger` removes `template` from the screen
    pub fn hide_on_click(self, trigger: Point, template: &str) -> Self {
        self.hides
            .lock()
            .entry(trigger)
            .or_default()
            .push(template.to_string());
        self
    }

    pub fn with_pointer(self, point: Point) -> Self {
        *self.pointer.lock() = point;
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn clicks(&self) -> Vec<Point> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                Event::Click(p, _, _) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn is_visible(&self, template: &str) -> bool {
        self.visible.lock().contains_key(template)
    }

    pub fn pointer(&self) -> Point {
        *self.pointer.lock()
    }

    fn record(&self, event: Event) {
        self.events.lock().push(event);
    }
}

impl Default for FakeDesktop {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenLocator for FakeDesktop {
    fn locate(&self, template: &str, _confidence: f32) -> AutofillResult<Option<Point>> {
        self.record(Event::Locate(template.to_string()));
        Ok(self.visible.lock().get(template).copied())
    }

    fn list_templates(&self) -> AutofillResult<Vec<String>> {
        let mut names = self.catalog.lock().clone();
        names.sort();
        Ok(names)
    }
}

impl PointerControl for FakeDesktop {
    fn position(&self) -> AutofillResult<Point> {
        Ok(*self.pointer.lock())
    }

    fn move_to(&self, point: Point) -> AutofillResult<()> {
        *self.pointer.lock() = point;
        self.record(Event::Move(point));
        Ok(())
    }

    fn click(&self, point: Point, button: MouseButton, count: u32) -> AutofillResult<()> {
        *self.pointer.lock() = point;
        self.record(Event::Click(point, button, count));

        if let Some(shown) = self.reveals.lock().get(&point) {
            let mut visible = self.visible.lock();
            for (template, at) in shown {
                visible.insert(template.clone(), *at);
            }
        }
        if let Some(hidden) = self.hides.lock().get(&point) {
            let mut visible = self.visible.lock();
            for template in hidden {
                visible.remove(template);
            }
        }
        Ok(())
    }

    fn type_text(&self, text: &str) -> AutofillResult<()> {
        self.record(Event::Type(text.to_string()));
        Ok(())
    }

    fn key_combo(&self, combo: &str) -> AutofillResult<()> {
        self.record(Event::Key(combo.to_string()));
        Ok(())
    }
}

/// Screen grabber returning blank images and remembering the regions asked for
pub struct FakeScreen {
    regions: Mutex<Vec<ScreenRegion>>,
    fail: bool,
}

impl FakeScreen {
    pub fn new() -> Self {
        Self {
            regions: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            regions: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn regions(&self) -> Vec<ScreenRegion> {
        self.regions.lock().clone()
    }
}

impl Default for FakeScreen {
    fn default() -> Self {
        Self::new()
    }
}

impl ScreenGrabber for FakeScreen {
    fn grab(&self, region: &ScreenRegion) -> AutofillResult<DynamicImage> {
        self.regions.lock().push(*region);
        if self.fail {
            return Err(AutofillError::Capture("fake capture failure".to_string()));
        }
        Ok(DynamicImage::new_luma8(region.width, region.height))
    }

    fn grab_full(&self) -> AutofillResult<ScreenFrame> {
        if self.fail {
            return Err(AutofillError::Capture("fake capture failure".to_string()));
        }
        Ok(ScreenFrame {
            image: DynamicImage::new_luma8(64, 64),
            scale_factor: 1.0,
            origin: Point::new(0, 0),
        })
    }
}

/// Recognizer replaying scripted outputs; empty text once the script runs out
pub struct ScriptedRecognizer {
    script: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<RecognitionMode>>,
}

impl ScriptedRecognizer {
    pub fn new<I, S>(outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(outputs.into_iter().map(|s| Ok(s.into())).collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue a recognizer failure after the outputs already scripted
    pub fn then_fail(self, message: &str) -> Self {
        self.script.lock().push_back(Err(message.to_string()));
        self
    }

    pub fn then_text(self, text: &str) -> Self {
        self.script.lock().push_back(Ok(text.to_string()));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    pub fn modes(&self) -> Vec<RecognitionMode> {
        self.calls.lock().clone()
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn recognize(&self, _image: &DynamicImage, mode: RecognitionMode) -> AutofillResult<String> {
        self.calls.lock().push(mode);
        match self.script.lock().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(AutofillError::Recognition(message)),
            None => Ok(String::new()),
        }
    }
}

/// Clipboard holding one string and logging every write
pub struct FakeClipboard {
    content: Mutex<String>,
    writes: Mutex<Vec<String>>,
}

impl FakeClipboard {
    pub fn new() -> Self {
        Self::with_text("")
    }

    pub fn with_text(text: &str) -> Self {
        Self {
            content: Mutex::new(text.to_string()),
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().clone()
    }
}

impl Default for FakeClipboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clipboard for FakeClipboard {
    fn read(&self) -> AutofillResult<String> {
        Ok(self.content.lock().clone())
    }

    fn write(&self, text: &str) -> AutofillResult<()> {
        *self.content.lock() = text.to_string();
        self.writes.lock().push(text.to_string());
        Ok(())
    }
}

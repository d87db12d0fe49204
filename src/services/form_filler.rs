use std::thread;
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::AutofillResult;
use crate::models::config::GridConfig;
use crate::models::coordinate_map::CoordinateMap;
use crate::models::form_entry::{Determination, FormEntry};
use crate::models::point::Point;
use crate::services::clipboard::{with_clipboard_text, Clipboard};
use crate::services::pointer::PointerControl;
use crate::services::resolver::GRID_OPEN_KEY;

/// Click-and-paste actions on the data-entry form.
///
/// Every action checks that all coordinates it needs are present before it
/// touches the screen.
pub struct FormFiller<'a> {
    coordinates: &'a CoordinateMap,
    pointer: &'a dyn PointerControl,
    clipboard: &'a dyn Clipboard,
    action_delay: Duration,
    paste_settle: Duration,
    grid: GridConfig,
}

impl<'a> FormFiller<'a> {
    pub fn new(
        coordinates: &'a CoordinateMap,
        pointer: &'a dyn PointerControl,
        clipboard: &'a dyn Clipboard,
    ) -> Self {
        Self {
            coordinates,
            pointer,
            clipboard,
            action_delay: Duration::ZERO,
            paste_settle: Duration::ZERO,
            grid: GridConfig::default(),
        }
    }

    pub fn with_action_delay(mut self, delay: Duration) -> Self {
        self.action_delay = delay;
        self
    }

    /// Wait between the paste keystroke and the clipboard restore
    pub fn with_paste_settle(mut self, settle: Duration) -> Self {
        self.paste_settle = settle;
        self
    }

    /// Grid layout used by [`FormFiller::determination`]
    pub fn with_grid(mut self, grid: GridConfig) -> Self {
        self.grid = grid;
        self
    }

    fn pause(&self) {
        sleep_for(self.action_delay);
    }

    fn click_key(&self, key: &str) -> AutofillResult<()> {
        let point = self.coordinates.get(key)?;
        self.pointer.left_click(point)?;
        self.pause();
        Ok(())
    }

    fn press(&self, combo: &str) -> AutofillResult<()> {
        self.pointer.key_combo(combo)?;
        self.pause();
        Ok(())
    }

    /// Paste `text`, after clicking `target` when given. The clipboard
    /// content from before is restored afterwards.
    pub fn write_with_clipboard(&self, text: &str, target: Option<&str>) -> AutofillResult<()> {
        if let Some(key) = target {
            self.click_key(key)?;
        }

        debug!(field = ?target, chars = text.chars().count(), "pasting text");
        with_clipboard_text(self.clipboard, text, || {
            self.pointer.key_combo("ctrl+v")?;
            sleep_for(self.paste_settle);
            Ok(())
        })?;
        self.pause();
        Ok(())
    }

    /// Go to the previous record
    pub fn previous(&self, position_after: Option<Point>, pinlabels: bool) -> AutofillResult<()> {
        self.navigate("previous", position_after, pinlabels)
    }

    /// Go to the next record
    pub fn next(&self, position_after: Option<Point>, pinlabels: bool) -> AutofillResult<()> {
        self.navigate("next", position_after, pinlabels)
    }

    /// Click a navigation control, optionally open the pin labels tab, and
    /// park the pointer at `position_after` (default: where it was)
    fn navigate(
        &self,
        control: &str,
        position_after: Option<Point>,
        pinlabels: bool,
    ) -> AutofillResult<()> {
        if pinlabels {
            self.coordinates.require(&[control, "pinlabels"])?;
        }

        let position_after = match position_after {
            Some(point) => point,
            None => self.pointer.position()?,
        };

        self.click_key(control)?;
        if pinlabels {
            self.click_key("pinlabels")?;
        }
        self.pointer.move_to(position_after)?;

        info!(control, "navigated");
        Ok(())
    }

    pub fn save(&self) -> AutofillResult<()> {
        self.press("alt+s")?;
        info!("record saved");
        Ok(())
    }

    pub fn collection(&self, name: &str) -> AutofillResult<()> {
        self.write_with_clipboard(name, Some("collection"))?;
        self.press("enter")
    }

    pub fn collector(&self, name: &str) -> AutofillResult<()> {
        self.coordinates.require(&["collector_add", "collector_name"])?;
        self.click_key("collector_add")?;
        self.write_with_clipboard(name, Some("collector_name"))?;
        self.press("enter")
    }

    /// Add a number under "Numbers & More"
    pub fn numbers_more(&self, number: &str, number_type: &str) -> AutofillResult<()> {
        self.coordinates.require(&[
            "numbers_more_button",
            "numbers_more_number",
            "numbers_more_type",
        ])?;
        self.click_key("numbers_more_button")?;
        self.click_key("numbers_more_number")?;
        self.pointer.type_text(number)?;
        self.pause();
        self.write_with_clipboard(number_type, Some("numbers_more_type"))?;
        self.press("enter")
    }

    /// Verbatim date plus its interpreted `yyyy/mm/dd` form
    pub fn date(&self, verbatim: &str, interpreted: &str) -> AutofillResult<()> {
        self.coordinates.require(&["date_verbatim", "date_interpreted"])?;
        self.write_with_clipboard(verbatim, Some("date_verbatim"))?;
        self.write_with_clipboard(interpreted, Some("date_interpreted"))
    }

    pub fn taxon(&self, name: &str) -> AutofillResult<()> {
        self.write_with_clipboard(name, Some("taxon"))
    }

    pub fn elevation(&self, from: &str, to: &str) -> AutofillResult<()> {
        self.coordinates.require(&["elevation_from", "elevation_to"])?;
        self.write_with_clipboard(from, Some("elevation_from"))?;
        self.write_with_clipboard(to, Some("elevation_to"))
    }

    pub fn notes(&self, text: &str) -> AutofillResult<()> {
        self.write_with_clipboard(text, Some("specimen_notes"))
    }

    pub fn sex(&self, sex: &str) -> AutofillResult<()> {
        self.write_with_clipboard(&capitalize(sex), Some("sex"))?;
        self.press("enter")
    }

    pub fn workflow_status(&self, status: &str) -> AutofillResult<()> {
        self.write_with_clipboard(status, Some("workflow_status"))?;
        self.press("enter")
    }

    /// Open a new determination row and paste each provided part into its
    /// grid column
    pub fn determination(&self, determination: &Determination) -> AutofillResult<()> {
        let fields = determination.fields(&self.grid.fields)?;
        let mut keys: Vec<&str> = vec![GRID_OPEN_KEY];
        keys.extend(fields.iter().map(|(key, _)| *key));
        self.coordinates.require(&keys)?;

        self.click_key(GRID_OPEN_KEY)?;
        sleep_for(Duration::from_millis(self.grid.settle_ms));

        for (key, value) in fields {
            self.write_with_clipboard(value, Some(key))?;
        }
        Ok(())
    }

    /// Fill every provided part of `entry`, in form order
    pub fn fill(&self, entry: &FormEntry) -> AutofillResult<()> {
        if let Some(collection) = &entry.collection {
            self.collection(collection)?;
        }
        if let Some(collector) = &entry.collector {
            self.collector(collector)?;
        }
        if let Some(number) = &entry.number {
            self.numbers_more(&number.number, &number.number_type)?;
        }
        if let Some(date) = &entry.date {
            self.date(&date.verbatim, &date.interpreted)?;
        }
        if let Some(taxon) = &entry.taxon {
            self.taxon(taxon)?;
        }
        if let Some(elevation) = &entry.elevation {
            self.elevation(&elevation.from, &elevation.to)?;
        }
        if let Some(notes) = &entry.notes {
            self.notes(notes)?;
        }
        if let Some(sex) = &entry.sex {
            self.sex(sex)?;
        }
        if let Some(status) = &entry.workflow_status {
            self.workflow_status(status)?;
        }
        if let Some(determination) = &entry.determination {
            self.determination(determination)?;
        }
        if entry.save {
            self.save()?;
        }
        Ok(())
    }
}

fn sleep_for(duration: Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

/// First character upper case, the rest lower case
fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AutofillError;
    use crate::models::form_entry::{DateEntry, NumberEntry};
    use crate::models::config::GridFieldConfig;
    use crate::services::pointer::MouseButton;
    use crate::services::testing::{Event, FakeClipboard, FakeDesktop};
    use parking_lot::Mutex;
    use std::time::Instant;

    /// Clipboard and keyboard sharing one timestamped log
    struct InputTimeline {
        content: Mutex<String>,
        log: Mutex<Vec<(String, Instant)>>,
    }

    impl InputTimeline {
        fn new(text: &str) -> Self {
            Self {
                content: Mutex::new(text.to_string()),
                log: Mutex::new(Vec::new()),
            }
        }

        fn record(&self, step: String) {
            self.log.lock().push((step, Instant::now()));
        }

        fn steps(&self) -> Vec<String> {
            self.log.lock().iter().map(|(step, _)| step.clone()).collect()
        }

        fn at(&self, step: &str) -> Instant {
            self.log
                .lock()
                .iter()
                .find(|(s, _)| s == step)
                .map(|(_, t)| *t)
                .unwrap()
        }
    }

    impl Clipboard for InputTimeline {
        fn read(&self) -> AutofillResult<String> {
            Ok(self.content.lock().clone())
        }

        fn write(&self, text: &str) -> AutofillResult<()> {
            *self.content.lock() = text.to_string();
            self.record(format!("write:{}", text));
            Ok(())
        }
    }

    impl PointerControl for InputTimeline {
        fn position(&self) -> AutofillResult<Point> {
            Ok(Point::new(0, 0))
        }

        fn move_to(&self, _point: Point) -> AutofillResult<()> {
            Ok(())
        }

        fn click(&self, point: Point, _button: MouseButton, _count: u32) -> AutofillResult<()> {
            self.record(format!("click:{}", point));
            Ok(())
        }

        fn type_text(&self, text: &str) -> AutofillResult<()> {
            self.record(format!("type:{}", text));
            Ok(())
        }

        fn key_combo(&self, combo: &str) -> AutofillResult<()> {
            self.record(format!("key:{}", combo));
            Ok(())
        }
    }

    fn quick_grid() -> GridConfig {
        GridConfig {
            settle_ms: 0,
            ..GridConfig::default()
        }
    }

    fn map() -> CoordinateMap {
        CoordinateMap::from_entries([
            ("previous", Point::new(10, 10)),
            ("next", Point::new(20, 10)),
            ("pinlabels", Point::new(30, 10)),
            ("collection", Point::new(100, 100)),
            ("collector_add", Point::new(100, 200)),
            ("collector_name", Point::new(165, 200)),
            ("numbers_more_button", Point::new(100, 300)),
            ("numbers_more_number", Point::new(200, 300)),
            ("numbers_more_type", Point::new(700, 300)),
            ("date_verbatim", Point::new(100, 400)),
            ("date_interpreted", Point::new(100, 420)),
            ("sex", Point::new(100, 500)),
            ("det_add", Point::new(50, 600)),
            ("det_genus", Point::new(60, 620)),
            ("det_date", Point::new(760, 620)),
        ])
    }

    fn click(x: i32, y: i32) -> Event {
        Event::Click(Point::new(x, y), MouseButton::Left, 1)
    }

    fn paste() -> Event {
        Event::Key("ctrl+v".to_string())
    }

    #[test]
    fn test_write_with_clipboard_restores_content() {
        let coords = map();
        let desktop = FakeDesktop::new();
        let clipboard = FakeClipboard::with_text("original");
        let filler = FormFiller::new(&coords, &desktop, &clipboard);

        filler.write_with_clipboard("Sunira", Some("collection")).unwrap();

        assert_eq!(desktop.events(), vec![click(100, 100), paste()]);
        assert_eq!(clipboard.writes(), vec!["Sunira", "original"]);
        assert_eq!(clipboard.read().unwrap(), "original");
    }

    #[test]
    fn test_paste_settles_before_clipboard_restore() {
        let coords = map();
        let timeline = InputTimeline::new("original");
        let settle = Duration::from_millis(40);
        let filler = FormFiller::new(&coords, &timeline, &timeline).with_paste_settle(settle);

        filler.write_with_clipboard("12093", None).unwrap();

        assert_eq!(
            timeline.steps(),
            vec!["write:12093", "key:ctrl+v", "write:original"]
        );
        let waited = timeline.at("write:original") - timeline.at("key:ctrl+v");
        assert!(waited >= settle, "clipboard restored after only {:?}", waited);
    }

    #[test]
    fn test_write_without_target_only_pastes() {
        let coords = map();
        let desktop = FakeDesktop::new();
        let clipboard = FakeClipboard::new();
        let filler = FormFiller::new(&coords, &desktop, &clipboard);

        filler.write_with_clipboard("x", None).unwrap();
        assert_eq!(desktop.events(), vec![paste()]);
    }

    #[test]
    fn test_next_returns_pointer() {
        let coords = map();
        let desktop = FakeDesktop::new().with_pointer(Point::new(555, 444));
        let clipboard = FakeClipboard::new();
        let filler = FormFiller::new(&coords, &desktop, &clipboard);

        filler.next(None, true).unwrap();

        assert_eq!(
            desktop.events(),
            vec![click(20, 10), click(30, 10), Event::Move(Point::new(555, 444))]
        );
    }

    #[test]
    fn test_previous_to_given_position_without_pinlabels() {
        let coords = map();
        let desktop = FakeDesktop::new();
        let clipboard = FakeClipboard::new();
        let filler = FormFiller::new(&coords, &desktop, &clipboard);

        filler.previous(Some(Point::new(1, 2)), false).unwrap();

        assert_eq!(desktop.events(), vec![click(10, 10), Event::Move(Point::new(1, 2))]);
    }

    #[test]
    fn test_numbers_more_sequence() {
        let coords = map();
        let desktop = FakeDesktop::new();
        let clipboard = FakeClipboard::new();
        let filler = FormFiller::new(&coords, &desktop, &clipboard);

        filler.numbers_more("12093", "Collection Number").unwrap();

        assert_eq!(
            desktop.events(),
            vec![
                click(100, 300),
                click(200, 300),
                Event::Type("12093".to_string()),
                click(700, 300),
                paste(),
                Event::Key("enter".to_string()),
            ]
        );
        assert_eq!(clipboard.writes()[0], "Collection Number");
    }

    #[test]
    fn test_missing_coordinate_fails_before_any_input() {
        let coords = CoordinateMap::from_entries([("collector_add", Point::new(1, 1))]);
        let desktop = FakeDesktop::new();
        let clipboard = FakeClipboard::new();
        let filler = FormFiller::new(&coords, &desktop, &clipboard);

        let err = filler.collector("Weber, Paul (1881-1968)").unwrap_err();

        assert!(matches!(err, AutofillError::MissingCoordinate(ref k) if k == "collector_name"));
        assert!(desktop.events().is_empty(), "no click should happen with an incomplete map");
    }

    #[test]
    fn test_sex_is_capitalized() {
        let coords = map();
        let desktop = FakeDesktop::new();
        let clipboard = FakeClipboard::new();
        let filler = FormFiller::new(&coords, &desktop, &clipboard);

        filler.sex("fEMALE").unwrap();
        assert_eq!(clipboard.writes()[0], "Female");
    }

    #[test]
    fn test_determination_pastes_provided_fields() {
        let coords = map();
        let desktop = FakeDesktop::new();
        let clipboard = FakeClipboard::new();
        let filler = FormFiller::new(&coords, &desktop, &clipboard).with_grid(quick_grid());

        let det = Determination {
            genus: Some("Sunira".into()),
            date: Some("1985".into()),
            ..Default::default()
        };
        filler.determination(&det).unwrap();

        assert_eq!(
            desktop.clicks(),
            vec![Point::new(50, 600), Point::new(60, 620), Point::new(760, 620)]
        );
        let pasted: Vec<String> = clipboard.writes().into_iter().step_by(2).collect();
        assert_eq!(pasted, vec!["Sunira", "1985"]);
    }

    #[test]
    fn test_determination_uses_configured_field_names() {
        let coords = CoordinateMap::from_entries([
            ("det_add", Point::new(50, 600)),
            ("genus_cell", Point::new(60, 640)),
        ]);
        let desktop = FakeDesktop::new();
        let clipboard = FakeClipboard::new();
        let grid = GridConfig {
            fields: vec![GridFieldConfig {
                name: "genus_cell".into(),
                column: 0,
            }],
            ..quick_grid()
        };
        let filler = FormFiller::new(&coords, &desktop, &clipboard).with_grid(grid);

        let det = Determination {
            genus: Some("Sunira".into()),
            ..Default::default()
        };
        filler.determination(&det).unwrap();

        assert_eq!(desktop.clicks(), vec![Point::new(50, 600), Point::new(60, 640)]);
        assert_eq!(clipboard.writes()[0], "Sunira");
    }

    #[test]
    fn test_fill_runs_in_form_order_and_saves() {
        let coords = map();
        let desktop = FakeDesktop::new();
        let clipboard = FakeClipboard::new();
        let filler = FormFiller::new(&coords, &desktop, &clipboard);

        let entry = FormEntry {
            collection: Some("Weber, Paul (1881-1968)".into()),
            number: Some(NumberEntry {
                number: "12093".into(),
                number_type: "Collection Number".into(),
            }),
            date: Some(DateEntry {
                verbatim: "V.1934".into(),
                interpreted: "1934/05".into(),
            }),
            save: true,
            ..Default::default()
        };
        filler.fill(&entry).unwrap();

        let pasted: Vec<String> = clipboard.writes().into_iter().step_by(2).collect();
        assert_eq!(
            pasted,
            vec!["Weber, Paul (1881-1968)", "Collection Number", "V.1934", "1934/05"]
        );
        assert_eq!(desktop.events().last(), Some(&Event::Key("alt+s".to_string())));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("male"), "Male");
        assert_eq!(capitalize("MALE"), "Male");
        assert_eq!(capitalize(""), "");
    }
}

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::models::point::Offset;

/// Template image locations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TemplateConfig {
    /// Directory holding the anchor images (`previous.png`, `save.png`, ...)
    pub dir: PathBuf,
    /// Directory holding the specimen tag digit images used by auto-locate
    pub tag_digits_dir: PathBuf,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("imgs"),
            tag_digits_dir: PathBuf::from("imgs/tags/digits"),
        }
    }
}

/// One sub-field of the determination grid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridFieldConfig {
    /// Coordinate key the field is stored under
    pub name: String,
    /// Grid column, which also fixes the determination part pasted there:
    /// 0 genus, 1 species, 2 subspecies, 3 infraspecific, 4 infrarank,
    /// 5 author, 6 determiner, 7 date, 8 verbatim
    pub column: u32,
}

impl GridFieldConfig {
    fn new(name: &str, column: u32) -> Self {
        Self {
            name: name.to_string(),
            column,
        }
    }
}

/// Determination entry grid, resolved only in extended mode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridConfig {
    /// Button that opens the grid; stored in the map as `det_add`
    pub open_template: String,
    /// Header of the first grid column
    pub anchor_template: String,
    /// Button that closes the grid again
    pub close_template: String,
    pub column_width: i32,
    pub row_offset: i32,
    /// Pause after opening the grid before anchors are searched
    pub settle_ms: u64,
    pub fields: Vec<GridFieldConfig>,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            open_template: "determination_add.png".to_string(),
            anchor_template: "determination_genus.png".to_string(),
            close_template: "determination_close.png".to_string(),
            column_width: 150,
            row_offset: 30,
            settle_ms: 500,
            fields: vec![
                GridFieldConfig::new("det_genus", 0),
                GridFieldConfig::new("det_species", 1),
                GridFieldConfig::new("det_subspecies", 2),
                GridFieldConfig::new("det_infraspecific", 3),
                GridFieldConfig::new("det_infrarank", 4),
                GridFieldConfig::new("det_author", 5),
                GridFieldConfig::new("det_determiner", 6),
                GridFieldConfig::new("det_date", 7),
                GridFieldConfig::new("det_verbatim", 8),
            ],
        }
    }
}

/// Calibration settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResolverConfig {
    /// Minimum template similarity (0, 1]
    pub confidence: f32,
    /// Also resolve the determination grid
    pub extended: bool,
    #[serde(default)]
    pub grid: GridConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            confidence: 0.9,
            extended: false,
            grid: GridConfig::default(),
        }
    }
}

/// Jittered OCR sampling parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SamplingConfig {
    pub width: u32,
    pub height: u32,
    pub jitter: i32,
    /// Valid samples needed before a unanimous run may stop early.
    /// `None` means `num_samples`.
    pub min_samples: Option<u32>,
    pub num_samples: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 80,
            jitter: 15,
            min_samples: Some(3),
            num_samples: 5,
        }
    }
}

/// Specimen tag auto-locate settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TagConfig {
    pub confidence: f32,
    /// Offset of `tag_approximate` from the `pinlabels` button
    pub approximate_offset: Offset,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            confidence: 0.5,
            approximate_offset: Offset::new(250, 260),
        }
    }
}

/// Specimen-number cleaning constants.
///
/// Tuned to one label font: a 5-char read starting with `(` is a misread
/// `1`, a 6-char read carries one spurious leading digit, and a 5-digit
/// read starting with `8` is really a `3`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DigitHeuristics {
    pub min_value: u32,
    pub max_value: u32,
    pub paren_fix_len: usize,
    pub drop_leading_len: usize,
    pub eight_fix_len: usize,
}

impl Default for DigitHeuristics {
    fn default() -> Self {
        Self {
            min_value: 1,
            max_value: 63000,
            paren_fix_len: 5,
            drop_leading_len: 6,
            eight_fix_len: 5,
        }
    }
}

/// Tesseract settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OcrConfig {
    /// Directory containing the tesseract executable, prepended to PATH
    #[serde(default)]
    pub tesseract_dir: Option<PathBuf>,
    pub lang: String,
    pub psm: i32,
    pub oem: i32,
    /// Scale factor applied before recognition (1.0 = none)
    pub upscale: f64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_dir: None,
            lang: "eng".to_string(),
            psm: 6,
            oem: 3,
            upscale: 1.0,
        }
    }
}

/// Synthesized input pacing
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub action_delay_ms: u64,
    /// Wait after the paste keystroke before the old clipboard content is
    /// put back; the target application reads the clipboard asynchronously
    pub paste_settle_ms: u64,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            action_delay_ms: 50,
            paste_settle_ms: 100,
        }
    }
}

/// Values used by the number + collection macro
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MacroConfig {
    pub number_type: String,
    pub collection: String,
}

impl Default for MacroConfig {
    fn default() -> Self {
        Self {
            number_type: "Collection Number".to_string(),
            collection: "Born-Moser, Paul (1859-1928)".to_string(),
        }
    }
}

/// Logging output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub templates: TemplateConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub tag: TagConfig,
    #[serde(default)]
    pub heuristics: DigitHeuristics,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default, rename = "macro")]
    pub macro_values: MacroConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

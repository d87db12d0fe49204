use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutofillError {
    #[error("Anchor '{key}' not found on screen (tried: {})", candidates.join(", "))]
    AnchorNotFound { key: String, candidates: Vec<String> },

    #[error("'{key}' depends on '{base}', which did not resolve")]
    DependencyUnresolved { key: String, base: String },

    #[error("Resolution plan contains a dependency cycle: {}", .0.join(" -> "))]
    CyclicPlan(Vec<String>),

    #[error("'{key}' is derived from unknown key '{base}'")]
    UnknownBase { key: String, base: String },

    #[error("Duplicate key in resolution plan: {0}")]
    DuplicateKey(String),

    #[error("No coordinate for '{0}' - run calibration first")]
    MissingCoordinate(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Screen capture error: {0}")]
    Capture(String),

    #[error("Text recognition error: {0}")]
    Recognition(String),

    #[error("Input error: {0}")]
    Input(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type AutofillResult<T> = Result<T, AutofillError>;

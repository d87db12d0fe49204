pub mod engine;
pub mod parser;
pub mod preprocessing;
pub mod tesseract;

pub use engine::{RecognitionMode, TextRecognizer};
pub use parser::{clean_text, clean_text_default};
pub use tesseract::TesseractRecognizer;

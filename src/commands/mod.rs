pub mod config;
pub mod form;
pub mod ocr;
pub mod session;

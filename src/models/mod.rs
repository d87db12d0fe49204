pub mod config;
pub mod coordinate_map;
pub mod form_entry;
pub mod ocr_result;
pub mod point;
pub mod roi;

pub mod clipboard;
pub mod config;
pub mod form_filler;
pub mod ocr;
pub mod ocr_sampler;
pub mod pointer;
pub mod resolver;
pub mod screen_capture;
pub mod session;
pub mod tag_locator;
pub mod template_locator;

#[cfg(test)]
pub mod testing;

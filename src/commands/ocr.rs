use crate::errors::AutofillResult;
use crate::models::ocr_result::OcrResult;
use crate::models::point::Point;
use crate::services::session::AutomationSession;

fn report(result: &OcrResult) {
    match result.value {
        Some(value) => println!("{}", value),
        None => println!("No valid OCR results found."),
    }
}

/// Read the number at `center` (default: pointer position)
pub fn ocr(session: &AutomationSession, center: Option<Point>) -> AutofillResult<()> {
    let result = session.ocr(center)?;
    report(&result);
    Ok(())
}

/// Locate the specimen tag, then read the number on it
pub fn auto_ocr(session: &AutomationSession) -> AutofillResult<()> {
    match session.auto_ocr()? {
        Some(result) => report(&result),
        None => println!("No tag found."),
    }
    Ok(())
}

/// Manual entry of a specimen number followed by the number macro
pub fn enter_number(session: &AutomationSession, text: &str) -> AutofillResult<()> {
    match session.enter_number(text)? {
        Some(number) => println!("Copied to clipboard: {}", number),
        None => println!("Not a valid specimen number: {:?}", text),
    }
    Ok(())
}

/// Number + collection macro on the number already on the clipboard
pub fn number_macro(session: &AutomationSession) -> AutofillResult<()> {
    session.number_macro()
}

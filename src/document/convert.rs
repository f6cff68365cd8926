// src/document/convert.rs
use std::path::Path;

use crate::document::models::PAGE_DELIMITER;
use crate::utils::error::ConvertError;

/// Produces page-tagged text from a source document.
///
/// Implementors must emit one `---  PÁGINA <n> ---` marker line before each
/// page's text so that [`crate::document::Document::split`] can recover pages.
pub trait TextConverter: Send + Sync {
    fn convert(&self, path: &Path) -> Result<String, ConvertError>;
}

/// Extracts text from PDF files with `pdf-extract`.
pub struct PdfTextConverter;

impl TextConverter for PdfTextConverter {
    fn convert(&self, path: &Path) -> Result<String, ConvertError> {
        let bytes = read_bytes(path)?;

        let text = pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| ConvertError::Pdf(e.to_string()))?;

        if text.trim().is_empty() {
            return Err(ConvertError::EmptyDocument);
        }

        // pdf-extract separates pages with form feeds
        let tagged = tag_pages(text.split('\x0C'));
        tracing::info!("Converted {} ({} bytes of text)", path.display(), tagged.len());
        Ok(tagged)
    }
}

/// Reads a text file that already carries page markers.
pub struct PlainTextConverter;

impl TextConverter for PlainTextConverter {
    fn convert(&self, path: &Path) -> Result<String, ConvertError> {
        let bytes = read_bytes(path)?;
        let text = String::from_utf8(bytes).map_err(|e| ConvertError::Read(e.to_string()))?;
        if text.trim().is_empty() {
            return Err(ConvertError::EmptyDocument);
        }
        Ok(text)
    }
}

/// Picks a converter from the file extension: `.pdf` goes through
/// [`PdfTextConverter`], everything else is treated as tagged text.
pub fn converter_for(path: &Path) -> Box<dyn TextConverter> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        Box::new(PdfTextConverter)
    } else {
        Box::new(PlainTextConverter)
    }
}

/// Joins page texts, numbering them from 1 in the order given.
pub fn tag_pages<'a>(pages: impl IntoIterator<Item = &'a str>) -> String {
    let mut tagged = String::new();
    for (index, page_text) in pages.into_iter().enumerate() {
        tagged.push('\n');
        tagged.push_str(PAGE_DELIMITER);
        tagged.push_str(&format!("{} ---\n", index + 1));
        tagged.push_str(page_text);
    }
    tagged
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ConvertError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConvertError::FileNotFound(path.display().to_string()),
        _ => ConvertError::Read(e.to_string()),
    })
}

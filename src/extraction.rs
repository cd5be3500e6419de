//! PDF text extraction.
//!
//! Pages are parsed with `lopdf` on a blocking task. Each page is extracted on its own so a
//! page with broken content streams contributes nothing instead of failing the document.

use lopdf::Document as PdfDocument;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Separator placed between the text of consecutive pages.
pub const PAGE_SEPARATOR: &str = "\n";

static CONTROL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\x00-\x08\x0B\x0C\x0E-\x1F\x7F]").unwrap());
static HORIZONTAL_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\r\n]+").unwrap());
static TRAILING_SPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" +(\r?\n)").unwrap());

/// Errors raised while pulling text out of a PDF.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Bytes could not be parsed as a PDF.
    #[error("Failed to parse PDF: {0}")]
    Parse(String),
    /// Document parsed but no page yielded any text.
    #[error("No text could be extracted from the PDF.")]
    NoText,
    /// Background extraction task failed to complete.
    #[error("PDF extraction task failed: {0}")]
    Task(String),
}

/// Text extracted from a single page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    /// One-based page number.
    pub number: u32,
    /// Cleaned page text; never blank.
    pub text: String,
}

/// Ordered per-page text of a document.
#[derive(Debug, Clone, Default)]
pub struct ExtractedText {
    pages: Vec<PageText>,
}

impl ExtractedText {
    /// Build from pages, dropping those without visible text.
    pub fn from_pages(pages: Vec<PageText>) -> Self {
        Self {
            pages: pages
                .into_iter()
                .filter(|page| !page.text.trim().is_empty())
                .collect(),
        }
    }

    /// Pages that produced text, in page order.
    pub fn pages(&self) -> &[PageText] {
        &self.pages
    }

    /// All page text joined with [`PAGE_SEPARATOR`].
    pub fn joined(&self) -> String {
        self.pages
            .iter()
            .map(|page| page.text.as_str())
            .collect::<Vec<_>>()
            .join(PAGE_SEPARATOR)
    }

    /// True when no page produced any text.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Extract per-page text from PDF bytes without blocking the async runtime.
///
/// Returns [`ExtractionError::NoText`] when the combined text is blank.
pub async fn extract_text(bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
    let owned = bytes.to_vec();
    let extracted = tokio::task::spawn_blocking(move || extract_pages(&owned))
        .await
        .map_err(|error| ExtractionError::Task(error.to_string()))??;

    tracing::debug!(pages = extracted.pages().len(), "PDF text extraction complete");
    if extracted.joined().trim().is_empty() {
        return Err(ExtractionError::NoText);
    }
    Ok(extracted)
}

/// Synchronous extraction used by [`extract_text`].
pub fn extract_pages(bytes: &[u8]) -> Result<ExtractedText, ExtractionError> {
    let document =
        PdfDocument::load_mem(bytes).map_err(|error| ExtractionError::Parse(error.to_string()))?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().keys().copied() {
        match document.extract_text(&[page_number]) {
            Ok(raw) => {
                let text = clean_content(&raw);
                if !text.is_empty() {
                    pages.push(PageText {
                        number: page_number,
                        text,
                    });
                }
            }
            Err(error) => {
                tracing::debug!(page = page_number, %error, "Skipping page without extractable text");
            }
        }
    }

    Ok(ExtractedText::from_pages(pages))
}

fn clean_content(content: &str) -> String {
    let cleaned = CONTROL_CHARS.replace_all(content, "");
    let cleaned = HORIZONTAL_WHITESPACE.replace_all(&cleaned, " ");
    let cleaned = TRAILING_SPACE.replace_all(&cleaned, "$1");
    cleaned.trim().to_string()
}

#[cfg(test)]
pub(crate) mod fixtures {
    use lopdf::content::{Content, Operation};
    use lopdf::{Object, Stream, dictionary};

    /// Build an in-memory PDF with one page per entry; `None` produces a page without text.
    pub(crate) fn pdf_with_pages(pages: &[Option<&str>]) -> Vec<u8> {
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut kids = Vec::new();
        for page in pages {
            let operations = match page {
                Some(text) => vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
                None => Vec::new(),
            };
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }
}

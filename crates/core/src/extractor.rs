use crate::error::ExtractError;
use crate::models::{ExtractedText, ReaderKind};
use lopdf::Document;
use std::panic::{self, AssertUnwindSafe};

#[derive(Debug, Clone)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

/// Page budgets for the two readers. The fallback reader typically runs
/// with tighter limits than the primary one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    pub max_pages: Option<usize>,
    pub max_chars: Option<usize>,
    pub fallback_max_pages: Option<usize>,
    pub fallback_max_chars: Option<usize>,
}

/// A document-reading capability: page range in, page texts out. Page texts
/// may be empty; malformed or encrypted input fails with a read error.
pub trait PageReader {
    fn read_pages(&self, data: &[u8], max_pages: Option<usize>)
        -> Result<Vec<PageText>, ExtractError>;
}

#[derive(Default)]
pub struct LopdfReader;

impl PageReader for LopdfReader {
    fn read_pages(
        &self,
        data: &[u8],
        max_pages: Option<usize>,
    ) -> Result<Vec<PageText>, ExtractError> {
        let document =
            Document::load_mem(data).map_err(|error| ExtractError::Read(error.to_string()))?;

        let mut pages = Vec::new();
        for (index, (page_no, _page_id)) in document.get_pages().into_iter().enumerate() {
            if max_pages.is_some_and(|limit| index >= limit) {
                break;
            }

            let text = document
                .extract_text(&[page_no])
                .map_err(|error| ExtractError::Read(error.to_string()))?;

            pages.push(PageText {
                number: page_no,
                text,
            });
        }

        Ok(pages)
    }
}

/// Fallback reader on top of `pdf_extract`. The library can panic on
/// malformed input rather than returning an error, so the call runs behind
/// an unwind boundary.
#[derive(Default)]
pub struct PdfExtractReader;

impl PageReader for PdfExtractReader {
    fn read_pages(
        &self,
        data: &[u8],
        max_pages: Option<usize>,
    ) -> Result<Vec<PageText>, ExtractError> {
        let owned = data.to_vec();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem_by_pages(&owned)
        }));

        let pages = match outcome {
            Ok(Ok(pages)) => pages,
            Ok(Err(error)) => return Err(ExtractError::Read(error.to_string())),
            Err(_) => {
                return Err(ExtractError::Read(
                    "pdf text extraction panicked on malformed input".to_string(),
                ))
            }
        };

        Ok(pages
            .into_iter()
            .take(max_pages.unwrap_or(usize::MAX))
            .enumerate()
            .map(|(index, text)| PageText {
                number: (index + 1) as u32,
                text,
            })
            .collect())
    }
}

/// Extract text with the default reader pair: `lopdf` first, `pdf_extract`
/// when it fails or finds nothing.
pub fn extract(data: &[u8], options: &ExtractOptions) -> Result<ExtractedText, ExtractError> {
    extract_with(&LopdfReader, &PdfExtractReader, data, options)
}

/// Extraction over caller-supplied readers. The fallback runs when the
/// primary errors or yields only whitespace; when both fail the error
/// carries both reasons and the run must stop before any analysis.
pub fn extract_with(
    primary: &dyn PageReader,
    fallback: &dyn PageReader,
    data: &[u8],
    options: &ExtractOptions,
) -> Result<ExtractedText, ExtractError> {
    let primary_failure = match read_and_accumulate(
        primary,
        data,
        options.max_pages,
        options.max_chars,
        ReaderKind::Primary,
    ) {
        Ok(extracted) => return Ok(extracted),
        Err(error) => error.to_string(),
    };

    match read_and_accumulate(
        fallback,
        data,
        options.fallback_max_pages,
        options.fallback_max_chars,
        ReaderKind::Fallback,
    ) {
        Ok(extracted) => Ok(extracted),
        Err(fallback_error) => Err(ExtractError::NoReadableText {
            primary: primary_failure,
            fallback: fallback_error.to_string(),
        }),
    }
}

fn read_and_accumulate(
    reader: &dyn PageReader,
    data: &[u8],
    max_pages: Option<usize>,
    max_chars: Option<usize>,
    kind: ReaderKind,
) -> Result<ExtractedText, ExtractError> {
    let pages = reader.read_pages(data, max_pages)?;

    let mut text = String::new();
    let mut char_count = 0usize;
    let mut consulted = 0usize;
    let mut capped = false;

    for page in pages {
        consulted += 1;
        let trimmed = page.text.trim();
        if trimmed.is_empty() {
            continue;
        }

        if !text.is_empty() {
            text.push('\n');
            char_count += 1;
        }
        text.push_str(trimmed);
        char_count += trimmed.chars().count();

        if max_chars.is_some_and(|limit| char_count >= limit) {
            capped = true;
            break;
        }
    }

    if text.is_empty() {
        return Err(ExtractError::Read(format!(
            "{} reader produced only whitespace",
            match kind {
                ReaderKind::Primary => "primary",
                ReaderKind::Fallback => "fallback",
            }
        )));
    }

    Ok(ExtractedText {
        text,
        reader: kind,
        pages_consulted: consulted,
        truncated: capped,
    })
}

//! Text extraction for uploaded documents.
//!
//! PDFs go through `pdf-extract`.  CSVs become one block per row, where each line
//! is `header: value`, so a row reads on its own once it is chunked.  Parsing
//! goes through the `csv` crate.

use super::SupportedFiletype;

/// Extraction error.
#[derive(Debug)]
pub enum ExtractError {
    Pdf(String),
    Csv(String),
    Empty,
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
            ExtractError::Csv(e) => write!(f, "CSV extraction failed: {}", e),
            ExtractError::Empty => write!(f, "document contains no text"),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extracts plain text from the downloaded bytes of a file.
pub fn extract_text(bytes: &[u8], filetype: SupportedFiletype) -> Result<String, ExtractError> {
    let text = match filetype {
        SupportedFiletype::Pdf => extract_pdf(bytes)?,
        SupportedFiletype::Csv => extract_csv(bytes)?,
    };

    if text.trim().is_empty() {
        return Err(ExtractError::Empty);
    }

    Ok(text)
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn extract_csv(bytes: &[u8]) -> Result<String, ExtractError> {
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(bytes);

    let headers = reader.headers().map_err(|e| ExtractError::Csv(e.to_string()))?.clone();

    let mut rows = Vec::new();

    for record in reader.records() {
        let record = record.map_err(|e| ExtractError::Csv(e.to_string()))?;

        let row = record
            .iter()
            .enumerate()
            .map(|(i, value)| {
                let header = headers.get(i).map(str::trim).filter(|h| !h.is_empty()).map(str::to_string).unwrap_or_else(|| format!("column {}", i + 1));
                format!("{}: {}", header, value.trim())
            })
            .collect::<Vec<_>>()
            .join("\n");

        rows.push(row);
    }

    Ok(rows.join("\n\n"))
}

// Tests.

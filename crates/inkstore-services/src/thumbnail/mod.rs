//! Preview-page generation.
//!
//! Dispatch is a closed enum keyed on the filename extension; there is no
//! generator registry. Formats without a generator simply produce no pages.

pub mod slides;
pub mod spreadsheet;

use anyhow::Result;

/// Generator family for a given file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailKind {
    /// Legacy binary workbook (`.xls`): one HTML page for the whole workbook.
    SpreadsheetLegacy,
    /// XML workbook (`.xlsx`, `.xlsm`): one HTML page per sheet.
    SpreadsheetXml,
    /// Slide deck (`.ppt`, `.pptx`): one PNG page per slide.
    SlideDeck,
}

impl ThumbnailKind {
    /// Pick the generator for a filename, by extension, case-insensitive.
    pub fn detect(filename: &str) -> Option<Self> {
        let ext = filename.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "xls" => Some(Self::SpreadsheetLegacy),
            "xlsx" | "xlsm" => Some(Self::SpreadsheetXml),
            "ppt" | "pptx" => Some(Self::SlideDeck),
            _ => None,
        }
    }

    /// Content type of the pages this generator produces.
    pub fn page_content_type(&self) -> &'static str {
        match self {
            Self::SpreadsheetLegacy | Self::SpreadsheetXml => "text/html",
            Self::SlideDeck => "image/png",
        }
    }
}

/// External-tool configuration for the slide pipeline.
#[derive(Debug, Clone)]
pub struct ThumbnailConfig {
    pub soffice_path: String,
    pub pdftoppm_path: String,
    pub slide_render_dpi: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            soffice_path: "soffice".to_string(),
            pdftoppm_path: "pdftoppm".to_string(),
            slide_render_dpi: 192,
        }
    }
}

/// Render the preview pages for one payload.
///
/// Returns the page payloads in order; callers assign indices 1..=n. Any
/// parse or conversion failure is an error here; the caller decides whether
/// that fails the surrounding operation.
pub async fn generate_pages(
    kind: ThumbnailKind,
    data: &[u8],
    filename: &str,
    config: &ThumbnailConfig,
) -> Result<Vec<Vec<u8>>> {
    match kind {
        ThumbnailKind::SpreadsheetLegacy => {
            Ok(vec![spreadsheet::legacy_workbook_page(data)?])
        }
        ThumbnailKind::SpreadsheetXml => spreadsheet::xml_workbook_pages(data),
        ThumbnailKind::SlideDeck => slides::render_slide_pages(data, filename, config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_by_extension() {
        assert_eq!(
            ThumbnailKind::detect("budget.xls"),
            Some(ThumbnailKind::SpreadsheetLegacy)
        );
        assert_eq!(
            ThumbnailKind::detect("budget.XLSX"),
            Some(ThumbnailKind::SpreadsheetXml)
        );
        assert_eq!(
            ThumbnailKind::detect("macros.xlsm"),
            Some(ThumbnailKind::SpreadsheetXml)
        );
        assert_eq!(
            ThumbnailKind::detect("talk.pptx"),
            Some(ThumbnailKind::SlideDeck)
        );
        assert_eq!(ThumbnailKind::detect("photo.png"), None);
        assert_eq!(ThumbnailKind::detect("no_extension"), None);
    }

    #[test]
    fn test_page_content_types() {
        assert_eq!(
            ThumbnailKind::SpreadsheetXml.page_content_type(),
            "text/html"
        );
        assert_eq!(ThumbnailKind::SlideDeck.page_content_type(), "image/png");
    }
}

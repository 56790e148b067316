//! Workbook-to-HTML preview rendering.
//!
//! Both workbook families parse through `calamine`; the difference is the
//! page split. The legacy binary format renders the whole workbook into a
//! single page, the XML format one page per sheet.

use std::io::Cursor;

use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, Xls, Xlsx};

/// Render a legacy `.xls` workbook as one HTML page containing every sheet.
pub fn legacy_workbook_page(data: &[u8]) -> Result<Vec<u8>> {
    let mut workbook =
        Xls::new(Cursor::new(data.to_vec())).context("Failed to parse xls workbook")?;

    let mut body = String::new();
    for (name, range) in workbook.worksheets() {
        body.push_str(&render_sheet_html(&name, &range));
    }

    Ok(wrap_document(&body).into_bytes())
}

/// Render an `.xlsx`/`.xlsm` workbook as one HTML page per sheet.
pub fn xml_workbook_pages(data: &[u8]) -> Result<Vec<Vec<u8>>> {
    let mut workbook =
        Xlsx::new(Cursor::new(data.to_vec())).context("Failed to parse xlsx workbook")?;

    let pages = workbook
        .worksheets()
        .iter()
        .map(|(name, range)| wrap_document(&render_sheet_html(name, range)).into_bytes())
        .collect();

    Ok(pages)
}

/// One sheet as a minimal HTML table. Empty cells render as empty `<td>`s;
/// everything passes through `escape_html`.
pub(crate) fn render_sheet_html(name: &str, range: &Range<Data>) -> String {
    let mut html = String::new();
    html.push_str(&format!("<h2>{}</h2>\n<table>\n", escape_html(name)));

    for row in range.rows() {
        html.push_str("<tr>");
        for cell in row {
            let text = match cell {
                Data::Empty => String::new(),
                other => other.to_string(),
            };
            html.push_str(&format!("<td>{}</td>", escape_html(&text)));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</table>\n");
    html
}

fn wrap_document(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"></head><body>\n{}</body></html>\n",
        body
    )
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

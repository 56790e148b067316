//! Slide-deck rasterization through external tools.
//!
//! Pipeline in a scratch directory: `soffice --headless` converts the deck
//! to PDF, `pdftoppm` rasterizes each page, and every rendered page is
//! re-encoded to PNG. The scratch directory is dropped with all
//! intermediates when the function returns, on success or failure.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tempfile::TempDir;
use tokio::process::Command;

use super::ThumbnailConfig;

/// Render a slide deck to one PNG per slide.
pub async fn render_slide_pages(
    data: &[u8],
    filename: &str,
    config: &ThumbnailConfig,
) -> Result<Vec<Vec<u8>>> {
    let start = std::time::Instant::now();

    let temp_dir = TempDir::new().context("Failed to create temp directory")?;
    let temp_path = temp_dir.path();

    // soffice picks the import filter from the extension.
    let ext = filename
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .unwrap_or_else(|| "ppt".to_string());
    let input_path = temp_path.join(format!("deck.{}", ext));
    tokio::fs::write(&input_path, data)
        .await
        .context("Failed to write deck to temp file")?;

    convert_to_pdf(&config.soffice_path, &input_path, temp_path).await?;

    let pdf_path = temp_path.join("deck.pdf");
    if !pdf_path.exists() {
        return Err(anyhow!("PDF conversion produced no output"));
    }

    rasterize_pdf(
        &config.pdftoppm_path,
        &pdf_path,
        &temp_path.join("page"),
        config.slide_render_dpi,
    )
    .await?;

    let pages = collect_rendered_pages(temp_path).await?;

    tracing::info!(
        filename = %filename,
        page_count = pages.len(),
        dpi = config.slide_render_dpi,
        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Slide deck rendered"
    );

    Ok(pages)
}

async fn convert_to_pdf(soffice: &str, input: &Path, outdir: &Path) -> Result<()> {
    let output = Command::new(soffice)
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(outdir)
        .arg(input)
        .output()
        .await
        .with_context(|| format!("Failed to run {}", soffice))?;

    if !output.status.success() {
        return Err(anyhow!(
            "PDF conversion failed ({}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(())
}

async fn rasterize_pdf(pdftoppm: &str, pdf: &Path, prefix: &Path, dpi: u32) -> Result<()> {
    let output = Command::new(pdftoppm)
        .arg("-r")
        .arg(dpi.to_string())
        .arg(pdf)
        .arg(prefix)
        .output()
        .await
        .with_context(|| format!("Failed to run {}", pdftoppm))?;

    if !output.status.success() {
        return Err(anyhow!(
            "Page rasterization failed ({}): {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(())
}

/// Gather the `page-*.ppm` files in name order and re-encode each as PNG.
///
/// `pdftoppm` zero-pads page numbers to a fixed width per run, so the name
/// order is the page order.
async fn collect_rendered_pages(dir: &Path) -> Result<Vec<Vec<u8>>> {
    let mut ppm_paths = Vec::new();
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .context("Failed to list rendered pages")?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|e| e == "ppm") {
            ppm_paths.push(path);
        }
    }
    ppm_paths.sort();

    let mut pages = Vec::with_capacity(ppm_paths.len());
    for path in &ppm_paths {
        let raster = image::open(path)
            .with_context(|| format!("Failed to decode rendered page {}", path.display()))?;
        let mut png = Vec::new();
        raster
            .write_to(
                &mut std::io::Cursor::new(&mut png),
                image::ImageFormat::Png,
            )
            .context("Failed to encode page as PNG")?;
        pages.push(png);
    }

    Ok(pages)
}

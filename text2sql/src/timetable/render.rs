//! Rasterize a multi-page document and stack the pages into one JPEG.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use image::{imageops, DynamicImage, ImageBuffer, ImageFormat, Rgb, RgbImage};

use super::TimetableError;

/// 72 dpi × 1.333 zoom.
pub const DEFAULT_DPI: u32 = 96;
pub const DEFAULT_RENDER_TIMEOUT: Duration = Duration::from_secs(60);

/// Turns a PDF into one PNG per page, in page order.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    async fn rasterize(&self, pdf: &[u8]) -> Result<Vec<Vec<u8>>, TimetableError>;
}

/// Runs poppler's `pdftoppm` in a scratch directory. The child is killed when it
/// outlives the timeout or the request is dropped.
pub struct PdftoppmRasterizer {
    program: PathBuf,
    dpi: u32,
    timeout: Duration,
}

impl PdftoppmRasterizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            dpi: DEFAULT_DPI,
            timeout: DEFAULT_RENDER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }
}

impl Default for PdftoppmRasterizer {
    fn default() -> Self {
        Self::new("pdftoppm")
    }
}

/// Page number from `page-<n>.png`, the naming `pdftoppm -png <dir>/page` produces
/// (zero-padded to the page count's width).
fn page_number(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_str()?;
    let ext = path.extension()?.to_str()?;
    if ext != "png" {
        return None;
    }
    stem.strip_prefix("page-")?.parse().ok()
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    async fn rasterize(&self, pdf: &[u8]) -> Result<Vec<Vec<u8>>, TimetableError> {
        let dir = tempfile::tempdir().map_err(|e| TimetableError::Render(e.to_string()))?;
        let input = dir.path().join("input.pdf");
        tokio::fs::write(&input, pdf)
            .await
            .map_err(|e| TimetableError::Render(e.to_string()))?;

        let child = tokio::process::Command::new(&self.program)
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-png")
            .arg(&input)
            .arg(dir.path().join("page"))
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(self.timeout, child)
            .await
            .map_err(|_| {
                tracing::warn!(timeout = ?self.timeout, "rasterizer killed after timeout");
                TimetableError::Render(format!(
                    "{} timed out after {:?}",
                    self.program.display(),
                    self.timeout
                ))
            })?
            .map_err(|e| {
                TimetableError::Render(format!(
                    "failed to run {}: {}",
                    self.program.display(),
                    e
                ))
            })?;
        if !output.status.success() {
            return Err(TimetableError::Render(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let mut entries = tokio::fs::read_dir(dir.path())
            .await
            .map_err(|e| TimetableError::Render(e.to_string()))?;
        let mut pages: Vec<(u32, PathBuf)> = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| TimetableError::Render(e.to_string()))?
        {
            let path = entry.path();
            if let Some(n) = page_number(&path) {
                pages.push((n, path));
            }
        }
        pages.sort_by_key(|(n, _)| *n);

        let mut out = Vec::with_capacity(pages.len());
        for (_, path) in pages {
            out.push(
                tokio::fs::read(&path)
                    .await
                    .map_err(|e| TimetableError::Render(e.to_string()))?,
            );
        }
        tracing::debug!(pages = out.len(), dpi = self.dpi, "document rasterized");
        Ok(out)
    }
}

/// Stacks encoded page images top to bottom on a white canvas as wide as the widest
/// page and encodes the result as JPEG.
pub fn combine_pages(pages: &[Vec<u8>]) -> Result<Vec<u8>, TimetableError> {
    if pages.is_empty() {
        return Err(TimetableError::Render("document has no pages".to_string()));
    }
    let decoded: Vec<RgbImage> = pages
        .iter()
        .map(|bytes| {
            image::load_from_memory(bytes)
                .map(|img| img.to_rgb8())
                .map_err(|e| TimetableError::Render(e.to_string()))
        })
        .collect::<Result<_, _>>()?;

    let width = decoded.iter().map(|p| p.width()).max().unwrap_or(0);
    let height: u32 = decoded.iter().map(|p| p.height()).sum();
    let mut canvas: RgbImage = ImageBuffer::from_pixel(width, height, Rgb([255, 255, 255]));
    let mut y: i64 = 0;
    for page in &decoded {
        imageops::replace(&mut canvas, page, 0, y);
        y += i64::from(page.height());
    }

    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(canvas)
        .write_to(&mut buf, ImageFormat::Jpeg)
        .map_err(|e| TimetableError::Render(e.to_string()))?;
    Ok(buf.into_inner())
}

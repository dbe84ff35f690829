use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tokio::fs;
use tracing::{info, warn};

use crate::db::{self, PdfTarget};
use crate::fetch::HttpFetcher;

/// What happened to one stored regulation's PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfOutcome {
    Downloaded { bytes: usize },
    AlreadyPresent,
    Failed(String),
}

#[derive(Debug, Default)]
pub struct PdfSummary {
    pub total: usize,
    pub downloaded: usize,
    pub already_present: usize,
    pub failures: Vec<(String, String)>,
}

impl PdfSummary {
    fn record(&mut self, url: &str, outcome: PdfOutcome) {
        self.total += 1;
        match outcome {
            PdfOutcome::Downloaded { .. } => self.downloaded += 1,
            PdfOutcome::AlreadyPresent => self.already_present += 1,
            PdfOutcome::Failed(reason) => self.failures.push((url.to_string(), reason)),
        }
    }

    pub fn print(&self) {
        println!(
            "Checked {} PDFs: {} downloaded, {} already present, {} failed.",
            self.total,
            self.downloaded,
            self.already_present,
            self.failures.len()
        );
        for (url, reason) in &self.failures {
            println!("  failed: {} ({})", url, reason);
        }
    }
}

/// Local file for a stored regulation: `<dir>/<row id>.pdf`.
pub fn pdf_path(dir: &Path, target: &PdfTarget) -> PathBuf {
    dir.join(format!("{}.pdf", target.id))
}

/// Download the PDF of every stored regulation that has one.
///
/// Files already on disk are left alone; a failed download is recorded and
/// the next one is tried.
pub async fn download_all(
    fetcher: &HttpFetcher,
    conn: &Connection,
    dir: &Path,
    limit: Option<usize>,
) -> Result<PdfSummary> {
    fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let targets = db::fetch_pdf_targets(conn, limit)?;
    info!("{} stored regulations with a PDF link", targets.len());

    let mut summary = PdfSummary::default();
    for target in &targets {
        let outcome = download_one(fetcher, dir, target).await;
        match &outcome {
            PdfOutcome::Downloaded { bytes } => {
                info!("Downloaded {} ({} bytes)", target.file_pdf, bytes)
            }
            PdfOutcome::AlreadyPresent => {}
            PdfOutcome::Failed(reason) => {
                warn!(
                    "Failed to download {} ({}): {}",
                    target.file_pdf, target.link_peraturan, reason
                )
            }
        }
        summary.record(&target.file_pdf, outcome);
    }
    Ok(summary)
}

async fn download_one(fetcher: &HttpFetcher, dir: &Path, target: &PdfTarget) -> PdfOutcome {
    let path = pdf_path(dir, target);
    match fs::try_exists(&path).await {
        Ok(true) => return PdfOutcome::AlreadyPresent,
        Ok(false) => {}
        Err(e) => return PdfOutcome::Failed(e.to_string()),
    }

    let body = match fetcher.fetch_bytes(&target.file_pdf).await {
        Ok(body) => body,
        Err(e) => return PdfOutcome::Failed(e.to_string()),
    };

    // Only complete downloads appear under the final name.
    let partial = path.with_extension("pdf.part");
    let written = async {
        fs::write(&partial, &body).await?;
        fs::rename(&partial, &path).await
    }
    .await;
    match written {
        Ok(()) => PdfOutcome::Downloaded { bytes: body.len() },
        Err(e) => PdfOutcome::Failed(e.to_string()),
    }
}

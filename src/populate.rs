use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::db;
use crate::fetch::Fetcher;
use crate::parser;
use crate::settings::Settings;

/// What happened to one detail URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Inserted { sparse: bool },
    Skipped,
    Failed(String),
}

/// Tally of one population run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub total: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub sparse: usize,
    pub failures: Vec<(String, String)>,
}

impl RunSummary {
    fn record(&mut self, url: &str, outcome: Outcome) {
        self.total += 1;
        match outcome {
            Outcome::Inserted { sparse } => {
                self.inserted += 1;
                if sparse {
                    self.sparse += 1;
                }
            }
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed(reason) => self.failures.push((url.to_string(), reason)),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn print(&self) {
        println!(
            "Processed {} links: {} inserted ({} sparse), {} skipped, {} failed.",
            self.total,
            self.inserted,
            self.sparse,
            self.skipped,
            self.failed()
        );
        for (url, reason) in &self.failures {
            println!("  failed: {} ({})", url, reason);
        }
    }
}

/// Scrape and store every URL not yet in the database.
///
/// Each URL is isolated: a failed fetch or insert is recorded in the summary
/// and the run moves on.
pub async fn run<F: Fetcher>(
    fetcher: &F,
    conn: &Connection,
    urls: &[String],
    settings: &Settings,
) -> Result<RunSummary> {
    let pb = ProgressBar::new(urls.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    let mut summary = RunSummary::default();
    for (i, url) in urls.iter().enumerate() {
        info!("Processing link {}/{}: {}", i + 1, urls.len(), url);
        let outcome = process_one(fetcher, conn, url, settings).await;
        match &outcome {
            Outcome::Skipped => warn!("Regulation from {} already exists. Skipping.", url),
            Outcome::Failed(reason) => error!("Failed to process {}: {}", url, reason),
            Outcome::Inserted { sparse: true } => {
                warn!("Stored {} but extracted no fields; page layout may have changed", url)
            }
            Outcome::Inserted { sparse: false } => {}
        }

        let processed = outcome != Outcome::Skipped;
        summary.record(url, outcome);
        pb.inc(1);

        if processed && !settings.item_delay().is_zero() {
            tokio::time::sleep(settings.item_delay()).await;
        }
    }

    pb.finish_and_clear();
    info!(
        "Population complete: {} inserted, {} skipped, {} failed",
        summary.inserted,
        summary.skipped,
        summary.failed()
    );
    Ok(summary)
}

async fn process_one<F: Fetcher>(
    fetcher: &F,
    conn: &Connection,
    url: &str,
    settings: &Settings,
) -> Outcome {
    match db::contains(conn, url) {
        Ok(true) => return Outcome::Skipped,
        Ok(false) => {}
        Err(e) => return Outcome::Failed(format!("{e:#}")),
    }

    let html = match fetcher.fetch(url).await {
        Ok(html) => html,
        Err(e) => return Outcome::Failed(e.to_string()),
    };

    let record = parser::parse_detail(&html, url, &settings.base_url);
    let sparse = record.is_sparse();
    match db::insert_regulation(conn, &record) {
        Ok(true) => {
            info!(
                "Successfully added: {}",
                record.nama_peraturan.as_deref().unwrap_or("N/A")
            );
            Outcome::Inserted { sparse }
        }
        Ok(false) => Outcome::Skipped,
        Err(e) => Outcome::Failed(format!("{e:#}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::MockFetcher;

    const ORIGIN: &str = "https://peraturan.bpk.go.id";

    fn memory() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        conn
    }

    fn detail_html() -> String {
        std::fs::read_to_string("tests/fixtures/detail.html").unwrap()
    }

    fn urls(ids: &[u32]) -> Vec<String> {
        ids.iter().map(|id| format!("{ORIGIN}/Details/{id}")).collect()
    }

    #[tokio::test]
    async fn second_run_is_a_no_op() {
        let conn = memory();
        let settings = Settings::for_tests(ORIGIN);
        let links = urls(&[1, 2]);
        let fetcher = MockFetcher::new()
            .page(&links[0], detail_html())
            .page(&links[1], detail_html());

        let first = run(&fetcher, &conn, &links, &settings).await.unwrap();
        assert_eq!(first.inserted, 2);
        assert_eq!(first.failed(), 0);

        let second = run(&fetcher, &conn, &links, &settings).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(fetcher.hits().len(), 2);
        assert_eq!(db::get_stats(&conn).unwrap().total, 2);
    }

    #[tokio::test]
    async fn failures_are_isolated() {
        let conn = memory();
        let settings = Settings::for_tests(ORIGIN);
        let links = urls(&[1, 2, 3]);
        let fetcher = MockFetcher::new()
            .page(&links[0], detail_html())
            .fail(&links[1])
            .page(&links[2], "<html><body>kosong</body></html>");

        let summary = run(&fetcher, &conn, &links, &settings).await.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.inserted, 2);
        assert_eq!(summary.sparse, 1);
        assert_eq!(summary.failed(), 1);
        assert_eq!(summary.failures[0].0, links[1]);
        assert!(summary.failures[0].1.contains("500"));

        let stored = db::fetch_by_link(&conn, &links[0]).unwrap().unwrap();
        assert_eq!(stored.tipe_dokumen.as_deref(), Some("Peraturan Pemerintah (PP)"));
        assert_eq!(stored.bentuk_singkat.as_deref(), Some("PP"));
        assert_eq!(stored.tanggal_penetapan.as_deref(), Some("2020-06-15"));
        assert!(!db::contains(&conn, &links[1]).unwrap());
    }
}

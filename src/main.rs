mod db;
mod error;
mod fetch;
mod parser;
mod pdfs;
mod populate;
mod record;
mod settings;
mod walker;

use std::path::Path;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};

use fetch::{Fetcher, HttpFetcher};
use settings::Settings;

#[derive(Parser)]
#[command(name = "bpk_scraper", about = "Regulation scraper for peraturan.bpk.go.id")]
struct Cli {
    /// SQLite database path (overrides BPK_DB_PATH)
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the regulation table
    Init,
    /// Walk the search listing and print every detail-page URL
    Links,
    /// Scrape one detail page and print it as JSON
    Scrape {
        url: String,
    },
    /// Discover links, then scrape and store every regulation not yet stored
    Populate {
        /// Max detail pages to process (default: all discovered)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Download the PDF of every stored regulation into the PDF directory
    Pdfs {
        /// Max stored regulations to check (default: all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Print a stored regulation as JSON
    Show {
        url: String,
    },
    /// Show database statistics
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;
    if let Some(db) = cli.db {
        settings.db_path = db;
    }

    let result = match cli.command {
        Commands::Init => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            println!("Schema ready at {}", settings.db_path);
            Ok(())
        }
        Commands::Links => {
            let fetcher = HttpFetcher::new(&settings)?;
            let links = walker::discover_links(&fetcher, &settings).await;
            for link in links.iter() {
                println!("{}", link);
            }
            println!("{} unique regulation links", links.len());
            Ok(())
        }
        Commands::Scrape { url } => {
            let fetcher = HttpFetcher::new(&settings)?;
            let html = fetcher.fetch(&url).await?;
            let record = parser::parse_detail(&html, &url, &settings.base_url);
            if record.is_sparse() {
                tracing::warn!("No fields extracted from {}", url);
            }
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Commands::Populate { limit } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let fetcher = HttpFetcher::new(&settings)?;

            let discovered = walker::discover_links(&fetcher, &settings).await;
            if discovered.is_empty() {
                println!("No regulation links discovered.");
                return Ok(());
            }
            let mut links = discovered.into_vec();
            if let Some(n) = limit {
                links.truncate(n);
            }

            println!("Processing {} regulation links...", links.len());
            let summary = populate::run(&fetcher, &conn, &links, &settings).await?;
            summary.print();
            Ok(())
        }
        Commands::Pdfs { limit } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let fetcher = HttpFetcher::new(&settings)?;
            let summary =
                pdfs::download_all(&fetcher, &conn, Path::new(&settings.pdf_dir), limit).await?;
            summary.print();
            Ok(())
        }
        Commands::Show { url } => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let record = db::fetch_by_link(&conn, &url)?
                .with_context(|| format!("No stored regulation for {url}"))?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect(&settings.db_path)?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Total:          {}", s.total);
            println!("With PDF:       {}", s.with_pdf);
            println!("With relations: {}", s.with_relations);
            if !s.by_status.is_empty() {
                println!("\n--- Status ---");
                for (status, count) in &s.by_status {
                    println!("  {:<24} {:>6}", status, count);
                }
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

mod client;
mod crawl;
mod db;
mod dedup;
mod error;
mod glassdoor;
mod parser;
mod record;
mod search;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use client::HttpFetcher;
use glassdoor::GlassdoorScraper;
use settings::{Overrides, Settings};

#[derive(Parser)]
#[command(name = "glassdoor_funnel", about = "Scrape new Glassdoor job listings into a master list")]
struct Cli {
    /// Master list database (overrides config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search, drop already-seen jobs, fetch descriptions and save the rest
    Scrape {
        /// Search keyword (repeatable)
        #[arg(short, long = "keyword")]
        keywords: Vec<String>,
        /// City to search around
        #[arg(short, long)]
        city: Option<String>,
        /// Glassdoor region domain, e.g. "ca" or "co.uk"
        #[arg(short, long)]
        domain: Option<String>,
        /// Search radius in km
        #[arg(short, long)]
        radius: Option<u32>,
        /// Max requests in flight
        #[arg(long)]
        concurrency: Option<usize>,
        /// Scrape but don't write to the master list
        #[arg(long)]
        dry_run: bool,
    },
    /// Show master list counts
    Stats,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let started = Instant::now();
    let cli = Cli::parse();
    let mut settings = Settings::load()?;

    let result = match cli.command {
        Commands::Scrape {
            keywords,
            city,
            domain,
            radius,
            concurrency,
            dry_run,
        } => {
            settings.apply(Overrides {
                keywords,
                city,
                domain,
                radius,
                max_concurrency: concurrency,
                db_path: cli.db,
            });
            scrape(&settings, dry_run).await
        }
        Commands::Stats => {
            settings.apply(Overrides {
                db_path: cli.db,
                ..Overrides::default()
            });
            stats(&settings)
        }
    };

    if let Some(took) = run_time(started.elapsed()) {
        println!("\nFinished in {}", took);
    }
    result
}

fn stats(settings: &Settings) -> anyhow::Result<()> {
    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;
    let stats = db::get_stats(&conn)?;
    if stats.is_empty() {
        println!("Master list is empty. Run 'scrape' first.");
        return Ok(());
    }
    println!("{:<12} | {:<10} | {:>6}", "Provider", "Status", "Jobs");
    println!("{}", "-".repeat(34));
    for s in &stats {
        println!("{:<12} | {:<10} | {:>6}", s.provider, s.status, s.count);
    }
    let total: i64 = stats.iter().map(|s| s.count).sum();
    println!("\n{} jobs total", total);
    Ok(())
}

async fn scrape(settings: &Settings, dry_run: bool) -> anyhow::Result<()> {
    let query = settings.search_query()?;
    let fetcher = HttpFetcher::new(
        &settings.user_agent,
        &format!("{}/", query.base_url()),
        settings.timeout(),
    )?;

    let conn = db::connect(&settings.db_path)?;
    db::init_schema(&conn)?;
    let master = db::load_master(&conn)?;
    info!(
        "Master list: {} known jobs",
        master.as_ref().map(|m| m.len()).unwrap_or(0)
    );

    let scraper = GlassdoorScraper::new(Arc::new(fetcher), query, settings.max_concurrency);
    let jobs = scraper
        .scrape(master.as_ref())
        .await
        .context("Scrape could not start")?;

    let with_blurb = jobs.values().filter(|j| !j.blurb.is_empty()).count();
    println!("Scraped {} new jobs ({} with descriptions).", jobs.len(), with_blurb);

    if dry_run {
        println!("Dry run: master list not updated.");
        return Ok(());
    }
    let saved = db::save_records(&conn, &jobs)?;
    println!("Saved {} jobs to {:?}", saved, settings.db_path);
    Ok(())
}

/// Wall time for the footer; runs under a second print nothing.
fn run_time(d: Duration) -> Option<String> {
    match d.as_secs() {
        0 => None,
        s if s < 60 => Some(format!("{:.1}s", d.as_secs_f64())),
        s => Some(format!("{}m{:02}s", s / 60, s % 60)),
    }
}

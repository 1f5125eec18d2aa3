pub mod config;
pub mod importer;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use config::{ImportConfig, SeatsStyle};
use importer::{Importer, Tally};

#[derive(Debug, Parser)]
#[command(name = "hand-importer")]
#[command(about = "Import hand histories and print per-player statistics", long_about = None)]
pub struct Cli {
    /// Hand history or tournament summary files
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Player to mark as the hero
    #[arg(long)]
    pub hero: Option<String>,

    /// Sum rows over every table size, or only the hero's
    #[arg(long, value_enum)]
    pub seats: Option<SeatsStyle>,

    /// Comma separated stat names, e.g. "vpip,pfr,cb1"
    #[arg(long, value_delimiter = ',')]
    pub stats: Option<Vec<String>>,

    /// Parse hands on one thread
    #[arg(long, default_value = "false")]
    pub sequential: bool,

    /// Print the report as JSON
    #[arg(long, default_value = "false")]
    pub json: bool,
}

impl Cli {
    /// The config file, if any, with command line flags laid over it.
    pub fn import_config(&self) -> Result<ImportConfig> {
        let mut config = match &self.config {
            Some(path) => ImportConfig::load(path)?,
            None => ImportConfig::default(),
        };
        if let Some(hero) = &self.hero {
            config.hero = Some(hero.clone());
        }
        if let Some(seats) = self.seats {
            config.seats_style = seats;
        }
        if let Some(stats) = &self.stats {
            config.stats = stats.clone();
        }
        if self.sequential {
            config.parallel = false;
        }
        Ok(config)
    }
}

pub fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.import_config()?;
    let kinds = config.stat_kinds()?;

    let mut importer = Importer::new(&config);
    let mut total = Tally::default();
    for path in &cli.files {
        match importer.import_file(path) {
            Ok(tally) => total.merge(tally),
            Err(e) => warn!("{:#}", e),
        }
    }
    info!(
        "Import complete: {} hands stored, {} duplicates, {} errors, {} summaries",
        total.stored, total.duplicates, total.errors, total.summaries
    );

    let report = importer.report(&kinds, config.seats_style)?;
    if cli.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        print!("{}", report.to_text());
    }
    Ok(())
}

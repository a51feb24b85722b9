//! Fetch subcommand - page through an endpoint and persist every page

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use lapline_core::{SharedProgress, fmt_num};
use lapline_fetch::FetchOrchestrator;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Endpoint path under each season (e.g. results, qualifying)
    #[arg(short, long)]
    pub endpoint: String,

    /// Seasons to fetch (comma-separated, default from config)
    #[arg(short, long, value_delimiter = ',')]
    pub seasons: Option<Vec<i32>>,

    /// Page size sent as `limit`
    #[arg(short = 'l', long)]
    pub limit: Option<u64>,

    /// Raw artifact directory
    #[arg(long)]
    pub raw_dir: Option<PathBuf>,

    /// API base URL
    #[arg(long)]
    pub base_url: Option<String>,
}

pub fn run(args: FetchArgs, config: &Config, progress: &SharedProgress) -> Result<()> {
    let mut fetch_config = config.fetch_config(args.raw_dir);
    if let Some(limit) = args.limit {
        fetch_config.page_size = limit;
    }
    if let Some(base_url) = args.base_url {
        fetch_config.base_url = base_url;
    }
    let seasons = args.seasons.unwrap_or_else(|| config.fetch.seasons.clone());

    let orchestrator =
        FetchOrchestrator::from_config(&fetch_config).with_progress(progress.clone());
    let summary = lapline_fetch::run_with(orchestrator, &args.endpoint, &seasons)?;

    let mut rows: Vec<(&str, String)> = vec![
        ("Endpoint", args.endpoint.clone()),
        ("Seasons", super::fmt_seasons(&seasons)),
    ];
    let per_season: Vec<String> = summary
        .seasons
        .iter()
        .map(|s| match s.total {
            Some(total) => format!("{}: {} pages ({} records)", s.season, s.pages, fmt_num(total as usize)),
            None => format!("{}: {} pages", s.season, s.pages),
        })
        .collect();
    rows.push(("Per season", per_season.join("\n")));
    rows.push(("Pages persisted", fmt_num(summary.pages_persisted)));
    rows.push(("Output", fetch_config.raw_dir.display().to_string()));
    rows.push(("Time", format!("{:.1}s", summary.elapsed.as_secs_f64())));
    super::print_table("Fetch", &rows);
    Ok(())
}

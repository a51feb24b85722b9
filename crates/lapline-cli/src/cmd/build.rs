//! Build subcommand - flatten artifacts into the consolidated table

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use lapline_build::BuildConfig;
use lapline_build::consolidate::DEFAULT_IDENTITY_COLUMN;
use lapline_core::fmt_num;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Endpoint whose artifacts are consolidated
    #[arg(short, long)]
    pub endpoint: String,

    /// Per-race list to flatten (e.g. Results, QualifyingResults)
    #[arg(short, long)]
    pub key: String,

    /// Column identifying an entity within a race
    #[arg(long, default_value = DEFAULT_IDENTITY_COLUMN)]
    pub identity: String,

    /// Raw artifact directory
    #[arg(long)]
    pub raw_dir: Option<PathBuf>,

    /// Output directory for the CSV
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl BuildArgs {
    fn into_config(self, config: &Config) -> BuildConfig {
        BuildConfig {
            raw_dir: self.raw_dir.unwrap_or_else(|| config.data.raw_dir.clone()),
            output_dir: self.output.unwrap_or_else(|| config.data.output_dir.clone()),
            endpoint: self.endpoint,
            key: self.key,
            identity_column: self.identity,
        }
    }
}

pub fn run(args: BuildArgs, config: &Config) -> Result<()> {
    let build_config = args.into_config(config);
    let summary = lapline_build::run(&build_config)?;

    super::print_table(
        "Build",
        &[
            ("Endpoint", build_config.endpoint.clone()),
            ("Artifacts", fmt_num(summary.artifacts)),
            ("Rows read", fmt_num(summary.rows_read)),
            ("Rows written", fmt_num(summary.rows_written)),
            ("Columns", summary.columns.to_string()),
            ("Output", summary.output.display().to_string()),
        ],
    );
    Ok(())
}

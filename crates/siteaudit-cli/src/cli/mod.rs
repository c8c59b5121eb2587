//! CLI for the siteaudit batch auditor.

mod commands;

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use siteaudit_core::config::{self, AuditConfig, ConfigError};
use siteaudit_core::logging;
use siteaudit_core::model::Strategy;
use siteaudit_core::quarantine::QuarantineStatus;
use std::path::{Path, PathBuf};

use commands::{run_audit, run_batch_command, run_completions, run_quarantine, run_stats};

/// Top-level CLI for siteaudit.
#[derive(Debug, Parser)]
#[command(name = "siteaudit")]
#[command(about = "siteaudit: quota-aware batch website auditing", long_about = None)]
pub struct Cli {
    /// State directory for the progress file, database and logs
    /// (default: config `state_dir`, else ~/.local/state/siteaudit).
    #[arg(long, global = true, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

/// Overrides for the `[batch]` config section.
#[derive(Debug, Clone, Default, Args)]
pub struct BatchArgs {
    /// Probes in flight at once [config default: 5].
    #[arg(long, value_name = "N")]
    pub max_concurrent: Option<usize>,
    /// API calls started per second, retries included; 0.001 to 1000 [config default: 1.0].
    #[arg(long, visible_alias = "rps", value_name = "RATE")]
    pub requests_per_second: Option<f64>,
    /// Skip targets whose every strategy succeeded within this many hours; 0 disables [config default: 0].
    #[arg(long, value_name = "HOURS")]
    pub skip_recent_hours: Option<u64>,
    /// Retries after the first attempt for retryable errors [config default: 2].
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,
    /// Stop scheduling new probes after this many seconds; in-flight probes finish.
    #[arg(long, value_name = "SECS")]
    pub deadline_secs: Option<f64>,
    /// Strategy to probe; repeat for several [config default: mobile and desktop].
    #[arg(long = "strategy", value_name = "STRATEGY")]
    pub strategies: Vec<Strategy>,
}

impl BatchArgs {
    /// Apply flags on top of the config file values.
    pub fn apply(&self, cfg: &mut AuditConfig) {
        let b = &mut cfg.batch;
        if let Some(n) = self.max_concurrent {
            b.max_concurrent_requests = n;
        }
        if let Some(rps) = self.requests_per_second {
            b.requests_per_second = rps;
        }
        if let Some(h) = self.skip_recent_hours {
            b.skip_recent_hours = h;
        }
        if let Some(n) = self.max_retries {
            b.max_retries = n;
        }
        if let Some(secs) = self.deadline_secs {
            b.soft_deadline_secs = Some(secs);
        }
        if !self.strategies.is_empty() {
            b.strategies = self.strategies.clone();
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Audit every target of a CSV list (one run; resumable).
    Batch {
        /// CSV/TSV file with a url-like column and optional id and region columns.
        input: PathBuf,
        #[command(flatten)]
        args: BatchArgs,
    },

    /// Probe a single url with every configured strategy.
    Audit {
        /// Absolute http(s) url to audit.
        url: String,
        /// Strategy to probe; repeat for several.
        #[arg(long = "strategy", value_name = "STRATEGY")]
        strategies: Vec<Strategy>,
        /// Store successful results in the database.
        #[arg(long)]
        save: bool,
    },

    /// Show stored result counts, averages and recent scores.
    Stats {
        /// Days of daily evolution to show.
        #[arg(long, default_value = "7", value_name = "DAYS")]
        days: u32,
        /// Number of latest scores to list.
        #[arg(long, default_value = "10", value_name = "N")]
        limit: u32,
    },

    /// Inspect and manage quarantined endpoints.
    Quarantine {
        #[command(subcommand)]
        action: QuarantineCommand,
    },

    /// Print shell completions to stdout.
    Completions {
        /// Target shell.
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Subcommand)]
pub enum QuarantineCommand {
    /// List quarantine entries, optionally by status.
    List {
        /// quarantined, investigating, resolved or wrong_url.
        #[arg(long)]
        status: Option<QuarantineStatus>,
    },
    /// Move an entry to a new status (investigating, resolved, wrong_url).
    Set {
        url: String,
        status: QuarantineStatus,
        /// Replace the operator note at the same time.
        #[arg(long)]
        note: Option<String>,
    },
    /// Replace the operator note; an empty note clears it.
    Note { url: String, note: String },
    /// Delete a resolved or wrong_url entry; the url rejoins the pool.
    Remove { url: String },
    /// Counts per status and failure streak figures.
    Stats,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        if let CliCommand::Completions { shell } = cli.command {
            run_completions(shell, &mut Cli::command());
            return Ok(());
        }

        // The credential is checked before any file or network work.
        let api_key = match cli.command {
            CliCommand::Batch { .. } | CliCommand::Audit { .. } => Some(config::api_key_from_env()?),
            _ => None,
        };

        let cfg = config::load_or_init()?;
        let state_dir = match cli.state_dir {
            Some(dir) => dir,
            None => cfg.state_dir()?,
        };
        init_logging(&state_dir);
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Batch { input, args } => {
                let key = api_key.ok_or(ConfigError::MissingApiKey)?;
                run_batch_command(cfg, &state_dir, &key, &input, &args).await?
            }
            CliCommand::Audit {
                url,
                strategies,
                save,
            } => {
                let key = api_key.ok_or(ConfigError::MissingApiKey)?;
                run_audit(cfg, &state_dir, &key, &url, &strategies, save).await?
            }
            CliCommand::Stats { days, limit } => run_stats(&state_dir, days, limit).await?,
            CliCommand::Quarantine { action } => run_quarantine(&cfg, &state_dir, action).await?,
            CliCommand::Completions { .. } => {}
        }

        Ok(())
    }
}

/// File logging in the state directory, or stderr when that fails.
fn init_logging(state_dir: &Path) {
    if logging::init_logging(state_dir).is_err() {
        logging::init_logging_stderr();
    }
}

#[cfg(test)]
mod tests;

mod args;
mod output;

use std::io::{self, BufRead};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use mailscore_lib::{Engine, EngineConfig, parse_email};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::args::{Cli, Commands};
use crate::output::{SyntaxRow, any_invalid, write_reports};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli)?;
    let out = cli.out.as_deref();

    // codes de sortie : 0 OK, 2 invalids, 1 fatal
    let invalid = match &cli.cmd {
        Commands::Syntax { emails } => {
            let emails = if emails.is_empty() {
                read_lines(io::stdin().lock())?
            } else {
                emails.clone()
            };
            let rows: Vec<SyntaxRow> = emails
                .iter()
                .map(|email| SyntaxRow::new(email, config.syntax_mode, &parse_email(email, config.syntax_mode)))
                .collect();
            write_reports(&rows, &cli.format, out)?;
            any_invalid(&rows)
        }
        Commands::Validate {
            email,
            checks,
            history,
        } => {
            let engine = Engine::new(config).context("engine setup")?;
            let options = checks.options();
            let result = match history.history() {
                Some(history) => engine.validate_with_history(email, &options, &history).await,
                None => engine.validate(email, &options).await,
            };
            let rows = [result];
            write_reports(&rows, &cli.format, out)?;
            any_invalid(&rows)
        }
        Commands::Batch {
            file,
            checks,
            deadline_secs,
            stats,
        } => {
            let emails = match file {
                Some(path) => read_file(path)?,
                None => read_lines(io::stdin().lock())?,
            };
            if emails.is_empty() {
                bail!("no address to validate");
            }
            let deadline = deadline_secs
                .map(Duration::from_secs)
                .unwrap_or(config.batch.default_deadline);
            let engine = Engine::new(config).context("engine setup")?;
            let report = engine
                .validate_batch_report(&emails, &checks.options(), deadline)
                .await?;
            if *stats {
                let s = &report.stats;
                eprintln!(
                    "total={} unique_domains={} dns_lookups={} smtp_probes={} timed_out={} tiers: premium={} high={} medium={} basic={} minimal={}",
                    s.total,
                    s.unique_domains,
                    s.dns_lookups,
                    s.smtp_probes,
                    s.timed_out,
                    s.tiers.premium,
                    s.tiers.high,
                    s.tiers.medium,
                    s.tiers.basic,
                    s.tiers.minimal,
                );
            }
            write_reports(&report.results, &cli.format, out)?;
            any_invalid(&report.results)
        }
    };

    if invalid {
        std::process::exit(2);
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "mailscore_lib=debug,mailscore_cli=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let mut config = match &cli.config {
        Some(path) => from_file(path)?,
        None => EngineConfig::default(),
    };
    if let Some(mode) = cli.parsed_mode()? {
        config.syntax_mode = mode;
    }
    debug!(mode = ?config.syntax_mode, "configuration loaded");
    Ok(config)
}

#[cfg(feature = "with-serde")]
fn from_file(path: &Path) -> Result<EngineConfig> {
    EngineConfig::from_json_file(path).with_context(|| format!("load config {}", path.display()))
}

#[cfg(not(feature = "with-serde"))]
fn from_file(_: &Path) -> Result<EngineConfig> {
    bail!("--config nécessite la feature 'with-serde'")
}

fn read_file(path: &Path) -> Result<Vec<String>> {
    let file = std::fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    read_lines(io::BufReader::new(file))
}

/// One address per line; blank lines and `#` comments are skipped.
fn read_lines(reader: impl BufRead) -> Result<Vec<String>> {
    let mut emails = Vec::new();
    for line in reader.lines() {
        let line = line.context("read input")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        emails.push(line.to_string());
    }
    Ok(emails)
}

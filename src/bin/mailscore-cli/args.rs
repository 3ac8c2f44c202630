use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use mailscore_lib::{BounceHistory, ValidateOptions, ValidationMode};

#[derive(Parser)]
#[command(name = "mailscore-cli", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,

    /// fichier de configuration JSON (listes, seuils, timeouts)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// write report to file (human/JSON/NDJSON/CSV selon --format)
    #[arg(long, global = true)]
    pub out: Option<String>,

    /// format: human|json|ndjson|csv
    #[arg(long, global = true, default_value = "human")]
    pub format: String,

    /// mode: strict|relaxed (prend le pas sur la configuration)
    #[arg(long, global = true)]
    pub mode: Option<String>,

    /// logs de debug sur stderr (RUST_LOG prend le pas)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Syntax only, no network.
    Syntax {
        /// adresses à tester (sinon lues sur stdin, une par ligne)
        emails: Vec<String>,
    },
    /// Full pipeline for one address.
    Validate {
        email: String,
        #[command(flatten)]
        checks: CheckArgs,
        #[command(flatten)]
        history: HistoryArgs,
    },
    /// Tiered batch from a file or stdin.
    Batch {
        /// fichier d'adresses (une par ligne, `#` commente); stdin si absent
        #[arg(long)]
        file: Option<PathBuf>,
        #[command(flatten)]
        checks: CheckArgs,
        /// délai global du lot, en secondes
        #[arg(long = "deadline")]
        deadline_secs: Option<u64>,
        /// affiche les statistiques du lot sur stderr
        #[arg(long)]
        stats: bool,
    },
}

#[derive(Args, Clone)]
pub struct CheckArgs {
    /// active la sonde SMTP (RCPT TO + détection catch-all)
    #[arg(long)]
    pub smtp: bool,

    /// timeout global de la sonde SMTP (s)
    #[arg(long = "smtp-timeout", default_value_t = 10)]
    pub smtp_timeout_secs: u64,

    /// saute les résolutions DNS/MX
    #[arg(long)]
    pub offline: bool,

    /// désactive les suggestions de domaine
    #[arg(long)]
    pub no_typos: bool,

    /// joint une évaluation du risque de rebond
    #[arg(long)]
    pub risk: bool,
}

impl CheckArgs {
    pub fn options(&self) -> ValidateOptions {
        let base = if self.offline {
            ValidateOptions::offline()
        } else {
            ValidateOptions::default()
        };
        ValidateOptions {
            enable_smtp: self.smtp && !self.offline,
            smtp_timeout_seconds: self.smtp_timeout_secs,
            check_typos: !self.no_typos,
            assess_risk: self.risk,
            ..base
        }
    }
}

#[derive(Args, Clone, Default)]
pub struct HistoryArgs {
    /// nombre de rebonds déjà enregistrés pour l'adresse
    #[arg(long, default_value_t = 0)]
    pub bounces: u32,

    /// âge du dernier rebond, en jours
    #[arg(long = "last-bounce-days")]
    pub last_bounce_days: Option<u64>,
}

impl HistoryArgs {
    /// `None` when no history flag was given.
    pub fn history(&self) -> Option<BounceHistory> {
        if self.bounces == 0 && self.last_bounce_days.is_none() {
            return None;
        }
        let last_bounce_at = self.last_bounce_days.and_then(|days| {
            SystemTime::now().checked_sub(Duration::from_secs(days.saturating_mul(24 * 3600)))
        });
        Some(BounceHistory {
            bounce_count: self.bounces,
            last_bounce_at,
        })
    }
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    pub fn parsed_mode(&self) -> Result<Option<ValidationMode>> {
        self.mode.as_deref().map(mode_from_str).transpose()
    }
}

pub fn mode_from_str(s: &str) -> Result<ValidationMode> {
    match s {
        "strict" => Ok(ValidationMode::Strict),
        "relaxed" => Ok(ValidationMode::Relaxed),
        other => bail!("unknown --mode '{other}', use: strict|relaxed"),
    }
}

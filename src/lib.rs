#![forbid(unsafe_code)]
//! mailscore_lib: email validation and scoring engine.
//!
//! Syntax, DNS/MX resolution, heuristics (disposable, role-based, typos),
//! optional SMTP probing, then a confidence score and an independent bounce
//! risk score. [`Engine`] runs the pipeline for one address or for a tiered
//! batch under a deadline.

pub mod batch;
pub mod config;
pub mod context;
mod engine;
pub mod error;
pub mod heuristics;
pub mod resolver;
pub mod scoring;
pub mod smtp;
mod types;
pub mod validator;

pub use batch::{BatchReport, BatchStats, Tier};
pub use config::{BatchSettings, DnsProvider, DnsSettings, EngineConfig};
pub use context::CallContext;
pub use engine::Engine;
pub use error::{ConfigError, EngineError};
pub use heuristics::{DomainSuggester, SimilaritySuggester};
pub use resolver::{DnsLookup, DomainRecord, MxRecord, ResolutionError, SystemLookup};
pub use scoring::{BounceHistory, RiskAssessment, RiskLevel, assess_risk};
pub use smtp::{ProbeErrorKind, SmtpProbeOptions, SmtpProbeResult, Verification};
pub use types::{ValidateOptions, ValidationChecks, ValidationResult};
pub use validator::{EmailAddress, SyntaxError, SyntaxReport, ValidationMode, parse_email, validate_syntax};

#[cfg(feature = "with-serde")]
pub use config::ConfigFile;

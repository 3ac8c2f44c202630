use std::fmt;
use std::time::{Duration, SystemTime};

use crate::config::EngineConfig;
use crate::types::ValidationResult;

use super::confidence::clamp_score;

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(rename_all = "UPPERCASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        })
    }
}

/// Delivery history the caller keeps for an address.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "with-serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BounceHistory {
    pub bounce_count: u32,
    pub last_bounce_at: Option<SystemTime>,
}

#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAssessment {
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub risk_factors: Vec<String>,
    pub is_spam_trap: bool,
    pub is_blacklisted: bool,
    /// Most severe first. Never empty.
    pub recommendations: Vec<String>,
}

/// Points per risk factor and the level thresholds.
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskWeights {
    /// Indexed by bounce count, the last entry covers every higher count.
    pub bounce_tiers: [u8; 4],
    pub recent_bounce: u8,
    pub recency_window: Duration,
    pub spam_trap: u8,
    pub blacklist: u8,
    pub catch_all: u8,
    pub disposable: u8,
    pub role_based: u8,
    /// Reached at confidence 0, scaled down linearly to 0 at the result's
    /// maximum achievable confidence.
    pub low_confidence_max: u8,
    pub medium_threshold: u8,
    pub high_threshold: u8,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            bounce_tiers: [0, 10, 20, 40],
            recent_bounce: 15,
            recency_window: Duration::from_secs(30 * 24 * 3600),
            spam_trap: 30,
            blacklist: 25,
            catch_all: 20,
            disposable: 15,
            role_based: 10,
            low_confidence_max: 20,
            medium_threshold: 40,
            high_threshold: 70,
        }
    }
}

impl RiskWeights {
    fn bounce_points(&self, count: u32) -> u8 {
        let last = self.bounce_tiers.len() - 1;
        let idx = usize::try_from(count).map_or(last, |c| c.min(last));
        self.bounce_tiers[idx]
    }

    pub fn level(&self, score: u8) -> RiskLevel {
        if score >= self.high_threshold {
            RiskLevel::High
        } else if score >= self.medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

// Lower rank sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Advice {
    SpamTrap,
    Blacklisted,
    Invalid,
    RepeatedBounces,
    Disposable,
    CatchAll,
    PreviousBounce,
    RoleBased,
    Verify,
}

impl Advice {
    fn text(self) -> &'static str {
        match self {
            Advice::SpamTrap => "DO NOT SEND - spam trap detected",
            Advice::Blacklisted => "DO NOT SEND - address matches blacklist",
            Advice::Invalid => "DO NOT SEND - invalid address",
            Advice::RepeatedBounces => "Remove from list - repeated bounces",
            Advice::Disposable => "Avoid - disposable address",
            Advice::CatchAll => "Review required - catch-all domain",
            Advice::PreviousBounce => "Monitor - previous bounce recorded",
            Advice::RoleBased => "Caution - role-based address",
            Advice::Verify => "Verify address before sending",
        }
    }
}

/// Bounce-risk assessment against the current wall clock.
pub fn assess_risk(
    result: &ValidationResult,
    history: &BounceHistory,
    config: &EngineConfig,
) -> RiskAssessment {
    assess_risk_at(result, history, config, SystemTime::now())
}

/// Same as [`assess_risk`] with an explicit "now", for the recency factor.
pub fn assess_risk_at(
    result: &ValidationResult,
    history: &BounceHistory,
    config: &EngineConfig,
    now: SystemTime,
) -> RiskAssessment {
    let weights = &config.risk_weights;
    let mut points: u32 = 0;
    let mut factors = Vec::new();
    let mut advice = Vec::new();

    let domain = result
        .email
        .rsplit_once('@')
        .map(|(_, d)| d.trim())
        .unwrap_or_default();
    let is_spam_trap = !domain.is_empty() && config.is_spam_trap_domain(domain);
    let is_blacklisted = config.matches_blacklist(&result.email);

    if history.bounce_count > 0 {
        points += u32::from(weights.bounce_points(history.bounce_count));
        factors.push(format!("{} previous bounce(s)", history.bounce_count));
        advice.push(if history.bounce_count >= 3 {
            Advice::RepeatedBounces
        } else {
            Advice::PreviousBounce
        });
    }
    if let Some(at) = history.last_bounce_at {
        // A bounce stamped in the future counts as recent.
        let recent = now
            .duration_since(at)
            .map_or(true, |age| age <= weights.recency_window);
        if recent {
            points += u32::from(weights.recent_bounce);
            factors.push("Recent bounce".to_string());
            advice.push(Advice::PreviousBounce);
        }
    }
    if is_spam_trap {
        points += u32::from(weights.spam_trap);
        factors.push("Known spam trap domain".to_string());
        advice.push(Advice::SpamTrap);
    }
    if is_blacklisted {
        points += u32::from(weights.blacklist);
        factors.push("Matches blacklist pattern".to_string());
        advice.push(Advice::Blacklisted);
    }
    if result.checks.is_catch_all {
        points += u32::from(weights.catch_all);
        factors.push("Catch-all domain".to_string());
        advice.push(Advice::CatchAll);
    }
    if result.checks.is_disposable {
        points += u32::from(weights.disposable);
        factors.push("Disposable domain".to_string());
        advice.push(Advice::Disposable);
    }
    if result.checks.is_role_based {
        points += u32::from(weights.role_based);
        factors.push("Role-based address".to_string());
        advice.push(Advice::RoleBased);
    }

    let low_confidence = low_confidence_points(result, weights);
    if low_confidence > 0 {
        points += low_confidence;
        factors.push(format!(
            "Low confidence score ({}/{})",
            result.confidence_score, result.max_confidence
        ));
    }

    if !result.valid {
        advice.push(Advice::Invalid);
    } else if result.confidence_score < 50 {
        advice.push(Advice::Verify);
    }

    advice.sort();
    advice.dedup();
    let recommendations = if advice.is_empty() {
        vec!["Safe to send".to_string()]
    } else {
        advice.into_iter().map(|a| a.text().to_string()).collect()
    };

    let risk_score = clamp_score(points);
    RiskAssessment {
        risk_score,
        risk_level: weights.level(risk_score),
        risk_factors: factors,
        is_spam_trap,
        is_blacklisted,
        recommendations,
    }
}

/// Scaled by the shortfall against `max_confidence`; checks that did not
/// run add nothing.
fn low_confidence_points(result: &ValidationResult, weights: &RiskWeights) -> u32 {
    let max = u32::from(result.max_confidence.min(100));
    if max == 0 {
        return 0;
    }
    let shortfall = max.saturating_sub(u32::from(result.confidence_score));
    shortfall * u32::from(weights.low_confidence_max) / max
}

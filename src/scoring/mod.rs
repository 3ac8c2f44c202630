//! Confidence and risk scoring. Both scores are additive tables clamped to
//! `0..=100`, computed independently of each other.

mod confidence;
mod risk;

pub use confidence::{ChecksRun, ConfidenceScore, ConfidenceWeights, ScoreInput, score_confidence};
pub use risk::{
    BounceHistory, RiskAssessment, RiskLevel, RiskWeights, assess_risk, assess_risk_at,
};

#[cfg(test)]
mod tests;

use textdistance::str::damerau_levenshtein;
use tracing::debug;

use crate::config::EngineConfig;

/// Proposes a corrected domain for one that looks mistyped.
pub trait DomainSuggester: Send + Sync {
    fn suggest(&self, domain: &str) -> Option<String>;
}

/// Normalized Damerau-Levenshtein similarity in `[0, 1]`; `1.0` for equal
/// strings.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = damerau_levenshtein(a, b);
    1.0 - distance as f64 / max_len as f64
}

/// Picks the closest entry of an ordered candidate list.
#[derive(Debug, Clone)]
pub struct SimilaritySuggester {
    candidates: Vec<String>,
    threshold: f64,
}

impl SimilaritySuggester {
    pub fn new(candidates: Vec<String>, threshold: f64) -> Self {
        Self {
            candidates,
            threshold,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.common_domains.clone(), config.suggestion_threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl DomainSuggester for SimilaritySuggester {
    fn suggest(&self, domain: &str) -> Option<String> {
        let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
        if domain.is_empty() {
            return None;
        }

        let mut best: Option<(&str, f64)> = None;
        for candidate in &self.candidates {
            if *candidate == domain {
                // Already a known domain.
                return None;
            }
            let score = similarity(&domain, candidate);
            // Strict comparison keeps the earliest entry on ties.
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((candidate.as_str(), score));
            }
        }

        let (candidate, score) = best?;
        if score >= self.threshold {
            debug!(domain = %domain, suggestion = candidate, score, "typo suggestion");
            Some(candidate.to_string())
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn default_suggester() -> SimilaritySuggester {
        SimilaritySuggester::from_config(&EngineConfig::default())
    }

    #[test]
    fn suggests_common_provider() {
        let s = default_suggester();
        assert_eq!(s.suggest("gmial.com").as_deref(), Some("gmail.com"));
        assert_eq!(s.suggest("GMIAL.COM").as_deref(), Some("gmail.com"));
        assert_eq!(s.suggest("hotmial.com").as_deref(), Some("hotmail.com"));
        assert_eq!(s.suggest("yaho.com").as_deref(), Some("yahoo.com"));
    }

    #[test]
    fn exact_match_is_not_a_typo() {
        assert_eq!(default_suggester().suggest("gmail.com"), None);
    }

    #[test]
    fn unrelated_domain_has_no_suggestion() {
        let s = default_suggester();
        assert_eq!(s.suggest("company.com"), None);
        assert_eq!(s.suggest("mycompany-intranet.org"), None);
        assert_eq!(s.suggest(""), None);
    }

    #[test]
    fn ties_resolve_to_earliest_entry() {
        let s = SimilaritySuggester::new(vec!["abcd.com".into(), "abce.com".into()], 0.8);
        // One substitution away from both.
        assert_eq!(s.suggest("abcf.com").as_deref(), Some("abcd.com"));
    }

    #[test]
    fn transposition_counts_once() {
        let score = similarity("gmial.com", "gmail.com");
        assert!((score - 8.0 / 9.0).abs() < 1e-9, "{score}");
    }

    proptest! {
        #[test]
        fn similarity_is_bounded_and_symmetric(a in "[a-z.]{0,20}", b in "[a-z.]{0,20}") {
            let ab = similarity(&a, &b);
            prop_assert!((0.0..=1.0).contains(&ab));
            prop_assert!((ab - similarity(&b, &a)).abs() < 1e-9);
        }

        #[test]
        fn suggestion_is_deterministic_and_from_list(domain in "[a-z]{1,10}\\.(com|net|org)") {
            let s = default_suggester();
            let first = s.suggest(&domain);
            prop_assert_eq!(&first, &s.suggest(&domain));
            if let Some(suggestion) = first {
                prop_assert_ne!(&suggestion, &domain);
                prop_assert!(EngineConfig::default().common_domains.contains(&suggestion));
                prop_assert!(similarity(&domain, &suggestion) >= s.threshold());
            }
        }
    }
}

//! Offline classifiers: disposable domains, role-based local parts and the
//! typo suggester. All lookups are against lists held by the caller.

pub mod lists;
mod suggest;

use std::collections::HashSet;

pub use suggest::{DomainSuggester, SimilaritySuggester, similarity};

/// Case-insensitive exact match of `domain` against `disposable`.
pub fn is_disposable(domain: &str, disposable: &HashSet<String>) -> bool {
    let domain = domain.trim().trim_end_matches('.').to_ascii_lowercase();
    !domain.is_empty() && disposable.contains(&domain)
}

/// Lower-cased local part matched exactly against `prefixes`.
pub fn is_role_based(local_part: &str, prefixes: &HashSet<String>) -> bool {
    let local = local_part.trim().to_lowercase();
    !local.is_empty() && prefixes.contains(&local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    #[test]
    fn disposable_lookup_ignores_case() {
        let config = EngineConfig::default();
        assert!(is_disposable("tempmail.com", &config.disposable_domains));
        assert!(is_disposable("TempMail.COM", &config.disposable_domains));
        assert!(is_disposable("mailinator.com.", &config.disposable_domains));
        assert!(!is_disposable("company.com", &config.disposable_domains));
        assert!(!is_disposable("", &config.disposable_domains));
    }

    #[test]
    fn role_prefixes_match_whole_local_part() {
        let config = EngineConfig::default();
        assert!(is_role_based("info", &config.role_prefixes));
        assert!(is_role_based("Support", &config.role_prefixes));
        assert!(!is_role_based("information", &config.role_prefixes));
        assert!(!is_role_based("john.doe", &config.role_prefixes));
    }

    #[test]
    fn custom_lists_replace_defaults() {
        let config = EngineConfig::default()
            .with_disposable_domains(["burner.test"])
            .with_role_prefixes(["ceo"]);
        assert!(is_disposable("burner.test", &config.disposable_domains));
        assert!(!is_disposable("tempmail.com", &config.disposable_domains));
        assert!(is_role_based("ceo", &config.role_prefixes));
        assert!(!is_role_based("info", &config.role_prefixes));
    }
}

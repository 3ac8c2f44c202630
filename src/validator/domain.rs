use super::types::SyntaxError;

/// Valide le domaine: conversion IDNA + checks de labels.
/// Push des erreurs dans `errors`; renvoie la forme ASCII si la conversion a réussi.
pub(crate) fn check_domain(domain: &str, errors: &mut Vec<SyntaxError>) -> Option<String> {
    let domain_ascii = match idna::domain_to_ascii(domain) {
        Ok(d) => d,
        Err(_) => {
            errors.push(SyntaxError::Idna);
            return None;
        }
    };

    if domain_ascii.is_empty() {
        errors.push(SyntaxError::EmptyDomain);
        return None;
    }

    if domain_ascii.len() > 253 {
        errors.push(SyntaxError::DomainTooLong(domain_ascii.len()));
    }

    // au moins un point
    if !domain_ascii.contains('.') {
        errors.push(SyntaxError::DomainWithoutDot);
    }

    for label in domain_ascii.split('.') {
        if label.is_empty() {
            errors.push(SyntaxError::EmptyLabel);
            continue;
        }
        if label.len() > 63 {
            errors.push(SyntaxError::LabelTooLong(label.to_string()));
        }
        if label.starts_with('-') || label.ends_with('-') {
            errors.push(SyntaxError::LabelHyphen(label.to_string()));
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            errors.push(SyntaxError::LabelChars(label.to_string()));
        }
    }

    Some(domain_ascii.to_ascii_lowercase())
}

/// Lower-case, strip a trailing root dot, IDNA-encode when possible.
/// Used for cache keys and list membership, never for validation.
pub fn normalize_domain(domain: &str) -> String {
    let trimmed = domain.trim().trim_end_matches('.');
    idna::domain_to_ascii(trimmed)
        .unwrap_or_else(|_| trimmed.to_string())
        .to_ascii_lowercase()
}

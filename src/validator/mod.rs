//! Structural (RFC 5321 subset) validation of an address string. No I/O.

mod domain;
mod local;
mod types;

pub use domain::normalize_domain;
pub use types::{EmailAddress, SyntaxError, SyntaxReport, ValidationMode};

pub(crate) use domain::check_domain;
use local::{has_forbidden_whitespace, is_local_relaxed, is_local_strict};

const MAX_ADDRESS_LEN: usize = 254;
const MAX_LOCAL_LEN: usize = 64;
const MAX_DOMAIN_LEN: usize = 253;

/// Cheap yes/no gate, strict local-part rules.
pub fn validate_syntax(email: &str) -> bool {
    parse_email(email, ValidationMode::Strict).valid
}

/// Full structural check. Never fails: every problem ends up in
/// [`SyntaxReport::errors`], and [`SyntaxReport::address`] is only set when
/// the address is valid.
pub fn parse_email(email: &str, mode: ValidationMode) -> SyntaxReport {
    let input = email.trim();
    if input.is_empty() {
        return SyntaxReport::invalid(vec![SyntaxError::Empty]);
    }

    let mut errors = Vec::new();

    if input.len() > MAX_ADDRESS_LEN {
        errors.push(SyntaxError::TooLong(input.len()));
    }

    match input.matches('@').count() {
        0 => {
            errors.push(SyntaxError::MissingAt);
            return SyntaxReport::invalid(errors);
        }
        1 => {}
        _ => {
            errors.push(SyntaxError::MultipleAt);
            return SyntaxReport::invalid(errors);
        }
    }
    let Some((local, domain)) = input.split_once('@') else {
        errors.push(SyntaxError::MissingAt);
        return SyntaxReport::invalid(errors);
    };

    if local.is_empty() {
        errors.push(SyntaxError::EmptyLocal);
    } else if local.len() > MAX_LOCAL_LEN {
        errors.push(SyntaxError::LocalTooLong(local.len()));
    }

    let quoted_allowed = mode == ValidationMode::Relaxed;
    if has_forbidden_whitespace(local, quoted_allowed)
        || domain.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        errors.push(SyntaxError::WhitespaceOrControl);
    }

    let ascii_domain = if domain.is_empty() {
        errors.push(SyntaxError::EmptyDomain);
        None
    } else if domain.len() > MAX_DOMAIN_LEN {
        errors.push(SyntaxError::DomainTooLong(domain.len()));
        None
    } else {
        check_domain(domain, &mut errors)
    };

    if !local.is_empty() {
        let local_ok = match mode {
            ValidationMode::Strict => is_local_strict(local),
            ValidationMode::Relaxed => is_local_relaxed(local),
        };
        if !local_ok && !errors.contains(&SyntaxError::WhitespaceOrControl) {
            errors.push(SyntaxError::InvalidLocal);
        }
    }

    let address = match ascii_domain {
        Some(ascii) if errors.is_empty() => Some(EmailAddress::new(local, ascii)),
        _ => None,
    };

    SyntaxReport {
        valid: address.is_some(),
        errors,
        address,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn accepts_basic() {
        assert!(validate_syntax("user@example.com"));
        let r = parse_email("alice@example.com", ValidationMode::Strict);
        assert!(r.valid, "{:?}", r.errors);
        let address = r.address.expect("address");
        assert_eq!(address.local_part(), "alice");
        assert_eq!(address.domain(), "example.com");
    }

    #[test]
    fn rejects_missing_domain() {
        assert!(!validate_syntax("invalid@"));
        let r = parse_email("invalid@", ValidationMode::Strict);
        assert_eq!(r.errors, vec![SyntaxError::EmptyDomain]);
    }

    #[test]
    fn rejects_double_at() {
        let r = parse_email("a@@b.com", ValidationMode::Strict);
        assert!(!r.valid);
        assert_eq!(r.failure_reason().as_deref(), Some("multiple @"));
    }

    #[test]
    fn rejects_missing_at() {
        let r = parse_email("user.example.com", ValidationMode::Strict);
        assert_eq!(r.failure_reason().as_deref(), Some("missing @"));
    }

    #[test]
    fn rejects_dotless_domain() {
        let r = parse_email("user@localhost", ValidationMode::Strict);
        assert_eq!(r.errors, vec![SyntaxError::DomainWithoutDot]);
        assert!(r.errors[0].is_domain_error());
    }

    #[test]
    fn rejects_long_local_part() {
        let local = "a".repeat(65);
        let r = parse_email(&format!("{local}@example.com"), ValidationMode::Strict);
        assert_eq!(r.errors, vec![SyntaxError::LocalTooLong(65)]);
    }

    #[test]
    fn rejects_overlong_address() {
        let domain = format!("{}.com", [&*"a".repeat(60)].repeat(5).join("."));
        let r = parse_email(&format!("user@{domain}"), ValidationMode::Strict);
        assert!(!r.valid);
        assert!(matches!(r.errors[0], SyntaxError::TooLong(_)));
    }

    #[test]
    fn rejects_inner_whitespace_and_control() {
        assert!(!validate_syntax("us er@example.com"));
        assert!(!validate_syntax("user@exa mple.com"));
        assert!(!validate_syntax("user\u{7}@example.com"));
        let r = parse_email("us er@example.com", ValidationMode::Strict);
        assert_eq!(r.errors, vec![SyntaxError::WhitespaceOrControl]);
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert!(validate_syntax("  user@example.com\n"));
    }

    #[test]
    fn relaxed_accepts_quoted_local() {
        assert!(!parse_email("\"john doe\"@example.com", ValidationMode::Strict).valid);
        assert!(parse_email("\"john doe\"@example.com", ValidationMode::Relaxed).valid);
    }

    #[test]
    fn idn_domain_is_stored_ascii() {
        let r = parse_email("alice@Exämple.com", ValidationMode::Strict);
        assert_eq!(
            r.address.map(|a| a.domain().to_string()).as_deref(),
            Some("xn--exmple-cua.com")
        );
    }

    proptest! {
        #[test]
        fn parse_is_deterministic(input in "\\PC{0,80}") {
            let a = parse_email(&input, ValidationMode::Strict);
            let b = parse_email(&input, ValidationMode::Strict);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn address_present_iff_valid(input in "[a-z.@ -]{0,40}") {
            let r = parse_email(&input, ValidationMode::Relaxed);
            prop_assert_eq!(r.valid, r.address.is_some());
            prop_assert_eq!(r.valid, r.errors.is_empty());
        }
    }
}

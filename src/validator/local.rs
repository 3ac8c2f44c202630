/// RFC 5322 atext specials, besides ASCII letters and digits.
const ATEXT_SPECIALS: &str = "!#$%&'*+-/=?^_`{|}~";

/// Règles strictes: atext ASCII + '.' non initial/terminal, pas de ".."
pub(crate) fn is_local_strict(s: &str) -> bool {
    if s.starts_with('.') || s.ends_with('.') || s.contains("..") {
        return false;
    }
    s.chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || ATEXT_SPECIALS.contains(c))
}

/// Règles relaxed: autorise une quoted-string simple (sans guillemet interne
/// non échappé), sinon retombe sur `is_local_strict`.
pub(crate) fn is_local_relaxed(s: &str) -> bool {
    match quoted_body(s) {
        Some(body) => !has_unescaped_quote(body),
        None => is_local_strict(s),
    }
}

/// Whitespace is only tolerated inside a quoted local part (relaxed mode);
/// control characters never are.
pub(crate) fn has_forbidden_whitespace(s: &str, quoted_allowed: bool) -> bool {
    if s.chars().any(char::is_control) {
        return true;
    }
    if quoted_allowed && quoted_body(s).is_some() {
        return false;
    }
    s.chars().any(char::is_whitespace)
}

fn quoted_body(s: &str) -> Option<&str> {
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        Some(&s[1..s.len() - 1])
    } else {
        None
    }
}

fn has_unescaped_quote(body: &str) -> bool {
    let mut escaped = false;
    for c in body.chars() {
        match c {
            '\\' if !escaped => escaped = true,
            '"' if !escaped => return true,
            _ => escaped = false,
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn strict_dots() {
        assert!(!is_local_strict(".abc"));
        assert!(!is_local_strict("abc."));
        assert!(!is_local_strict("a..b"));
        assert!(is_local_strict("a.b"));
    }
    #[test]
    fn relaxed_quoted() {
        assert!(is_local_relaxed("\"a b\""));
        assert!(is_local_relaxed("\"a\\\"b\""));
        assert!(!is_local_relaxed("\"a\"b\""));
    }
    #[test]
    fn whitespace_only_inside_quotes() {
        assert!(has_forbidden_whitespace("a b", true));
        assert!(!has_forbidden_whitespace("\"a b\"", true));
        assert!(has_forbidden_whitespace("\"a b\"", false));
        assert!(has_forbidden_whitespace("\"a\tb\"", true));
    }
}

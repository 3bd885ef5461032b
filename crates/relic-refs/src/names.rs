//! Reference name validation and glob matching.
//!
//! Valid reference names:
//! - Must be non-empty
//! - Must not contain whitespace, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - Must not contain `..` (double dot) or `@{`
//! - Must not start or end with `.` or `/`
//! - Must not contain consecutive slashes (`//`)
//! - No component may start with `.` or end with `.lock`

use relic_types::{StoreError, StoreResult};

/// Characters that are forbidden anywhere in a reference name.
const FORBIDDEN_CHARS: &[char] = &[' ', '\t', '\n', '\r', '~', '^', ':', '?', '*', '[', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> StoreError {
    StoreError::InvalidRefName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// Validate a reference name, returning `Ok(())` if valid.
///
/// # Examples
///
/// ```
/// use relic_refs::names::validate_refname;
///
/// assert!(validate_refname("refs/heads/main").is_ok());
/// assert!(validate_refname("HEAD").is_ok());
/// assert!(validate_refname("").is_err());
/// assert!(validate_refname("refs/heads/bad..name").is_err());
/// ```
pub fn validate_refname(name: &str) -> StoreResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "ref name must not be empty"));
    }

    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
        }
    }

    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }

    if name.contains("@{") {
        return Err(invalid(name, "must not contain '@{'"));
    }

    if name.starts_with('.') || name.ends_with('.') {
        return Err(invalid(name, "must not start or end with '.'"));
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err(invalid(name, "must not start or end with '/'"));
    }

    if name.contains("//") {
        return Err(invalid(name, "must not contain consecutive slashes"));
    }

    for component in name.split('/') {
        if component.starts_with('.') {
            return Err(invalid(name, "no component may start with '.'"));
        }
        if component.ends_with(".lock") {
            return Err(invalid(name, "no component may end with '.lock'"));
        }
    }

    Ok(())
}

/// Match a reference name against a glob pattern.
///
/// `*` matches any run of characters (including `/`), `?` matches exactly
/// one character; everything else matches literally.
pub fn glob_match(pattern: &str, name: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let n: Vec<char> = name.chars().collect();
    let (mut pi, mut ni) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;

    while ni < n.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == n[ni]) {
            pi += 1;
            ni += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ni));
            pi += 1;
        } else if let Some((star_pi, star_ni)) = star {
            // Backtrack: let the last `*` absorb one more character.
            pi = star_pi + 1;
            ni = star_ni + 1;
            star = Some((star_pi, star_ni + 1));
        } else {
            return false;
        }
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    // -----------------------------------------------------------------------
    // Refname validation
    // -----------------------------------------------------------------------

    #[test]
    fn accepts_common_names() {
        for name in [
            "HEAD",
            "refs/heads/main",
            "refs/heads/feature/auth",
            "refs/tags/v1.0.0",
            "refs/remotes/origin/main",
        ] {
            assert!(validate_refname(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_empty() {
        assert!(validate_refname("").is_err());
    }

    #[test]
    fn rejects_forbidden_characters() {
        for name in [
            "refs/heads/with space",
            "refs/heads/tilde~1",
            "refs/heads/caret^2",
            "refs/heads/colon:x",
            "refs/heads/quest?",
            "refs/heads/star*",
            "refs/heads/brack[et",
            "refs/heads/back\\slash",
        ] {
            assert!(validate_refname(name).is_err(), "{name} should be invalid");
        }
    }

    #[test]
    fn rejects_double_dot_and_reflog_syntax() {
        assert!(validate_refname("refs/heads/bad..name").is_err());
        assert!(validate_refname("refs/heads/bad@{1}").is_err());
    }

    #[test]
    fn rejects_bad_edges() {
        assert!(validate_refname(".refs/heads/main").is_err());
        assert!(validate_refname("refs/heads/main.").is_err());
        assert!(validate_refname("/refs/heads/main").is_err());
        assert!(validate_refname("refs/heads/main/").is_err());
        assert!(validate_refname("refs//heads/main").is_err());
    }

    #[test]
    fn rejects_bad_components() {
        assert!(validate_refname("refs/heads/.hidden").is_err());
        assert!(validate_refname("refs/heads/main.lock").is_err());
        assert!(validate_refname("refs/main.lock/x").is_err());
    }

    #[test]
    fn reason_is_carried() {
        let err = validate_refname("refs/heads/bad..name").unwrap_err();
        assert!(err.to_string().contains(".."));
    }

    // -----------------------------------------------------------------------
    // Glob matching
    // -----------------------------------------------------------------------

    #[test]
    fn literal_patterns() {
        assert!(glob_match("refs/heads/main", "refs/heads/main"));
        assert!(!glob_match("refs/heads/main", "refs/heads/maim"));
        assert!(!glob_match("refs/heads/main", "refs/heads/main2"));
    }

    #[test]
    fn star_matches_runs() {
        assert!(glob_match("refs/heads/*", "refs/heads/main"));
        assert!(glob_match("refs/heads/*", "refs/heads/feature/auth"));
        assert!(glob_match("refs/*/main", "refs/heads/main"));
        assert!(glob_match("*", "anything/at/all"));
        assert!(!glob_match("refs/tags/*", "refs/heads/main"));
    }

    #[test]
    fn question_mark_matches_one_char() {
        assert!(glob_match("refs/tags/v?", "refs/tags/v1"));
        assert!(!glob_match("refs/tags/v?", "refs/tags/v10"));
        assert!(!glob_match("refs/tags/v?", "refs/tags/v"));
    }

    #[test]
    fn trailing_star_matches_empty() {
        assert!(glob_match("refs/heads/main*", "refs/heads/main"));
        assert!(glob_match("refs/heads/main*", "refs/heads/main-2"));
    }

    #[test]
    fn multiple_stars_backtrack() {
        assert!(glob_match("refs/*/feature/*", "refs/heads/feature/auth"));
        assert!(glob_match("*main*", "refs/heads/main"));
        assert!(!glob_match("*main*x", "refs/heads/main"));
    }
}

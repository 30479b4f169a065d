//! Reference name validation following git-style conventions.
//!
//! A valid reference name:
//! - has at least two `/`-separated components (e.g. `refs/tags/v1.0`)
//! - contains no control characters, space, `~`, `^`, `:`, `?`, `*`, `[`, `\`
//! - contains no `..` and no `@{`
//! - has no empty component (`//`, leading or trailing `/`)
//! - has no component starting with `.` or ending with `.lock`
//! - does not end with `.` and is not the single character `@`

/// Bytes forbidden anywhere in a reference name.
const FORBIDDEN: &[u8] = b" ~^:?*[\\";

/// Check a full reference name, returning the reason it is invalid.
///
/// ```
/// use ks_fsck::check_refname_format;
///
/// assert!(check_refname_format(b"refs/tags/v1.0").is_ok());
/// assert!(check_refname_format(b"refs/tags/bad..name").is_err());
/// ```
pub fn check_refname_format(name: &[u8]) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("name must not be empty");
    }
    if name == b"@" {
        return Err("name must not be '@'");
    }
    if name.last() == Some(&b'.') {
        return Err("must not end with '.'");
    }
    if name.windows(2).any(|w| w == b"..") {
        return Err("must not contain '..'");
    }
    if name.windows(2).any(|w| w == b"@{") {
        return Err("must not contain '@{'");
    }
    for &b in name {
        if b < 0x20 || b == 0x7f {
            return Err("contains a control character");
        }
        if FORBIDDEN.contains(&b) {
            return Err("contains a forbidden character");
        }
    }

    let mut components = 0;
    for component in name.split(|&b| b == b'/') {
        if component.is_empty() {
            return Err("path components must not be empty");
        }
        if component[0] == b'.' {
            return Err("component must not start with '.'");
        }
        if component.ends_with(b".lock") {
            return Err("component must not end with '.lock'");
        }
        components += 1;
    }
    if components < 2 {
        return Err("name must have at least two components");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str) -> Result<(), &'static str> {
        check_refname_format(format!("refs/tags/{name}").as_bytes())
    }

    #[test]
    fn valid_simple_names() {
        assert!(tag("v1.0").is_ok());
        assert!(tag("release-2024").is_ok());
        assert!(tag("a").is_ok());
    }

    #[test]
    fn valid_nested_names() {
        assert!(tag("team/alpha/v2").is_ok());
    }

    #[test]
    fn reject_empty_name() {
        assert!(tag("").is_err());
        assert!(check_refname_format(b"").is_err());
    }

    #[test]
    fn reject_double_dot() {
        assert!(tag("bad..name").is_err());
    }

    #[test]
    fn reject_whitespace_and_control() {
        assert!(tag("has space").is_err());
        assert!(tag("has\ttab").is_err());
        assert!(tag("del\x7f").is_err());
    }

    #[test]
    fn reject_forbidden_chars() {
        for name in ["a~b", "a^b", "a:b", "a?b", "a*b", "a[b", "a\\b"] {
            assert!(tag(name).is_err(), "{name} should be rejected");
        }
    }

    #[test]
    fn reject_dot_rules() {
        assert!(tag(".hidden").is_err());
        assert!(tag("trailing.").is_err());
        assert!(tag("dir/.hidden").is_err());
    }

    #[test]
    fn reject_slash_rules() {
        assert!(tag("trailing/").is_err());
        assert!(tag("a//b").is_err());
    }

    #[test]
    fn reject_lock_suffix() {
        assert!(tag("v1.lock").is_err());
        assert!(tag("v1.lock/x").is_err());
    }

    #[test]
    fn reject_at_brace() {
        assert!(tag("v1@{0}").is_err());
    }

    #[test]
    fn at_sign_alone_is_only_invalid_as_whole_name() {
        assert!(check_refname_format(b"@").is_err());
        assert!(tag("@").is_ok());
    }

    #[test]
    fn single_component_is_rejected() {
        assert!(check_refname_format(b"HEAD").is_err());
    }
}

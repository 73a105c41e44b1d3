//! Named regular expressions for `pattern=#name` rules.

use std::sync::OnceLock;

use regex::Regex;

const SOURCES: [(&str, &str); 7] = [
    (
        "#email",
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    ),
    (
        "#url",
        r"^(?i:https?|ftp)://[^\s/$.?#][^\s]*$",
    ),
    ("#digits", r"^[0-9]+$"),
    ("#hex", r"^(?:0[xX])?[0-9a-fA-F]+$"),
    (
        "#base64",
        r"^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$",
    ),
    ("#alphabets", r"^[a-zA-Z]+$"),
    ("#alphanumeric", r"^[a-zA-Z0-9]+$"),
];

/// One entry of the pattern library.
#[derive(Debug)]
pub struct NamedPattern {
    name: &'static str,
    regex: Regex,
}

impl NamedPattern {
    /// The `#name` used to reference this pattern.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The compiled, anchored expression.
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Returns `true` if the whole of `text` matches.
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Fixed catalogue of named, anchored patterns.
///
/// The table is compiled once per process and shared read-only.
///
/// # Examples
///
/// ```
/// use bind_core::PatternLibrary;
///
/// let digits = PatternLibrary::lookup("#digits").unwrap();
/// assert!(digits.is_match("12345"));
/// assert!(!digits.is_match("12a45"));
///
/// assert!(PatternLibrary::lookup("#phone").is_none());
/// ```
pub struct PatternLibrary;

impl PatternLibrary {
    /// Finds a pattern by its exact `#name`.
    pub fn lookup(name: &str) -> Option<&'static NamedPattern> {
        Self::all().iter().find(|p| p.name == name)
    }

    /// Every pattern in the library.
    pub fn all() -> &'static [NamedPattern] {
        static TABLE: OnceLock<Vec<NamedPattern>> = OnceLock::new();
        TABLE.get_or_init(|| {
            SOURCES
                .iter()
                .filter_map(|&(name, source)| match Regex::new(source) {
                    Ok(regex) => Some(NamedPattern { name, regex }),
                    Err(err) => {
                        tracing::error!(pattern = name, error = %err, "builtin pattern failed to compile");
                        None
                    }
                })
                .collect()
        })
    }

    /// Names of every pattern, in catalogue order.
    pub fn names() -> impl Iterator<Item = &'static str> {
        SOURCES.iter().map(|&(name, _)| name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matches(name: &str, text: &str) -> bool {
        PatternLibrary::lookup(name)
            .unwrap_or_else(|| panic!("missing pattern {}", name))
            .is_match(text)
    }

    #[test]
    fn every_builtin_compiles() {
        assert_eq!(PatternLibrary::all().len(), SOURCES.len());
        for name in PatternLibrary::names() {
            assert!(PatternLibrary::lookup(name).is_some(), "{}", name);
        }
    }

    #[test]
    fn every_builtin_is_anchored() {
        for p in PatternLibrary::all() {
            let src = p.regex().as_str();
            assert!(src.starts_with('^') && src.ends_with('$'), "{}", p.name());
        }
    }

    #[test]
    fn lookup_requires_exact_name() {
        assert!(PatternLibrary::lookup("digits").is_none());
        assert!(PatternLibrary::lookup("#DIGITS").is_none());
    }

    #[test]
    fn email() {
        assert!(matches("#email", "user@example.com"));
        assert!(matches("#email", "first.last+tag@sub.example.org"));
        assert!(!matches("#email", "user@"));
        assert!(!matches("#email", "not an email"));
    }

    #[test]
    fn url() {
        assert!(matches("#url", "https://example.com/path?q=1"));
        assert!(matches("#url", "http://localhost:8080"));
        assert!(!matches("#url", "example.com"));
        assert!(!matches("#url", "https://exa mple.com"));
    }

    #[test]
    fn digits() {
        assert!(matches("#digits", "12345"));
        assert!(!matches("#digits", "12a45"));
        assert!(!matches("#digits", ""));
    }

    #[test]
    fn hex() {
        assert!(matches("#hex", "deadBEEF"));
        assert!(matches("#hex", "0x1f"));
        assert!(!matches("#hex", "xyz"));
    }

    #[test]
    fn base64() {
        assert!(matches("#base64", "aGVsbG8="));
        assert!(matches("#base64", "aGk="));
        assert!(!matches("#base64", "aGk"));
        assert!(!matches("#base64", "a$b="));
    }

    #[test]
    fn alphabets_and_alphanumeric() {
        assert!(matches("#alphabets", "Hello"));
        assert!(!matches("#alphabets", "Hello1"));
        assert!(matches("#alphanumeric", "Hello1"));
        assert!(!matches("#alphanumeric", "Hello 1"));
    }
}

//! Message content matching for extracting passcodes from email bodies.
//!
//! This module provides a flexible [`Matcher`] trait and built-in
//! implementations, most importantly [`CodeMatcher`] which applies the
//! vendor's passcode phrasings in priority order.
//!
//! # Example
//!
//! ```
//! use report_relay::matcher::{CodeMatcher, RegexMatcher, Matcher};
//!
//! // Using the built-in prioritized code matcher
//! let code = CodeMatcher::vendor_default();
//! assert_eq!(
//!     code.find_match("Your security code: 123456").as_deref(),
//!     Some("123456")
//! );
//!
//! // Using custom regex
//! let custom = RegexMatcher::new(r"ticket #(\d+)").unwrap();
//! assert_eq!(custom.find_match("See ticket #42 for details").as_deref(), Some("42"));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

/// Passcode phrasings in priority order. Labeled phrases win over the bare
/// digit-run fallback, so a message containing both a labeled code and an
/// incidental 6-digit number (an order id, say) resolves to the labeled one.
const LABELED_CODE_PATTERNS: [&str; 4] = [
    r"security code[:\s]*(\d{6})",
    r"login code[:\s]*(\d{6})",
    r"verification code[:\s]*(\d{6})",
    r"code[:\s]*(\d{6})",
];

/// Lowest-priority fallback: any 6-digit run.
const BARE_CODE_PATTERN: &str = r"(\d{6})";

static VENDOR_MATCHERS: Lazy<Vec<RegexMatcher>> = Lazy::new(|| {
    LABELED_CODE_PATTERNS
        .iter()
        .chain(std::iter::once(&BARE_CODE_PATTERN))
        .map(|pattern| RegexMatcher::new(pattern).expect("valid regex"))
        .collect()
});

/// Trait for matching and extracting content from message bodies.
///
/// Implement this trait to define custom matching logic.
///
/// # Example
///
/// ```
/// use report_relay::matcher::Matcher;
/// use std::borrow::Cow;
///
/// struct FirstLineMatcher;
///
/// impl Matcher for FirstLineMatcher {
///     fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
///         text.lines().next().map(Cow::Borrowed)
///     }
///
///     fn description(&self) -> &str {
///         "first line"
///     }
/// }
/// ```
pub trait Matcher: Send + Sync {
    /// Attempts to find and extract matching content from the text.
    ///
    /// Returns `Some(matched_value)` if found, `None` otherwise.
    /// Uses `Cow<str>` to avoid allocations when the match can be borrowed
    /// directly from the input text.
    fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>>;

    /// Returns a human-readable description of what this matcher looks for.
    ///
    /// Used in logging and error messages.
    fn description(&self) -> &str;
}

/// Regex-based matcher that extracts the first capture group.
///
/// # Example
///
/// ```
/// use report_relay::matcher::{RegexMatcher, Matcher};
///
/// let matcher = RegexMatcher::new(r"code:\s*(\d+)").unwrap();
/// assert_eq!(matcher.find_match("Your code: 42"), Some("42".into()));
/// ```
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    regex: Regex,
    description: String,
}

impl RegexMatcher {
    /// Creates a new regex matcher.
    ///
    /// The regex should contain at least one capture group. The first capture
    /// group will be extracted as the match result.
    ///
    /// # Errors
    ///
    /// Returns an error if the regex pattern is invalid.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(pattern)?;
        Ok(Self {
            description: format!("regex pattern: {pattern}"),
            regex,
        })
    }

    /// Creates a new regex matcher with a custom description.
    ///
    /// # Errors
    ///
    /// Returns an error if the regex pattern is invalid.
    pub fn with_description(
        pattern: &str,
        description: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        let regex = Regex::new(pattern)?;
        Ok(Self {
            description: description.into(),
            regex,
        })
    }
}

impl Matcher for RegexMatcher {
    fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
        self.regex
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| Cow::Borrowed(m.as_str()))
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Prioritized matcher for 6-digit login passcodes.
///
/// Patterns are tried in a fixed priority order against the lowercased text:
/// "security code", "login code", "verification code", "code", then (for the
/// default variant) any bare 6-digit run. The first capturing match by
/// pattern priority wins - priority, not position, disambiguates a message
/// containing several 6-digit numbers.
///
/// # Example
///
/// ```
/// use report_relay::matcher::{CodeMatcher, Matcher};
///
/// let matcher = CodeMatcher::vendor_default();
///
/// // The labeled code wins over the stray digit run
/// let text = "Ref 222222. Your security code: 111111";
/// assert_eq!(matcher.find_match(text).as_deref(), Some("111111"));
///
/// // Without any 6-digit run there is no code
/// assert_eq!(matcher.find_match("Your code: 12345"), None);
/// ```
#[derive(Debug, Clone)]
pub struct CodeMatcher {
    patterns: Vec<RegexMatcher>,
    description: &'static str,
}

impl CodeMatcher {
    /// Creates the default matcher: labeled phrases first, bare 6-digit
    /// fallback last.
    #[must_use]
    pub fn vendor_default() -> Self {
        Self {
            patterns: VENDOR_MATCHERS.clone(),
            description: "prioritized 6-digit passcode",
        }
    }

    /// Creates a matcher without the bare digit-run fallback.
    ///
    /// Use this when message bodies may contain incidental 6-digit runs
    /// (order numbers, reference ids) that must never be mistaken for a
    /// passcode.
    #[must_use]
    pub fn labeled_only() -> Self {
        Self {
            patterns: VENDOR_MATCHERS[..LABELED_CODE_PATTERNS.len()].to_vec(),
            description: "labeled 6-digit passcode",
        }
    }
}

impl Matcher for CodeMatcher {
    fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
        // Phrases are matched case-insensitively by lowercasing once up
        // front, as the vendor mixes "Security Code" and "security code".
        let lowered = text.to_lowercase();

        self.patterns
            .iter()
            .find_map(|pattern| pattern.find_match(&lowered))
            .map(|code| Cow::Owned(code.into_owned()))
    }

    fn description(&self) -> &str {
        self.description
    }
}

/// Matcher using a closure for custom matching logic.
///
/// # Example
///
/// ```
/// use report_relay::matcher::{ClosureMatcher, Matcher};
/// use std::borrow::Cow;
///
/// let matcher = ClosureMatcher::new(
///     |text| {
///         text.lines()
///             .find(|line| line.starts_with("Code:"))
///             .map(|line| Cow::Owned(line.trim_start_matches("Code:").trim().to_string()))
///     },
///     "code line extractor"
/// );
///
/// let text = "Hello\nCode: ABC123\nThanks";
/// assert_eq!(matcher.find_match(text).as_deref(), Some("ABC123"));
/// ```
pub struct ClosureMatcher<F>
where
    F: for<'a> Fn(&'a str) -> Option<Cow<'a, str>> + Send + Sync,
{
    matcher_fn: F,
    description: String,
}

impl<F> ClosureMatcher<F>
where
    F: for<'a> Fn(&'a str) -> Option<Cow<'a, str>> + Send + Sync,
{
    /// Creates a new closure-based matcher.
    #[must_use]
    pub fn new(matcher_fn: F, description: impl Into<String>) -> Self {
        Self {
            matcher_fn,
            description: description.into(),
        }
    }
}

impl<F> Matcher for ClosureMatcher<F>
where
    F: for<'a> Fn(&'a str) -> Option<Cow<'a, str>> + Send + Sync,
{
    fn find_match<'a>(&self, text: &'a str) -> Option<Cow<'a, str>> {
        (self.matcher_fn)(text)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl<F> std::fmt::Debug for ClosureMatcher<F>
where
    F: for<'a> Fn(&'a str) -> Option<Cow<'a, str>> + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureMatcher")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regex_matcher() {
        let matcher = RegexMatcher::new(r"code:\s*(\d+)").unwrap();
        assert_eq!(
            matcher.find_match("Your code: 12345").as_deref(),
            Some("12345")
        );
        assert_eq!(matcher.find_match("No code here"), None);
    }

    #[test]
    fn test_labeled_beats_stray_digits() {
        let matcher = CodeMatcher::vendor_default();
        let text = "Order 222222 received. Your security code: 111111";
        assert_eq!(matcher.find_match(text).as_deref(), Some("111111"));
    }

    #[test]
    fn test_labeled_beats_earlier_stray_digits() {
        // The stray run appears first in the text; priority still wins
        let matcher = CodeMatcher::vendor_default();
        let text = "222222\nsecurity code: 111111";
        assert_eq!(matcher.find_match(text).as_deref(), Some("111111"));
    }

    #[test]
    fn test_phrase_priority_order() {
        let matcher = CodeMatcher::vendor_default();
        // "security code" outranks "login code" regardless of position
        let text = "login code: 333333 ... security code: 444444";
        assert_eq!(matcher.find_match(text).as_deref(), Some("444444"));
    }

    #[test]
    fn test_case_insensitive_phrases() {
        let matcher = CodeMatcher::vendor_default();
        assert_eq!(
            matcher.find_match("Your Verification Code: 987654").as_deref(),
            Some("987654")
        );
    }

    #[test]
    fn test_bare_fallback() {
        let matcher = CodeMatcher::vendor_default();
        assert_eq!(
            matcher.find_match("Use 555555 to continue").as_deref(),
            Some("555555")
        );
    }

    #[test]
    fn test_no_six_digit_run() {
        let matcher = CodeMatcher::vendor_default();
        assert_eq!(matcher.find_match("Your code: 12345"), None);
        assert_eq!(matcher.find_match("No digits at all"), None);
    }

    #[test]
    fn test_labeled_only_ignores_bare_digits() {
        let matcher = CodeMatcher::labeled_only();
        assert_eq!(matcher.find_match("Order #987654 confirmed"), None);
        assert_eq!(
            matcher.find_match("security code: 111111").as_deref(),
            Some("111111")
        );
    }

    #[test]
    fn test_colonless_phrase() {
        // The separator between phrase and digits is optional
        let matcher = CodeMatcher::vendor_default();
        assert_eq!(
            matcher.find_match("security code 654321").as_deref(),
            Some("654321")
        );
    }

    #[test]
    fn test_closure_matcher() {
        let matcher = ClosureMatcher::new(
            |text| {
                text.lines()
                    .find(|line| line.contains("SECRET"))
                    .map(|line| Cow::Owned(line.replace("SECRET:", "").trim().to_string()))
            },
            "secret extractor",
        );

        let text = "Header\nSECRET: my-value\nFooter";
        assert_eq!(matcher.find_match(text).as_deref(), Some("my-value"));
    }

    #[test]
    fn test_regex_matcher_returns_borrowed() {
        // Verify that RegexMatcher returns a borrowed reference (no allocation)
        let matcher = RegexMatcher::new(r"code:\s*(\d+)").unwrap();
        let result = matcher.find_match("Your code: 12345");
        assert!(matches!(result, Some(Cow::Borrowed(_))));
    }

    #[test]
    fn test_with_description() {
        let matcher = RegexMatcher::with_description(r"(\d{6})", "6-digit code").unwrap();
        assert_eq!(matcher.description(), "6-digit code");
    }
}

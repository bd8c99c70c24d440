//! Filename eligibility.

use std::sync::LazyLock;

use regex::Regex;

/// Three or four letters, a double underscore, then anything.
const NAME_PATTERN: &str = r"^[A-Za-z]{3,4}__";

static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NAME_PATTERN).expect("name pattern is a valid regex"));

/// Decides whether a file name is eligible for upload.
///
/// A name matches when it starts with 3 or 4 ASCII letters (any case)
/// immediately followed by `__`. Extension and length are not checked.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameMatcher;

impl NameMatcher {
    pub fn new() -> Self {
        Self
    }

    pub fn matches(&self, name: &str) -> bool {
        NAME_RE.is_match(name)
    }

    /// Human readable description used in the startup banner.
    pub fn describe(&self) -> &'static str {
        "3-4 letters + '__' + name"
    }

    /// Example names shown in the startup banner.
    pub fn examples(&self) -> &'static [&'static str] {
        &["BOI__report.xlsx", "IDB__data.csv"]
    }
}

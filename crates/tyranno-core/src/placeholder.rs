//! Placeholder scanning
//!
//! Finds references of the form:
//! - `${project.version}` - a path
//! - `${ . }` - the namespace root
//! - `${versions ~ semver_max(@) ~}` - a path plus a JMESPath query
//!
//! Scanning is pure: it returns spans and never substitutes anything.
//! [`substitute`] rebuilds a string from those spans.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

/// A reference parsed out of a string leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    /// Dotted path, possibly empty or starting with `.`
    pub path: String,
    /// Query applied to the resolved value, passed through verbatim
    pub query: Option<String>,
}

/// A placeholder plus the byte range it occupies in the scanned text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub span: Range<usize>,
    pub placeholder: Placeholder,
}

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{\s*([-._A-Za-z0-9]*)\s*(?:~\s*([^~]+)~\s*)?\}")
            .expect("placeholder pattern is valid")
    })
}

/// Find all non-overlapping placeholders in `text`, left to right
pub fn scan(text: &str) -> Vec<Match> {
    pattern()
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let path = caps.get(1).map_or("", |m| m.as_str()).to_string();
            let query = caps.get(2).map(|m| m.as_str().trim().to_string());
            Some(Match {
                span: whole.range(),
                placeholder: Placeholder { path, query },
            })
        })
        .collect()
}

/// Check if a string contains any placeholder
pub fn contains_placeholder(text: &str) -> bool {
    pattern().is_match(text)
}

/// Rebuild `text` with every matched span replaced by its computed text.
///
/// `replacements` must line up with `matches`. Text outside the spans is
/// copied byte for byte.
pub fn substitute(text: &str, matches: &[Match], replacements: &[String]) -> String {
    let mut result = String::with_capacity(text.len());
    let mut last = 0;

    for (m, replacement) in matches.iter().zip(replacements) {
        result.push_str(&text[last..m.span.start]);
        result.push_str(replacement);
        last = m.span.end;
    }

    result.push_str(&text[last..]);
    result
}

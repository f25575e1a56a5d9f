//! Text assertions. Failed equality, prefix and suffix checks carry a line
//! diff between the actual and expected text.

use std::borrow::Cow;
use std::fmt;

use difference::{Changeset, Difference};
use regex::Regex;

use super::{Expectation, Family};
use crate::errors::{Exception, Outcome, VALUE_ERROR};
use crate::value::Value;

/// A regular expression given either as source text or precompiled.
#[derive(Debug, Clone)]
pub enum Pattern {
    Raw(String),
    Compiled(Regex),
}

impl Pattern {
    pub fn as_str(&self) -> &str {
        match self {
            Pattern::Raw(source) => source,
            Pattern::Compiled(regex) => regex.as_str(),
        }
    }

    /// Compiles raw patterns; an invalid pattern raises `ValueError`.
    pub fn regex(&self) -> Outcome<Cow<'_, Regex>> {
        match self {
            Pattern::Compiled(regex) => Ok(Cow::Borrowed(regex)),
            Pattern::Raw(source) => Regex::new(source).map(Cow::Owned).map_err(|e| {
                Exception::new(&VALUE_ERROR, format!("invalid pattern /{}/: {}", source, e))
            }),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.as_str())
    }
}

impl From<&str> for Pattern {
    fn from(source: &str) -> Self {
        Pattern::Raw(source.to_string())
    }
}

impl From<String> for Pattern {
    fn from(source: String) -> Self {
        Pattern::Raw(source)
    }
}

impl From<Regex> for Pattern {
    fn from(regex: Regex) -> Self {
        Pattern::Compiled(regex)
    }
}

/// Line diff of `actual` against `expected`: `-` lines only in expected,
/// `+` lines only in actual.
pub fn line_diff(actual: &str, expected: &str) -> String {
    let changeset = Changeset::new(expected, actual, "\n");
    let mut out = String::from("diff (-expected +actual):");
    for diff in &changeset.diffs {
        let (marker, chunk) = match diff {
            Difference::Same(x) => (' ', x),
            Difference::Add(x) => ('+', x),
            Difference::Rem(x) => ('-', x),
        };
        for line in chunk.split('\n') {
            out.push('\n');
            out.push(marker);
            out.push_str(line);
        }
    }
    out
}

impl<'r> Expectation<'r> {
    fn text(&self, assertion: &str) -> Outcome<&str> {
        match (&self.family, self.actual.as_text()) {
            (Family::Text, Some(text)) => Ok(text),
            _ => Err(self.unsupported(assertion)),
        }
    }

    pub(super) fn text_equal(&self, expected: &Value) -> Outcome<&Self> {
        let claim = self.claim("equal").expected(expected);
        match (self.actual.as_text(), expected.as_text()) {
            (Some(actual), Some(wanted)) if actual == wanted => self.verdict(true, claim),
            (Some(actual), Some(wanted)) => {
                self.verdict(false, claim.detail(line_diff(actual, wanted)))
            }
            _ => self.verdict(false, claim),
        }
    }

    pub(super) fn text_contain(&self, needle: &Value) -> Outcome<&Self> {
        self.ensure_comparable(needle, "search")?;
        let holds = match (self.actual.as_text(), needle.as_text()) {
            (Some(haystack), Some(needle)) => haystack.contains(needle),
            _ => false,
        };
        self.verdict(holds, self.claim("contain").expected(needle))
    }

    pub fn to_start_with(&self, prefix: &str) -> Outcome<&Self> {
        let actual = self.text("to_start_with")?;
        let holds = actual.len() >= prefix.len() && actual.starts_with(prefix);
        let mut claim = self.claim("start with").expected(Value::from(prefix));
        if !holds {
            let head: String = actual.chars().take(prefix.chars().count()).collect();
            claim = claim.detail(line_diff(&head, prefix));
        }
        self.verdict(holds, claim)
    }

    pub fn to_end_with(&self, suffix: &str) -> Outcome<&Self> {
        let actual = self.text("to_end_with")?;
        let holds = actual.len() >= suffix.len() && actual.ends_with(suffix);
        let mut claim = self.claim("end with").expected(Value::from(suffix));
        if !holds {
            let count = actual.chars().count();
            let tail: String = actual
                .chars()
                .skip(count.saturating_sub(suffix.chars().count()))
                .collect();
            claim = claim.detail(line_diff(&tail, suffix));
        }
        self.verdict(holds, claim)
    }

    /// Searches for `pattern` anywhere in the text.
    pub fn to_match(&self, pattern: impl Into<Pattern>) -> Outcome<&Self> {
        let actual = self.text("to_match")?;
        let pattern = pattern.into();
        let holds = pattern.regex()?.is_match(actual);
        self.verdict(holds, self.claim("match").expected(&pattern))
    }
}

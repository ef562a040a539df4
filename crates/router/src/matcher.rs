//! Token matchers used by routes.
//!
//! Every pattern is anchored: `"get-.*"` matches the whole token `get-url`
//! but never a token that merely contains `get-`.

use crate::error::{DispatchError, DispatchResult};
use mockproc_common::program_name;
use regex::Regex;
use std::fmt;

/// A compiled, whole-token regular expression.
#[derive(Clone)]
pub struct TokenPattern {
    source: String,
    regex: Regex,
}

impl TokenPattern {
    pub fn new(pattern: &str) -> DispatchResult<Self> {
        let regex =
            Regex::new(&format!("^(?:{pattern})$")).map_err(|source| DispatchError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, token: &str) -> bool {
        self.regex.is_match(token)
    }
}

impl fmt::Debug for TokenPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/", self.source)
    }
}

/// Matcher for one argument position.
#[derive(Debug, Clone)]
pub enum ArgMatcher {
    Exact(String),
    Pattern(TokenPattern),
    /// Accepts any token; the token is still reported as a capture.
    Any,
}

impl ArgMatcher {
    pub fn exact(token: impl Into<String>) -> Self {
        Self::Exact(token.into())
    }

    pub fn pattern(pattern: &str) -> DispatchResult<Self> {
        TokenPattern::new(pattern).map(Self::Pattern)
    }

    pub fn matches(&self, token: &str) -> bool {
        match self {
            Self::Exact(expected) => expected == token,
            Self::Pattern(pattern) => pattern.is_match(token),
            Self::Any => true,
        }
    }

    /// Whether a token matched at this position is reported to generators.
    pub fn captures(&self) -> bool {
        !matches!(self, Self::Exact(_))
    }
}

impl From<&str> for ArgMatcher {
    fn from(token: &str) -> Self {
        Self::Exact(token.to_string())
    }
}

impl From<String> for ArgMatcher {
    fn from(token: String) -> Self {
        Self::Exact(token)
    }
}

/// Matcher for the executable token.
#[derive(Debug, Clone)]
pub enum ProgramMatcher {
    /// The whole first token, compared as registered.
    Exact(String),
    /// The file-name component of the first token (`/usr/bin/git` -> `git`).
    Name(String),
    Pattern(TokenPattern),
    Any,
}

impl ProgramMatcher {
    pub fn exact(program: impl Into<String>) -> Self {
        Self::Exact(program.into())
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self::Name(name.into())
    }

    pub fn pattern(pattern: &str) -> DispatchResult<Self> {
        TokenPattern::new(pattern).map(Self::Pattern)
    }

    /// `program` is `None` for an empty argv, which only `Any` accepts.
    pub fn matches(&self, program: Option<&str>) -> bool {
        match (self, program) {
            (Self::Any, _) => true,
            (_, None) => false,
            (Self::Exact(expected), Some(token)) => expected == token,
            (Self::Name(expected), Some(token)) => expected == program_name(token),
            (Self::Pattern(pattern), Some(token)) => pattern.is_match(token),
        }
    }

    pub(crate) fn label(&self) -> String {
        match self {
            Self::Exact(program) | Self::Name(program) => program.clone(),
            Self::Pattern(pattern) => format!("/{}/", pattern.as_str()),
            Self::Any => "*".to_string(),
        }
    }
}

impl From<&str> for ProgramMatcher {
    fn from(program: &str) -> Self {
        Self::Exact(program.to_string())
    }
}

/// How argument matchers relate to the length of the argument vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Arity {
    /// Matchers cover a prefix; trailing tokens are free.
    #[default]
    Prefix,
    /// The argument count must equal the number of matchers.
    Exact,
}

impl Arity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prefix => "prefix",
            Self::Exact => "exact",
        }
    }

    pub fn parse_insensitive(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "prefix" => Some(Self::Prefix),
            "exact" => Some(Self::Exact),
            _ => None,
        }
    }
}

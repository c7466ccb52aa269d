//! Input decisions and their validation against a game's vocabulary.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Why an answer was not a valid input decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputRejection {
    /// A token outside the vocabulary.
    Unknown(String),
    /// The same token appeared twice.
    Duplicate(String),
    /// Two commas in a row, or a leading/trailing comma.
    EmptyToken,
}

impl Display for InputRejection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown(token) => write!(f, "unknown input '{token}'"),
            Self::Duplicate(token) => write!(f, "duplicate input '{token}'"),
            Self::EmptyToken => write!(f, "empty input token"),
        }
    }
}

/// A validated, possibly empty, set of inputs for one window.
///
/// Token order is preserved as the agent gave it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputDecision {
    tokens: Vec<String>,
}

impl InputDecision {
    /// The no-input decision.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether no input is held this window.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Individual tokens.
    #[must_use]
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Comma-joined form sent to the emulator.
    #[must_use]
    pub fn to_wire(&self) -> String {
        self.tokens.join(",")
    }
}

/// Fixed set of input tokens a title accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputVocabulary {
    tokens: BTreeSet<String>,
}

impl InputVocabulary {
    /// Build a vocabulary from its tokens.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `token` is allowed.
    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// Parse an answer into a decision.
    ///
    /// Whitespace anywhere in the answer is dropped first, so `left, a`
    /// parses the same as `left,a`. An empty answer is the no-input decision.
    ///
    /// # Errors
    ///
    /// Returns the first [`InputRejection`] encountered, scanning left to right.
    pub fn parse(&self, raw: &str) -> std::result::Result<InputDecision, InputRejection> {
        let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return Ok(InputDecision::none());
        }

        let mut seen = BTreeSet::new();
        let mut tokens = Vec::new();
        for token in compact.split(',') {
            if token.is_empty() {
                return Err(InputRejection::EmptyToken);
            }
            if !self.contains(token) {
                return Err(InputRejection::Unknown(token.to_owned()));
            }
            if !seen.insert(token) {
                return Err(InputRejection::Duplicate(token.to_owned()));
            }
            tokens.push(token.to_owned());
        }

        Ok(InputDecision { tokens })
    }
}

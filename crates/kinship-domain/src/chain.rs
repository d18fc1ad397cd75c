//! Relation chains and their serialized form
//!
//! A chain is the ordered list of atomic steps describing how the owner of a
//! relation reaches the other person: "my father's mother" is
//! `[Parent(Male), Parent(Female)]`. Chains are persisted as JSON arrays of
//! kinship tokens (`["父","母"]`), which is the format profile clients submit.

use crate::person::Gender;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors produced when decoding a serialized chain
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The chain has no steps
    #[error("Relation chain is empty")]
    Empty,

    /// The payload is not a JSON array of strings
    #[error("Relation chain is not a JSON token array: {0}")]
    InvalidJson(String),

    /// A token is not part of the step vocabulary
    #[error("Unknown relation token: {0}")]
    UnknownToken(String),

    /// A legacy `同辈` chain is truncated or uses an unknown connector
    #[error("Malformed legacy sibling chain: {0}")]
    LegacyForm(String),
}

/// Relative age of a sibling compared to the person before them in the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Seniority {
    /// The sibling is older (哥/姐)
    Older,
    /// The sibling is younger (弟/妹)
    Younger,
    /// Not recorded
    Unknown,
}

impl Seniority {
    /// Flip the point of view: my older sibling sees me as younger
    pub fn invert(self) -> Self {
        match self {
            Seniority::Older => Seniority::Younger,
            Seniority::Younger => Seniority::Older,
            Seniority::Unknown => Seniority::Unknown,
        }
    }
}

/// One atomic kinship step; the gender is that of the person reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    /// Up one generation (父/母)
    Parent(Gender),
    /// Down one generation (子/女)
    Child(Gender),
    /// Marriage hop (配偶)
    Spouse,
    /// Same generation, shared parents (哥/弟/姐/妹)
    Sibling(Gender, Seniority),
}

impl Step {
    /// Serialized token. Unknown gender is written as the male variant.
    pub fn token(&self) -> &'static str {
        match *self {
            Step::Parent(Gender::Female) => "母",
            Step::Parent(_) => "父",
            Step::Child(Gender::Female) => "女",
            Step::Child(_) => "子",
            Step::Spouse => "配偶",
            Step::Sibling(Gender::Female, Seniority::Older) => "姐",
            Step::Sibling(Gender::Female, Seniority::Younger) => "妹",
            Step::Sibling(Gender::Female, Seniority::Unknown) => "姐妹",
            Step::Sibling(_, Seniority::Older) => "哥",
            Step::Sibling(_, Seniority::Younger) => "弟",
            Step::Sibling(_, Seniority::Unknown) => "兄弟",
        }
    }

    /// Parse a single token
    pub fn from_token(token: &str) -> Option<Self> {
        let step = match token {
            "父" => Step::Parent(Gender::Male),
            "母" => Step::Parent(Gender::Female),
            "子" => Step::Child(Gender::Male),
            "女" => Step::Child(Gender::Female),
            "配偶" => Step::Spouse,
            "哥" => Step::Sibling(Gender::Male, Seniority::Older),
            "弟" => Step::Sibling(Gender::Male, Seniority::Younger),
            "姐" => Step::Sibling(Gender::Female, Seniority::Older),
            "妹" => Step::Sibling(Gender::Female, Seniority::Younger),
            "兄弟" => Step::Sibling(Gender::Male, Seniority::Unknown),
            "姐妹" => Step::Sibling(Gender::Female, Seniority::Unknown),
            _ => return None,
        };
        Some(step)
    }

    /// Gender of the person reached, `None` for spouse hops
    pub fn gender(&self) -> Option<Gender> {
        match *self {
            Step::Parent(g) | Step::Child(g) | Step::Sibling(g, _) => Some(g),
            Step::Spouse => None,
        }
    }

    /// Same step pointing at a person of another gender
    pub fn with_gender(self, gender: Gender) -> Self {
        match self {
            Step::Parent(_) => Step::Parent(gender),
            Step::Child(_) => Step::Child(gender),
            Step::Sibling(_, s) => Step::Sibling(gender, s),
            Step::Spouse => Step::Spouse,
        }
    }

    /// Up one generation
    pub fn is_up(&self) -> bool {
        matches!(self, Step::Parent(_))
    }

    /// Down one generation
    pub fn is_down(&self) -> bool {
        matches!(self, Step::Child(_))
    }

    /// Same-generation sibling hop
    pub fn is_sibling(&self) -> bool {
        matches!(self, Step::Sibling(..))
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Ordered list of steps: "how the owner reaches the other person"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Chain(Vec<Step>);

impl Chain {
    /// Create a chain from steps
    pub fn new(steps: Vec<Step>) -> Self {
        Self(steps)
    }

    /// Chain with no steps
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Single-step chain
    pub fn single(step: Step) -> Self {
        Self(vec![step])
    }

    /// Steps in order
    pub fn steps(&self) -> &[Step] {
        &self.0
    }

    /// Number of hops
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no steps
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First step, if any
    pub fn first(&self) -> Option<Step> {
        self.0.first().copied()
    }

    /// Last step, if any
    pub fn last(&self) -> Option<Step> {
        self.0.last().copied()
    }

    /// Lookup key: tokens joined by commas (`父,母`)
    pub fn key(&self) -> String {
        self.tokens().join(",")
    }

    /// Tokens in order
    pub fn tokens(&self) -> Vec<&'static str> {
        self.0.iter().map(Step::token).collect()
    }

    /// Every step goes up
    pub fn is_all_up(&self) -> bool {
        !self.is_empty() && self.0.iter().all(Step::is_up)
    }

    /// Every step goes down
    pub fn is_all_down(&self) -> bool {
        !self.is_empty() && self.0.iter().all(Step::is_down)
    }

    /// Exactly one plain sibling hop
    pub fn is_plain_sibling(&self) -> bool {
        self.0.len() == 1 && self.0[0].is_sibling()
    }

    /// Starts with a marriage hop
    pub fn is_spouse_rooted(&self) -> bool {
        matches!(self.first(), Some(Step::Spouse))
    }

    /// Count of up and down hops
    pub fn generation_counts(&self) -> (usize, usize) {
        let up = self.0.iter().filter(|s| s.is_up()).count();
        let down = self.0.iter().filter(|s| s.is_down()).count();
        (up, down)
    }

    /// Append another chain
    pub fn concat(&self, other: &Chain) -> Chain {
        let mut steps = self.0.clone();
        steps.extend_from_slice(&other.0);
        Chain(steps)
    }

    /// Re-gender the final step once the target's gender is known.
    ///
    /// Spouse-terminated chains and unknown genders are returned unchanged.
    pub fn with_target_gender(&self, gender: Gender) -> Chain {
        let mut steps = self.0.clone();
        if gender.is_known() {
            if let Some(last) = steps.last_mut() {
                *last = last.with_gender(gender);
            }
        }
        Chain(steps)
    }

    /// Serialize to the JSON token array
    pub fn encode(&self) -> String {
        serde_json::to_string(&self.tokens()).unwrap_or_else(|_| "[]".to_string())
    }

    /// Parse the JSON token array
    pub fn decode(json: &str) -> Result<Chain, ChainError> {
        let tokens: Vec<String> =
            serde_json::from_str(json).map_err(|e| ChainError::InvalidJson(e.to_string()))?;
        Chain::from_tokens(&tokens)
    }

    /// Parse historical rows: anything unreadable becomes an empty chain
    pub fn decode_lenient(json: &str) -> Chain {
        if json.trim().is_empty() {
            return Chain::empty();
        }
        Chain::decode(json).unwrap_or_default()
    }

    /// Build from tokens, accepting the legacy `["同辈", connector, sibling]` form
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Chain, ChainError> {
        if tokens.is_empty() {
            return Err(ChainError::Empty);
        }
        if tokens[0].as_ref() == "同辈" {
            return Self::from_legacy_sibling(tokens);
        }
        tokens
            .iter()
            .map(|t| {
                Step::from_token(t.as_ref()).ok_or_else(|| ChainError::UnknownToken(t.as_ref().to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Chain)
    }

    fn from_legacy_sibling<S: AsRef<str>>(tokens: &[S]) -> Result<Chain, ChainError> {
        let joined = tokens.iter().map(|t| t.as_ref()).collect::<Vec<_>>().join(",");
        if tokens.len() < 3 {
            return Err(ChainError::LegacyForm(joined));
        }
        let sibling = Step::from_token(tokens[2].as_ref())
            .filter(Step::is_sibling)
            .ok_or_else(|| ChainError::LegacyForm(joined.clone()))?;
        let child_gender = sibling.gender().unwrap_or_default();

        // Cousins are stored as parent -> parent's sibling -> their child
        let via = match tokens[1].as_ref() {
            "直属" => return Ok(Chain::single(sibling)),
            "伯伯" => [Step::Parent(Gender::Male), Step::Sibling(Gender::Male, Seniority::Older)],
            "叔叔" => [Step::Parent(Gender::Male), Step::Sibling(Gender::Male, Seniority::Younger)],
            "姑姑" => [Step::Parent(Gender::Male), Step::Sibling(Gender::Female, Seniority::Older)],
            "舅舅" => [Step::Parent(Gender::Female), Step::Sibling(Gender::Male, Seniority::Older)],
            "姨妈" => [Step::Parent(Gender::Female), Step::Sibling(Gender::Female, Seniority::Older)],
            _ => return Err(ChainError::LegacyForm(joined)),
        };
        Ok(Chain(vec![via[0], via[1], Step::Child(child_gender)]))
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.key())
    }
}

impl TryFrom<Vec<String>> for Chain {
    type Error = ChainError;

    fn try_from(tokens: Vec<String>) -> Result<Self, Self::Error> {
        if tokens.is_empty() {
            return Ok(Chain::empty());
        }
        Chain::from_tokens(&tokens)
    }
}

impl From<Chain> for Vec<String> {
    fn from(chain: Chain) -> Self {
        chain.tokens().into_iter().map(str::to_string).collect()
    }
}

impl From<Vec<Step>> for Chain {
    fn from(steps: Vec<Step>) -> Self {
        Chain(steps)
    }
}

//! Person identity and gender
//!
//! People are owned by the account service; this crate only references them
//! by id and reads their gender.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a person (user account)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PersonId(pub i64);

impl PersonId {
    /// Get the raw value
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PersonId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Gender of a person as recorded on their profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Not recorded
    #[default]
    Unknown,
    /// Male
    Male,
    /// Female
    Female,
}

impl Gender {
    /// Wire code used by profile storage and graph edge properties (0/1/2)
    pub fn code(&self) -> i64 {
        match self {
            Gender::Unknown => 0,
            Gender::Male => 1,
            Gender::Female => 2,
        }
    }

    /// Parse a wire code; anything unrecognised is `Unknown`
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Gender::Male,
            2 => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    /// Whether the gender is recorded
    pub fn is_known(&self) -> bool {
        !matches!(self, Gender::Unknown)
    }

    /// The opposite gender, if known
    pub fn opposite(&self) -> Self {
        match self {
            Gender::Unknown => Gender::Unknown,
            Gender::Male => Gender::Female,
            Gender::Female => Gender::Male,
        }
    }

    /// Prefer `self` when known, otherwise `fallback`
    pub fn or(self, fallback: Gender) -> Self {
        if self.is_known() {
            self
        } else {
            fallback
        }
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Unknown => "unknown",
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unknown" | "0" => Ok(Gender::Unknown),
            "male" | "m" | "1" => Ok(Gender::Male),
            "female" | "f" | "2" => Ok(Gender::Female),
            _ => Err(format!("Invalid gender: {}", s)),
        }
    }
}

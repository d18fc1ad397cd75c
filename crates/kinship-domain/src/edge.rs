//! Relation edges and relation applications
//!
//! An edge is one direction of a relationship: what `owner` calls `other`.
//! Reciprocal edges are stored as two rows.

use crate::chain::Chain;
use crate::person::PersonId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Current time in milliseconds since the Unix epoch
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Identifier of a stored relation edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub i64);

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a relation application
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplyId(pub i64);

impl fmt::Display for ApplyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How an edge came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Declared by a person and accepted by the other
    Manual,
    /// Derived by the inference engine
    Inferred,
}

impl Origin {
    /// Storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Manual => "manual",
            Origin::Inferred => "inferred",
        }
    }
}

impl std::str::FromStr for Origin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Origin::Manual),
            "inferred" => Ok(Origin::Inferred),
            _ => Err(format!("Invalid origin: {}", s)),
        }
    }
}

/// Confirmation state of an edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfirmState {
    /// Visible in the owner's relation list
    Confirmed,
    /// Waiting for the owner to confirm
    Pending,
    /// Rejected by the owner; kept so propagation does not recreate it
    Rejected,
}

impl ConfirmState {
    /// Storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfirmState::Confirmed => "confirmed",
            ConfirmState::Pending => "pending",
            ConfirmState::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for ConfirmState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(ConfirmState::Confirmed),
            "pending" => Ok(ConfirmState::Pending),
            "rejected" => Ok(ConfirmState::Rejected),
            _ => Err(format!("Invalid confirm state: {}", s)),
        }
    }
}

/// One direction of a relationship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationEdge {
    /// Row id
    pub id: EdgeId,
    /// Person holding the term
    pub owner_id: PersonId,
    /// Person the term refers to
    pub other_id: PersonId,
    /// Display term, e.g. 奶奶
    pub kinship_term: String,
    /// How the owner reaches the other person; may be empty for legacy rows
    pub chain: Chain,
    /// Manual or inferred
    pub origin: Origin,
    /// Confirmation state
    pub confirm_state: ConfirmState,
    /// Creation time (ms since epoch)
    pub created_at: u64,
    /// Confirmation time (ms since epoch)
    pub confirmed_at: Option<u64>,
}

impl RelationEdge {
    /// Confirmed and visible
    pub fn is_confirmed(&self) -> bool {
        self.confirm_state == ConfirmState::Confirmed
    }

    /// Manual and confirmed
    pub fn is_confirmed_manual(&self) -> bool {
        self.origin == Origin::Manual && self.is_confirmed()
    }

    /// Inferred row the owner rejected
    pub fn is_tombstone(&self) -> bool {
        self.origin == Origin::Inferred && self.confirm_state == ConfirmState::Rejected
    }
}

/// Edge to be inserted; the store assigns id and timestamps
#[derive(Debug, Clone, PartialEq)]
pub struct NewEdge {
    /// Person holding the term
    pub owner_id: PersonId,
    /// Person the term refers to
    pub other_id: PersonId,
    /// Display term
    pub kinship_term: String,
    /// Chain from owner to other
    pub chain: Chain,
    /// Manual or inferred
    pub origin: Origin,
    /// Initial confirmation state
    pub confirm_state: ConfirmState,
}

impl NewEdge {
    /// Manual, confirmed edge
    pub fn manual(owner_id: PersonId, other_id: PersonId, kinship_term: impl Into<String>, chain: Chain) -> Self {
        Self {
            owner_id,
            other_id,
            kinship_term: kinship_term.into(),
            chain,
            origin: Origin::Manual,
            confirm_state: ConfirmState::Confirmed,
        }
    }

    /// Inferred edge, auto-confirmed
    pub fn inferred(owner_id: PersonId, other_id: PersonId, kinship_term: impl Into<String>, chain: Chain) -> Self {
        Self {
            owner_id,
            other_id,
            kinship_term: kinship_term.into(),
            chain,
            origin: Origin::Inferred,
            confirm_state: ConfirmState::Confirmed,
        }
    }
}

/// Result of an atomic inferred-edge write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new row was written
    Inserted(EdgeId),
    /// A pending inferred row was confirmed in place
    Upgraded(EdgeId),
    /// Nothing written: a manual, confirmed or rejected row already covers the pair
    Skipped,
}

impl UpsertOutcome {
    /// Whether a row changed
    pub fn wrote(&self) -> bool {
        !matches!(self, UpsertOutcome::Skipped)
    }
}

/// State of a relation application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplyStatus {
    /// Awaiting the target's decision
    Pending,
    /// Accepted; edges were created
    Accepted,
    /// Rejected by the target
    Rejected,
}

impl ApplyStatus {
    /// Storage name
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyStatus::Pending => "pending",
            ApplyStatus::Accepted => "accepted",
            ApplyStatus::Rejected => "rejected",
        }
    }
}

impl std::str::FromStr for ApplyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApplyStatus::Pending),
            "accepted" => Ok(ApplyStatus::Accepted),
            "rejected" => Ok(ApplyStatus::Rejected),
            _ => Err(format!("Invalid apply status: {}", s)),
        }
    }
}

/// A request by `applicant_id` to be related to `target_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationApply {
    /// Row id
    pub id: ApplyId,
    /// Person asking
    pub applicant_id: PersonId,
    /// Person asked
    pub target_id: PersonId,
    /// How the applicant reaches the target
    pub proposed_chain: Chain,
    /// Term resolved from the proposed chain at application time
    pub proposed_term: String,
    /// Free text from the applicant
    pub note: Option<String>,
    /// Current state
    pub status: ApplyStatus,
    /// Reason given on rejection
    pub reject_reason: Option<String>,
    /// Creation time (ms since epoch)
    pub created_at: u64,
    /// Decision time (ms since epoch)
    pub handled_at: Option<u64>,
}

/// Application to be inserted
#[derive(Debug, Clone, PartialEq)]
pub struct NewApply {
    /// Person asking
    pub applicant_id: PersonId,
    /// Person asked
    pub target_id: PersonId,
    /// How the applicant reaches the target
    pub proposed_chain: Chain,
    /// Resolved term
    pub proposed_term: String,
    /// Free text
    pub note: Option<String>,
}

/// Relationship state between two people, either direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationStatus {
    /// A confirmed edge exists
    Related,
    /// An application is pending
    Pending,
    /// Nothing
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_names_parse_back() {
        for state in [ConfirmState::Confirmed, ConfirmState::Pending, ConfirmState::Rejected] {
            assert_eq!(state.as_str().parse::<ConfirmState>().unwrap(), state);
        }
        assert!("deleted".parse::<ConfirmState>().is_err());
        assert_eq!("inferred".parse::<Origin>().unwrap(), Origin::Inferred);
        assert_eq!("accepted".parse::<ApplyStatus>().unwrap(), ApplyStatus::Accepted);
    }

    #[test]
    fn test_edge_predicates() {
        let mut edge = RelationEdge {
            id: EdgeId(1),
            owner_id: PersonId(1),
            other_id: PersonId(2),
            kinship_term: "父亲".to_string(),
            chain: Chain::decode(r#"["父"]"#).unwrap(),
            origin: Origin::Manual,
            confirm_state: ConfirmState::Confirmed,
            created_at: 0,
            confirmed_at: Some(0),
        };
        assert!(edge.is_confirmed_manual());
        assert!(!edge.is_tombstone());

        edge.origin = Origin::Inferred;
        edge.confirm_state = ConfirmState::Rejected;
        assert!(edge.is_tombstone());
        assert!(!edge.is_confirmed());
    }

    #[test]
    fn test_upsert_outcome_wrote() {
        assert!(UpsertOutcome::Inserted(EdgeId(3)).wrote());
        assert!(UpsertOutcome::Upgraded(EdgeId(3)).wrote());
        assert!(!UpsertOutcome::Skipped.wrote());
    }
}

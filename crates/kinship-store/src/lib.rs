//! Kinship Storage Layer
//!
//! Implements the RelationStore trait using SQLite.
//!
//! # Architecture
//!
//! - `relation_edges`: one row per direction, unique per (owner, other, origin)
//! - `relation_applies`: pending/accepted/rejected relation requests
//! - `people`: read-mostly person directory (gender and liveness)
//!
//! Inferred writes check and write inside one transaction, so two concurrent
//! propagation passes cannot produce duplicate rows.
//!
//! # Examples
//!
//! ```no_run
//! use kinship_store::SqliteStore;
//!
//! let store = SqliteStore::new(":memory:").unwrap();
//! // Store is now ready for relation operations
//! ```

#![warn(missing_docs)]

use kinship_domain::traits::{EdgeQuery, RelationStore};
use kinship_domain::{
    now_millis, ApplyId, ApplyStatus, Chain, ConfirmState, EdgeId, Gender, GenderMap, NewApply,
    NewEdge, Origin, PersonId, RelationApply, RelationEdge, UpsertOutcome,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data format or state
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Unique constraint hit
    #[error("Duplicate relation row")]
    Duplicate,
}

const EDGE_COLUMNS: &str =
    "id, owner_id, other_id, kinship_term, chain, origin, confirm_state, created_at, confirmed_at";

const APPLY_COLUMNS: &str = "id, applicant_id, target_id, proposed_chain, proposed_term, note, status, \
     reject_reason, created_at, handled_at";

/// SQLite-based implementation of RelationStore
///
/// # Thread Safety
///
/// SQLite connections are not thread-safe. Share a store across tasks behind
/// a mutex, or give each thread its own instance.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    /// Insert or update a person in the directory
    pub fn upsert_person(
        &mut self,
        id: PersonId,
        gender: Gender,
        display_name: Option<&str>,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO people (id, display_name, gender, deleted) VALUES (?1, ?2, ?3, 0)
             ON CONFLICT(id) DO UPDATE SET
             display_name = COALESCE(excluded.display_name, people.display_name),
             gender = excluded.gender,
             deleted = 0",
            params![id.value(), display_name, gender.code()],
        )?;
        Ok(())
    }

    /// Mark a person as deleted; their edges stay untouched
    pub fn deactivate_person(&mut self, id: PersonId) -> Result<(), StoreError> {
        let changed = self
            .conn
            .execute("UPDATE people SET deleted = 1 WHERE id = ?1", params![id.value()])?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("person {}", id)));
        }
        Ok(())
    }

    fn conversion_error(col: usize, ty: rusqlite::types::Type, msg: String) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(col, ty, Box::new(StoreError::InvalidData(msg)))
    }

    fn row_to_edge(row: &Row<'_>) -> rusqlite::Result<RelationEdge> {
        use rusqlite::types::Type;

        let chain_json: String = row.get(4)?;
        let origin: String = row.get(5)?;
        let state: String = row.get(6)?;
        let confirmed_at: Option<i64> = row.get(8)?;

        Ok(RelationEdge {
            id: EdgeId(row.get(0)?),
            owner_id: PersonId(row.get(1)?),
            other_id: PersonId(row.get(2)?),
            kinship_term: row.get(3)?,
            chain: Chain::decode_lenient(&chain_json),
            origin: origin.parse().map_err(|e| Self::conversion_error(5, Type::Text, e))?,
            confirm_state: state.parse().map_err(|e| Self::conversion_error(6, Type::Text, e))?,
            created_at: row.get::<_, i64>(7)? as u64,
            confirmed_at: confirmed_at.map(|t| t as u64),
        })
    }

    fn row_to_apply(row: &Row<'_>) -> rusqlite::Result<RelationApply> {
        use rusqlite::types::Type;

        let chain_json: String = row.get(3)?;
        let status: String = row.get(6)?;
        let handled_at: Option<i64> = row.get(9)?;

        Ok(RelationApply {
            id: ApplyId(row.get(0)?),
            applicant_id: PersonId(row.get(1)?),
            target_id: PersonId(row.get(2)?),
            proposed_chain: Chain::decode_lenient(&chain_json),
            proposed_term: row.get(4)?,
            note: row.get(5)?,
            status: status.parse().map_err(|e| Self::conversion_error(6, Type::Text, e))?,
            reject_reason: row.get(7)?,
            created_at: row.get::<_, i64>(8)? as u64,
            handled_at: handled_at.map(|t| t as u64),
        })
    }

    fn map_constraint(err: rusqlite::Error) -> StoreError {
        match err {
            rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
                StoreError::Duplicate
            }
            other => StoreError::Database(other),
        }
    }

    fn insert_edge_on(conn: &Connection, edge: &NewEdge) -> Result<EdgeId, StoreError> {
        let now = now_millis() as i64;
        let confirmed_at = (edge.confirm_state == ConfirmState::Confirmed).then_some(now);
        conn.execute(
            "INSERT INTO relation_edges
             (owner_id, other_id, kinship_term, chain, origin, confirm_state, created_at, confirmed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                edge.owner_id.value(),
                edge.other_id.value(),
                &edge.kinship_term,
                edge.chain.encode(),
                edge.origin.as_str(),
                edge.confirm_state.as_str(),
                now,
                confirmed_at,
            ],
        )
        .map_err(Self::map_constraint)?;
        Ok(EdgeId(conn.last_insert_rowid()))
    }

    fn edges_between_on(conn: &Connection, owner: PersonId, other: PersonId) -> Result<Vec<RelationEdge>, StoreError> {
        let sql = format!(
            "SELECT {} FROM relation_edges WHERE owner_id = ?1 AND other_id = ?2 ORDER BY id",
            EDGE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let edges = stmt
            .query_map(params![owner.value(), other.value()], Self::row_to_edge)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(edges)
    }

    fn get_apply_on(conn: &Connection, id: ApplyId) -> Result<Option<RelationApply>, StoreError> {
        let sql = format!("SELECT {} FROM relation_applies WHERE id = ?1", APPLY_COLUMNS);
        let apply = conn
            .query_row(&sql, params![id.0], Self::row_to_apply)
            .optional()?;
        Ok(apply)
    }

    fn placeholders(n: usize) -> String {
        vec!["?"; n].join(", ")
    }
}

impl RelationStore for SqliteStore {
    type Error = StoreError;

    fn insert_edge(&mut self, edge: NewEdge) -> Result<EdgeId, Self::Error> {
        Self::insert_edge_on(&self.conn, &edge)
    }

    fn get_edge(&self, id: EdgeId) -> Result<Option<RelationEdge>, Self::Error> {
        let sql = format!("SELECT {} FROM relation_edges WHERE id = ?1", EDGE_COLUMNS);
        let edge = self
            .conn
            .query_row(&sql, params![id.0], Self::row_to_edge)
            .optional()?;
        Ok(edge)
    }

    fn edges_between(&self, owner: PersonId, other: PersonId) -> Result<Vec<RelationEdge>, Self::Error> {
        Self::edges_between_on(&self.conn, owner, other)
    }

    fn query_edges(&self, query: &EdgeQuery) -> Result<Vec<RelationEdge>, Self::Error> {
        let mut sql = format!("SELECT {} FROM relation_edges WHERE 1=1", EDGE_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(owner) = query.owner {
            sql.push_str(" AND owner_id = ?");
            params.push(Box::new(owner.value()));
        }

        if let Some(other) = query.other {
            sql.push_str(" AND other_id = ?");
            params.push(Box::new(other.value()));
        }

        if let Some(person) = query.involving {
            sql.push_str(" AND (owner_id = ? OR other_id = ?)");
            params.push(Box::new(person.value()));
            params.push(Box::new(person.value()));
        }

        if let Some(origin) = query.origin {
            sql.push_str(" AND origin = ?");
            params.push(Box::new(origin.as_str()));
        }

        if let Some(state) = query.confirm_state {
            sql.push_str(" AND confirm_state = ?");
            params.push(Box::new(state.as_str()));
        }

        sql.push_str(" ORDER BY id");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let edges = stmt
            .query_map(&param_refs[..], Self::row_to_edge)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(edges)
    }

    fn upsert_inferred(&mut self, edge: NewEdge) -> Result<UpsertOutcome, Self::Error> {
        let tx = self.conn.transaction()?;
        let existing = Self::edges_between_on(&tx, edge.owner_id, edge.other_id)?;

        if existing.iter().any(RelationEdge::is_confirmed_manual) {
            return Ok(UpsertOutcome::Skipped);
        }

        let outcome = match existing.iter().find(|e| e.origin == Origin::Inferred) {
            Some(row) if row.confirm_state == ConfirmState::Pending => {
                tx.execute(
                    "UPDATE relation_edges
                     SET confirm_state = 'confirmed', confirmed_at = ?2, kinship_term = ?3, chain = ?4
                     WHERE id = ?1",
                    params![row.id.0, now_millis() as i64, &edge.kinship_term, edge.chain.encode()],
                )?;
                UpsertOutcome::Upgraded(row.id)
            }
            // Confirmed, or a tombstone the owner rejected
            Some(_) => UpsertOutcome::Skipped,
            None => {
                let inferred = NewEdge {
                    origin: Origin::Inferred,
                    ..edge
                };
                UpsertOutcome::Inserted(Self::insert_edge_on(&tx, &inferred)?)
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn set_confirm_state(&mut self, id: EdgeId, state: ConfirmState) -> Result<(), Self::Error> {
        let confirmed_at = (state == ConfirmState::Confirmed).then(|| now_millis() as i64);
        let changed = self.conn.execute(
            "UPDATE relation_edges SET confirm_state = ?2, confirmed_at = COALESCE(?3, confirmed_at)
             WHERE id = ?1",
            params![id.0, state.as_str(), confirmed_at],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("edge {}", id)));
        }
        Ok(())
    }

    fn delete_between(&mut self, a: PersonId, b: PersonId) -> Result<usize, Self::Error> {
        let deleted = self.conn.execute(
            "DELETE FROM relation_edges
             WHERE (owner_id = ?1 AND other_id = ?2) OR (owner_id = ?2 AND other_id = ?1)",
            params![a.value(), b.value()],
        )?;
        Ok(deleted)
    }

    fn delete_inferred_among(&mut self, people: &BTreeSet<PersonId>) -> Result<usize, Self::Error> {
        if people.is_empty() {
            return Ok(0);
        }
        let marks = Self::placeholders(people.len());
        let sql = format!(
            "DELETE FROM relation_edges
             WHERE origin = 'inferred' AND owner_id IN ({marks}) AND other_id IN ({marks})"
        );
        let ids = people.iter().map(|p| p.value());
        let deleted = self
            .conn
            .execute(&sql, params_from_iter(ids.clone().chain(ids)))?;
        Ok(deleted)
    }

    fn edge_owners(&self) -> Result<Vec<PersonId>, Self::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT owner_id FROM relation_edges ORDER BY owner_id")?;
        let owners = stmt
            .query_map([], |row| Ok(PersonId(row.get(0)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(owners)
    }

    fn insert_apply(&mut self, apply: NewApply) -> Result<ApplyId, Self::Error> {
        self.conn.execute(
            "INSERT INTO relation_applies
             (applicant_id, target_id, proposed_chain, proposed_term, note, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 'pending', ?6)",
            params![
                apply.applicant_id.value(),
                apply.target_id.value(),
                apply.proposed_chain.encode(),
                &apply.proposed_term,
                &apply.note,
                now_millis() as i64,
            ],
        )?;
        Ok(ApplyId(self.conn.last_insert_rowid()))
    }

    fn get_apply(&self, id: ApplyId) -> Result<Option<RelationApply>, Self::Error> {
        Self::get_apply_on(&self.conn, id)
    }

    fn pending_apply_between(&self, a: PersonId, b: PersonId) -> Result<Option<RelationApply>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM relation_applies
             WHERE status = 'pending'
               AND ((applicant_id = ?1 AND target_id = ?2) OR (applicant_id = ?2 AND target_id = ?1))
             ORDER BY id LIMIT 1",
            APPLY_COLUMNS
        );
        let apply = self
            .conn
            .query_row(&sql, params![a.value(), b.value()], Self::row_to_apply)
            .optional()?;
        Ok(apply)
    }

    fn pending_applies_for(&self, target: PersonId) -> Result<Vec<RelationApply>, Self::Error> {
        let sql = format!(
            "SELECT {} FROM relation_applies
             WHERE target_id = ?1 AND status = 'pending'
             ORDER BY created_at DESC, id DESC",
            APPLY_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let applies = stmt
            .query_map(params![target.value()], Self::row_to_apply)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(applies)
    }

    fn accept_apply(
        &mut self,
        id: ApplyId,
        forward: NewEdge,
        reverse: NewEdge,
    ) -> Result<(EdgeId, EdgeId), Self::Error> {
        let tx = self.conn.transaction()?;

        let apply = Self::get_apply_on(&tx, id)?
            .ok_or_else(|| StoreError::NotFound(format!("application {}", id)))?;
        if apply.status != ApplyStatus::Pending {
            return Err(StoreError::InvalidData(format!(
                "application {} is already {}",
                id,
                apply.status.as_str()
            )));
        }

        tx.execute(
            "UPDATE relation_applies SET status = 'accepted', handled_at = ?2 WHERE id = ?1",
            params![id.0, now_millis() as i64],
        )?;

        // Manual rows supersede whatever was inferred for the pair
        tx.execute(
            "DELETE FROM relation_edges WHERE origin = 'inferred'
             AND ((owner_id = ?1 AND other_id = ?2) OR (owner_id = ?2 AND other_id = ?1))",
            params![forward.owner_id.value(), forward.other_id.value()],
        )?;

        let forward_id = Self::insert_edge_on(&tx, &forward)?;
        let reverse_id = Self::insert_edge_on(&tx, &reverse)?;

        tx.commit()?;
        Ok((forward_id, reverse_id))
    }

    fn reject_apply(&mut self, id: ApplyId, reason: Option<&str>) -> Result<(), Self::Error> {
        let changed = self.conn.execute(
            "UPDATE relation_applies SET status = 'rejected', reject_reason = ?2, handled_at = ?3
             WHERE id = ?1 AND status = 'pending'",
            params![id.0, reason, now_millis() as i64],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("pending application {}", id)));
        }
        Ok(())
    }

    fn person_exists(&self, id: PersonId) -> Result<bool, Self::Error> {
        let exists = self
            .conn
            .query_row(
                "SELECT 1 FROM people WHERE id = ?1 AND deleted = 0",
                params![id.value()],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        Ok(exists)
    }

    fn gender_of(&self, id: PersonId) -> Result<Gender, Self::Error> {
        let code: Option<i64> = self
            .conn
            .query_row("SELECT gender FROM people WHERE id = ?1", params![id.value()], |row| row.get(0))
            .optional()?;
        Ok(code.map(Gender::from_code).unwrap_or_default())
    }

    fn genders_of(&self, ids: &[PersonId]) -> Result<GenderMap, Self::Error> {
        if ids.is_empty() {
            return Ok(GenderMap::new());
        }
        let sql = format!(
            "SELECT id, gender FROM people WHERE id IN ({})",
            Self::placeholders(ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(ids.iter().map(|p| p.value())), |row| {
                Ok((PersonId(row.get(0)?), Gender::from_code(row.get(1)?)))
            })?
            .collect::<Result<GenderMap, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders() {
        assert_eq!(SqliteStore::placeholders(1), "?");
        assert_eq!(SqliteStore::placeholders(3), "?, ?, ?");
    }

    #[test]
    fn test_unique_index_maps_to_duplicate() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let edge = NewEdge::manual(PersonId(1), PersonId(2), "父亲", Chain::empty());
        store.insert_edge(edge.clone()).unwrap();
        assert!(matches!(store.insert_edge(edge), Err(StoreError::Duplicate)));
    }
}

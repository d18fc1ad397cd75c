//! In-process graph substrate
//!
//! Adjacency kept in ordered maps so path and neighbour enumeration are
//! deterministic. Symmetric edges are stored once under a canonical key.

use crate::{GraphError, GraphSubstrate};
use async_trait::async_trait;
use kinship_domain::{EdgeKind, GraphEdge, GraphPath, PersonId};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

type EdgeKey = (EdgeKind, PersonId, PersonId);

#[derive(Debug, Default)]
struct Adjacency {
    edges: BTreeMap<EdgeKey, GraphEdge>,
    by_node: BTreeMap<PersonId, BTreeSet<EdgeKey>>,
}

impl Adjacency {
    fn key(edge: &GraphEdge) -> EdgeKey {
        if edge.kind.is_symmetric() && edge.dst < edge.src {
            (edge.kind, edge.dst, edge.src)
        } else {
            (edge.kind, edge.src, edge.dst)
        }
    }

    fn insert(&mut self, edge: GraphEdge) {
        let key = Self::key(&edge);
        self.by_node.entry(edge.src).or_default().insert(key);
        self.by_node.entry(edge.dst).or_default().insert(key);
        self.edges.insert(key, edge);
    }

    fn remove(&mut self, key: &EdgeKey) -> bool {
        let Some(edge) = self.edges.remove(key) else {
            return false;
        };
        for node in [edge.src, edge.dst] {
            if let Some(keys) = self.by_node.get_mut(&node) {
                keys.remove(key);
                if keys.is_empty() {
                    self.by_node.remove(&node);
                }
            }
        }
        true
    }

    fn incident(&self, node: PersonId) -> impl Iterator<Item = &GraphEdge> + '_ {
        self.by_node
            .get(&node)
            .into_iter()
            .flat_map(|keys| keys.iter())
            .filter_map(|key| self.edges.get(key))
    }

    fn paths(&self, from: PersonId, to: PersonId, max_hops: usize) -> Vec<GraphPath> {
        let mut found = Vec::new();
        let mut visited = BTreeSet::from([from]);
        let mut trail = Vec::new();
        self.walk(from, to, max_hops, &mut visited, &mut trail, &mut found);
        found
    }

    fn walk(
        &self,
        current: PersonId,
        to: PersonId,
        hops_left: usize,
        visited: &mut BTreeSet<PersonId>,
        trail: &mut Vec<GraphEdge>,
        found: &mut Vec<GraphPath>,
    ) {
        if hops_left == 0 {
            return;
        }
        for edge in self.incident(current) {
            let Some(next) = edge.other_end(current) else {
                continue;
            };
            if visited.contains(&next) {
                continue;
            }
            trail.push(edge.clone());
            if next == to {
                found.push(GraphPath(trail.clone()));
            } else {
                visited.insert(next);
                self.walk(next, to, hops_left - 1, visited, trail, found);
                visited.remove(&next);
            }
            trail.pop();
        }
    }

    fn neighbors(&self, start: PersonId, max_hops: usize) -> BTreeSet<PersonId> {
        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([(start, 0usize)]);
        while let Some((node, depth)) = queue.pop_front() {
            if depth == max_hops {
                continue;
            }
            for edge in self.incident(node) {
                if let Some(next) = edge.other_end(node) {
                    if seen.insert(next) {
                        queue.push_back((next, depth + 1));
                    }
                }
            }
        }
        seen.remove(&start);
        seen
    }
}

/// Graph substrate held in memory
///
/// `set_available(false)` makes every call fail with
/// [`GraphError::Unavailable`], which exercises the fallback path.
#[derive(Debug)]
pub struct MemoryGraph {
    inner: RwLock<Adjacency>,
    available: AtomicBool,
}

impl MemoryGraph {
    /// Create an empty, available graph
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Adjacency::default()),
            available: AtomicBool::new(true),
        }
    }

    /// Switch availability
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Snapshot of every stored edge
    pub fn edges(&self) -> Result<Vec<GraphEdge>, GraphError> {
        Ok(self.read()?.edges.values().cloned().collect())
    }

    /// Number of stored edges
    pub fn edge_count(&self) -> usize {
        self.read().map(|g| g.edges.len()).unwrap_or(0)
    }

    fn ensure_available(&self) -> Result<(), GraphError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(GraphError::Unavailable)
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Adjacency>, GraphError> {
        self.inner
            .read()
            .map_err(|_| GraphError::Backend("graph lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Adjacency>, GraphError> {
        self.inner
            .write()
            .map_err(|_| GraphError::Backend("graph lock poisoned".to_string()))
    }
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphSubstrate for MemoryGraph {
    async fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn upsert_edge(&self, edge: GraphEdge) -> Result<(), GraphError> {
        self.ensure_available()?;
        debug!(kind = edge.kind.as_str(), src = %edge.src, dst = %edge.dst, "Upserting graph edge");
        let mut graph = self.write()?;
        // One structural edge of a kind per pair
        let stale: Vec<EdgeKey> = graph
            .incident(edge.src)
            .filter(|e| e.kind == edge.kind && e.other_end(edge.src) == Some(edge.dst))
            .map(Adjacency::key)
            .collect();
        for key in &stale {
            graph.remove(key);
        }
        graph.insert(edge);
        Ok(())
    }

    async fn delete_edges(&self, a: PersonId, b: PersonId) -> Result<usize, GraphError> {
        self.ensure_available()?;
        let mut graph = self.write()?;
        let keys: Vec<EdgeKey> = graph
            .incident(a)
            .filter(|e| e.other_end(a) == Some(b))
            .map(Adjacency::key)
            .collect();
        let removed = keys.iter().filter(|key| graph.remove(key)).count();
        Ok(removed)
    }

    async fn find_paths(
        &self,
        from: PersonId,
        to: PersonId,
        max_hops: usize,
    ) -> Result<Vec<GraphPath>, GraphError> {
        self.ensure_available()?;
        if from == to {
            return Ok(Vec::new());
        }
        Ok(self.read()?.paths(from, to, max_hops))
    }

    async fn find_neighbors(
        &self,
        id: PersonId,
        max_hops: usize,
    ) -> Result<BTreeSet<PersonId>, GraphError> {
        self.ensure_available()?;
        Ok(self.read()?.neighbors(id, max_hops))
    }
}

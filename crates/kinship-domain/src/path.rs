//! Graph paths and their kinship terms
//!
//! A path is a sequence of typed structural edges between a viewer and a
//! target. Edge semantics do not depend on traversal direction: the source of
//! a `ParentOf` edge is always the parent. Walking it from the source is a
//! step down a generation, walking it from the destination is a step up.
//!
//! Genders are read from the edge first and then overridden by the gender map,
//! which holds the current profile values.

use crate::chain::{Chain, Seniority, Step};
use crate::person::{Gender, PersonId};
use crate::vocabulary::{is_generic, GENERIC_TERM};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Current genders keyed by person
pub type GenderMap = HashMap<PersonId, Gender>;

/// Kind of structural edge stored in the graph substrate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EdgeKind {
    /// `src` is a parent of `dst`
    ParentOf,
    /// Marriage, symmetric
    SpouseOf,
    /// Siblings, symmetric; seniority describes `src`
    SiblingOf,
}

impl EdgeKind {
    /// Edge type name used by graph backends
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::ParentOf => "PARENT_OF",
            EdgeKind::SpouseOf => "SPOUSE_OF",
            EdgeKind::SiblingOf => "SIBLING_OF",
        }
    }

    /// Whether `(a, b)` and `(b, a)` denote the same edge
    pub fn is_symmetric(&self) -> bool {
        !matches!(self, EdgeKind::ParentOf)
    }
}

/// A typed edge with its embedded properties
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Edge type
    pub kind: EdgeKind,
    /// Source node
    pub src: PersonId,
    /// Destination node
    pub dst: PersonId,
    /// Gender of the parent at write time (`ParentOf` only)
    pub parent_gender: Gender,
    /// Gender of the child at write time (`ParentOf` only)
    pub child_gender: Gender,
    /// Age of `src` relative to `dst` (`SiblingOf` only)
    pub seniority: Seniority,
}

impl GraphEdge {
    /// `parent` is a parent of `child`
    pub fn parent_of(parent: PersonId, child: PersonId, parent_gender: Gender, child_gender: Gender) -> Self {
        Self {
            kind: EdgeKind::ParentOf,
            src: parent,
            dst: child,
            parent_gender,
            child_gender,
            seniority: Seniority::Unknown,
        }
    }

    /// `a` and `b` are married
    pub fn spouse_of(a: PersonId, b: PersonId) -> Self {
        Self {
            kind: EdgeKind::SpouseOf,
            src: a,
            dst: b,
            parent_gender: Gender::Unknown,
            child_gender: Gender::Unknown,
            seniority: Seniority::Unknown,
        }
    }

    /// `a` and `b` are siblings; `seniority` is `a` relative to `b`
    pub fn sibling_of(a: PersonId, b: PersonId, seniority: Seniority) -> Self {
        Self {
            kind: EdgeKind::SiblingOf,
            src: a,
            dst: b,
            parent_gender: Gender::Unknown,
            child_gender: Gender::Unknown,
            seniority,
        }
    }

    /// Wire code of the seniority property: 1 = src older, 2 = src younger, 0 = unknown
    pub fn seniority_code(&self) -> i64 {
        match self.seniority {
            Seniority::Older => 1,
            Seniority::Younger => 2,
            Seniority::Unknown => 0,
        }
    }

    /// The endpoint opposite `node`, if `node` is an endpoint
    pub fn other_end(&self, node: PersonId) -> Option<PersonId> {
        if self.src == node {
            Some(self.dst)
        } else if self.dst == node {
            Some(self.src)
        } else {
            None
        }
    }
}

/// Sequence of edges leading from a start node to an end node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GraphPath(pub Vec<GraphEdge>);

impl GraphPath {
    /// Hop count
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for a zero-hop path
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Edges in order
    pub fn edges(&self) -> &[GraphEdge] {
        &self.0
    }

    /// Node ids visited when walking from `start`, excluding `start`.
    ///
    /// Stops early if the path does not connect.
    pub fn node_sequence(&self, start: PersonId) -> Vec<PersonId> {
        let mut current = start;
        let mut nodes = Vec::with_capacity(self.0.len());
        for edge in &self.0 {
            match edge.other_end(current) {
                Some(next) => {
                    nodes.push(next);
                    current = next;
                }
                None => break,
            }
        }
        nodes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
    Up,
    Down,
    Spouse,
    Sibling,
}

#[derive(Debug, Clone, Copy)]
struct Hop {
    kind: Move,
    next: PersonId,
    parent_gender: Gender,
    child_gender: Gender,
    /// Age of `next` relative to the current node
    next_older: Seniority,
}

fn gender_of(genders: &GenderMap, id: PersonId) -> Gender {
    genders.get(&id).copied().unwrap_or_default()
}

fn extract_hops(path: &GraphPath, viewer: PersonId, genders: &GenderMap) -> Option<Vec<Hop>> {
    let mut current = viewer;
    let mut hops = Vec::with_capacity(path.len());
    for edge in path.edges() {
        let forward = edge.src == current;
        let next = edge.other_end(current)?;

        let mut hop = Hop {
            kind: Move::Spouse,
            next,
            parent_gender: Gender::Unknown,
            child_gender: Gender::Unknown,
            next_older: Seniority::Unknown,
        };
        match edge.kind {
            EdgeKind::ParentOf => {
                hop.kind = if forward { Move::Down } else { Move::Up };
                // Edge values first, then fresh profile values when known
                hop.parent_gender = gender_of(genders, edge.src).or(edge.parent_gender);
                hop.child_gender = gender_of(genders, edge.dst).or(edge.child_gender);
            }
            EdgeKind::SpouseOf => hop.kind = Move::Spouse,
            EdgeKind::SiblingOf => {
                hop.kind = Move::Sibling;
                hop.next_older = if forward {
                    edge.seniority.invert()
                } else {
                    edge.seniority
                };
            }
        }
        hops.push(hop);
        current = next;
    }
    Some(hops)
}

/// Resolve one path to a term
pub fn resolve_path(path: &GraphPath, viewer: PersonId, genders: &GenderMap) -> String {
    match extract_hops(path, viewer, genders) {
        Some(hops) if !hops.is_empty() => map_to_term(&hops, viewer, genders).to_string(),
        _ => GENERIC_TERM.to_string(),
    }
}

/// The winning path and its term
#[derive(Debug, Clone, PartialEq)]
pub struct BestPath {
    /// Resolved term, possibly generic
    pub term: String,
    /// Chain decoded from the winning path
    pub chain: Chain,
}

/// Pick the best term over all candidate paths.
///
/// Candidates are ordered by hop count, then by the node ids they visit. The
/// first non-generic term wins; if every path is generic the generic term is
/// returned. No paths means no relation: `None`.
pub fn resolve_best(paths: &[GraphPath], viewer: PersonId, genders: &GenderMap) -> Option<String> {
    best_match(paths, viewer, genders).map(|best| best.term)
}

/// Same ordering as [`resolve_best`], also returning the chain of the winner
pub fn best_match(paths: &[GraphPath], viewer: PersonId, genders: &GenderMap) -> Option<BestPath> {
    let mut ordered: Vec<&GraphPath> = paths.iter().collect();
    ordered.sort_by_cached_key(|p| (p.len(), p.node_sequence(viewer)));

    let shortest = *ordered.first()?;
    for path in &ordered {
        let term = resolve_path(path, viewer, genders);
        if !is_generic(&term) {
            return Some(BestPath {
                term,
                chain: path_to_chain(path, viewer, genders),
            });
        }
    }
    Some(BestPath {
        term: GENERIC_TERM.to_string(),
        chain: path_to_chain(shortest, viewer, genders),
    })
}

/// Convert a path into a chain from the viewer's point of view.
///
/// A path that does not start at the viewer yields an empty chain.
pub fn path_to_chain(path: &GraphPath, viewer: PersonId, genders: &GenderMap) -> Chain {
    let Some(hops) = extract_hops(path, viewer, genders) else {
        return Chain::empty();
    };
    hops.iter()
        .map(|hop| match hop.kind {
            Move::Up => Step::Parent(hop.parent_gender),
            Move::Down => Step::Child(hop.child_gender),
            Move::Spouse => Step::Spouse,
            Move::Sibling => Step::Sibling(gender_of(genders, hop.next), hop.next_older),
        })
        .collect::<Vec<_>>()
        .into()
}

fn pick(gender: Gender, male: &'static str, female: &'static str) -> &'static str {
    if gender == Gender::Female {
        female
    } else {
        male
    }
}

fn map_to_term(hops: &[Hop], viewer: PersonId, genders: &GenderMap) -> &'static str {
    use Move::*;

    let me = gender_of(genders, viewer);
    let target = gender_of(genders, hops[hops.len() - 1].next);
    let mid = |i: usize| gender_of(genders, hops[i].next);
    let kinds: Vec<Move> = hops.iter().map(|h| h.kind).collect();

    match kinds.as_slice() {
        // One hop
        [Up] => pick(hops[0].parent_gender, "父亲", "母亲"),
        [Down] => pick(hops[0].child_gender, "儿子", "女儿"),
        [Spouse] => match me {
            Gender::Female => "丈夫",
            Gender::Male => "妻子",
            Gender::Unknown => "配偶",
        },
        [Sibling] => match hops[0].next_older {
            Seniority::Older => pick(target, "哥哥", "姐姐"),
            Seniority::Younger => pick(target, "弟弟", "妹妹"),
            Seniority::Unknown => pick(target, "兄/弟", "姐/妹"),
        },

        // Two hops
        [Up, Up] => {
            let via_father = hops[0].parent_gender.or(mid(0)) == Gender::Male;
            let grand = hops[1].parent_gender.or(target);
            if via_father {
                pick(grand, "爷爷", "奶奶")
            } else {
                pick(grand, "外公", "外婆")
            }
        }
        [Up, Sibling] => {
            let via_father = hops[0].parent_gender.or(mid(0)) == Gender::Male;
            let older = hops[1].next_older;
            if via_father {
                match (target, older) {
                    (Gender::Male, Seniority::Older) => "伯父",
                    (Gender::Male, Seniority::Younger) => "叔叔",
                    (Gender::Male, Seniority::Unknown) => "叔/伯",
                    (Gender::Female, _) => "姑姑",
                    (Gender::Unknown, Seniority::Older) => "伯父/姑姑",
                    (Gender::Unknown, _) => "叔叔/姑姑",
                }
            } else {
                match target {
                    Gender::Male => "舅舅",
                    Gender::Female => "姨妈",
                    Gender::Unknown => "舅舅/姨妈",
                }
            }
        }
        [Up, Down] => pick(target, "兄/弟", "姐/妹"),
        [Down, Down] => {
            let via_son = hops[0].child_gender.or(mid(0)) == Gender::Male;
            if via_son {
                pick(target, "孙子", "孙女")
            } else {
                pick(target, "外孙", "外孙女")
            }
        }
        [Sibling, Down] => {
            if me == Gender::Female {
                pick(target, "外甥", "外甥女")
            } else {
                pick(target, "侄子", "侄女")
            }
        }
        [Spouse, Up] => {
            let parent = hops[1].parent_gender.or(target);
            match me {
                Gender::Male => pick(parent, "岳父", "岳母"),
                Gender::Female => pick(parent, "公公", "婆婆"),
                Gender::Unknown => pick(parent, "岳父/公公", "岳母/婆婆"),
            }
        }
        [Spouse, Sibling] => {
            let older = hops[1].next_older;
            match (me, target == Gender::Male) {
                (Gender::Male, true) => match older {
                    Seniority::Older => "大舅子",
                    Seniority::Younger => "小舅子",
                    Seniority::Unknown => "舅子",
                },
                (Gender::Male, false) => match older {
                    Seniority::Older => "大姨子",
                    Seniority::Younger => "小姨子",
                    Seniority::Unknown => "姨子",
                },
                (Gender::Female, true) => match older {
                    Seniority::Older => "大伯子",
                    Seniority::Younger => "小叔子",
                    Seniority::Unknown => "叔/伯子",
                },
                (Gender::Female, false) => match older {
                    Seniority::Older => "大姑子",
                    Seniority::Younger => "小姑子",
                    Seniority::Unknown => "姑子",
                },
                (Gender::Unknown, true) => "配偶的兄弟",
                (Gender::Unknown, false) => "配偶的姐妹",
            }
        }
        [Spouse, Down] => pick(target, "继子", "继女"),
        [Up, Spouse] => match mid(0) {
            Gender::Male => "继母",
            Gender::Female => "继父",
            Gender::Unknown => "继父/继母",
        },
        [Down, Spouse] => pick(hops[0].child_gender.or(mid(0)), "儿媳", "女婿"),
        [Sibling, Spouse] => {
            let sib_older = hops[0].next_older == Seniority::Older;
            let sib_male = mid(0) == Gender::Male || (mid(0) == Gender::Unknown && target == Gender::Female);
            match (sib_older, sib_male) {
                (true, true) => "嫂子",
                (true, false) => "姐夫",
                (false, true) => "弟媳",
                (false, false) => "妹夫",
            }
        }
        [Sibling, Up] => pick(hops[1].parent_gender, "父亲", "母亲"),

        // Three hops
        [Up, Up, Up] => pick(target, "太爷爷", "太奶奶"),
        [Down, Down, Down] => pick(target, "重孙子", "重孙女"),
        [Up, Up, Sibling] => {
            let grand_is_male = hops[1].parent_gender.or(mid(1)) == Gender::Male;
            match target {
                Gender::Male if grand_is_male => "叔/伯祖父",
                Gender::Male => "舅祖父",
                Gender::Female if grand_is_male => "姑祖母",
                Gender::Female => "姨祖母",
                Gender::Unknown => "祖父辈亲属",
            }
        }
        [Up, Sibling, Down] => {
            let paternal = hops[0].parent_gender.or(mid(0)) == Gender::Male && mid(1) == Gender::Male;
            match (paternal, target == Gender::Female) {
                (true, false) => "堂兄/弟",
                (true, true) => "堂姐/妹",
                (false, false) => "表兄/弟",
                (false, true) => "表姐/妹",
            }
        }
        [Sibling, Down, Down] => pick(target, "侄孙", "侄孙女"),
        [Down, Down, Spouse] => pick(hops[1].child_gender.or(mid(1)), "孙媳妇", "孙女婿"),
        [Down, Spouse, Up] => pick(target, "亲家公", "亲家母"),
        [Up, Sibling, Spouse] => {
            let via_father = hops[0].parent_gender.or(mid(0)) == Gender::Male;
            let uncle_is_male = mid(1) == Gender::Male;
            match (via_father, uncle_is_male) {
                (true, true) if hops[1].next_older == Seniority::Older => "伯母",
                (true, true) => "婶婶",
                (true, false) => "姑父",
                (false, true) => "舅妈",
                (false, false) => "姨父",
            }
        }
        [Up, Spouse, Sibling] => pick(target, "继父/母的兄弟", "继母/父的姐妹"),
        [Up, Up, Down] => {
            let via_father = hops[0].parent_gender.or(mid(0)) == Gender::Male;
            let grand_is_male = hops[1].parent_gender.or(mid(1)) == Gender::Male;
            if via_father && grand_is_male {
                pick(target, "叔/伯", "姑姑")
            } else {
                pick(target, "叔/舅", "姨妈/姑姑")
            }
        }
        [Sibling, Spouse, Up] => pick(target, "亲家公", "亲家母"),

        // Four hops
        [Up, Up, Up, Up] => pick(target, "高祖父", "高祖母"),
        [Down, Down, Down, Down] => pick(target, "玄孙", "玄孙女"),
        [Up, Up, Sibling, Down] => {
            let via_grandmother = hops[1].parent_gender.or(mid(1)) == Gender::Female;
            if via_grandmother {
                pick(target, "表叔", "表姑")
            } else {
                pick(target, "叔叔", "姑姑")
            }
        }
        [Up, Sibling, Down, Down] => {
            let paternal = hops[0].parent_gender.or(mid(0)) == Gender::Male && mid(1) == Gender::Male;
            match (paternal, target == Gender::Female) {
                (true, false) => "堂侄子",
                (true, true) => "堂侄女",
                (false, false) => "表侄子",
                (false, true) => "表侄女",
            }
        }
        [Up, Up, Down, Down] => {
            // Grandparent's grandchild through another child: a cousin
            let paternal = hops[0].parent_gender.or(mid(0)) == Gender::Male && mid(2) == Gender::Male;
            match (paternal, target == Gender::Female) {
                (true, false) => "堂兄/弟",
                (true, true) => "堂姐/妹",
                (false, false) => "表兄/弟",
                (false, true) => "表姐/妹",
            }
        }

        _ => GENERIC_TERM,
    }
}

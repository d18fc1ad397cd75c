//! Mirroring confirmed relations into structural edges

use kinship_domain::{Chain, Gender, GraphEdge, PersonId, Step};

/// Structural edge for a confirmed single-step relation.
///
/// `chain` describes how `owner` reaches `other`. Multi-step chains are not
/// structural and yield `None`; so does an empty chain.
pub fn structural_edge(
    chain: &Chain,
    owner: PersonId,
    other: PersonId,
    owner_gender: Gender,
    other_gender: Gender,
) -> Option<GraphEdge> {
    let [step] = chain.steps() else {
        return None;
    };
    let edge = match *step {
        Step::Parent(g) => GraphEdge::parent_of(other, owner, other_gender.or(g), owner_gender),
        Step::Child(g) => GraphEdge::parent_of(owner, other, owner_gender, other_gender.or(g)),
        Step::Spouse => GraphEdge::spouse_of(owner, other),
        // Step seniority describes `other`; the edge describes its source
        Step::Sibling(_, seniority) => GraphEdge::sibling_of(owner, other, seniority.invert()),
    };
    Some(edge)
}

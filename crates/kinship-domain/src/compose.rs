//! Chain composition for inference without a graph
//!
//! Given how A reaches B and how B reaches C, derive how A reaches C. The
//! rules are deliberately conservative: asymmetric mixes such as aunt/uncle
//! or niece/nephew via an up-then-down route are refused and left for the
//! graph path or a human to settle.

use crate::chain::{Chain, Seniority, Step};
use crate::person::Gender;

/// Longest chain concatenation will produce
pub const MAX_COMPOSED_HOPS: usize = 3;

/// Compose `a2b` with `b2c` into a provisional `a2c`.
///
/// Returns `None` when the combination is not inferred. Genders in the result
/// are placeholders; callers re-gender the final step against C.
pub fn compose(a2b: &Chain, b2c: &Chain) -> Option<Chain> {
    if a2b.is_empty() || b2c.is_empty() {
        return None;
    }

    // A spouse shares the partner's relatives
    if a2b.is_spouse_rooted() {
        return Some(b2c.clone());
    }
    // C is B's spouse: no safe statement about A
    if b2c.is_spouse_rooted() {
        return None;
    }

    // Siblings share parents
    if a2b.is_plain_sibling() {
        return b2c.is_all_up().then(|| b2c.clone());
    }
    if b2c.is_plain_sibling() {
        if !a2b.is_all_down() {
            return None;
        }
        let gender = b2c.last().and_then(|s| s.gender()).unwrap_or_default();
        return Some(a2b.with_target_gender(gender));
    }

    if (a2b.is_all_up() && b2c.is_all_up()) || (a2b.is_all_down() && b2c.is_all_down()) {
        if a2b.len() + b2c.len() > MAX_COMPOSED_HOPS {
            return None;
        }
        return Some(a2b.concat(b2c));
    }

    if a2b.is_all_up() && b2c.is_all_down() {
        return same_generation(a2b, b2c);
    }

    None
}

fn same_generation(up: &Chain, down: &Chain) -> Option<Chain> {
    if up.len() != down.len() {
        return None;
    }
    match up.len() {
        1 => Some(Chain::single(Step::Sibling(Gender::Male, Seniority::Unknown))),
        2 => {
            let via = up.first().and_then(|s| s.gender()).unwrap_or_default();
            Some(Chain::new(vec![
                Step::Parent(via),
                Step::Sibling(Gender::Male, Seniority::Unknown),
                Step::Child(Gender::Male),
            ]))
        }
        _ => None,
    }
}

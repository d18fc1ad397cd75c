//! Kinship vocabulary
//!
//! Maps chains to display terms and derives the reverse chain ("how the other
//! person reaches me"). Resolution is total: any input produces a term, with
//! [`GENERIC_TERM`] as the floor.

use crate::chain::{Chain, Step};
use crate::person::Gender;

/// Term used when nothing more specific can be said
pub const GENERIC_TERM: &str = "亲属";

/// Whether a term carries no kinship information beyond "related"
pub fn is_generic(term: &str) -> bool {
    term.is_empty() || term == GENERIC_TERM
}

/// Resolve a chain into its display term
pub fn resolve(chain: &Chain) -> String {
    if chain.is_empty() {
        return GENERIC_TERM.to_string();
    }
    match lookup(&chain.key()) {
        Some(term) => term.to_string(),
        None => fallback_term(chain),
    }
}

/// Resolve a serialized chain; malformed input yields the generic term
pub fn resolve_json(json: &str) -> String {
    resolve(&Chain::decode_lenient(json))
}

fn fallback_term(chain: &Chain) -> String {
    match chain.generation_counts() {
        (up, 0) if up > 0 => format!("{}代祖先", up),
        (0, down) if down > 0 => format!("{}代后裔", down),
        _ => GENERIC_TERM.to_string(),
    }
}

fn lookup(key: &str) -> Option<&'static str> {
    let term = match key {
        // Single steps
        "父" => "父亲",
        "母" => "母亲",
        "子" => "儿子",
        "女" => "女儿",
        "配偶" => "配偶",
        "哥" => "哥哥",
        "弟" => "弟弟",
        "姐" => "姐姐",
        "妹" => "妹妹",
        "兄弟" => "兄/弟",
        "姐妹" => "姐/妹",

        // Ancestors
        "父,父" => "爷爷",
        "父,母" => "奶奶",
        "母,父" => "外公",
        "母,母" => "外婆",
        "父,父,父" => "太爷爷",
        "父,父,母" => "太奶奶",
        "母,父,父" => "外曾祖父",
        "母,父,母" => "外曾祖母",
        "母,母,父" => "太外公",
        "母,母,母" => "太外婆",
        "父,母,父" => "祖外公",
        "父,母,母" => "祖外婆",

        // Descendants
        "子,子" => "孙子",
        "子,女" => "孙女",
        "女,子" => "外孙",
        "女,女" => "外孙女",
        "子,子,子" => "重孙子",
        "子,子,女" => "重孙女",
        "子,女,子" => "外曾孙",
        "子,女,女" => "外曾孙女",
        "女,子,子" => "外孙的儿子",
        "女,女,子" => "外孙女的儿子",

        // Spouse's family
        "配偶,父" => "岳父/公公",
        "配偶,母" => "岳母/婆婆",
        "配偶,哥" => "大舅子/大伯",
        "配偶,弟" => "小舅子/小叔",
        "配偶,姐" => "大姨子/大姑",
        "配偶,妹" => "小姨子/小姑",
        "配偶,子" => "继子",
        "配偶,女" => "继女",
        "配偶,父,父" => "配偶的爷爷",
        "配偶,父,母" => "配偶的奶奶",
        "配偶,母,父" => "配偶的外公",
        "配偶,母,母" => "配偶的外婆",
        "配偶,父,哥" => "配偶的伯父",
        "配偶,父,弟" => "配偶的叔叔",
        "配偶,父,姐" | "配偶,父,妹" => "配偶的姑姑",
        "配偶,母,哥" | "配偶,母,弟" => "配偶的舅舅",
        "配偶,母,姐" | "配偶,母,妹" => "配偶的姨妈",

        // Parents' siblings and step-parents
        "父,哥" => "伯父",
        "父,弟" => "叔叔",
        "父,兄弟" => "叔/伯",
        "父,姐" | "父,妹" | "父,姐妹" => "姑姑",
        "母,哥" | "母,弟" | "母,兄弟" => "舅舅",
        "母,姐" | "母,妹" | "母,姐妹" => "姨妈",
        "父,配偶" => "继母",
        "母,配偶" => "继父",

        // Siblings' children and spouses
        "哥,子" | "弟,子" | "兄弟,子" => "侄子",
        "哥,女" | "弟,女" | "兄弟,女" => "侄女",
        "姐,子" | "妹,子" | "姐妹,子" => "外甥",
        "姐,女" | "妹,女" | "姐妹,女" => "外甥女",
        "哥,配偶" => "嫂子",
        "弟,配偶" => "弟媳",
        "姐,配偶" => "姐夫",
        "妹,配偶" => "妹夫",

        // Children's spouses
        "子,配偶" => "儿媳",
        "女,配偶" => "女婿",
        "子,子,配偶" => "孙媳",

        // Cousins
        "父,哥,子" | "父,弟,子" => "堂兄弟",
        "父,哥,女" | "父,弟,女" => "堂姐妹",
        "父,兄弟,子" => "堂/表兄弟",
        "父,兄弟,女" => "堂/表姐妹",
        "父,姐,子" | "父,妹,子" | "父,姐妹,子" => "表兄弟",
        "父,姐,女" | "父,妹,女" | "父,姐妹,女" => "表姐妹",
        "母,哥,子" | "母,弟,子" | "母,姐,子" | "母,妹,子" | "母,兄弟,子" | "母,姐妹,子" => "表兄弟",
        "母,哥,女" | "母,弟,女" | "母,姐,女" | "母,妹,女" | "母,兄弟,女" | "母,姐妹,女" => "表姐妹",

        // Aunts' and uncles' spouses
        "父,哥,配偶" => "伯母",
        "父,弟,配偶" => "婶婶",
        "父,姐,配偶" | "父,妹,配偶" => "姑父",
        "母,哥,配偶" | "母,弟,配偶" => "舅妈",
        "母,姐,配偶" | "母,妹,配偶" => "姨父",

        // Co-parents-in-law
        "子,配偶,父" | "女,配偶,父" => "亲家公",
        "子,配偶,母" | "女,配偶,母" => "亲家母",

        // Grandparents' siblings' children
        "父,父,哥,子" | "父,父,弟,子" => "叔叔（堂叔）",
        "父,父,哥,女" | "父,父,弟,女" => "姑姑（堂姑）",
        "父,母,哥,子" | "父,母,弟,子" | "父,母,姐,子" | "父,母,妹,子" => "表叔",
        "父,母,哥,女" | "父,母,弟,女" | "父,母,姐,女" | "父,母,妹,女" => "表姑",

        _ => return None,
    };
    Some(term)
}

/// Derive the chain describing how `other` reaches `me`.
///
/// `chain` describes how `me` (gender `self_gender`) reaches `other`
/// (gender `other_gender`). Each reversed step is gendered by the person it
/// lands on; the final step lands on `me`. Unknown genders produce the male
/// variant. A lone spouse hop is its own reverse.
pub fn reverse(chain: &Chain, self_gender: Gender, other_gender: Gender) -> Chain {
    let steps = chain.steps();
    if steps.is_empty() {
        return Chain::empty();
    }

    // genders[i] is the gender of the i-th person along the chain, 0 = me
    let mut genders = Vec::with_capacity(steps.len() + 1);
    genders.push(self_gender);
    for (i, step) in steps.iter().enumerate() {
        let g = match step.gender() {
            Some(g) => g,
            None => genders[i].opposite(),
        };
        genders.push(g);
    }
    if other_gender.is_known() {
        if let Some(last) = genders.last_mut() {
            *last = other_gender;
        }
    }

    let reversed = steps
        .iter()
        .enumerate()
        .rev()
        .map(|(i, step)| invert_step(*step, genders[i].or(Gender::Male)))
        .collect::<Vec<_>>();
    Chain::new(reversed)
}

fn invert_step(step: Step, landing_gender: Gender) -> Step {
    match step {
        Step::Parent(_) => Step::Child(landing_gender),
        Step::Child(_) => Step::Parent(landing_gender),
        Step::Spouse => Step::Spouse,
        Step::Sibling(_, seniority) => Step::Sibling(landing_gender, seniority.invert()),
    }
}

/// Reverse a bare term when no usable chain is stored.
///
/// `owner_gender` is the gender of the person who holds the term; the result
/// is what the other person calls them.
pub fn reverse_term(term: &str, owner_gender: Gender) -> String {
    let female = owner_gender == Gender::Female;
    let pick = |male: &'static str, female_term: &'static str| if female { female_term } else { male };
    let reversed = match term {
        "父亲" | "母亲" => pick("儿子", "女儿"),
        "儿子" | "女儿" => pick("父亲", "母亲"),
        "配偶" | "丈夫" | "妻子" => match owner_gender {
            Gender::Male => "丈夫",
            Gender::Female => "妻子",
            Gender::Unknown => "配偶",
        },
        "哥哥" | "姐姐" => pick("弟弟", "妹妹"),
        "弟弟" | "妹妹" => pick("哥哥", "姐姐"),
        "兄/弟" | "姐/妹" => pick("兄/弟", "姐/妹"),
        "爷爷" | "奶奶" => pick("孙子", "孙女"),
        "外公" | "外婆" => pick("外孙", "外孙女"),
        "孙子" | "孙女" => pick("爷爷", "奶奶"),
        "外孙" | "外孙女" => pick("外公", "外婆"),
        "太爷爷" | "太奶奶" | "曾祖父" | "曾祖母" => pick("重孙子", "重孙女"),
        "重孙子" | "重孙女" | "曾孙" | "曾孙女" => pick("太爷爷", "太奶奶"),
        "伯父" | "叔叔" | "叔/伯" | "姑姑" => pick("侄子", "侄女"),
        "舅舅" | "姨妈" => pick("外甥", "外甥女"),
        "侄子" | "侄女" => pick("叔/伯", "姑姑"),
        "外甥" | "外甥女" => pick("舅舅", "姨妈"),
        "堂兄弟" | "堂姐妹" => pick("堂兄弟", "堂姐妹"),
        "表兄弟" | "表姐妹" => pick("表兄弟", "表姐妹"),
        "堂/表兄弟" | "堂/表姐妹" => pick("堂/表兄弟", "堂/表姐妹"),
        "岳父" | "岳母" => "女婿",
        "公公" | "婆婆" => "儿媳",
        "女婿" => pick("岳父", "岳母"),
        "儿媳" => pick("公公", "婆婆"),
        "继父" | "继母" => pick("继子", "继女"),
        "继子" | "继女" => pick("继父", "继母"),
        "亲家公" | "亲家母" => pick("亲家公", "亲家母"),
        _ => GENERIC_TERM,
    };
    reversed.to_string()
}

//! Weak types, neutrals and implicit levels (rules W1-W7, N0-N2, I1-I2)
//! for a single isolating run sequence.

use unicode_bidi::BidiClass::{self, *};

use crate::unicode::{BracketRole, CharProps};

/// Maximum depth of the bracket-pair stack (BD16).
const MAX_BRACKET_STACK: usize = 63;

/// Treatment of European and Arabic numbers during weak-type resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NumberPolicy {
    Standard,
    /// A European number after L text that is followed by R text stays a
    /// number and moves with the R text (even sequences only).
    NumbersSpecial,
    /// Numbers become L only when L text is the nearest strong type on
    /// both sides.
    GroupWithR,
    /// All numbers resolve as L.
    AsL,
}

/// An isolating run sequence (BD13) with its boundary types.
///
/// `indices` are paragraph-relative and listed in reading order, which
/// is memory order unless the sequence is read from its visual end.
#[derive(Debug, Clone)]
pub(crate) struct IsolatingRunSequence {
    pub indices: Vec<usize>,
    pub level: u8,
    pub sos: BidiClass,
    pub eos: BidiClass,
    /// Sequence is read against memory order; paired brackets swap roles.
    pub reversed: bool,
}

pub(crate) fn class_for_level(level: u8) -> BidiClass {
    if level % 2 == 1 { R } else { L }
}

pub(crate) fn is_isolate_control(class: BidiClass) -> bool {
    matches!(class, LRI | RLI | FSI | PDI)
}

fn is_neutral(class: BidiClass) -> bool {
    matches!(class, B | S | WS | ON | LRI | RLI | FSI | PDI)
}

/// Direction a resolved type exerts on neutrals (numbers count as R).
fn strong_direction(class: BidiClass) -> Option<BidiClass> {
    match class {
        L => Some(L),
        R | AL | EN | AN => Some(R),
        _ => None,
    }
}

/// Resolves one sequence in place.
///
/// `initial` holds the original classes and `classes` the classes after
/// the explicit pass (overrides applied). On return `classes` holds the
/// resolved type (L, R, EN or AN) and `levels` the implicit levels of
/// every character in the sequence.
pub(crate) fn resolve_sequence<P: CharProps>(
    props: &P,
    text: &[char],
    initial: &[BidiClass],
    classes: &mut [BidiClass],
    levels: &mut [u8],
    seq: &IsolatingRunSequence,
    policy: NumberPolicy,
) {
    let idx = &seq.indices;
    let mut types: Vec<BidiClass> = idx.iter().map(|&i| classes[i]).collect();

    resolve_weak(&mut types, idx, initial, seq, policy);
    resolve_brackets(props, text, initial, &mut types, seq);
    resolve_neutrals(&mut types, seq);

    for (k, &i) in idx.iter().enumerate() {
        classes[i] = types[k];
        levels[i] = implicit_level(seq.level, types[k]);
    }
}

fn implicit_level(level: u8, class: BidiClass) -> u8 {
    match (level % 2, class) {
        (0, R) => level + 1,
        (0, AN | EN) => level + 2,
        (1, L | EN | AN) => level + 1,
        _ => level,
    }
}

fn resolve_weak(
    types: &mut [BidiClass],
    idx: &[usize],
    initial: &[BidiClass],
    seq: &IsolatingRunSequence,
    policy: NumberPolicy,
) {
    let n = types.len();

    // W1
    let mut prev = seq.sos;
    for k in 0..n {
        if types[k] == NSM {
            types[k] = if k > 0 && is_isolate_control(initial[idx[k - 1]]) { ON } else { prev };
        }
        prev = types[k];
    }

    // W2, W3
    let mut last_strong = seq.sos;
    for t in types.iter_mut() {
        match *t {
            L | R | AL => last_strong = *t,
            EN if last_strong == AL => *t = AN,
            _ => {}
        }
    }
    for t in types.iter_mut() {
        if *t == AL {
            *t = R;
        }
    }

    // W4
    for k in 1..n.saturating_sub(1) {
        let (before, after) = (types[k - 1], types[k + 1]);
        types[k] = match (types[k], before, after) {
            (ES, EN, EN) | (CS, EN, EN) => EN,
            (CS, AN, AN) => AN,
            (t, _, _) => t,
        };
    }

    // W5
    let mut k = 0;
    while k < n {
        if types[k] != ET {
            k += 1;
            continue;
        }
        let start = k;
        while k < n && types[k] == ET {
            k += 1;
        }
        let touches_number = (start > 0 && types[start - 1] == EN) || (k < n && types[k] == EN);
        if touches_number {
            types[start..k].fill(EN);
        }
    }

    // W6
    for t in types.iter_mut() {
        if matches!(*t, ES | ET | CS) {
            *t = ON;
        }
    }

    match policy {
        NumberPolicy::AsL => {
            for t in types.iter_mut() {
                if matches!(*t, EN | AN) {
                    *t = L;
                }
            }
        }
        NumberPolicy::GroupWithR => group_numbers_with_r(types, seq),
        NumberPolicy::Standard | NumberPolicy::NumbersSpecial => {
            let keep_before_r = policy == NumberPolicy::NumbersSpecial && seq.level % 2 == 0;
            resolve_w7(types, seq, keep_before_r);
        }
    }
}

/// W7, optionally leaving numbers that lead into R text as numbers.
fn resolve_w7(types: &mut [BidiClass], seq: &IsolatingRunSequence, keep_before_r: bool) {
    let n = types.len();
    let mut last_strong = seq.sos;
    let mut k = 0;
    while k < n {
        match types[k] {
            L | R => {
                last_strong = types[k];
                k += 1;
            }
            EN if last_strong == L => {
                let start = k;
                while k < n && types[k] == EN {
                    k += 1;
                }
                if !(keep_before_r && next_strong(types, k, seq.eos) == R) {
                    types[start..k].fill(L);
                }
            }
            _ => k += 1,
        }
    }
}

fn group_numbers_with_r(types: &mut [BidiClass], seq: &IsolatingRunSequence) {
    let n = types.len();
    let mut last_strong = seq.sos;
    let mut k = 0;
    while k < n {
        match types[k] {
            L | R => {
                last_strong = types[k];
                k += 1;
            }
            EN | AN => {
                let start = k;
                while k < n && matches!(types[k], EN | AN) {
                    k += 1;
                }
                if last_strong == L && next_strong(types, k, seq.eos) == L {
                    types[start..k].fill(L);
                }
            }
            _ => k += 1,
        }
    }
}

/// First L or R at or after `from`, skipping numbers and neutrals.
fn next_strong(types: &[BidiClass], from: usize, eos: BidiClass) -> BidiClass {
    types[from..]
        .iter()
        .copied()
        .find(|t| matches!(t, L | R))
        .unwrap_or(eos)
}

/// Locate bracket pairs (BD16) as `(open, close)` sequence positions.
fn bracket_pairs<P: CharProps>(
    props: &P,
    text: &[char],
    types: &[BidiClass],
    seq: &IsolatingRunSequence,
) -> Vec<(usize, usize)> {
    let mut stack: Vec<(char, usize)> = Vec::with_capacity(MAX_BRACKET_STACK);
    let mut pairs = Vec::new();

    for (k, &i) in seq.indices.iter().enumerate() {
        if types[k] != ON {
            continue;
        }
        let Some(bracket) = props.paired_bracket(text[i]) else {
            continue;
        };
        let bracket = if seq.reversed { bracket.flipped() } else { bracket };
        match bracket.role {
            BracketRole::Open => {
                if stack.len() == MAX_BRACKET_STACK {
                    break;
                }
                stack.push((bracket.pair_key, k));
            }
            BracketRole::Close => {
                if let Some(pos) = stack.iter().rposition(|&(key, _)| key == bracket.pair_key) {
                    pairs.push((stack[pos].1, k));
                    stack.truncate(pos);
                }
            }
        }
    }

    pairs.sort_unstable();
    pairs
}

// N0
fn resolve_brackets<P: CharProps>(
    props: &P,
    text: &[char],
    initial: &[BidiClass],
    types: &mut [BidiClass],
    seq: &IsolatingRunSequence,
) {
    let embedding = class_for_level(seq.level);
    let n = types.len();

    for (open, close) in bracket_pairs(props, text, types, seq) {
        let mut found_embedding = false;
        let mut found_opposite = false;
        for &t in &types[open + 1..close] {
            match strong_direction(t) {
                Some(dir) if dir == embedding => {
                    found_embedding = true;
                    break;
                }
                Some(_) => found_opposite = true,
                None => {}
            }
        }

        let resolved = if found_embedding {
            embedding
        } else if found_opposite {
            let context = types[..open]
                .iter()
                .rev()
                .find_map(|&t| strong_direction(t))
                .unwrap_or(seq.sos);
            if context != embedding { context } else { embedding }
        } else {
            continue;
        };

        for pos in [open, close] {
            types[pos] = resolved;
            let mut k = pos + 1;
            while k < n && initial[seq.indices[k]] == NSM {
                types[k] = resolved;
                k += 1;
            }
        }
    }
}

// N1, N2
fn resolve_neutrals(types: &mut [BidiClass], seq: &IsolatingRunSequence) {
    let embedding = class_for_level(seq.level);
    let n = types.len();
    let mut k = 0;
    while k < n {
        if !is_neutral(types[k]) {
            k += 1;
            continue;
        }
        let start = k;
        while k < n && is_neutral(types[k]) {
            k += 1;
        }
        let before = if start == 0 {
            seq.sos
        } else {
            strong_direction(types[start - 1]).unwrap_or(embedding)
        };
        let after = if k == n {
            seq.eos
        } else {
            strong_direction(types[k]).unwrap_or(embedding)
        };
        let resolved = if before == after { before } else { embedding };
        types[start..k].fill(resolved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unicode::UnicodeProps;

    fn run(text: &str, level: u8, policy: NumberPolicy) -> (Vec<BidiClass>, Vec<u8>) {
        let chars: Vec<char> = text.chars().collect();
        let props = UnicodeProps;
        let initial: Vec<BidiClass> = chars.iter().map(|&c| props.bidi_class(c)).collect();
        let mut classes = initial.clone();
        let mut levels = vec![level; chars.len()];
        let seq = IsolatingRunSequence {
            indices: (0..chars.len()).collect(),
            level,
            sos: class_for_level(level),
            eos: class_for_level(level),
            reversed: false,
        };
        resolve_sequence(&props, &chars, &initial, &mut classes, &mut levels, &seq, policy);
        (classes, levels)
    }

    #[test]
    fn european_numbers_after_arabic_become_arabic() {
        let (classes, levels) = run("\u{0643} 12", 0, NumberPolicy::Standard);
        assert_eq!(classes[2], AN);
        assert_eq!(levels[2..], [2, 2]);
    }

    #[test]
    fn numbers_after_latin_resolve_as_latin() {
        let (classes, levels) = run("abc 12", 1, NumberPolicy::Standard);
        assert_eq!(classes[4], L);
        assert_eq!(levels, vec![2; 6]);
    }

    #[test]
    fn separators_between_numbers_join_them() {
        let (classes, _) = run("\u{05D0} 1,5 2+3", 1, NumberPolicy::Standard);
        assert_eq!(&classes[2..5], &[EN, EN, EN]);
        assert_eq!(&classes[6..9], &[EN, EN, EN]);
    }

    #[test]
    fn neutrals_between_mixed_strong_take_embedding_direction() {
        let (classes, levels) = run("a - \u{05D0}", 0, NumberPolicy::Standard);
        assert_eq!(&classes[1..4], &[L, L, L]);
        assert_eq!(levels, vec![0, 0, 0, 0, 1]);
    }

    #[test]
    fn brackets_enclosing_rtl_text_follow_context() {
        // "\u{05D0}(\u{05D1})" in an LTR sequence: the pair holds only R and is
        // preceded by R, so both brackets resolve to R.
        let (classes, levels) = run("\u{05D0}(\u{05D1})", 0, NumberPolicy::Standard);
        assert_eq!(classes[1], R);
        assert_eq!(classes[3], R);
        assert_eq!(levels, vec![1, 1, 1, 1]);
    }

    #[test]
    fn numbers_special_keeps_number_before_rtl() {
        let (std_classes, _) = run("a 1 \u{05D0}", 0, NumberPolicy::Standard);
        let (special, levels) = run("a 1 \u{05D0}", 0, NumberPolicy::NumbersSpecial);
        assert_eq!(std_classes[2], L);
        assert_eq!(special[2], EN);
        assert_eq!(levels[2], 2);
    }

    #[test]
    fn group_with_r_needs_latin_on_both_sides() {
        let (between_l, _) = run("a 1 b", 0, NumberPolicy::GroupWithR);
        let (before_r, _) = run("a 1 \u{05D0}", 0, NumberPolicy::GroupWithR);
        assert_eq!(between_l[2], L);
        assert_eq!(before_r[2], EN);
    }

    #[test]
    fn numbers_as_l_policy() {
        let (classes, levels) = run("\u{05D0} 12", 1, NumberPolicy::AsL);
        assert_eq!(&classes[2..], &[L, L]);
        assert_eq!(&levels[2..], &[2, 2]);
    }
}

//! Directional marks that keep visual-to-logical output reversible.
//!
//! After an inverse pass the logical result is checked by displaying it
//! again with the matching logical-to-visual mode. Wherever a character
//! would land somewhere other than its source position, an LRM or RLM
//! carrying the direction it was resolved with is inserted in front of
//! it and the check repeats.
//!
//! In-place strong characters at the paragraph level split the output
//! into chunks that resolve and reorder independently, so every chunk
//! gets its next mark in the same pass. The number of passes follows the
//! marks one chunk needs, not the length of the text.

use unicode_bidi::format_chars::{LRM, RLM};
use unicode_bidi::BidiClass::{self, *};

use crate::bidi::implicit::class_for_level;
use crate::bidi::levels::{LevelResolver, ParaLevel, Resolution};
use crate::bidi::options::ReorderingMode;
use crate::bidi::reorder::visual_order;
use crate::error::Result;
use crate::unicode::CharProps;

/// A mark emitted in front of the character at output position `before`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Mark {
    pub before: usize,
    pub ch: char,
}

/// Marks chosen for one output, sorted by position.
#[derive(Debug, Clone, Default)]
pub(crate) struct MarkPlan {
    pub marks: Vec<Mark>,
    /// Resolution passes over the output, the last one being clean
    /// unless the budget ran out.
    pub passes: usize,
}

pub(crate) struct MarkPlanner<'a, P> {
    pub props: &'a P,
    /// Visually ordered input of the inverse pass.
    pub source: &'a [char],
    /// Types and levels the inverse pass resolved for `source`.
    pub classes: &'a [BidiClass],
    pub levels: &'a [u8],
    /// Mode used to display the logical result again.
    pub direct_mode: ReorderingMode,
    pub para: ParaLevel,
}

/// Misplaced output positions between two anchors.
struct Chunk {
    first: usize,
    first_mismatch: Option<usize>,
}

impl<P: CharProps> MarkPlanner<'_, P> {
    /// Plan marks for the output described by `order` (output position
    /// to source index). At most `budget` marks are inserted.
    pub fn plan(&self, order: &[usize], lead_rlm: bool, budget: usize) -> Result<MarkPlan> {
        let mut plan = MarkPlan::default();
        if lead_rlm {
            plan.marks.push(Mark { before: 0, ch: RLM });
        }
        let resolver = LevelResolver::new(self.props, self.direct_mode, false);

        loop {
            let (text, slots) = interleave(self.source, order, &plan.marks);
            let resolution = resolver.resolve(&text, self.para, None, false)?;
            plan.passes += 1;

            let chunks = self.misplaced_chunks(order, &text, &slots, &resolution);
            if chunks.is_empty() {
                break;
            }
            let room = budget.saturating_sub(plan.marks.len());
            if room == 0 {
                tracing::warn!(marks = plan.marks.len(), chunks = chunks.len(), "mark budget exhausted before round trip");
                break;
            }

            let mut added = 0;
            for chunk in chunks {
                if added == room {
                    break;
                }
                let target = chunk.first_mismatch.unwrap_or(chunk.first);
                let mark = Mark { before: target, ch: self.mark_for(order[target]) };
                if plan.marks.contains(&mark) {
                    tracing::warn!(before = target, "directional mark did not settle the output");
                    continue;
                }
                tracing::trace!(before = target, mark = ?mark.ch, "inserting directional mark");
                plan.marks.push(mark);
                added += 1;
            }
            if added == 0 {
                break;
            }
            plan.marks.sort_by_key(|m| m.before);
        }

        tracing::debug!(marks = plan.marks.len(), passes = plan.passes, "directional marks planned");
        Ok(plan)
    }

    fn mark_for(&self, src: usize) -> char {
        match self.classes[src] {
            L => LRM,
            R | AL | EN | AN => RLM,
            _ if self.levels[src] % 2 == 1 => RLM,
            _ => LRM,
        }
    }

    /// Groups misplaced output positions into chunks separated by
    /// anchors: characters shown in place whose own class is the strong
    /// direction of their paragraph and that resolved to its level, or
    /// paragraph separators. Neither level resolution nor L2 crosses an
    /// anchor.
    fn misplaced_chunks(
        &self,
        order: &[usize],
        text: &[char],
        slots: &[Option<usize>],
        resolution: &Resolution,
    ) -> Vec<Chunk> {
        let mut text_index = vec![0; order.len()];
        for (j, slot) in slots.iter().enumerate() {
            if let Some(k) = *slot {
                text_index[k] = j;
            }
        }
        let mut shown_at = vec![0; order.len()];
        let displayed = visual_order(&resolution.levels).into_iter().filter_map(|j| slots[j]);
        for (pos, k) in displayed.enumerate() {
            shown_at[k] = pos;
        }
        let mut para_level = vec![0; text.len()];
        for paragraph in &resolution.paragraphs {
            para_level[paragraph.range.clone()].fill(paragraph.level);
        }

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut open = false;
        for (k, &src) in order.iter().enumerate() {
            let j = text_index[k];
            let in_place = shown_at[k] == src;
            let anchor = in_place
                && match self.props.bidi_class(text[j]) {
                    B => true,
                    class => {
                        let strong = if class == AL { R } else { class };
                        strong == class_for_level(para_level[j]) && resolution.levels[j] == para_level[j]
                    }
                };
            if anchor {
                open = false;
                continue;
            }
            if in_place {
                continue;
            }
            let mismatch = kind(self.classes[src]) != kind(resolution.classes[j]);
            if !open {
                chunks.push(Chunk { first: k, first_mismatch: None });
                open = true;
            }
            if let Some(chunk) = chunks.last_mut() {
                if mismatch && chunk.first_mismatch.is_none() {
                    chunk.first_mismatch = Some(k);
                }
            }
        }
        chunks
    }
}

/// Resolved types compared loosely: numbers of either kind are alike.
fn kind(class: BidiClass) -> u8 {
    match class {
        L => 0,
        R | AL => 1,
        EN | AN => 2,
        _ => 3,
    }
}

/// Output text with marks in place, plus the output position of every
/// character (`None` for marks).
fn interleave(source: &[char], order: &[usize], marks: &[Mark]) -> (Vec<char>, Vec<Option<usize>>) {
    let mut text = Vec::with_capacity(order.len() + marks.len());
    let mut slots = Vec::with_capacity(order.len() + marks.len());
    let mut pending = marks.iter().peekable();
    for (k, &src) in order.iter().enumerate() {
        while let Some(mark) = pending.next_if(|m| m.before == k) {
            text.push(mark.ch);
            slots.push(None);
        }
        text.push(source[src]);
        slots.push(Some(k));
    }
    for mark in pending {
        text.push(mark.ch);
        slots.push(None);
    }
    (text, slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidi::reorder::Layout;
    use crate::unicode::UnicodeProps;

    fn plan(visual: &str, para: ParaLevel) -> Vec<Mark> {
        plan_for(visual, para).marks
    }

    fn plan_for(visual: &str, para: ParaLevel) -> MarkPlan {
        let chars: Vec<char> = visual.chars().collect();
        let props = UnicodeProps;
        let res = LevelResolver::new(&props, ReorderingMode::InverseLikeDirect, false)
            .resolve(&chars, para, None, false)
            .unwrap();
        let layout = Layout::from_levels(&res.levels);
        let planner = MarkPlanner {
            props: &props,
            source: &chars,
            classes: &res.classes,
            levels: &res.levels,
            direct_mode: ReorderingMode::Default,
            para,
        };
        planner.plan(&layout.order, false, 2 * layout.runs.len()).unwrap()
    }

    #[test]
    fn independent_spans_are_marked_in_one_pass() {
        let visual = "abc \u{05D2}\u{05D1}\u{05D0} 123 ".repeat(200);
        let plan = plan_for(&visual, ParaLevel::LTR);
        assert_eq!(plan.marks.len(), 200);
        assert_eq!(plan.passes, 2);
        for (i, mark) in plan.marks.iter().enumerate() {
            assert_eq!(*mark, Mark { before: 12 * i + 4, ch: RLM });
        }
    }

    #[test]
    fn one_cause_gets_one_mark() {
        // "12" lands after the Hebrew and the Hebrew before "12": both
        // spans are misplaced, but one RLM fixes them.
        let plan = plan_for("ab \u{05D1}\u{05D0} 12", ParaLevel::LTR);
        assert_eq!(plan.marks, vec![Mark { before: 3, ch: RLM }]);
        assert_eq!(plan.passes, 2);
    }

    #[test]
    fn number_after_rtl_needs_rlm() {
        let marks = plan("abc \u{05D2}\u{05D1}\u{05D0} 123", ParaLevel::LTR);
        assert_eq!(marks, vec![Mark { before: 4, ch: RLM }]);
    }

    #[test]
    fn unambiguous_text_needs_no_marks() {
        assert!(plan("abc \u{05D2}\u{05D1}\u{05D0} def", ParaLevel::LTR).is_empty());
        assert!(plan("Hello World", ParaLevel::LTR).is_empty());
    }

    #[test]
    fn interleave_places_marks_before_slots() {
        let marks = [Mark { before: 1, ch: LRM }, Mark { before: 2, ch: RLM }];
        let (text, slots) = interleave(&['a', 'b'], &[1, 0], &marks);
        assert_eq!(text, vec!['b', LRM, 'a', RLM]);
        assert_eq!(slots, vec![Some(0), None, Some(1), None]);
    }
}

//! Rendering reordered text: mirroring (rule L4), combining marks and
//! insertion or removal of directional controls.

use unicode_bidi::format_chars::LRM;
use unicode_bidi::BidiClass;

use crate::bidi::options::WriteOptions;
use crate::bidi::reorder::Layout;
use crate::bidi::runs::DirectionalRun;
use crate::unicode::{is_bidi_control, CharProps, UnicodeProps};

/// Writes the processed text of one resolution in the order given by a
/// [`Layout`].
pub(crate) struct Writer<'a, P> {
    pub props: &'a P,
    pub text: &'a [char],
    pub levels: &'a [u8],
    pub layout: &'a Layout,
    /// Runs keep their internal order and are never mirrored.
    pub runs_only: bool,
}

impl<P: CharProps> Writer<'_, P> {
    pub fn write(&self, options: WriteOptions) -> Vec<char> {
        let layout = self.layout;
        let reverse = options.contains(WriteOptions::OUTPUT_REVERSE);
        let starts = layout.run_starts();
        let total = layout.order.len();
        let run_count = layout.runs.len();
        let mut out = Vec::with_capacity(total + layout.marks.len() + 2 * run_count);

        let run_ids: Vec<usize> = if reverse {
            (0..run_count).rev().collect()
        } else {
            (0..run_count).collect()
        };

        if reverse {
            self.push_marks(total, true, &mut out);
        }
        for (nth, &r) in run_ids.iter().enumerate() {
            let run = &layout.runs[r];
            let start = starts[r];
            let slots = self.emitted_slots(start, run, reverse, options);
            let (before, after) = if options.contains(WriteOptions::INSERT_LRM_FOR_NUMERIC) {
                self.numeric_marks(run, &slots, nth == 0, nth + 1 == run_count)
            } else {
                (None, None)
            };

            out.extend(before);
            for (t, &src) in slots.iter().enumerate() {
                let pos = if reverse { start + run.length - 1 - t } else { start + t };
                if !reverse {
                    self.push_marks(pos, false, &mut out);
                }
                self.push_char(src, options, &mut out);
                if reverse {
                    self.push_marks(pos, true, &mut out);
                }
            }
            out.extend(after);
        }
        if !reverse {
            self.push_marks(total, false, &mut out);
        }
        out
    }

    /// Number of marks `INSERT_LRM_FOR_NUMERIC` adds to a forward write.
    pub fn numeric_mark_count(&self) -> usize {
        let starts = self.layout.run_starts();
        let run_count = self.layout.runs.len();
        self.layout
            .runs
            .iter()
            .enumerate()
            .map(|(r, run)| {
                let slots = self.emitted_slots(starts[r], run, false, WriteOptions::empty());
                let (before, after) = self.numeric_marks(run, &slots, r == 0, r + 1 == run_count);
                usize::from(before.is_some()) + usize::from(after.is_some())
            })
            .sum()
    }

    /// Source indices of a run in the order they are written.
    fn emitted_slots(&self, start: usize, run: &DirectionalRun, reverse: bool, options: WriteOptions) -> Vec<usize> {
        let mut slots = self.layout.order[start..start + run.length].to_vec();
        if reverse {
            slots.reverse();
        }
        let descending = !self.runs_only && run.direction.is_rtl() != reverse;
        if descending && options.contains(WriteOptions::KEEP_BASE_COMBINING) {
            keep_marks_after_base(self.props, self.text, &mut slots);
        }
        slots
    }

    fn numeric_marks(&self, run: &DirectionalRun, slots: &[usize], first: bool, last: bool) -> (Option<char>, Option<char>) {
        let (Some(&head), Some(&tail)) = (slots.first(), slots.last()) else {
            return (None, None);
        };
        let rtl = run.direction.is_rtl();
        let own_direction = |i: usize| match self.props.bidi_class(self.text[i]) {
            BidiClass::R | BidiClass::AL => rtl,
            BidiClass::L => !rtl,
            _ => false,
        };
        let before = (!first && !own_direction(head)).then_some(LRM);
        let after = (!last && !own_direction(tail)).then_some(LRM);
        (before, after)
    }

    fn push_marks(&self, pos: usize, reverse: bool, out: &mut Vec<char>) {
        let marks = &self.layout.marks;
        let lo = marks.partition_point(|m| m.before < pos);
        let hi = marks.partition_point(|m| m.before <= pos);
        let at = marks[lo..hi].iter().map(|m| m.ch);
        if reverse {
            out.extend(at.rev());
        } else {
            out.extend(at);
        }
    }

    fn push_char(&self, src: usize, options: WriteOptions, out: &mut Vec<char>) {
        let ch = self.text[src];
        if options.contains(WriteOptions::REMOVE_BIDI_CONTROLS) && is_bidi_control(ch) {
            return;
        }
        let mirror = options.contains(WriteOptions::DO_MIRRORING)
            && !self.runs_only
            && self.levels[src] % 2 == 1;
        out.push(if mirror { self.props.mirror_of(ch).unwrap_or(ch) } else { ch });
    }
}

/// In a run written from its logical end, move each base character in
/// front of the combining marks that follow it logically.
fn keep_marks_after_base<P: CharProps>(props: &P, text: &[char], slots: &mut [usize]) {
    let is_mark = |src: usize| props.is_combining_mark(text[src]);
    let mut k = 0;
    while k < slots.len() {
        if !is_mark(slots[k]) {
            k += 1;
            continue;
        }
        let start = k;
        while k < slots.len() && is_mark(slots[k]) {
            k += 1;
        }
        if k < slots.len() {
            slots[start..=k].reverse();
            k += 1;
        }
    }
}

/// Reverse `text` as a single right-to-left run.
///
/// Honours `KEEP_BASE_COMBINING`, `DO_MIRRORING` (every mirrored
/// character is replaced) and `REMOVE_BIDI_CONTROLS`; other options
/// are ignored.
pub fn write_reverse(text: &str, options: WriteOptions) -> String {
    let props = UnicodeProps;
    let chars: Vec<char> = text.chars().collect();
    let mut slots: Vec<usize> = (0..chars.len()).rev().collect();
    if options.contains(WriteOptions::KEEP_BASE_COMBINING) {
        keep_marks_after_base(&props, &chars, &mut slots);
    }
    slots
        .into_iter()
        .map(|i| chars[i])
        .filter(|&ch| !(options.contains(WriteOptions::REMOVE_BIDI_CONTROLS) && is_bidi_control(ch)))
        .map(|ch| {
            if options.contains(WriteOptions::DO_MIRRORING) {
                props.mirror_of(ch).unwrap_or(ch)
            } else {
                ch
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidi::marks::Mark;
    use unicode_bidi::format_chars::RLM;

    fn write(text: &str, levels: &[u8], marks: Vec<Mark>, options: WriteOptions) -> String {
        let chars: Vec<char> = text.chars().collect();
        let mut layout = Layout::from_levels(levels);
        layout.marks = marks;
        let writer = Writer { props: &UnicodeProps, text: &chars, levels, layout: &layout, runs_only: false };
        writer.write(options).into_iter().collect()
    }

    #[test]
    fn mirrors_only_at_odd_levels() {
        let text = "(a\u{05D0})";
        assert_eq!(write(text, &[0, 0, 1, 1], vec![], WriteOptions::empty()), "(a)\u{05D0}");
        assert_eq!(write(text, &[0, 0, 1, 1], vec![], WriteOptions::DO_MIRRORING), "(a(\u{05D0}");
    }

    #[test]
    fn keeps_combining_mark_after_base() {
        let text = "\u{05D0}\u{05B8}\u{05D1}";
        let plain = write(text, &[1, 1, 1], vec![], WriteOptions::empty());
        assert_eq!(plain, "\u{05D1}\u{05B8}\u{05D0}");
        let kept = write(text, &[1, 1, 1], vec![], WriteOptions::KEEP_BASE_COMBINING);
        assert_eq!(kept, "\u{05D1}\u{05D0}\u{05B8}");
    }

    #[test]
    fn output_reverse_is_forward_reversed() {
        let text = "abc\u{05D0}\u{05D1}";
        let levels = [0, 0, 0, 1, 1];
        let forward = write(text, &levels, vec![], WriteOptions::empty());
        let reversed = write(text, &levels, vec![], WriteOptions::OUTPUT_REVERSE);
        assert_eq!(forward, "abc\u{05D1}\u{05D0}");
        assert_eq!(reversed, forward.chars().rev().collect::<String>());
    }

    #[test]
    fn marks_follow_their_slot_when_reversed() {
        let marks = vec![Mark { before: 1, ch: RLM }];
        assert_eq!(write("ab", &[0, 0], marks.clone(), WriteOptions::empty()), "a\u{200F}b");
        assert_eq!(write("ab", &[0, 0], marks, WriteOptions::OUTPUT_REVERSE), "b\u{200F}a");
    }

    #[test]
    fn removes_controls_but_keeps_inserted_marks() {
        let marks = vec![Mark { before: 0, ch: LRM }];
        let out = write("a\u{200E}b\u{202A}", &[0, 0, 0, 0], marks, WriteOptions::REMOVE_BIDI_CONTROLS);
        assert_eq!(out, "\u{200E}ab");
    }

    #[test]
    fn numeric_runs_get_surrounding_marks() {
        // Paragraph level 1: "12" displays first, then " \u{05D0}".
        let text = "\u{05D0} 12";
        let levels = [1, 1, 2, 2];
        let out = write(text, &levels, vec![], WriteOptions::INSERT_LRM_FOR_NUMERIC);
        assert_eq!(out, "12\u{200E}\u{200E} \u{05D0}");

        let chars: Vec<char> = text.chars().collect();
        let layout = Layout::from_levels(&levels);
        let writer = Writer { props: &UnicodeProps, text: &chars, levels: &levels, layout: &layout, runs_only: false };
        assert_eq!(writer.numeric_mark_count(), 2);
    }

    #[test]
    fn write_reverse_handles_marks_and_mirrors() {
        assert_eq!(write_reverse("a(b", WriteOptions::DO_MIRRORING), "b)a");
        assert_eq!(
            write_reverse("\u{05D0}\u{05B8}\u{05D1}", WriteOptions::KEEP_BASE_COMBINING),
            "\u{05D1}\u{05D0}\u{05B8}"
        );
        assert_eq!(write_reverse("a\u{200F}b", WriteOptions::REMOVE_BIDI_CONTROLS), "ba");
    }
}

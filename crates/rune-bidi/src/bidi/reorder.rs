//! Visual reordering of resolved text (rule L2).

use crate::bidi::marks::Mark;
use crate::bidi::runs::{Direction, DirectionalRun, RunSegmenter};

/// Reorder logical runs into visual order.
///
/// From the highest level down to the lowest odd level, every maximal
/// sequence of runs at that level or above is reversed.
pub fn reorder_runs(runs: &[DirectionalRun]) -> Vec<DirectionalRun> {
    let mut visual = runs.to_vec();
    let (Some(highest), Some(lowest)) = (
        runs.iter().map(|r| r.level).max(),
        runs.iter().map(|r| r.level).min(),
    ) else {
        return visual;
    };
    let lowest_odd = lowest | 1;

    for level in (lowest_odd..=highest).rev() {
        let mut i = 0;
        while i < visual.len() {
            if visual[i].level < level {
                i += 1;
                continue;
            }
            let start = i;
            while i < visual.len() && visual[i].level >= level {
                i += 1;
            }
            visual[start..i].reverse();
        }
    }
    visual
}

/// Build a visual-to-logical index map from resolved levels.
///
/// `map[v]` is the logical index displayed at visual position `v`.
pub fn visual_order(levels: &[u8]) -> Vec<usize> {
    expand(&reorder_runs(&RunSegmenter::segment(levels)))
}

/// Logical indices of visually ordered runs, RTL runs reversed.
fn expand(runs: &[DirectionalRun]) -> Vec<usize> {
    let mut order = Vec::with_capacity(runs.iter().map(|r| r.length).sum());
    for run in runs {
        if run.direction.is_rtl() {
            order.extend(run.logical_range().rev());
        } else {
            order.extend(run.logical_range());
        }
    }
    order
}

/// Visual runs of the processed text plus the marks to emit with them.
#[derive(Debug, Clone, Default)]
pub(crate) struct Layout {
    /// Runs in output order.
    pub runs: Vec<DirectionalRun>,
    /// Output position to source index, marks excluded.
    pub order: Vec<usize>,
    /// Marks keyed by the output position they precede, sorted.
    pub marks: Vec<Mark>,
}

impl Layout {
    pub fn from_levels(levels: &[u8]) -> Self {
        let runs = reorder_runs(&RunSegmenter::segment(levels));
        let order = expand(&runs);
        Self { runs, order, marks: Vec::new() }
    }

    /// Composite layout for logical-to-logical reordering.
    ///
    /// `display` maps the source text to its visual form and `relogical`
    /// maps that visual form back to logical order for the opposite
    /// paragraph direction. Runs are spans whose source indices ascend
    /// by one without leaving a source level run; they are never
    /// reversed internally.
    pub fn runs_only(source_levels: &[u8], display: &[usize], relogical: &[usize]) -> Self {
        let order: Vec<usize> = relogical.iter().map(|&v| display[v]).collect();
        let mut runs: Vec<DirectionalRun> = Vec::new();
        for (k, &src) in order.iter().enumerate() {
            let level = source_levels[src];
            match runs.last_mut() {
                Some(run) if order[k - 1] + 1 == src && run.level == level => run.length += 1,
                _ => runs.push(DirectionalRun {
                    direction: Direction::from_level(level),
                    logical_start: src,
                    length: 1,
                    level,
                }),
            }
        }
        Self { runs, order, marks: Vec::new() }
    }

    /// Output position of the first character of each run.
    pub fn run_starts(&self) -> Vec<usize> {
        self.runs
            .iter()
            .scan(0, |pos, run| {
                let start = *pos;
                *pos += run.length;
                Some(start)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visual_order_reverses_rtl_span() {
        // "abc אבג": 0,1,2,3 then 6,5,4
        assert_eq!(visual_order(&[0, 0, 0, 0, 1, 1, 1]), vec![0, 1, 2, 3, 6, 5, 4]);
    }

    #[test]
    fn numbers_inside_rtl_keep_their_order() {
        // R R ws EN EN at paragraph level 1
        assert_eq!(visual_order(&[1, 1, 1, 2, 2]), vec![3, 4, 2, 1, 0]);
    }

    #[test]
    fn higher_levels_reverse_first() {
        assert_eq!(visual_order(&[2, 2, 4, 1]), vec![3, 0, 1, 2]);
    }

    #[test]
    fn reorder_runs_keeps_even_only_text_in_place() {
        let runs = RunSegmenter::segment(&[0, 0, 2, 2, 0]);
        let visual = reorder_runs(&runs);
        assert_eq!(visual, runs);
    }

    #[test]
    fn layout_run_starts_are_cumulative() {
        let layout = Layout::from_levels(&[0, 0, 1, 1, 1, 0]);
        assert_eq!(layout.run_starts(), vec![0, 2, 5]);
        assert_eq!(layout.order, vec![0, 1, 4, 3, 2, 5]);
    }

    #[test]
    fn runs_only_keeps_runs_forward() {
        // Source "ab CD" at level 0, displayed as "ab DC"; flipping to RTL
        // gives logical order "CD ab" when read back.
        let levels = [0, 0, 0, 1, 1];
        let display = [0, 1, 2, 4, 3];
        let relogical = [4, 3, 2, 0, 1];
        let layout = Layout::runs_only(&levels, &display, &relogical);
        assert_eq!(layout.order, vec![3, 4, 2, 0, 1]);
        let runs: Vec<_> = layout.runs.iter().map(|r| (r.logical_start, r.length)).collect();
        assert_eq!(runs, vec![(3, 2), (2, 1), (0, 2)]);
    }
}

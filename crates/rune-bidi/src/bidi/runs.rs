//! Grouping resolved levels into directional runs.

use core::ops::Range;

/// Direction of a run, from its level's parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Ltr,
    Rtl,
}

impl Direction {
    pub fn from_level(level: u8) -> Self {
        if level % 2 == 1 { Direction::Rtl } else { Direction::Ltr }
    }

    pub fn is_rtl(self) -> bool {
        self == Direction::Rtl
    }
}

/// A run of text with a single embedding level.
///
/// In visual order an RTL run is displayed from its last logical
/// character to its first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionalRun {
    pub direction: Direction,
    /// First logical index covered by the run.
    pub logical_start: usize,
    pub length: usize,
    pub level: u8,
}

impl DirectionalRun {
    pub fn logical_range(&self) -> Range<usize> {
        self.logical_start..self.logical_start + self.length
    }
}

/// Splits a level array into maximal runs of equal level.
///
/// Adjacent spans at different levels of the same parity (e.g. a number
/// at level 2 inside Latin text at level 4) stay separate runs, since L2
/// moves them independently.
pub struct RunSegmenter;

impl RunSegmenter {
    pub fn segment(levels: &[u8]) -> Vec<DirectionalRun> {
        let mut runs: Vec<DirectionalRun> = Vec::new();
        for (i, &level) in levels.iter().enumerate() {
            match runs.last_mut() {
                Some(run) if run.level == level => run.length += 1,
                _ => runs.push(DirectionalRun {
                    direction: Direction::from_level(level),
                    logical_start: i,
                    length: 1,
                    level,
                }),
            }
        }
        runs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_levels_have_no_runs() {
        assert!(RunSegmenter::segment(&[]).is_empty());
    }

    #[test]
    fn runs_partition_the_text() {
        let levels = [0, 0, 1, 1, 2, 2, 1, 0];
        let runs = RunSegmenter::segment(&levels);
        assert_eq!(runs.iter().map(|r| r.length).sum::<usize>(), levels.len());
        let mut next = 0;
        for run in &runs {
            assert_eq!(run.logical_start, next);
            next = run.logical_range().end;
        }
        assert_eq!(runs.len(), 5);
    }

    #[test]
    fn direction_follows_level_parity() {
        let runs = RunSegmenter::segment(&[2, 2, 4, 1]);
        let dirs: Vec<_> = runs.iter().map(|r| r.direction).collect();
        assert_eq!(dirs, vec![Direction::Ltr, Direction::Ltr, Direction::Rtl]);
        assert_eq!(runs[1].level, 4);
    }
}

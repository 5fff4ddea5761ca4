//! Paragraph and embedding-level resolution (UAX-9 rules P1-P3,
//! X1-X10 and L1). The per-sequence weak/neutral/implicit rules live
//! in [`crate::bidi::implicit`].

use core::ops::Range;
use core::str::FromStr;

use unicode_bidi::BidiClass::{self, *};

use crate::bidi::implicit::{self, class_for_level, IsolatingRunSequence};
use crate::bidi::options::ReorderingMode;
use crate::error::{BidiError, Result};
use crate::unicode::CharProps;

/// Deepest level reachable through explicit embeddings.
pub const MAX_EXPLICIT_LEVEL: u8 = 125;
/// Deepest level any character can resolve to.
pub const MAX_RESOLVED_LEVEL: u8 = MAX_EXPLICIT_LEVEL + 1;
/// Bit or-ed into an explicit level to force the character's direction.
pub const LEVEL_OVERRIDE: u8 = 0x80;
/// Raw paragraph level: detect, defaulting to LTR.
pub const DEFAULT_LTR: u8 = 0xfe;
/// Raw paragraph level: detect, defaulting to RTL.
pub const DEFAULT_RTL: u8 = 0xff;

/// Paragraph embedding level requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParaLevel {
    /// Use this level (0..=125) for every paragraph.
    Fixed(u8),
    /// Detect from the first strong character, LTR when there is none.
    AutoLtr,
    /// Detect from the first strong character, RTL when there is none.
    AutoRtl,
}

impl ParaLevel {
    pub const LTR: ParaLevel = ParaLevel::Fixed(0);
    pub const RTL: ParaLevel = ParaLevel::Fixed(1);

    /// Decode a raw level, accepting the `DEFAULT_LTR`/`DEFAULT_RTL` sentinels.
    pub fn from_raw(raw: u8) -> Result<Self> {
        match raw {
            DEFAULT_LTR => Ok(ParaLevel::AutoLtr),
            DEFAULT_RTL => Ok(ParaLevel::AutoRtl),
            level @ 0..=MAX_EXPLICIT_LEVEL => Ok(ParaLevel::Fixed(level)),
            other => Err(BidiError::InvalidConfiguration(format!(
                "paragraph level {other} exceeds {MAX_EXPLICIT_LEVEL}"
            ))),
        }
    }

    pub fn to_raw(self) -> u8 {
        match self {
            ParaLevel::Fixed(level) => level,
            ParaLevel::AutoLtr => DEFAULT_LTR,
            ParaLevel::AutoRtl => DEFAULT_RTL,
        }
    }

    pub fn is_auto(self) -> bool {
        !matches!(self, ParaLevel::Fixed(_))
    }

    /// Level used when detection finds no strong character.
    pub fn fallback_level(self) -> u8 {
        match self {
            ParaLevel::Fixed(level) => level,
            ParaLevel::AutoLtr => 0,
            ParaLevel::AutoRtl => 1,
        }
    }

    pub(crate) fn validate(self) -> Result<Self> {
        Self::from_raw(self.to_raw())
    }
}

impl Default for ParaLevel {
    fn default() -> Self {
        ParaLevel::AutoLtr
    }
}

impl FromStr for ParaLevel {
    type Err = BidiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ltr" => Ok(ParaLevel::LTR),
            "rtl" => Ok(ParaLevel::RTL),
            "auto" | "auto-ltr" | "default-ltr" => Ok(ParaLevel::AutoLtr),
            "auto-rtl" | "default-rtl" => Ok(ParaLevel::AutoRtl),
            other => other
                .parse::<u8>()
                .map_err(|_| BidiError::InvalidConfiguration(format!("unknown paragraph level `{s}`")))
                .and_then(ParaLevel::from_raw),
        }
    }
}

/// Paragraph direction classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParagraphDirection {
    Ltr,
    Rtl,
    Mixed,
}

impl ParagraphDirection {
    /// Classify resolved levels; empty text takes the paragraph level's parity.
    pub fn from_levels(levels: &[u8], para_level: u8) -> Self {
        let odd = levels.iter().filter(|&&level| level % 2 == 1).count();
        match (odd, levels.len()) {
            (_, 0) if para_level % 2 == 1 => ParagraphDirection::Rtl,
            (_, 0) => ParagraphDirection::Ltr,
            (0, _) => ParagraphDirection::Ltr,
            (odd, len) if odd == len => ParagraphDirection::Rtl,
            _ => ParagraphDirection::Mixed,
        }
    }
}

/// BiDi information for a single paragraph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    /// Character range, including the trailing separator if any.
    pub range: Range<usize>,
    /// Resolved paragraph embedding level.
    pub level: u8,
    pub direction: ParagraphDirection,
}

/// Output of a resolution pass over the processed prefix of a text.
#[derive(Debug, Clone)]
pub(crate) struct Resolution {
    pub levels: Vec<u8>,
    /// Resolved type per character: L, R, EN or AN, or the original
    /// class for characters removed by X9.
    pub classes: Vec<BidiClass>,
    pub paragraphs: Vec<Paragraph>,
    pub processed_length: usize,
    pub para_level: u8,
}

/// Computes embedding levels for one reordering mode.
pub(crate) struct LevelResolver<'p, P> {
    props: &'p P,
    mode: ReorderingMode,
    order_paragraphs_ltr: bool,
}

impl<'p, P: CharProps> LevelResolver<'p, P> {
    pub fn new(props: &'p P, mode: ReorderingMode, order_paragraphs_ltr: bool) -> Self {
        Self { props, mode, order_paragraphs_ltr }
    }

    pub fn resolve(
        &self,
        text: &[char],
        para: ParaLevel,
        explicit: Option<&[u8]>,
        streaming: bool,
    ) -> Result<Resolution> {
        let para = para.validate()?;
        if let Some(explicit) = explicit {
            check_explicit_levels(explicit, text.len())?;
        }

        let initial: Vec<BidiClass> = text.iter().map(|&ch| self.props.bidi_class(ch)).collect();
        let bounds = paragraph_bounds(text, &initial);
        let processed_length = if streaming {
            streaming_limit(text, &initial, &bounds)
        } else {
            text.len()
        };
        if processed_length < text.len() {
            tracing::trace!(
                length = text.len(),
                processed_length,
                "streaming stopped at last paragraph boundary"
            );
        }

        let mut levels = vec![0u8; processed_length];
        let mut classes = initial[..processed_length].to_vec();
        let mut paragraphs = Vec::with_capacity(bounds.len());
        for range in bounds.into_iter().filter(|range| range.end <= processed_length) {
            let level = self.resolve_paragraph(
                &text[range.clone()],
                &initial[range.clone()],
                explicit.map(|levels| &levels[range.clone()]),
                para,
                &mut levels[range.clone()],
                &mut classes[range.clone()],
            )?;
            let direction = ParagraphDirection::from_levels(&levels[range.clone()], level);
            paragraphs.push(Paragraph { range, level, direction });
        }

        let para_level = paragraphs.first().map_or(para.fallback_level(), |p| p.level);
        Ok(Resolution { levels, classes, paragraphs, processed_length, para_level })
    }

    fn resolve_paragraph(
        &self,
        text: &[char],
        initial: &[BidiClass],
        explicit: Option<&[u8]>,
        para: ParaLevel,
        levels: &mut [u8],
        classes: &mut [BidiClass],
    ) -> Result<u8> {
        let isolates = IsolatePairs::new(initial);
        let para_level = match para {
            ParaLevel::Fixed(level) => level,
            _ => self.detect_level(initial, &isolates).unwrap_or(para.fallback_level()),
        };

        let linked = match explicit {
            Some(explicit) => {
                apply_explicit_levels(initial, explicit, para_level, levels, classes)?;
                None
            }
            None => {
                apply_embeddings(initial, &isolates, para_level, levels, classes);
                Some(&isolates)
            }
        };

        let policy = self.mode.number_policy();
        for seq in self.run_sequences(initial, levels, para_level, linked) {
            implicit::resolve_sequence(self.props, text, initial, classes, levels, &seq, policy);
            if seq.reversed {
                raise_numbers_after_latin(classes, levels, &seq);
            }
        }

        for i in 0..initial.len() {
            if removed_by_x9(initial[i]) {
                levels[i] = if i == 0 { para_level } else { levels[i - 1] };
            }
        }

        self.reset_whitespace(initial, para_level, levels);
        Ok(para_level)
    }

    // P2, P3
    fn detect_level(&self, initial: &[BidiClass], isolates: &IsolatePairs) -> Option<u8> {
        let first = first_strong_level(initial, 0..initial.len(), isolates);
        if !self.mode.reads_rtl_from_visual_end() {
            return first;
        }
        // Visual input: RTL if either edge of the text is RTL.
        match (first, last_strong_level(initial, isolates)) {
            (Some(1), _) | (_, Some(1)) => Some(1),
            (None, None) => None,
            _ => Some(0),
        }
    }

    // X10 (BD13)
    fn run_sequences(
        &self,
        initial: &[BidiClass],
        levels: &[u8],
        para_level: u8,
        isolates: Option<&IsolatePairs>,
    ) -> Vec<IsolatingRunSequence> {
        let n = initial.len();
        let mut runs: Vec<Vec<usize>> = Vec::new();
        for i in (0..n).filter(|&i| !removed_by_x9(initial[i])) {
            match runs.last_mut() {
                Some(run) if levels[run[0]] == levels[i] => run.push(i),
                _ => runs.push(vec![i]),
            }
        }

        let mut run_starting_at = vec![None; n];
        for (r, run) in runs.iter().enumerate() {
            run_starting_at[run[0]] = Some(r);
        }
        let continuation_of = |run: &[usize]| -> Option<usize> {
            let last = *run.last()?;
            isolates?.closing(last).and_then(|pdi| run_starting_at[pdi])
        };
        let mut is_continuation = vec![false; runs.len()];
        for run in &runs {
            if let Some(next) = continuation_of(run) {
                is_continuation[next] = true;
            }
        }

        let mut sequences = Vec::new();
        for (r, run) in runs.iter().enumerate() {
            if is_continuation[r] {
                continue;
            }
            let mut indices = run.clone();
            let mut current = r;
            while let Some(next) = continuation_of(&runs[current]) {
                indices.extend_from_slice(&runs[next]);
                current = next;
            }
            sequences.push(self.bound_sequence(indices, initial, levels, para_level));
        }
        sequences
    }

    fn bound_sequence(
        &self,
        mut indices: Vec<usize>,
        initial: &[BidiClass],
        levels: &[u8],
        para_level: u8,
    ) -> IsolatingRunSequence {
        let first = indices[0];
        let last = indices[indices.len() - 1];
        let level = levels[first];

        let kept = |j: &usize| !removed_by_x9(initial[*j]);
        let before = (0..first).rev().find(kept).map_or(para_level, |j| levels[j]);
        let after = if matches!(initial[last], LRI | RLI | FSI) {
            para_level
        } else {
            (last + 1..initial.len()).find(kept).map_or(para_level, |j| levels[j])
        };
        let mut sos = class_for_level(level.max(before));
        let mut eos = class_for_level(level.max(after));

        let reversed = self.mode.reads_rtl_from_visual_end() && level % 2 == 1;
        if reversed {
            indices.reverse();
            core::mem::swap(&mut sos, &mut eos);
        }
        IsolatingRunSequence { indices, level, sos, eos, reversed }
    }

    // L1
    fn reset_whitespace(&self, initial: &[BidiClass], para_level: u8, levels: &mut [u8]) {
        let separator_level = if self.order_paragraphs_ltr { 0 } else { para_level };
        let n = initial.len();
        let reading_order: Vec<usize> =
            if self.mode.reads_rtl_from_visual_end() && para_level % 2 == 1 {
                (0..n).rev().collect()
            } else {
                (0..n).collect()
            };

        let mut trailing = Vec::new();
        for i in reading_order {
            match initial[i] {
                S | B => {
                    for j in trailing.drain(..) {
                        levels[j] = para_level;
                    }
                    levels[i] = if initial[i] == B { separator_level } else { para_level };
                }
                WS | LRI | RLI | FSI | PDI => trailing.push(i),
                class if removed_by_x9(class) => trailing.push(i),
                _ => trailing.clear(),
            }
        }
        for j in trailing {
            levels[j] = para_level;
        }
    }
}

/// Matching PDI for each isolate initiator (BD9).
struct IsolatePairs {
    closing: Vec<Option<usize>>,
}

impl IsolatePairs {
    fn new(initial: &[BidiClass]) -> Self {
        let mut closing = vec![None; initial.len()];
        let mut open = Vec::new();
        for (i, &class) in initial.iter().enumerate() {
            match class {
                LRI | RLI | FSI => open.push(i),
                PDI => {
                    if let Some(initiator) = open.pop() {
                        closing[initiator] = Some(i);
                    }
                }
                _ => {}
            }
        }
        Self { closing }
    }

    fn closing(&self, initiator: usize) -> Option<usize> {
        self.closing.get(initiator).copied().flatten()
    }
}

#[derive(Debug, Clone, Copy)]
struct EmbeddingStatus {
    level: u8,
    override_class: Option<BidiClass>,
    isolate: bool,
}

fn next_level(level: u8, rtl: bool) -> u8 {
    if rtl { (level + 1) | 1 } else { (level + 2) & !1 }
}

/// X1-X8: explicit embeddings, overrides and isolates.
fn apply_embeddings(
    initial: &[BidiClass],
    isolates: &IsolatePairs,
    para_level: u8,
    levels: &mut [u8],
    classes: &mut [BidiClass],
) {
    let base = EmbeddingStatus { level: para_level, override_class: None, isolate: false };
    let mut stack: Vec<EmbeddingStatus> = vec![base];
    let mut overflow_isolates = 0usize;
    let mut overflow_embeddings = 0usize;
    let mut valid_isolates = 0usize;

    for i in 0..initial.len() {
        let top = stack.last().copied().unwrap_or(base);
        match initial[i] {
            RLE | LRE | RLO | LRO => {
                levels[i] = top.level;
                let level = next_level(top.level, matches!(initial[i], RLE | RLO));
                if level <= MAX_EXPLICIT_LEVEL && overflow_isolates == 0 && overflow_embeddings == 0 {
                    let override_class = match initial[i] {
                        RLO => Some(R),
                        LRO => Some(L),
                        _ => None,
                    };
                    stack.push(EmbeddingStatus { level, override_class, isolate: false });
                } else if overflow_isolates == 0 {
                    overflow_embeddings += 1;
                }
            }
            RLI | LRI | FSI => {
                levels[i] = top.level;
                if let Some(class) = top.override_class {
                    classes[i] = class;
                }
                let rtl = match initial[i] {
                    RLI => true,
                    LRI => false,
                    _ => {
                        let end = isolates.closing(i).unwrap_or(initial.len());
                        first_strong_level(initial, i + 1..end, isolates) == Some(1)
                    }
                };
                let level = next_level(top.level, rtl);
                if level <= MAX_EXPLICIT_LEVEL && overflow_isolates == 0 && overflow_embeddings == 0 {
                    valid_isolates += 1;
                    stack.push(EmbeddingStatus { level, override_class: None, isolate: true });
                } else {
                    overflow_isolates += 1;
                }
            }
            PDI => {
                if overflow_isolates > 0 {
                    overflow_isolates -= 1;
                } else if valid_isolates > 0 {
                    overflow_embeddings = 0;
                    while stack.last().is_some_and(|status| !status.isolate) {
                        stack.pop();
                    }
                    stack.pop();
                    valid_isolates -= 1;
                }
                let top = stack.last().copied().unwrap_or(base);
                levels[i] = top.level;
                if let Some(class) = top.override_class {
                    classes[i] = class;
                }
            }
            PDF => {
                levels[i] = top.level;
                if overflow_isolates == 0 {
                    if overflow_embeddings > 0 {
                        overflow_embeddings -= 1;
                    } else if !top.isolate && stack.len() >= 2 {
                        stack.pop();
                    }
                }
            }
            B => levels[i] = para_level,
            BN => levels[i] = top.level,
            _ => {
                levels[i] = top.level;
                if let Some(class) = top.override_class {
                    classes[i] = class;
                }
            }
        }
    }
}

fn check_explicit_levels(explicit: &[u8], len: usize) -> Result<()> {
    if explicit.len() != len {
        return Err(BidiError::InvalidInput(format!(
            "{} explicit levels supplied for {len} characters",
            explicit.len()
        )));
    }
    if let Some((i, raw)) = explicit
        .iter()
        .enumerate()
        .find(|&(_, &raw)| raw & !LEVEL_OVERRIDE > MAX_EXPLICIT_LEVEL)
    {
        return Err(BidiError::InvalidInput(format!(
            "explicit level {} at index {i} exceeds {MAX_EXPLICIT_LEVEL}",
            raw & !LEVEL_OVERRIDE
        )));
    }
    Ok(())
}

/// Seeds levels from caller-supplied values instead of X1-X8.
fn apply_explicit_levels(
    initial: &[BidiClass],
    explicit: &[u8],
    para_level: u8,
    levels: &mut [u8],
    classes: &mut [BidiClass],
) -> Result<()> {
    for (i, &raw) in explicit.iter().enumerate() {
        if initial[i] == B {
            levels[i] = para_level;
            continue;
        }
        let level = raw & !LEVEL_OVERRIDE;
        if level < para_level {
            return Err(BidiError::InvalidInput(format!(
                "explicit level {level} is below the paragraph level {para_level}"
            )));
        }
        levels[i] = level;
        if raw & LEVEL_OVERRIDE != 0 && !removed_by_x9(initial[i]) {
            classes[i] = class_for_level(level);
        }
    }
    Ok(())
}

pub(crate) fn removed_by_x9(class: BidiClass) -> bool {
    matches!(class, RLE | LRE | RLO | LRO | PDF | BN)
}

fn first_strong_level(initial: &[BidiClass], range: Range<usize>, isolates: &IsolatePairs) -> Option<u8> {
    let mut i = range.start;
    while i < range.end {
        match initial[i] {
            L => return Some(0),
            R | AL => return Some(1),
            LRI | RLI | FSI => i = isolates.closing(i)?,
            _ => {}
        }
        i += 1;
    }
    None
}

fn last_strong_level(initial: &[BidiClass], isolates: &IsolatePairs) -> Option<u8> {
    let mut found = None;
    let mut i = 0;
    while i < initial.len() {
        match initial[i] {
            L => found = Some(0),
            R | AL => found = Some(1),
            LRI | RLI | FSI => match isolates.closing(i) {
                Some(pdi) => i = pdi,
                None => break,
            },
            _ => {}
        }
        i += 1;
    }
    found
}

/// Keeps a number that sits at the visual right of L text in a reversed
/// sequence as its own run two levels above the L text, so it stays
/// attached to that text when the result is displayed again.
fn raise_numbers_after_latin(classes: &[BidiClass], levels: &mut [u8], seq: &IsolatingRunSequence) {
    let raised = seq.level + 3;
    if raised > MAX_RESOLVED_LEVEL {
        return;
    }
    let mut after_latin = false;
    for &i in seq.indices.iter().rev() {
        match classes[i] {
            L => after_latin = true,
            EN | AN => {
                if after_latin {
                    levels[i] = raised;
                }
            }
            _ => after_latin = false,
        }
    }
}

/// Splits text after each paragraph separator (P1). CR LF is one separator.
fn paragraph_bounds(text: &[char], initial: &[BidiClass]) -> Vec<Range<usize>> {
    let mut bounds = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < text.len() {
        if initial[i] != B {
            i += 1;
            continue;
        }
        let end = if text[i] == '\r' && text.get(i + 1) == Some(&'\n') { i + 2 } else { i + 1 };
        bounds.push(start..end);
        start = end;
        i = end;
    }
    if start < text.len() {
        bounds.push(start..text.len());
    }
    bounds
}

/// End of the last paragraph whose separator is known to be complete.
/// A CR at the very end may still be followed by LF in the next chunk.
fn streaming_limit(text: &[char], initial: &[BidiClass], bounds: &[Range<usize>]) -> usize {
    bounds
        .iter()
        .rev()
        .map(|range| range.end)
        .find(|&end| initial[end - 1] == B && !(end == text.len() && text[end - 1] == '\r'))
        .unwrap_or(0)
}

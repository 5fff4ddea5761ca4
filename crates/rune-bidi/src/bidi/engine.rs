//! Paragraph-level facade tying resolution, reordering and writing
//! together.
//!
//! A [`ParagraphEngine`] owns its configuration and the last submitted
//! text. Levels are resolved when text is submitted; the visual layout
//! and rendered output are computed on demand and cached until the text
//! or configuration changes.

use core::cell::RefCell;

use once_cell::unsync::OnceCell;
use rune_config::BidiConfig;
use unicode_bidi::BidiClass;

use crate::bidi::levels::{LevelResolver, ParaLevel, Paragraph, ParagraphDirection, Resolution};
use crate::bidi::marks::MarkPlanner;
use crate::bidi::options::{ModeSelection, ReorderingMode, ReorderingOptions, WriteOptions};
use crate::bidi::reorder::{visual_order, Layout};
use crate::bidi::runs::{Direction, DirectionalRun, RunSegmenter};
use crate::bidi::writer::Writer;
use crate::error::{BidiError, Result};
use crate::unicode::{is_bidi_control, CharProps, UnicodeProps};

/// Text submitted through [`ParagraphEngine::set_para`].
#[derive(Debug, Clone)]
struct Input {
    text: Vec<char>,
    para: ParaLevel,
    explicit: Option<Vec<u8>>,
}

/// Levels of the submitted text and the layout used to write it.
#[derive(Debug)]
struct Resolved {
    resolution: Resolution,
    layout: Layout,
    /// Layout comes from a logical-to-logical pass.
    runs_only: bool,
}

/// Bidi engine for one paragraph (or a sequence of paragraphs).
///
/// ```
/// use rune_bidi::{ParaLevel, ParagraphEngine, WriteOptions};
///
/// let mut engine = ParagraphEngine::new();
/// engine.set_para("abc \u{05D0}\u{05D1}\u{05D2}", ParaLevel::LTR, None)?;
/// assert_eq!(engine.count_runs()?, 2);
/// assert_eq!(engine.get_reordered(WriteOptions::empty())?, "abc \u{05D2}\u{05D1}\u{05D0}");
/// # Ok::<(), rune_bidi::BidiError>(())
/// ```
pub struct ParagraphEngine<P: CharProps = UnicodeProps> {
    props: P,
    selection: ModeSelection,
    options: ReorderingOptions,
    order_paragraphs_ltr: bool,
    default_para: ParaLevel,
    write_options: WriteOptions,
    input: Option<Input>,
    resolved: OnceCell<Resolved>,
    output: RefCell<Option<(WriteOptions, String)>>,
}

impl ParagraphEngine<UnicodeProps> {
    pub fn new() -> Self {
        Self::with_props(UnicodeProps)
    }

    /// Build an engine from configuration defaults.
    ///
    /// Unknown mode or option names and out-of-range levels fail with
    /// [`BidiError::InvalidConfiguration`].
    pub fn from_config(config: &BidiConfig) -> Result<Self> {
        let mut engine = Self::new();
        engine.default_para = config.paragraph_level.parse()?;
        engine.selection = if config.inverse {
            ModeSelection::LegacyInverse(true)
        } else {
            ModeSelection::Mode(config.reordering_mode.parse()?)
        };
        engine.options = ReorderingOptions::parse_names(&config.reordering_options)?;
        engine.write_options = WriteOptions::parse_names(&config.write_options)?;
        engine.order_paragraphs_ltr = config.order_paragraphs_ltr;
        tracing::debug!(
            mode = %engine.reordering_mode(),
            options = ?engine.options,
            write_options = ?engine.write_options,
            "bidi engine configured"
        );
        Ok(engine)
    }
}

impl Default for ParagraphEngine<UnicodeProps> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: CharProps> ParagraphEngine<P> {
    /// Engine backed by a custom character property oracle.
    pub fn with_props(props: P) -> Self {
        Self {
            props,
            selection: ModeSelection::default(),
            options: ReorderingOptions::empty(),
            order_paragraphs_ltr: false,
            default_para: ParaLevel::default(),
            write_options: WriteOptions::empty(),
            input: None,
            resolved: OnceCell::new(),
            output: RefCell::new(None),
        }
    }

    // Configuration

    pub fn reordering_mode(&self) -> ReorderingMode {
        self.selection.effective_mode()
    }

    pub fn set_reordering_mode(&mut self, mode: ReorderingMode) {
        self.selection = ModeSelection::Mode(mode);
        self.invalidate();
    }

    /// Legacy switch: `true` selects [`ReorderingMode::InverseNumbersAsL`],
    /// `false` selects [`ReorderingMode::Default`].
    pub fn set_inverse(&mut self, inverse: bool) {
        self.selection = ModeSelection::LegacyInverse(inverse);
        self.invalidate();
    }

    /// True exactly when the effective mode is `InverseNumbersAsL`.
    pub fn is_inverse(&self) -> bool {
        self.selection.is_inverse()
    }

    pub fn mode_selection(&self) -> ModeSelection {
        self.selection
    }

    pub fn reordering_options(&self) -> ReorderingOptions {
        self.options
    }

    pub fn set_reordering_options(&mut self, options: ReorderingOptions) {
        self.options = options;
        self.invalidate();
    }

    pub fn order_paragraphs_ltr(&self) -> bool {
        self.order_paragraphs_ltr
    }

    pub fn set_order_paragraphs_ltr(&mut self, ltr: bool) {
        self.order_paragraphs_ltr = ltr;
        self.invalidate();
    }

    /// Paragraph level used by [`ParagraphEngine::set_text`].
    pub fn default_para_level(&self) -> ParaLevel {
        self.default_para
    }

    pub fn set_default_para_level(&mut self, para: ParaLevel) -> Result<()> {
        self.default_para = para.validate()?;
        Ok(())
    }

    /// Write options used by [`ParagraphEngine::reordered`].
    pub fn write_options(&self) -> WriteOptions {
        self.write_options
    }

    pub fn set_write_options(&mut self, options: WriteOptions) {
        self.write_options = options;
    }

    // Input

    /// Submit text and resolve its embedding levels.
    ///
    /// `explicit` seeds the levels of every character (0..=125, optionally
    /// or-ed with [`crate::bidi::levels::LEVEL_OVERRIDE`]) instead of
    /// running the explicit embedding rules. On error the engine is left
    /// without text.
    pub fn set_para(&mut self, text: &str, para: ParaLevel, explicit: Option<&[u8]>) -> Result<()> {
        let para = para.validate()?;
        self.input = Some(Input {
            text: text.chars().collect(),
            para,
            explicit: explicit.map(<[u8]>::to_vec),
        });
        self.invalidate();

        let resolved = self.resolved().map(|resolved| {
            tracing::debug!(
                para_level = resolved.resolution.para_level,
                length = resolved.resolution.levels.len(),
                processed_length = resolved.resolution.processed_length,
                paragraphs = resolved.resolution.paragraphs.len(),
                mode = %self.reordering_mode(),
                "paragraph resolved"
            );
        });
        if let Err(err) = resolved {
            self.input = None;
            self.invalidate();
            return Err(err);
        }
        Ok(())
    }

    /// [`ParagraphEngine::set_para`] with the default paragraph level.
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        self.set_para(text, self.default_para, None)
    }

    // Queries

    /// Resolved level of the first paragraph.
    pub fn para_level(&self) -> Result<u8> {
        Ok(self.resolved()?.resolution.para_level)
    }

    /// Number of characters submitted.
    pub fn length(&self) -> Result<usize> {
        Ok(self.input()?.text.len())
    }

    /// Number of characters resolved. Smaller than [`Self::length`] only
    /// in streaming mode.
    pub fn processed_length(&self) -> Result<usize> {
        Ok(self.resolved()?.resolution.processed_length)
    }

    /// Length of the reordered text, counting inserted marks and
    /// excluding controls removed by `REMOVE_CONTROLS`.
    pub fn result_length(&self) -> Result<usize> {
        let resolved = self.resolved()?;
        let processed = resolved.resolution.processed_length;
        if self.options.contains(ReorderingOptions::REMOVE_CONTROLS) {
            let text = &self.input()?.text[..processed];
            return Ok(processed - text.iter().filter(|&&ch| is_bidi_control(ch)).count());
        }
        let numeric = if self
            .effective_write_options(WriteOptions::empty())
            .contains(WriteOptions::INSERT_LRM_FOR_NUMERIC)
        {
            self.writer(resolved)?.numeric_mark_count()
        } else {
            0
        };
        Ok(processed + resolved.layout.marks.len() + numeric)
    }

    pub fn count_runs(&self) -> Result<usize> {
        Ok(self.resolved()?.layout.runs.len())
    }

    /// Run `index` in visual order.
    pub fn visual_run(&self, index: usize) -> Result<DirectionalRun> {
        let runs = &self.resolved()?.layout.runs;
        runs.get(index).copied().ok_or_else(|| {
            BidiError::InvalidInput(format!("run index {index} out of range (runs: {})", runs.len()))
        })
    }

    pub fn visual_runs(&self) -> Result<Vec<DirectionalRun>> {
        Ok(self.resolved()?.layout.runs.clone())
    }

    /// Runs of equal level in logical order.
    pub fn logical_runs(&self) -> Result<Vec<DirectionalRun>> {
        Ok(RunSegmenter::segment(&self.resolved()?.resolution.levels))
    }

    /// `map[v]` is the logical index written at visual position `v`.
    pub fn logical_map(&self) -> Result<Vec<usize>> {
        Ok(self.resolved()?.layout.order.clone())
    }

    pub fn visual_index(&self, logical: usize) -> Result<usize> {
        let layout = &self.resolved()?.layout;
        layout
            .order
            .iter()
            .position(|&src| src == logical)
            .ok_or_else(|| out_of_range("logical", logical, layout.order.len()))
    }

    pub fn logical_index(&self, visual: usize) -> Result<usize> {
        let order = &self.resolved()?.layout.order;
        order.get(visual).copied().ok_or_else(|| out_of_range("visual", visual, order.len()))
    }

    pub fn levels(&self) -> Result<&[u8]> {
        Ok(&self.resolved()?.resolution.levels)
    }

    pub fn level_at(&self, index: usize) -> Result<u8> {
        let levels = self.levels()?;
        levels.get(index).copied().ok_or_else(|| out_of_range("character", index, levels.len()))
    }

    pub fn direction(&self) -> Result<ParagraphDirection> {
        let resolution = &self.resolved()?.resolution;
        Ok(ParagraphDirection::from_levels(&resolution.levels, resolution.para_level))
    }

    pub fn count_paragraphs(&self) -> Result<usize> {
        Ok(self.resolved()?.resolution.paragraphs.len())
    }

    pub fn paragraph(&self, index: usize) -> Result<&Paragraph> {
        let paragraphs = &self.resolved()?.resolution.paragraphs;
        paragraphs.get(index).ok_or_else(|| out_of_range("paragraph", index, paragraphs.len()))
    }

    // Output

    /// Reordered text using the engine's write options.
    pub fn reordered(&self) -> Result<String> {
        self.get_reordered(self.write_options)
    }

    pub fn get_reordered(&self, options: WriteOptions) -> Result<String> {
        let options = self.effective_write_options(options);
        if let Some((cached, text)) = self.output.borrow().as_ref() {
            if *cached == options {
                return Ok(text.clone());
            }
        }
        let text: String = self.render(options)?.into_iter().collect();
        *self.output.borrow_mut() = Some((options, text.clone()));
        Ok(text)
    }

    /// Write the reordered text into `dest`, returning the number of
    /// characters written.
    ///
    /// `dest` must hold `processed_length + 2 * count_runs` characters
    /// (or the exact output, if longer); nothing is written otherwise.
    pub fn write_reordered(&self, options: WriteOptions, dest: &mut [char]) -> Result<usize> {
        let resolved = self.resolved()?;
        let out = self.render(self.effective_write_options(options))?;
        let needed = (resolved.resolution.processed_length + 2 * resolved.layout.runs.len()).max(out.len());
        if dest.len() < needed {
            return Err(BidiError::BufferTooSmall { needed, capacity: dest.len() });
        }
        dest[..out.len()].copy_from_slice(&out);
        Ok(out.len())
    }

    // Internals

    fn input(&self) -> Result<&Input> {
        self.input.as_ref().ok_or(BidiError::NotConfigured)
    }

    fn resolved(&self) -> Result<&Resolved> {
        let input = self.input()?;
        self.resolved.get_or_try_init(|| self.build(input))
    }

    fn invalidate(&mut self) {
        self.resolved = OnceCell::new();
        self.output.get_mut().take();
    }

    /// Write options after applying the reordering options' overrides.
    fn effective_write_options(&self, mut options: WriteOptions) -> WriteOptions {
        if self.options.contains(ReorderingOptions::REMOVE_CONTROLS) {
            options.insert(WriteOptions::REMOVE_BIDI_CONTROLS);
            options.remove(WriteOptions::INSERT_LRM_FOR_NUMERIC);
        } else if self.options.contains(ReorderingOptions::INSERT_MARKS) {
            options.remove(WriteOptions::REMOVE_BIDI_CONTROLS);
            if self.reordering_mode() == ReorderingMode::InverseNumbersAsL {
                options.insert(WriteOptions::INSERT_LRM_FOR_NUMERIC);
            }
        }
        options
    }

    fn wants_marks(&self) -> bool {
        self.options.contains(ReorderingOptions::INSERT_MARKS)
            && !self.options.contains(ReorderingOptions::REMOVE_CONTROLS)
    }

    fn build(&self, input: &Input) -> Result<Resolved> {
        let mode = self.reordering_mode();
        if mode == ReorderingMode::RunsOnly {
            return self.build_runs_only(input);
        }

        let resolution = LevelResolver::new(&self.props, mode, self.order_paragraphs_ltr).resolve(
            &input.text,
            input.para,
            input.explicit.as_deref(),
            self.options.contains(ReorderingOptions::STREAMING),
        )?;
        let mut layout = Layout::from_levels(&resolution.levels);

        if let Some(direct_mode) = mode.direct_counterpart().filter(|_| self.wants_marks()) {
            let planner = MarkPlanner {
                props: &self.props,
                source: &input.text[..resolution.processed_length],
                classes: &resolution.classes,
                levels: &resolution.levels,
                direct_mode,
                para: ParaLevel::Fixed(resolution.para_level),
            };
            let lead_rlm = input.para.is_auto() && resolution.para_level % 2 == 1;
            layout.marks = planner.plan(&layout.order, lead_rlm, 2 * layout.runs.len())?.marks;
        }
        Ok(Resolved { resolution, layout, runs_only: false })
    }

    /// Display the text with the default algorithm, then read the
    /// display back as logical text of the opposite paragraph direction.
    fn build_runs_only(&self, input: &Input) -> Result<Resolved> {
        let resolution = LevelResolver::new(&self.props, ReorderingMode::Default, self.order_paragraphs_ltr)
            .resolve(
                &input.text,
                input.para,
                input.explicit.as_deref(),
                self.options.contains(ReorderingOptions::STREAMING),
            )?;
        let display = visual_order(&resolution.levels);
        let visual: Vec<char> = display.iter().map(|&i| input.text[i]).collect();

        let flipped = ParaLevel::Fixed(resolution.para_level ^ 1);
        let inner = LevelResolver::new(&self.props, ReorderingMode::InverseLikeDirect, self.order_paragraphs_ltr)
            .resolve(&visual, flipped, None, false)?;
        let relogical = Layout::from_levels(&inner.levels).order;
        let mut layout = Layout::runs_only(&resolution.levels, &display, &relogical);

        if self.wants_marks() {
            let planner = MarkPlanner {
                props: &self.props,
                source: &visual,
                classes: &inner.classes,
                levels: &inner.levels,
                direct_mode: ReorderingMode::Default,
                para: flipped,
            };
            layout.marks = planner.plan(&relogical, false, 2 * layout.runs.len())?.marks;
        }
        Ok(Resolved { resolution, layout, runs_only: true })
    }

    fn writer<'a>(&'a self, resolved: &'a Resolved) -> Result<Writer<'a, P>> {
        let input = self.input()?;
        Ok(Writer {
            props: &self.props,
            text: &input.text[..resolved.resolution.processed_length],
            levels: &resolved.resolution.levels,
            layout: &resolved.layout,
            runs_only: resolved.runs_only,
        })
    }

    fn render(&self, options: WriteOptions) -> Result<Vec<char>> {
        let resolved = self.resolved()?;
        Ok(self.writer(resolved)?.write(options))
    }
}

fn out_of_range(what: &str, index: usize, len: usize) -> BidiError {
    BidiError::InvalidInput(format!("{what} index {index} out of range (len: {len})"))
}

/// Direction of the first strong character of `text`, if any.
pub fn base_direction(text: &str) -> Option<Direction> {
    let props = UnicodeProps;
    text.chars().find_map(|ch| match props.bidi_class(ch) {
        BidiClass::L => Some(Direction::Ltr),
        BidiClass::R | BidiClass::AL => Some(Direction::Rtl),
        _ => None,
    })
}

use anyhow::Result;
use rune_bidi::{
    BidiError, Direction, ParaLevel, ParagraphEngine, ReorderingMode, ReorderingOptions, WriteOptions,
};

const VISUAL_ARABIC: &str =
    "Latin1 \u{060C}(\u{0643} 567 \u{062A}\u{0643}\u{0631}\u{0634}> More latin 123 \u{0643}\u{062A}";

#[test]
fn inverse_like_direct_recovers_logical_arabic_line() -> Result<()> {
    let mut engine = ParagraphEngine::new();
    engine.set_inverse(true);
    engine.set_reordering_mode(ReorderingMode::InverseLikeDirect);
    assert!(!engine.is_inverse(), "explicit mode selection replaces the legacy flag");
    engine.set_reordering_options(ReorderingOptions::INSERT_MARKS);
    engine.set_para(VISUAL_ARABIC, ParaLevel::RTL, None)?;

    assert_eq!(engine.length()?, 38);
    assert_eq!(engine.processed_length()?, 38);
    assert_eq!(engine.result_length()?, 38);
    assert_eq!(engine.para_level()?, 1);

    let runs: Vec<(u8, usize, usize)> = engine
        .visual_runs()?
        .iter()
        .map(|run| (u8::from(run.direction.is_rtl()), run.logical_start, run.length))
        .collect();
    assert_eq!(
        runs,
        vec![(1, 35, 3), (0, 32, 3), (1, 31, 1), (0, 21, 10), (1, 14, 7), (0, 11, 3), (1, 6, 5), (0, 0, 5), (0, 5, 1)]
    );
    assert_eq!(runs.iter().map(|r| r.2).sum::<usize>(), 38);

    let out = engine.get_reordered(WriteOptions::DO_MIRRORING | WriteOptions::KEEP_BASE_COMBINING)?;
    assert_eq!(
        out,
        "\u{062A}\u{0643} 123 More latin <\u{0634}\u{0631}\u{0643}\u{062A} 567 \u{0643})\u{060C} Latin1"
    );
    Ok(())
}

#[test]
fn pure_ltr_ascii_is_unchanged() -> Result<()> {
    let mut engine = ParagraphEngine::new();
    engine.set_para("Hello World", ParaLevel::AutoLtr, None)?;

    assert_eq!(engine.count_runs()?, 1);
    let run = engine.visual_run(0)?;
    assert_eq!((run.direction, run.logical_start, run.length), (Direction::Ltr, 0, 11));
    assert_eq!(engine.processed_length()?, 11);
    assert_eq!(engine.result_length()?, 11);
    assert_eq!(engine.get_reordered(WriteOptions::empty())?, "Hello World");
    Ok(())
}

#[test]
fn empty_input_has_no_runs() -> Result<()> {
    let mut engine = ParagraphEngine::new();
    for para in [ParaLevel::AutoLtr, ParaLevel::RTL] {
        engine.set_para("", para, None)?;
        assert_eq!(engine.count_runs()?, 0);
        assert_eq!(engine.get_reordered(WriteOptions::OUTPUT_REVERSE)?, "");
        assert!(engine.logical_map()?.is_empty());
    }
    Ok(())
}

#[test]
fn streaming_stops_at_last_separator_and_resumes() -> Result<()> {
    let text = "first \u{05D0}\u{05D1} line\nsecond \u{05D2} line";
    let separator = text.chars().position(|c| c == '\n').unwrap_or_default();

    let mut engine = ParagraphEngine::new();
    engine.set_reordering_options(ReorderingOptions::STREAMING);
    engine.set_para(text, ParaLevel::LTR, None)?;
    let processed = engine.processed_length()?;
    assert_eq!(processed, separator + 1);
    assert_eq!(engine.length()?, text.chars().count());
    assert_eq!(engine.count_paragraphs()?, 1);

    let remainder: String = text.chars().skip(processed).collect();
    engine.set_reordering_options(ReorderingOptions::empty());
    engine.set_para(&remainder, ParaLevel::LTR, None)?;
    assert_eq!(engine.processed_length()?, remainder.chars().count());
    assert_eq!(engine.get_reordered(WriteOptions::empty())?, "second \u{05D2} line");
    Ok(())
}

#[test]
fn runs_only_flips_paragraph_direction_without_reversing_runs() -> Result<()> {
    let mut engine = ParagraphEngine::new();
    engine.set_reordering_mode(ReorderingMode::RunsOnly);
    engine.set_para("abc \u{05D0}\u{05D1}\u{05D2}", ParaLevel::LTR, None)?;

    let runs: Vec<(usize, usize)> = engine.visual_runs()?.iter().map(|r| (r.logical_start, r.length)).collect();
    assert_eq!(runs, vec![(4, 3), (3, 1), (0, 3)]);
    assert_eq!(engine.get_reordered(WriteOptions::DO_MIRRORING)?, "\u{05D0}\u{05D1}\u{05D2} abc");
    assert_eq!(engine.levels()?, &[0, 0, 0, 0, 1, 1, 1]);
    Ok(())
}

#[test]
fn paragraphs_are_resolved_independently() -> Result<()> {
    let mut engine = ParagraphEngine::new();
    engine.set_para("\u{05D0}\u{05D1}\r\nabc", ParaLevel::AutoLtr, None)?;
    assert_eq!(engine.count_paragraphs()?, 2);
    assert_eq!(engine.paragraph(0)?.range, 0..4);
    assert_eq!(engine.paragraph(0)?.level, 1);
    assert_eq!(engine.paragraph(1)?.range, 4..7);
    assert_eq!(engine.paragraph(1)?.level, 0);
    assert_eq!(engine.para_level()?, 1);
    Ok(())
}

#[test]
fn caller_errors_are_reported_per_call() -> Result<()> {
    let mut engine = ParagraphEngine::new();
    assert_eq!(engine.processed_length(), Err(BidiError::NotConfigured));

    let below = engine.set_para("ab", ParaLevel::Fixed(2), Some(&[1, 1]));
    assert!(matches!(below, Err(BidiError::InvalidInput(_))));

    assert!(matches!(ParaLevel::from_raw(200), Err(BidiError::InvalidConfiguration(_))));
    assert!(matches!(ReorderingMode::try_from(9), Err(BidiError::InvalidConfiguration(_))));
    assert!(matches!(WriteOptions::from_raw(0x40), Err(BidiError::InvalidConfiguration(_))));

    engine.set_para("abc", ParaLevel::LTR, None)?;
    assert!(matches!(engine.visual_run(5), Err(BidiError::InvalidInput(_))));
    Ok(())
}

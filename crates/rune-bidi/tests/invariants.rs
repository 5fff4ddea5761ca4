use anyhow::Result;
use rune_bidi::bidi::{mirrored_char, MAX_RESOLVED_LEVEL};
use rune_bidi::{write_reverse, ParaLevel, ParagraphEngine, ReorderingMode, ReorderingOptions, WriteOptions};

const SAMPLES: &[&str] = &[
    "Hello World",
    "abc \u{05D0}\u{05D1}\u{05D2} def",
    "abc \u{05D2}\u{05D1}\u{05D0} 123",
    "\u{05D0}(b [\u{05D1}]) 12.5%",
    "\u{0627}\u{0644} 1/2 \u{0661}\u{0662} x",
    "a\u{202B}b\u{202A}c\u{202C}d\u{202C}e",
    "x \u{2067}\u{05D0} y\u{2069} z\n\u{05D1} 7",
    "Latin1 \u{060C}(\u{0643} 567 \u{062A}\u{0643}\u{0631}\u{0634}> More latin 123 \u{0643}\u{062A}",
];

fn engine(mode: ReorderingMode, options: ReorderingOptions, text: &str, para: ParaLevel) -> Result<ParagraphEngine> {
    let mut engine = ParagraphEngine::new();
    engine.set_reordering_mode(mode);
    engine.set_reordering_options(options);
    engine.set_para(text, para, None)?;
    Ok(engine)
}

#[test]
fn runs_partition_processed_text_in_every_mode() -> Result<()> {
    for mode in ReorderingMode::ALL {
        for text in SAMPLES {
            for para in [ParaLevel::LTR, ParaLevel::RTL, ParaLevel::AutoLtr] {
                let engine = engine(mode, ReorderingOptions::INSERT_MARKS, text, para)?;
                let processed = engine.processed_length()?;

                let logical = engine.logical_runs()?;
                let mut next = 0;
                for run in &logical {
                    assert_eq!(run.logical_start, next, "{mode} {text:?}");
                    next += run.length;
                }
                assert_eq!(next, processed);

                let mut visual: Vec<_> = engine.visual_runs()?.iter().map(|r| r.logical_range()).collect();
                visual.sort_by_key(|range| range.start);
                let covered = visual.iter().try_fold(0, |at, range| (range.start == at).then_some(range.end));
                assert_eq!(covered, Some(processed), "{mode} {text:?}");

                let mut map = engine.logical_map()?;
                map.sort_unstable();
                assert_eq!(map, (0..processed).collect::<Vec<_>>());
            }
        }
    }
    Ok(())
}

#[test]
fn levels_never_exceed_resolved_maximum() -> Result<()> {
    let mut deep = String::new();
    for i in 0..140 {
        deep.push(if i % 2 == 0 { '\u{202B}' } else { '\u{2066}' });
        deep.push_str("a1");
    }
    for mode in ReorderingMode::ALL {
        for text in SAMPLES.iter().copied().chain([deep.as_str()]) {
            let engine = engine(mode, ReorderingOptions::empty(), text, ParaLevel::AutoRtl)?;
            assert!(engine.levels()?.iter().all(|&level| level <= MAX_RESOLVED_LEVEL), "{mode}");
        }
    }
    Ok(())
}

#[test]
fn inverse_output_displays_as_its_visual_source() -> Result<()> {
    let cases = [
        ("Hello World", ParaLevel::LTR),
        ("abc \u{05D0}\u{05D1}\u{05D2} def", ParaLevel::LTR),
        ("abc \u{05D2}\u{05D1}\u{05D0} 123", ParaLevel::LTR),
        (SAMPLES[7], ParaLevel::RTL),
    ];
    for (visual, para) in cases {
        let logical = engine(ReorderingMode::InverseLikeDirect, ReorderingOptions::INSERT_MARKS, visual, para)?
            .get_reordered(WriteOptions::empty())?;
        let shown = engine(ReorderingMode::Default, ReorderingOptions::empty(), &logical, para)?
            .get_reordered(WriteOptions::REMOVE_BIDI_CONTROLS)?;
        assert_eq!(shown, visual, "{para:?}");
    }
    Ok(())
}

#[test]
fn simple_logical_text_survives_display_and_inverse() -> Result<()> {
    let logical = "abc \u{05D0}\u{05D1}\u{05D2} def";
    let visual = engine(ReorderingMode::Default, ReorderingOptions::empty(), logical, ParaLevel::LTR)?
        .get_reordered(WriteOptions::empty())?;
    let back = engine(ReorderingMode::InverseLikeDirect, ReorderingOptions::INSERT_MARKS, &visual, ParaLevel::LTR)?
        .get_reordered(WriteOptions::empty())?;
    let without_marks: String = back.chars().filter(|&c| c != '\u{200E}' && c != '\u{200F}').collect();
    assert_eq!(without_marks, logical);
    Ok(())
}

/// Several logical strings share one display, so the inverse can only
/// return one of them: "a \u{05D0} 1" and "a 1 \u{05D0}" both show as
/// "a 1 \u{05D0}". The visual side still round trips.
#[test]
fn logical_text_with_the_same_display_is_not_recovered() -> Result<()> {
    let logical = "a \u{05D0} 1";
    let visual = engine(ReorderingMode::Default, ReorderingOptions::empty(), logical, ParaLevel::LTR)?
        .get_reordered(WriteOptions::empty())?;
    assert_eq!(visual, "a 1 \u{05D0}");

    let back = engine(ReorderingMode::InverseLikeDirect, ReorderingOptions::INSERT_MARKS, &visual, ParaLevel::LTR)?
        .get_reordered(WriteOptions::empty())?;
    assert_eq!(back, "a 1 \u{05D0}");
    assert_ne!(back, logical);

    let shown = engine(ReorderingMode::Default, ReorderingOptions::empty(), &back, ParaLevel::LTR)?
        .get_reordered(WriteOptions::REMOVE_BIDI_CONTROLS)?;
    assert_eq!(shown, visual);
    Ok(())
}

#[test]
fn mirroring_twice_restores_symmetric_pairs() {
    for ch in "()[]{}<>\u{00AB}\u{00BB}\u{2039}\u{203A}\u{2208}\u{220B}".chars() {
        assert_eq!(mirrored_char(mirrored_char(ch)), ch);
    }
    let text = "a(b[c]d)<e>";
    let once = write_reverse(text, WriteOptions::DO_MIRRORING);
    assert_eq!(once, "<e>(d[c]b)a");
    assert_eq!(write_reverse(&once, WriteOptions::DO_MIRRORING), text);
}

#[test]
fn output_reverse_mirrors_forward_output() -> Result<()> {
    for text in SAMPLES {
        let engine = engine(ReorderingMode::Default, ReorderingOptions::empty(), text, ParaLevel::AutoLtr)?;
        let forward = engine.get_reordered(WriteOptions::DO_MIRRORING)?;
        let reversed = engine.get_reordered(WriteOptions::DO_MIRRORING | WriteOptions::OUTPUT_REVERSE)?;
        assert_eq!(reversed, forward.chars().rev().collect::<String>());
    }
    Ok(())
}

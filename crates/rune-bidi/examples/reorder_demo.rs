use rune_bidi::{ParagraphEngine, WriteOptions};
use rune_config::RuneConfig;

fn main() {
    // Engine defaults come from rune.toml and RUNE_BIDI_* variables
    let config = RuneConfig::load();
    let mut engine = ParagraphEngine::from_config(&config.bidi).expect("Invalid bidi configuration");

    let text = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "abc \u{05D0}\u{05D1}\u{05D2} (123) def".to_string());
    engine.set_text(&text).expect("Failed to resolve text");

    println!("Text: {:?}", text);
    println!("Mode: {}", engine.reordering_mode());
    println!("Paragraph level: {}", engine.para_level().unwrap_or_default());
    println!("Levels: {:?}", engine.levels().unwrap_or_default());
    println!();

    let runs = engine.visual_runs().unwrap_or_default();
    println!("Visual runs: {}", runs.len());
    for (i, run) in runs.iter().enumerate() {
        println!(
            "  Run {}: {:?} start={} length={} level={}",
            i, run.direction, run.logical_start, run.length, run.level
        );
    }
    println!();

    match engine.reordered() {
        Ok(out) => println!("Reordered: {:?}", out),
        Err(e) => eprintln!("Failed to reorder: {}", e),
    }
    match engine.get_reordered(engine.write_options() | WriteOptions::DO_MIRRORING) {
        Ok(out) => println!("Mirrored:  {:?}", out),
        Err(e) => eprintln!("Failed to reorder: {}", e),
    }
}

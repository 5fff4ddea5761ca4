/// Example program to print the loaded bidi configuration
///
/// Run with: cargo run -p rune-config --example print_config

fn main() {
    let config = rune_config::RuneConfig::load();

    println!("=== Rune Bidi Configuration ===\n");
    println!("  Paragraph level: {}", config.bidi.paragraph_level);
    println!("  Reordering mode: {}", config.bidi.reordering_mode);
    println!("  Reordering options: {:?}", config.bidi.reordering_options);
    println!("  Write options: {:?}", config.bidi.write_options);
    println!("  Inverse: {}", config.bidi.inverse);
    println!("  Order paragraphs LTR: {}", config.bidi.order_paragraphs_ltr);
    println!();

    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}

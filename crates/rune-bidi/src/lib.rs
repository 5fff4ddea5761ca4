//! rune-bidi: Unicode Bidirectional Algorithm engine.
//!
//! Resolves embedding levels for logical text, reorders it for display
//! and writes the result, with the inverse modes needed to turn visually
//! ordered text back into logical order.
//!
//! The entry point is [`ParagraphEngine`]; character data comes from a
//! [`CharProps`] oracle, [`UnicodeProps`] by default.

pub mod bidi;
pub mod error;
pub mod unicode;

pub use bidi::{
    base_direction, write_reverse, Direction, DirectionalRun, ModeSelection, ParaLevel, Paragraph,
    ParagraphDirection, ParagraphEngine, ReorderingMode, ReorderingOptions, WriteOptions,
};
pub use error::{BidiError, Result};
pub use unicode::{CharProps, UnicodeProps};

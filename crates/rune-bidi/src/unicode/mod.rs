//! Unicode character data consumed by the bidi engine.
//!
//! The engine never looks at code points directly; it queries a
//! [`CharProps`] implementation for bidi classes, mirroring and
//! paired-bracket data.

pub mod properties;

pub use properties::{
    is_bidi_control, paired_bracket, Bracket, BracketRole, CharProps, UnicodeProps,
};

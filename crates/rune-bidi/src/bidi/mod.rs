//! Bidirectional (BiDi) text support.
//!
//! - Paragraph level detection and embedding levels (UAX-9)
//! - Directional runs and visual reordering, including the inverse
//!   (visual-to-logical) and runs-only modes
//! - Mirroring, directional marks and output formatting

pub mod engine;
pub(crate) mod implicit;
pub mod levels;
pub(crate) mod marks;
pub mod mirror;
pub mod options;
pub mod reorder;
pub mod runs;
pub mod writer;

pub use engine::{base_direction, ParagraphEngine};
pub use levels::{
    ParaLevel, Paragraph, ParagraphDirection, DEFAULT_LTR, DEFAULT_RTL, LEVEL_OVERRIDE,
    MAX_EXPLICIT_LEVEL, MAX_RESOLVED_LEVEL,
};
pub use mirror::mirrored_char;
pub use options::{ModeSelection, ReorderingMode, ReorderingOptions, WriteOptions};
pub use reorder::{reorder_runs, visual_order};
pub use runs::{Direction, DirectionalRun, RunSegmenter};
pub use writer::write_reverse;

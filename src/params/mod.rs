//! Parameter definitions with units and documented semantics.
//!
//! All magic numbers are extracted here with:
//! - Units (world units, seconds, decibels, etc.)
//! - Documented ranges and meanings
//! - Defaults used by the demo variants

mod audio;
mod render;
mod scene;

// Re-export all types
pub use audio::{AnalyserConfig, MAX_FFT_SIZE, MIN_FFT_SIZE};
pub use render::RenderConfig;
pub use scene::{GridLayout, LineLayout, MotionParams, SphereDetail, NUM_PRIMITIVES};

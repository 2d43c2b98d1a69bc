//! Wavetable synthesis: turns sampled instruments into 1/60 s single-cycle frames

pub mod builder;
pub mod cycle;
pub mod frame;
pub mod period;
pub mod spline;

pub use builder::{base_frequency, base_notes, build, Instrument, SampleMeta, Wavetable};
pub use builder::{REFERENCE_FREQ, REFERENCE_NOTE};
pub use cycle::extract_cycle;
pub use frame::{quantize, Frame, FRAME_SIZE, WAVE_POINTS};
pub use period::estimate_period;

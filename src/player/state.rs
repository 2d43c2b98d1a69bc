//! Player state

use serde::Serialize;

/// Number of hardware channels
pub const CHANNEL_COUNT: usize = 4;

/// Ticks per row at the default speed of 6
pub const DEFAULT_ROW_DURATION: f64 = 7.2;

/// Per-voice cursor into the packed frame data
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelState {
    /// Address of the next frame
    pub pointer: usize,
    /// 1-based sample number, 0 when the channel is silent
    pub sample_index: u8,
    /// Most recently triggered sample number, kept after the sample ends
    pub last_sample: u8,
    /// Frames left before the sample ends or loops
    pub frames_remaining: usize,
    /// Semitones between the played note and the sample's base note
    pub pitch_shift: i32,
    /// Volume scale in [0, 1]
    pub volume_multiplier: f64,
}

impl ChannelState {
    pub fn is_active(&self) -> bool {
        self.sample_index > 0
    }
}

impl Default for ChannelState {
    fn default() -> Self {
        Self {
            pointer: 0,
            sample_index: 0,
            last_sample: 0,
            frames_remaining: 0,
            pitch_shift: 0,
            volume_multiplier: 1.0,
        }
    }
}

/// Song position and channel state, mutated once per tick
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerState {
    /// Ticks elapsed
    pub tick: u64,
    /// Tick at which the next row is read
    pub next_row_time: f64,
    /// Ticks per row
    pub row_duration: f64,
    /// Current row, `None` before the first row is read
    pub row: Option<usize>,
    /// Index into the position list
    pub position: usize,
    /// Pattern playing at `position`
    pub pattern: usize,
    pub channels: [ChannelState; CHANNEL_COUNT],
}

impl PlayerState {
    pub fn new(first_pattern: usize) -> Self {
        Self {
            tick: 0,
            next_row_time: 0.0,
            row_duration: DEFAULT_ROW_DURATION,
            row: None,
            position: 0,
            pattern: first_pattern,
            channels: [ChannelState::default(); CHANNEL_COUNT],
        }
    }
}

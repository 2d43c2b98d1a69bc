//! Tracker module model and loader
//!
//! The rest of the crate only sees the typed model defined here; the binary
//! layout is handled by [`ModReader`].

pub mod note;
pub mod reader;

pub use reader::ModReader;

use crate::error::Result;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Rows per pattern
pub const ROWS: usize = 64;

/// Channels per row
pub const CHANNELS: usize = 4;

/// Instrument sample with PCM data normalized to [-1, 1)
#[derive(Debug, Clone, Default)]
pub struct Sample {
    pub name: String,
    /// Finetune (-8..7)
    pub finetune: i8,
    /// Default volume (0..64)
    pub volume: u8,
    /// Loop start in bytes
    pub repeat_from: usize,
    /// Loop length in bytes
    pub repeat_length: usize,
    pub data: Vec<f64>,
}

impl Sample {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// A single pattern cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Event {
    /// Note number (0..59), `None` when the cell has no note
    pub note: Option<u8>,
    /// 1-based sample number, 0 for none
    pub sample: u8,
    /// Effect command (4 bits)
    pub effect: u8,
    /// Effect parameter
    pub param: u8,
}

impl Event {
    pub fn note(note: u8, sample: u8) -> Self {
        Self {
            note: Some(note),
            sample,
            ..Self::default()
        }
    }

    pub fn with_effect(mut self, effect: u8, param: u8) -> Self {
        self.effect = effect & 0x0F;
        self.param = param;
        self
    }
}

/// One row of cells, one per channel
pub type Row = [Event; CHANNELS];

/// 64 rows of events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    pub rows: Vec<Row>,
}

impl Pattern {
    pub fn empty() -> Self {
        Self {
            rows: vec![[Event::default(); CHANNELS]; ROWS],
        }
    }

    pub fn set(&mut self, row: usize, channel: usize, event: Event) {
        self.rows[row][channel] = event;
    }

    /// Iterate over every event in row-major order
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.rows.iter().flatten()
    }
}

impl Default for Pattern {
    fn default() -> Self {
        Self::empty()
    }
}

/// Parsed tracker module
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub title: String,
    /// Four-character signature ("M.K.", "STK." for signature-less files, ...)
    pub format: String,
    pub samples: Vec<Sample>,
    pub patterns: Vec<Pattern>,
    /// Play order (pattern numbers), truncated to `position_count`
    pub positions: Vec<u8>,
    pub position_count: usize,
}

impl Module {
    /// Parse a module from raw bytes, decompressing gzip data if necessary
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if is_gzip(data) {
            let mut decoder = GzDecoder::new(data);
            let mut raw = Vec::new();
            decoder.read_to_end(&mut raw)?;
            ModReader::new(&raw).parse()
        } else {
            ModReader::new(data).parse()
        }
    }

    /// Load a module file (plain or gzip-compressed)
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Self::from_bytes(&data)
    }

    /// Iterate over every event of every stored pattern
    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.patterns.iter().flat_map(|p| p.events())
    }
}

/// Check for gzip magic (0x1f 0x8b)
fn is_gzip(data: &[u8]) -> bool {
    data.len() >= 2 && data[0] == 0x1f && data[1] == 0x8b
}

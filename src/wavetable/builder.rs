//! Wavetable construction and per-instrument metadata

use super::cycle::extract_cycle;
use super::frame::{quantize, Frame, FRAME_SIZE};
use super::period::estimate_period;
use crate::modfile::{Module, Sample};
use serde::Serialize;
use std::collections::HashSet;

/// Tick rate of the playback engine (frames per second)
pub const FRAMES_PER_SECOND: f64 = 60.0;

/// Frequency at which an instrument played at `REFERENCE_NOTE` is resynthesized
pub const REFERENCE_FREQ: f64 = 11084.0;

/// Note number anchored to `REFERENCE_FREQ` (F-2)
pub const REFERENCE_NOTE: u8 = 29;

/// Ordered frames for one instrument
pub type Wavetable = Vec<Frame>;

/// Playback metadata for one instrument.
///
/// `start` and `repeat_from` are byte offsets into the packed frame data,
/// always multiples of [`FRAME_SIZE`]; lengths count frames.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SampleMeta {
    pub start: usize,
    pub length: usize,
    pub repeat_from: usize,
    pub repeat_length: usize,
    pub base_note: u8,
}

impl SampleMeta {
    /// Byte offset just past this instrument's frames
    pub fn end(&self) -> usize {
        self.start + self.length * FRAME_SIZE
    }

    pub fn is_looped(&self) -> bool {
        self.repeat_length > 0
    }
}

/// Frequency at which an instrument with the given base note is analyzed
pub fn base_frequency(reference_freq: f64, reference_note: u8, base_note: u8) -> f64 {
    reference_freq * 2f64.powf((base_note as f64 - reference_note as f64) / 12.0)
}

/// Hop size in samples for a base frequency
pub fn block_size(base_frequency: f64) -> usize {
    (base_frequency / FRAMES_PER_SECOND).floor() as usize
}

/// Average (integer division) of every note that triggers each instrument,
/// over all stored patterns. Instruments never triggered get `default_note`.
pub fn base_notes(module: &Module, default_note: u8) -> Vec<u8> {
    let count = module.samples.len();
    let mut sums = vec![0u64; count];
    let mut hits = vec![0u64; count];

    for event in module.events() {
        let Some(note) = event.note else { continue };
        let Some(index) = (event.sample as usize).checked_sub(1) else {
            continue;
        };
        if index < count {
            sums[index] += note as u64;
            hits[index] += 1;
        }
    }

    sums.iter()
        .zip(&hits)
        .map(|(&sum, &n)| if n > 0 { (sum / n) as u8 } else { default_note })
        .collect()
}

/// Slide a two-hop window over `pcm`, producing one frame per hop.
///
/// Only full windows are analyzed. Returns the frames and the hop size.
pub fn build(pcm: &[f64], base_frequency: f64) -> (Wavetable, usize) {
    let step = block_size(base_frequency);
    let window = step * 2;
    let mut frames = Vec::new();
    if step == 0 || pcm.len() < window {
        return (frames, step);
    }

    let mut skipped = 0usize;
    for start in (0..=pcm.len() - window).step_by(step) {
        let block = &pcm[start..start + window];
        match estimate_period(block, window / 2) {
            Some(period) => {
                let cycle = extract_cycle(block, period);
                frames.push(quantize(&cycle, period, base_frequency));
            }
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        tracing::warn!(
            "Dropped {} block(s) of {} samples with no period candidate",
            skipped,
            window
        );
    }

    (frames, step)
}

/// An instrument's wavetable together with its analysis parameters
#[derive(Debug, Clone)]
pub struct Instrument {
    pub name: String,
    pub base_note: u8,
    pub base_frequency: f64,
    pub block_size: usize,
    pub frames: Wavetable,
}

impl Instrument {
    /// Analyze one sample at the pitch of `base_note`
    pub fn build(
        sample: &Sample,
        base_note: u8,
        reference_freq: f64,
        reference_note: u8,
    ) -> Self {
        let base_frequency = base_frequency(reference_freq, reference_note, base_note);
        let (frames, block_size) = build(&sample.data, base_frequency);

        let distinct: HashSet<&[u8; 32]> = frames.iter().map(|f| &f.wave).collect();
        let silent = frames.iter().filter(|f| f.is_silent()).count();
        tracing::debug!(
            "Instrument '{}': base note {} ({:.1} Hz), {} frames ({} silent), {} distinct waves",
            sample.name,
            base_note,
            base_frequency,
            frames.len(),
            silent,
            distinct.len()
        );

        Self {
            name: sample.name.clone(),
            base_note,
            base_frequency,
            block_size,
            frames,
        }
    }

    /// Size of the packed frames in bytes
    pub fn packed_len(&self) -> usize {
        self.frames.len() * FRAME_SIZE
    }

    /// Append the packed frames to a buffer
    pub fn write_frames(&self, buf: &mut Vec<u8>) {
        for frame in &self.frames {
            frame.write_to(buf);
        }
    }

    /// Metadata for this instrument placed at byte offset `start`.
    ///
    /// Loop points are converted from sample bytes to frame units and clamped
    /// to the frames that exist.
    pub fn meta(&self, sample: &Sample, start: usize) -> SampleMeta {
        let length = self.frames.len();
        let mut meta = SampleMeta {
            start,
            length,
            repeat_from: start,
            repeat_length: 0,
            base_note: self.base_note,
        };
        if self.block_size == 0 {
            return meta;
        }

        let loop_frame = sample.repeat_from / self.block_size;
        let loop_length = sample.repeat_length / self.block_size;
        if loop_length == 0 {
            meta.repeat_from = start + loop_frame.min(length) * FRAME_SIZE;
            return meta;
        }
        if loop_frame >= length {
            tracing::warn!(
                "Instrument '{}': loop starts past the last frame, playing once",
                self.name
            );
            return meta;
        }

        meta.repeat_from = start + loop_frame * FRAME_SIZE;
        meta.repeat_length = loop_length.min(length - loop_frame);
        if meta.repeat_length < loop_length {
            tracing::debug!(
                "Instrument '{}': loop shortened from {} to {} frames",
                self.name,
                loop_length,
                meta.repeat_length
            );
        }
        meta
    }
}

//! Frame quantization and the packed 18-byte frame format
//!
//! Packed layout:
//!
//! | byte  | contents                                   |
//! |-------|--------------------------------------------|
//! | 0     | frequency bits 0..8                        |
//! | 1     | amplitude << 4 \| frequency bits 8..12     |
//! | 2..18 | wave[2i] \| wave[2i + 1] << 4, i = 0..16   |
//!
//! The same layout is used by the sound registers the player writes.

use super::spline::CubicSpline;
use serde::Serialize;

/// Size of one packed frame in bytes
pub const FRAME_SIZE: usize = 18;

/// Number of 4-bit points in a waveform
pub const WAVE_POINTS: usize = 32;

/// Largest value of the 12-bit frequency field
pub const MAX_FREQUENCY: u16 = 0x0FFF;

/// Largest amplitude / wave nibble
pub const MAX_NIBBLE: u8 = 15;

/// Wave nibble that represents a zero crossing
pub const WAVE_CENTER: f64 = 8.0;

/// Normalized samples are clamped to this magnitude before mapping to nibbles
const WAVE_LIMIT: f64 = 0.999999;

/// One quantized single-cycle snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Frame {
    /// Playback frequency in Hz (12 bits)
    pub frequency: u16,
    /// Amplitude (4 bits)
    pub amplitude: u8,
    /// Waveform nibbles
    pub wave: [u8; WAVE_POINTS],
}

impl Frame {
    /// Silent frame
    pub fn silent(frequency: u16) -> Self {
        Self {
            frequency: frequency.min(MAX_FREQUENCY),
            amplitude: 0,
            wave: [0; WAVE_POINTS],
        }
    }

    pub fn is_silent(&self) -> bool {
        self.amplitude == 0
    }

    /// Pack into the 18-byte wire format
    pub fn pack(&self) -> [u8; FRAME_SIZE] {
        let mut out = [0u8; FRAME_SIZE];
        out[0..2].copy_from_slice(&pack_header(self.frequency, self.amplitude));
        for (i, pair) in self.wave.chunks_exact(2).enumerate() {
            out[2 + i] = (pair[0] & 0x0F) | ((pair[1] & 0x0F) << 4);
        }
        out
    }

    /// Append the packed form to a buffer
    pub fn write_to(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.pack());
    }

    /// Decode a packed frame; `None` if fewer than 18 bytes are given
    pub fn unpack(data: &[u8]) -> Option<Self> {
        if data.len() < FRAME_SIZE {
            return None;
        }
        let (frequency, amplitude) = unpack_header([data[0], data[1]]);
        let mut wave = [0u8; WAVE_POINTS];
        for (i, &b) in data[2..FRAME_SIZE].iter().enumerate() {
            wave[2 * i] = b & 0x0F;
            wave[2 * i + 1] = b >> 4;
        }
        Some(Self {
            frequency,
            amplitude,
            wave,
        })
    }
}

/// Pack a 12-bit frequency and 4-bit amplitude into two bytes
pub fn pack_header(frequency: u16, amplitude: u8) -> [u8; 2] {
    let frequency = frequency.min(MAX_FREQUENCY);
    [
        (frequency & 0xFF) as u8,
        ((amplitude & 0x0F) << 4) | (frequency >> 8) as u8,
    ]
}

/// Split a two-byte header into frequency and amplitude
pub fn unpack_header(bytes: [u8; 2]) -> (u16, u8) {
    let frequency = bytes[0] as u16 | (((bytes[1] & 0x0F) as u16) << 8);
    (frequency, bytes[1] >> 4)
}

/// Quantize one extracted cycle into a frame.
///
/// `samplerate / period` gives the frequency; the cycle is normalized to its
/// peak, resampled to 32 points through a cubic spline and mapped to nibbles
/// centered on 8.
pub fn quantize(cycle: &[f64], period: usize, samplerate: f64) -> Frame {
    let frequency = (samplerate / period as f64)
        .round()
        .clamp(0.0, MAX_FREQUENCY as f64) as u16;

    let peak = cycle.iter().fold(0.0f64, |m, v| m.max(v.abs()));
    let amplitude = (peak * 16.0).round().min(MAX_NIBBLE as f64) as u8;
    if amplitude == 0 {
        return Frame::silent(frequency);
    }

    let normalized: Vec<f64> = cycle.iter().map(|v| v / peak).collect();
    let mut wave = [0u8; WAVE_POINTS];
    match CubicSpline::new(&normalized) {
        Some(spline) => {
            for (i, point) in wave.iter_mut().enumerate() {
                let v = spline.eval(i as f64 / WAVE_POINTS as f64);
                *point = to_nibble(v);
            }
        }
        None => wave = [to_nibble(normalized.first().copied().unwrap_or(0.0)); WAVE_POINTS],
    }

    Frame {
        frequency,
        amplitude,
        wave,
    }
}

/// Map a normalized sample to a nibble in [1, 15]
fn to_nibble(v: f64) -> u8 {
    (v.clamp(-WAVE_LIMIT, WAVE_LIMIT) * 7.0 + WAVE_CENTER).round() as u8
}

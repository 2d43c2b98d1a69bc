//! Tick-driven playback of packed patterns and frames
//!
//! Everything the player needs lives in memory (pattern records and packed
//! frames) or in [`SongTables`]. A tick never allocates and does a fixed
//! amount of work per channel.

use super::memory::Memory;
use super::state::{ChannelState, PlayerState, CHANNEL_COUNT};
use crate::config::RecordFormat;
use crate::modfile::{Event, ROWS};
use crate::pack::events::{cell_offset, decode_event};
use crate::wavetable::frame::{pack_header, MAX_FREQUENCY};
use crate::wavetable::{Frame, SampleMeta, FRAME_SIZE};

/// Address of the first channel's sound registers
pub const REGISTER_BASE: usize = 0xFF9C;

/// Set-volume effect command
pub const EFFECT_SET_VOLUME: u8 = 0x0C;

/// Set-speed/tempo effect command
pub const EFFECT_SET_TEMPO: u8 = 0x0F;

/// Highest volume effect parameter
pub const MAX_VOLUME_PARAM: u8 = 64;

/// Tempo parameters up to this value set ticks per row, larger ones set BPM
pub const TEMPO_SPEED_LIMIT: u8 = 32;

/// Player ticks per row per speed unit (one 0.02 s tracker tick at 60 Hz)
pub const TEMPO_TICKS_PER_SPEED: f64 = 1.2;

/// Player ticks per row at 1 BPM (six 2.5/BPM s tracker ticks at 60 Hz)
pub const TEMPO_BPM_NUMERATOR: f64 = 900.0;

/// Address of a channel's register block
pub fn register_addr(channel: usize) -> usize {
    REGISTER_BASE + channel * FRAME_SIZE
}

/// Read back the frame currently held in a channel's registers
pub fn read_registers<M: Memory>(mem: &M, channel: usize) -> Frame {
    let mut bytes = [0u8; FRAME_SIZE];
    mem.peek_into(register_addr(channel), &mut bytes);
    // 18 bytes are always present
    Frame::unpack(&bytes).unwrap_or(Frame::silent(0))
}

/// Row duration for a tempo effect parameter; `None` for 0
pub fn tempo_row_duration(param: u8) -> Option<f64> {
    match param {
        0 => None,
        p if p <= TEMPO_SPEED_LIMIT => Some(TEMPO_TICKS_PER_SPEED * p as f64),
        p => Some(TEMPO_BPM_NUMERATOR / p as f64),
    }
}

/// Static song data the player looks things up in
#[derive(Debug, Clone, PartialEq)]
pub struct SongTables {
    /// Indexed by sample number - 1
    pub samples_meta: Vec<SampleMeta>,
    /// Play order of pattern numbers
    pub positions: Vec<u8>,
    /// Address of the first pattern record
    pub pattern_base: usize,
    /// Address of the first packed frame
    pub sample_data_base: usize,
    pub record_format: RecordFormat,
}

impl SongTables {
    fn meta(&self, sample: u8) -> Option<&SampleMeta> {
        (sample as usize)
            .checked_sub(1)
            .and_then(|i| self.samples_meta.get(i))
    }
}

pub struct Player {
    tables: SongTables,
    state: PlayerState,
}

impl Player {
    pub fn new(tables: SongTables) -> Self {
        let first = tables.positions.first().copied().unwrap_or(0) as usize;
        Self {
            tables,
            state: PlayerState::new(first),
        }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn channel(&self, index: usize) -> &ChannelState {
        &self.state.channels[index]
    }

    pub fn tables(&self) -> &SongTables {
        &self.tables
    }

    /// Run one 1/60 s tick
    pub fn tick<M: Memory>(&mut self, mem: &mut M) {
        if self.state.next_row_time <= self.state.tick as f64 {
            self.trigger_row(mem);
        }
        self.advance_channels(mem);
        self.state.tick += 1;
    }

    /// Move to the next row, start its notes and apply its effects
    pub fn trigger_row<M: Memory>(&mut self, mem: &M) {
        let row = match self.state.row {
            None => 0,
            Some(r) if r + 1 >= ROWS => {
                if !self.tables.positions.is_empty() {
                    self.state.position = (self.state.position + 1) % self.tables.positions.len();
                    self.state.pattern = self.tables.positions[self.state.position] as usize;
                }
                0
            }
            Some(r) => r + 1,
        };
        self.state.row = Some(row);

        let format = self.tables.record_format;
        let mut record = [0u8; 4];
        for ch in 0..CHANNEL_COUNT {
            let addr = self.tables.pattern_base + cell_offset(format, self.state.pattern, row, ch);
            mem.peek_into(addr, &mut record[..format.size()]);
            let event = decode_event(&record, format);
            self.apply_event(ch, &event);
        }

        self.state.next_row_time += self.state.row_duration;
    }

    fn apply_event(&mut self, ch: usize, event: &Event) {
        if event.effect == EFFECT_SET_TEMPO {
            if let Some(duration) = tempo_row_duration(event.param) {
                self.state.row_duration = duration;
            }
        }

        let channel = &mut self.state.channels[ch];
        let volume = (event.effect == EFFECT_SET_VOLUME)
            .then(|| event.param.min(MAX_VOLUME_PARAM) as f64 / MAX_VOLUME_PARAM as f64);

        let Some(note) = event.note else {
            if let Some(v) = volume {
                channel.volume_multiplier = v;
            }
            return;
        };

        // A note without a sample number replays the channel's last sample,
        // even after that sample has finished playing
        let sample = if event.sample > 0 {
            event.sample
        } else {
            channel.last_sample
        };
        let Some(meta) = self.tables.meta(sample) else {
            return;
        };

        *channel = ChannelState {
            pointer: meta.start + self.tables.sample_data_base,
            sample_index: sample,
            last_sample: sample,
            frames_remaining: meta.length,
            pitch_shift: note as i32 - meta.base_note as i32,
            volume_multiplier: volume.unwrap_or(1.0),
        };
    }

    /// Decode the next frame of every channel into its registers
    pub fn advance_channels<M: Memory>(&mut self, mem: &mut M) {
        for ch in 0..CHANNEL_COUNT {
            let regs = register_addr(ch);
            let state = &mut self.state.channels[ch];

            if state.is_active() && state.frames_remaining == 0 {
                match self.tables.meta(state.sample_index) {
                    Some(meta) if meta.is_looped() => {
                        state.pointer = meta.repeat_from + self.tables.sample_data_base;
                        state.frames_remaining = meta.repeat_length;
                    }
                    _ => state.sample_index = 0,
                }
            }

            if !state.is_active() {
                mem.poke(regs + 1, 0);
                continue;
            }

            let addr = state.pointer;
            let (frequency, amplitude) =
                crate::wavetable::frame::unpack_header([mem.peek(addr), mem.peek(addr + 1)]);
            let shifted = (frequency as f64 * 2f64.powf(state.pitch_shift as f64 / 12.0))
                .round()
                .clamp(0.0, MAX_FREQUENCY as f64) as u16;
            let volume = (amplitude as f64 * state.volume_multiplier).floor() as u8;

            let header = pack_header(shifted, volume);
            mem.poke(regs, header[0]);
            mem.poke(regs + 1, header[1]);
            for i in 2..FRAME_SIZE {
                let b = mem.peek(addr + i);
                mem.poke(regs + i, b);
            }

            state.pointer += FRAME_SIZE;
            state.frames_remaining -= 1;
        }
    }
}

//! JSON serialization types for build reports and player traces

use crate::compiler::CompiledSong;
use crate::modfile::note::{note_name, note_to_period};
use crate::pack::Region;
use crate::player::{read_registers, Memory, Player, CHANNEL_COUNT};
use crate::wavetable::SampleMeta;
use serde::Serialize;

/// Top-level JSON structure for a compiled song
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    /// Module title
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// Module signature
    pub format: String,
    pub instruments: Vec<InstrumentJson>,
    pub positions: Vec<u8>,
    /// Size of the event records
    pub events_bytes: usize,
    /// Size of the packed frames
    pub frames_bytes: usize,
    pub total_bytes: usize,
    pub budget: usize,
    pub regions: Vec<RegionJson>,
}

/// JSON representation of one instrument
#[derive(Debug, Clone, Serialize)]
pub struct InstrumentJson {
    /// 1-based sample number as used in patterns
    pub number: usize,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    pub base_note: String,
    /// Amiga period of the base note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_period: Option<u16>,
    pub base_frequency: f64,
    pub frames: usize,
    pub meta: SampleMeta,
}

/// JSON representation of a payload region
#[derive(Debug, Clone, Serialize)]
pub struct RegionJson {
    pub name: String,
    pub tag: u8,
    pub base: usize,
    pub offset: usize,
    pub length: usize,
}

impl From<&Region> for RegionJson {
    fn from(region: &Region) -> Self {
        Self {
            name: region.name.clone(),
            tag: region.tag,
            base: region.base,
            offset: region.range.start,
            length: region.len(),
        }
    }
}

impl BuildReport {
    pub fn new(song: &CompiledSong) -> Self {
        let instruments = song
            .instruments
            .iter()
            .zip(&song.samples_meta)
            .enumerate()
            .map(|(i, (inst, meta))| InstrumentJson {
                number: i + 1,
                name: inst.name.clone(),
                base_note: note_name(inst.base_note),
                base_period: note_to_period(inst.base_note),
                base_frequency: inst.base_frequency,
                frames: inst.frames.len(),
                meta: *meta,
            })
            .collect();

        Self {
            title: song.title.clone(),
            format: song.format.clone(),
            instruments,
            positions: song.positions.clone(),
            events_bytes: song.layout.events_len,
            frames_bytes: song.layout.frames_len(),
            total_bytes: song.layout.len(),
            budget: song.config.budget,
            regions: song.layout.regions.iter().map(RegionJson::from).collect(),
        }
    }
}

/// Register values of every channel after one tick
#[derive(Debug, Clone, Serialize)]
pub struct TraceLine {
    pub tick: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    pub position: usize,
    pub channels: Vec<ChannelJson>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelJson {
    pub sample: u8,
    pub frequency: u16,
    pub volume: u8,
    /// Waveform nibbles as a hex string
    pub wave: String,
}

impl TraceLine {
    /// Capture the state after the player's most recent tick
    pub fn capture<M: Memory>(player: &Player, mem: &M) -> Self {
        let state = player.state();
        let channels = (0..CHANNEL_COUNT)
            .map(|ch| {
                let regs = read_registers(mem, ch);
                ChannelJson {
                    sample: state.channels[ch].sample_index,
                    frequency: regs.frequency,
                    volume: regs.amplitude,
                    wave: regs.wave.iter().map(|w| format!("{:X}", w)).collect(),
                }
            })
            .collect();
        Self {
            tick: state.tick.saturating_sub(1),
            row: state.row,
            position: state.position,
            channels,
        }
    }
}

//! Module to wavetable compiler
//!
//! Ties the stages together: base pitch selection, per-instrument wavetable
//! synthesis, event encoding and payload layout.

use crate::cart::{RegionSink, TicCartridge};
use crate::config::{chunk, BuildConfig};
use crate::error::Result;
use crate::modfile::Module;
use crate::pack::{encode_patterns, Layout};
use crate::player::{embed_tables, Ram, SongTables, REGISTER_BASE};
use crate::wavetable::{base_notes, Instrument, SampleMeta};
use rayon::prelude::*;
use std::path::Path;

/// Output of a successful build
#[derive(Debug, Clone)]
pub struct CompiledSong {
    pub title: String,
    pub format: String,
    pub instruments: Vec<Instrument>,
    /// One entry per instrument, indexed by sample number - 1
    pub samples_meta: Vec<SampleMeta>,
    pub positions: Vec<u8>,
    pub layout: Layout,
    pub config: BuildConfig,
}

impl CompiledSong {
    /// Address of the first packed frame once the payload is mapped
    pub fn sample_data_base(&self) -> usize {
        self.config.pattern_base + self.layout.events_len
    }

    /// Lookup tables for the playback engine
    pub fn tables(&self) -> SongTables {
        SongTables {
            samples_meta: self.samples_meta.clone(),
            positions: self.positions.clone(),
            pattern_base: self.config.pattern_base,
            sample_data_base: self.sample_data_base(),
            record_format: self.config.record_format,
        }
    }

    /// Whether the mapped payload extends into the sound register block
    pub fn overlaps_registers(&self) -> bool {
        self.config.pattern_base + self.layout.len() > REGISTER_BASE
    }

    /// Memory image with the payload mapped at the pattern base
    pub fn memory(&self) -> Ram {
        let mut ram = Ram::new();
        ram.load(self.config.pattern_base, &self.layout.data);
        ram
    }

    /// Hand the payload regions to a writer
    pub fn write_to<S: RegionSink>(&self, sink: &mut S) -> Result<()> {
        self.layout.write_to(sink)
    }

    /// Lookup tables for a Lua player script
    pub fn lua_tables(&self) -> Result<String> {
        self.tables().to_lua()
    }

    /// Build a cartridge, optionally with a player program as its code chunk.
    /// The program gets the song's lookup tables embedded.
    pub fn cartridge(&self, code: Option<&[u8]>) -> Result<TicCartridge> {
        let mut cart = TicCartridge::new();
        if let Some(code) = code {
            let code = embed_tables(code, &self.lua_tables()?);
            cart.add_region(chunk::CODE, 0, &code)?;
        }
        self.write_to(&mut cart)?;
        Ok(cart)
    }
}

/// Main compiler state
pub struct Compiler {
    pub config: BuildConfig,
}

impl Compiler {
    pub fn new() -> Self {
        Self::with_config(BuildConfig::default())
    }

    pub fn with_config(config: BuildConfig) -> Self {
        Self { config }
    }

    /// Compile a parsed module
    pub fn compile(&self, module: &Module) -> Result<CompiledSong> {
        let config = &self.config;
        let notes = base_notes(module, config.reference_note);

        let instruments: Vec<Instrument> = module
            .samples
            .par_iter()
            .zip(&notes)
            .map(|(sample, &note)| {
                Instrument::build(sample, note, config.reference_freq, config.reference_note)
            })
            .collect();

        let mut frames = Vec::new();
        let mut samples_meta = Vec::with_capacity(instruments.len());
        for (instrument, sample) in instruments.iter().zip(&module.samples) {
            samples_meta.push(instrument.meta(sample, frames.len()));
            instrument.write_frames(&mut frames);
        }

        let events = encode_patterns(&module.patterns, config.record_format);
        tracing::info!(
            "Mod data: {} bytes (max: {})",
            events.len() + frames.len(),
            config.budget
        );
        let layout = Layout::assemble(&events, &frames, config.budget, &config.regions)?;

        Ok(CompiledSong {
            title: module.title.clone(),
            format: module.format.clone(),
            instruments,
            samples_meta,
            positions: module.positions.clone(),
            layout,
            config: config.clone(),
        })
    }

    /// Parse and compile raw module bytes
    pub fn compile_bytes(&self, data: &[u8]) -> Result<CompiledSong> {
        let module = Module::from_bytes(data)?;
        self.compile(&module)
    }

    /// Compile a module file into a cartridge file
    pub fn compile_file(
        &self,
        input: &Path,
        output: &Path,
        code: Option<&[u8]>,
    ) -> Result<CompiledSong> {
        let module = Module::open(input)?;
        let song = self.compile(&module)?;
        song.cartridge(code)?.save(output)?;
        tracing::info!(
            "Wrote {} region(s) to {}",
            song.layout.regions.len(),
            output.display()
        );
        Ok(song)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

//! Lua lookup tables for the in-cartridge player script

use super::engine::SongTables;
use crate::error::Result;
use std::fmt::Write as FmtWrite;

impl SongTables {
    /// Generate Lua globals describing the song layout.
    ///
    /// Each `samples_meta` row is `{start, length, repeat_from, repeat_length,
    /// base_note}` with byte offsets relative to `sample_data_start`.
    pub fn to_lua(&self) -> Result<String> {
        let mut output = String::new();

        writeln!(output, "-- generated by modtic")?;
        writeln!(output, "pattern_data_start = 0x{:04X}", self.pattern_base)?;
        writeln!(output, "sample_data_start = 0x{:04X}", self.sample_data_base)?;
        writeln!(output, "record_size = {}", self.record_format.size())?;
        writeln!(output)?;

        writeln!(output, "-- 1=start address of sample (0-based)")?;
        writeln!(output, "-- 2=sample length in frames")?;
        writeln!(output, "-- 3=address to repeat from (0-based)")?;
        writeln!(output, "-- 4=repeat length in frames")?;
        writeln!(output, "-- 5=base note")?;
        writeln!(output, "samples_meta = {{")?;
        for meta in &self.samples_meta {
            writeln!(
                output,
                "    {{{},{},{},{},{}}},",
                meta.start, meta.length, meta.repeat_from, meta.repeat_length, meta.base_note
            )?;
        }
        writeln!(output, "}}")?;
        writeln!(output)?;

        let positions: Vec<String> = self.positions.iter().map(|p| p.to_string()).collect();
        writeln!(output, "positions = {{{}}}", positions.join(","))?;

        Ok(output)
    }
}

/// Insert generated tables into a player script, after its leading comment
/// block so cartridge metadata tags stay at the top.
pub fn embed_tables(script: &[u8], tables: &str) -> Vec<u8> {
    let mut split = 0;
    for line in script.split_inclusive(|&b| b == b'\n') {
        if !line.starts_with(b"--") {
            break;
        }
        split += line.len();
    }

    let mut out = Vec::with_capacity(script.len() + tables.len() + 2);
    out.extend_from_slice(&script[..split]);
    if split > 0 && !script[..split].ends_with(b"\n") {
        out.push(b'\n');
    }
    out.extend_from_slice(tables.as_bytes());
    out.push(b'\n');
    out.extend_from_slice(&script[split..]);
    out
}

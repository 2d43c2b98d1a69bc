//! TIC-80 cartridge writer
//!
//! A cartridge is a flat list of chunks, each with a 4-byte header:
//! `(bank << 5) | type`, a 16-bit little-endian payload size and one
//! reserved zero byte.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Size of a chunk header
pub const CHUNK_HEADER_SIZE: usize = 4;

/// Largest payload a chunk can carry
pub const MAX_CHUNK_SIZE: usize = 0xFFFF;

/// Destination for named payload regions
pub trait RegionSink {
    /// Store `bytes` as a region of type `tag` in memory bank `bank`
    fn add_region(&mut self, tag: u8, bank: u8, bytes: &[u8]) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub tag: u8,
    pub bank: u8,
    pub data: Vec<u8>,
}

/// In-memory cartridge
#[derive(Debug, Clone, Default)]
pub struct TicCartridge {
    chunks: Vec<Chunk>,
}

impl TicCartridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Find the first chunk of a given type
    pub fn chunk(&self, tag: u8) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.tag == tag)
    }

    /// Serialize all chunks
    pub fn to_bytes(&self) -> Vec<u8> {
        let size: usize = self
            .chunks
            .iter()
            .map(|c| CHUNK_HEADER_SIZE + c.data.len())
            .sum();
        let mut out = Vec::with_capacity(size);
        for chunk in &self.chunks {
            let len = chunk.data.len() as u16;
            out.push((chunk.bank << 5) | (chunk.tag & 0x1F));
            out.extend_from_slice(&len.to_le_bytes());
            out.push(0);
            out.extend_from_slice(&chunk.data);
        }
        out
    }

    /// Parse a serialized cartridge
    pub fn from_bytes(mut data: &[u8]) -> Result<Self> {
        let mut cart = Self::new();
        while !data.is_empty() {
            if data.len() < CHUNK_HEADER_SIZE {
                return Err(Error::ModParse("Truncated chunk header".into()));
            }
            let tag = data[0] & 0x1F;
            let bank = data[0] >> 5;
            let len = u16::from_le_bytes([data[1], data[2]]) as usize;
            let end = CHUNK_HEADER_SIZE + len;
            if data.len() < end {
                return Err(Error::ModParse(format!(
                    "Chunk of type {} is truncated",
                    tag
                )));
            }
            cart.chunks.push(Chunk {
                tag,
                bank,
                data: data[CHUNK_HEADER_SIZE..end].to_vec(),
            });
            data = &data[end..];
        }
        Ok(cart)
    }

    /// Write the cartridge to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(&self.to_bytes())?;
        file.flush()?;
        Ok(())
    }
}

impl RegionSink for TicCartridge {
    fn add_region(&mut self, tag: u8, bank: u8, bytes: &[u8]) -> Result<()> {
        if bytes.len() > MAX_CHUNK_SIZE {
            return Err(Error::CapacityExceeded {
                actual: bytes.len(),
                budget: MAX_CHUNK_SIZE,
            });
        }
        if tag > 0x1F || bank > 7 {
            return Err(Error::Config(format!(
                "Invalid chunk type {} / bank {}",
                tag, bank
            )));
        }
        self.chunks.push(Chunk {
            tag,
            bank,
            data: bytes.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::chunk;

    #[test]
    fn test_chunk_header() {
        let mut cart = TicCartridge::new();
        cart.add_region(chunk::TILES, 0, &[0xAA, 0xBB, 0xCC]).unwrap();
        cart.add_region(chunk::MAP, 1, &[]).unwrap();
        assert_eq!(
            cart.to_bytes(),
            vec![0x01, 3, 0, 0, 0xAA, 0xBB, 0xCC, 0x24, 0, 0, 0]
        );
    }

    #[test]
    fn test_parse_written_cartridge() {
        let mut cart = TicCartridge::new();
        cart.add_region(chunk::CODE, 0, b"-- script: lua").unwrap();
        cart.add_region(chunk::SPRITES, 0, &vec![9; 0x2000]).unwrap();
        let parsed = TicCartridge::from_bytes(&cart.to_bytes()).unwrap();
        assert_eq!(parsed.chunks(), cart.chunks());
        assert_eq!(parsed.chunk(chunk::SPRITES).unwrap().data.len(), 0x2000);
        assert!(parsed.chunk(chunk::MAP).is_none());
    }

    #[test]
    fn test_rejects_oversized_chunk() {
        let mut cart = TicCartridge::new();
        let result = cart.add_region(chunk::MAP, 0, &vec![0; 0x10000]);
        assert!(matches!(result, Err(Error::CapacityExceeded { .. })));
        assert!(cart.chunks().is_empty());
    }

    #[test]
    fn test_truncated_cartridge() {
        assert!(TicCartridge::from_bytes(&[0x01, 4, 0, 0, 1]).is_err());
        assert!(TicCartridge::from_bytes(&[0x01, 4]).is_err());
    }
}

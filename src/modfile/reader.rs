//! ProTracker MOD reader

use super::note::period_to_note;
use super::{Event, Module, Pattern, Sample, CHANNELS, ROWS};
use crate::error::{Error, Result};

/// Offset of the format signature in 31-instrument files
const SIGNATURE_OFFSET: usize = 1080;

/// Size of one sample header
const SAMPLE_HEADER_SIZE: usize = 30;

/// Size of the position table
const POSITION_TABLE_SIZE: usize = 128;

/// Size of one stored pattern (64 rows, 4 channels, 4 bytes per cell)
const PATTERN_SIZE: usize = ROWS * CHANNELS * 4;

/// Module flavour derived from the signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModFormat {
    pub signature: &'static str,
    pub description: &'static str,
    pub sample_count: usize,
    pub supported: bool,
}

const FORMATS: &[ModFormat] = &[
    ModFormat {
        signature: "STK.",
        description: "Ultimate Soundtracker (Original) 4 channel / 15 instruments",
        sample_count: 15,
        supported: true,
    },
    ModFormat {
        signature: "M.K.",
        description: "Protracker 4 channel / 31 instruments",
        sample_count: 31,
        supported: true,
    },
    ModFormat {
        signature: "M!K!",
        description: "Protracker 4 channel / 31 instruments / >64 patterns",
        sample_count: 31,
        supported: false,
    },
    ModFormat {
        signature: "FLT4",
        description: "Startracker 4 channel / 31 instruments",
        sample_count: 31,
        supported: true,
    },
    ModFormat {
        signature: "FLT8",
        description: "Startracker 8 channel / 31 instruments",
        sample_count: 31,
        supported: false,
    },
    ModFormat {
        signature: "2CHN",
        description: "Fasttracker 2 channel / 31 instruments",
        sample_count: 31,
        supported: false,
    },
    ModFormat {
        signature: "4CHN",
        description: "Fasttracker 4 channel / 31 instruments",
        sample_count: 31,
        supported: true,
    },
    ModFormat {
        signature: "6CHN",
        description: "Fasttracker 6 channel / 31 instruments",
        sample_count: 31,
        supported: false,
    },
    ModFormat {
        signature: "8CHN",
        description: "Fasttracker 8 channel / 31 instruments",
        sample_count: 31,
        supported: false,
    },
    ModFormat {
        signature: "CD81",
        description: "Atari oktalyzer 8 channel / 31 instruments",
        sample_count: 31,
        supported: false,
    },
    ModFormat {
        signature: "OKTA",
        description: "Atari oktalyzer 8 channel / 31 instruments",
        sample_count: 31,
        supported: false,
    },
    ModFormat {
        signature: "OCTA",
        description: "Atari oktalyzer 8 channel / 31 instruments",
        sample_count: 31,
        supported: false,
    },
    ModFormat {
        signature: "16CN",
        description: "Taketracker 16 channel / 31 instruments",
        sample_count: 31,
        supported: false,
    },
    ModFormat {
        signature: "32CN",
        description: "Taketracker 32 channel / 31 instruments",
        sample_count: 31,
        supported: false,
    },
];

/// Find the format entry for a signature
pub fn lookup_format(signature: &str) -> Option<&'static ModFormat> {
    FORMATS.iter().find(|f| f.signature == signature)
}

/// MOD file reader
pub struct ModReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ModReader<'a> {
    /// Create a new reader from raw module data
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Read a single byte
    pub fn read_u8(&mut self) -> Result<u8> {
        if self.pos >= self.data.len() {
            return Err(Error::ModParse("Unexpected end of data".into()));
        }
        let b = self.data[self.pos];
        self.pos += 1;
        Ok(b)
    }

    /// Read a slice of bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.pos + len > self.data.len() {
            return Err(Error::ModParse("Unexpected end of data".into()));
        }
        let bytes = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    /// Detect the signature; files without a printable one are Soundtracker modules
    fn detect_signature(&self) -> String {
        if self.data.len() < SIGNATURE_OFFSET + 4 {
            return "STK.".to_string();
        }
        let sig = &self.data[SIGNATURE_OFFSET..SIGNATURE_OFFSET + 4];
        if sig.iter().all(|&b| (0x20..0x7F).contains(&b)) {
            String::from_utf8_lossy(sig).into_owned()
        } else {
            "STK.".to_string()
        }
    }

    /// Parse the whole module
    pub fn parse(&mut self) -> Result<Module> {
        if self.data.starts_with(b"PP20") {
            return Err(Error::UnsupportedFormat(
                "PowerPacker compressed module".into(),
            ));
        }

        let signature = self.detect_signature();
        let format = match lookup_format(&signature) {
            Some(f) if f.supported => f,
            Some(f) => {
                return Err(Error::UnsupportedFormat(format!(
                    "{} ({})",
                    f.signature, f.description
                )))
            }
            None => {
                return Err(Error::UnsupportedFormat(format!(
                    "{} (Unknown format)",
                    signature
                )))
            }
        };
        tracing::debug!("{} format detected: {}", format.signature, format.description);

        self.pos = 0;
        let title = parse_string(self.read_bytes(20)?);

        let mut samples = Vec::with_capacity(format.sample_count);
        let mut lengths = Vec::with_capacity(format.sample_count);
        for _ in 0..format.sample_count {
            let (sample, length) = self.parse_sample_header()?;
            samples.push(sample);
            lengths.push(length);
        }

        let position_count = self.read_u8()? as usize;
        if position_count == 0 {
            return Err(Error::ModParse("Empty position list".into()));
        }
        let _restart = self.read_u8()?;
        let table = self.read_bytes(POSITION_TABLE_SIZE)?;
        if format.sample_count == 31 {
            self.read_bytes(4)?;
        }

        // Stored pattern count is one more than the highest entry in the whole table
        let pattern_count = table.iter().copied().max().unwrap_or(0) as usize + 1;
        let positions = table[..position_count.min(POSITION_TABLE_SIZE)].to_vec();

        let mut patterns = Vec::with_capacity(pattern_count);
        for i in 0..pattern_count {
            let data = self.read_bytes(PATTERN_SIZE).map_err(|_| {
                Error::ModParse(format!("Pattern {} is truncated", i))
            })?;
            patterns.push(parse_pattern(data));
        }

        for (sample, wanted) in samples.iter_mut().zip(lengths) {
            let available = (self.data.len() - self.pos).min(wanted);
            if available < wanted {
                tracing::warn!(
                    "Sample '{}' truncated: {} of {} bytes present",
                    sample.name,
                    available,
                    wanted
                );
            }
            let bytes = self.read_bytes(available)?;
            sample
                .data
                .extend(bytes.iter().map(|&b| b as i8 as f64 / 128.0));
        }

        Ok(Module {
            title,
            format: format.signature.to_string(),
            samples,
            patterns,
            positions,
            position_count,
        })
    }

    /// Parse a 30-byte sample header, returning the sample and its data length in bytes
    fn parse_sample_header(&mut self) -> Result<(Sample, usize)> {
        let header = self.read_bytes(SAMPLE_HEADER_SIZE)?;
        let name = parse_string(&header[0..22]);
        let length = u16::from_be_bytes([header[22], header[23]]) as usize * 2;
        let finetune = (header[24] & 0x0F) as i8;
        let finetune = if finetune > 7 { finetune - 16 } else { finetune };
        let volume = header[25].min(64);
        let repeat_from = u16::from_be_bytes([header[26], header[27]]) as usize * 2;
        let repeat_length = u16::from_be_bytes([header[28], header[29]]) as usize * 2;

        let sample = Sample {
            name,
            finetune,
            volume,
            repeat_from,
            repeat_length,
            data: Vec::with_capacity(length),
        };
        Ok((sample, length))
    }
}

/// Decode one stored pattern
fn parse_pattern(data: &[u8]) -> Pattern {
    let mut pattern = Pattern::empty();
    for (i, cell) in data.chunks_exact(4).enumerate() {
        let sample = (cell[0] & 0xF0) | (cell[2] >> 4);
        let period = (((cell[0] & 0x0F) as u16) << 8) | cell[1] as u16;
        let event = Event {
            note: period_to_note(period),
            sample,
            effect: cell[2] & 0x0F,
            param: cell[3],
        };
        pattern.set(i / CHANNELS, i % CHANNELS, event);
    }
    pattern
}

/// Parse a null-terminated string from bytes
fn parse_string(data: &[u8]) -> String {
    let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
    String::from_utf8_lossy(&data[..end]).trim_end().to_string()
}

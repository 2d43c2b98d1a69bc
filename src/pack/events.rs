//! Pattern event records

use crate::config::RecordFormat;
use crate::modfile::{Event, Pattern, CHANNELS, ROWS};

/// Note byte for cells without a note
pub const NO_NOTE: u8 = 255;

/// Serialize every pattern, in pattern-number order, as fixed-size records
pub fn encode_patterns(patterns: &[Pattern], format: RecordFormat) -> Vec<u8> {
    let mut out = Vec::with_capacity(patterns.len() * pattern_size(format));
    for event in patterns.iter().flat_map(|p| p.events()) {
        encode_event(event, format, &mut out);
    }
    out
}

/// Append one record
pub fn encode_event(event: &Event, format: RecordFormat, out: &mut Vec<u8>) {
    out.push(event.note.unwrap_or(NO_NOTE));
    out.push(event.sample);
    if format == RecordFormat::WithEffects {
        out.push(event.effect);
        out.push(event.param);
    }
}

/// Decode the record at the start of `data`
pub fn decode_event(data: &[u8], format: RecordFormat) -> Event {
    let note = match data[0] {
        NO_NOTE => None,
        n => Some(n),
    };
    let (effect, param) = match format {
        RecordFormat::WithEffects => (data[2], data[3]),
        RecordFormat::NotesOnly => (0, 0),
    };
    Event {
        note,
        sample: data[1],
        effect,
        param,
    }
}

/// Bytes per encoded pattern
pub fn pattern_size(format: RecordFormat) -> usize {
    ROWS * CHANNELS * format.size()
}

/// Address of a cell relative to the start of the event stream
pub fn cell_offset(format: RecordFormat, pattern: usize, row: usize, channel: usize) -> usize {
    let record = format.size();
    pattern * ROWS * CHANNELS * record + row * CHANNELS * record + channel * record
}

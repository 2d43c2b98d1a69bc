//! Binary packing of events and frames into the final payload

pub mod events;
pub mod layout;

pub use events::{cell_offset, decode_event, encode_patterns, NO_NOTE};
pub use layout::{Layout, Region};

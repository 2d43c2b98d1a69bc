//! Runtime playback engine

pub mod engine;
pub mod lua;
pub mod memory;
pub mod state;

pub use engine::{read_registers, register_addr, Player, SongTables, REGISTER_BASE};
pub use lua::embed_tables;
pub use memory::{Memory, Ram};
pub use state::{ChannelState, PlayerState, CHANNEL_COUNT};

pub mod cart;
pub mod compiler;
pub mod config;
pub mod error;
pub mod modfile;
pub mod pack;
pub mod player;
pub mod report;
pub mod wavetable;

pub use compiler::{CompiledSong, Compiler};
pub use error::Error;

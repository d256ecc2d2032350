pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::toml_config::TomlConfig;

pub use core::engine::{chunk_channel, ChunkSender, EngineReport, StreamEngine};
pub use core::processor::{ProcessorStats, ShelfSession, StreamProcessor};
pub use utils::error::{Result, ShelfError};

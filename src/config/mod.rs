pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_INPUT: &str = "-";
pub const DEFAULT_PLANOGRAM: &str = "planogram.toml";
pub const DEFAULT_READ_CHUNK_BYTES: usize = 64;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "shelf-weight")]
#[command(about = "Turns the shelf weight board feed into shopping cart updates")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Serial device or file to read, `-` for stdin
    #[arg(long)]
    pub input: Option<String>,

    /// Planogram table (.toml or .json)
    #[arg(long)]
    pub planogram: Option<String>,

    #[arg(long, help = "Input arrives hex-encoded")]
    pub hex: bool,

    /// Append diagnostic snapshots to this JSON-lines file
    #[arg(long)]
    pub diagnostics: Option<String>,

    #[arg(long)]
    pub read_chunk_bytes: Option<usize>,

    /// Drop a partial line once it grows past this many bytes
    #[arg(long)]
    pub max_line_bytes: Option<usize>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log as JSON lines")]
    pub json_logs: bool,

    #[arg(long, help = "Log process CPU/memory stats")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        self.input.as_deref().unwrap_or(DEFAULT_INPUT)
    }

    fn planogram_path(&self) -> &str {
        self.planogram.as_deref().unwrap_or(DEFAULT_PLANOGRAM)
    }

    fn hex_input(&self) -> bool {
        self.hex
    }

    fn read_chunk_bytes(&self) -> usize {
        self.read_chunk_bytes.unwrap_or(DEFAULT_READ_CHUNK_BYTES)
    }

    fn max_line_bytes(&self) -> Option<usize> {
        self.max_line_bytes
    }

    fn diagnostics_enabled(&self) -> bool {
        self.diagnostics.is_some() || self.verbose
    }

    fn diagnostics_path(&self) -> Option<&str> {
        self.diagnostics.as_deref()
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input", self.input_path())?;
        validation::validate_path("planogram", self.planogram_path())?;
        validation::validate_file_extensions(
            "planogram",
            &[self.planogram_path().to_string()],
            &["toml", "json"],
        )?;
        validation::validate_positive_number("read_chunk_bytes", self.read_chunk_bytes(), 1)?;
        if let Some(max) = self.max_line_bytes {
            validation::validate_positive_number("max_line_bytes", max, 16)?;
        }
        if let Some(path) = &self.diagnostics {
            validation::validate_path("diagnostics", path)?;
        }
        Ok(())
    }
}

use crate::adapters::source::InputEncoding;
use crate::config::{DEFAULT_PLANOGRAM, DEFAULT_READ_CHUNK_BYTES};
use crate::core::ConfigProvider;
use crate::utils::error::{Result, ShelfError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub source: SourceConfig,
    pub planogram: Option<PlanogramConfig>,
    pub engine: Option<EngineConfig>,
    pub diagnostics: Option<DiagnosticsConfig>,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// 裝置節點或檔案，`-` 為 stdin
    pub path: String,
    /// `text` 或 `hex`
    pub encoding: Option<String>,
    pub read_chunk_bytes: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanogramConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub max_line_bytes: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    pub enabled: bool,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ShelfError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// 替換環境變數 (例如 ${SHELF_DEVICE})，找不到的保留原字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ShelfError::ConfigError {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 命令列參數優先於檔案
    #[cfg(feature = "cli")]
    pub fn apply_overrides(&mut self, cli: &crate::config::CliConfig) {
        if let Some(input) = &cli.input {
            self.source.path = input.clone();
        }
        if cli.hex {
            self.source.encoding = Some("hex".to_string());
        }
        if let Some(bytes) = cli.read_chunk_bytes {
            self.source.read_chunk_bytes = Some(bytes);
        }
        if let Some(path) = &cli.planogram {
            self.planogram = Some(PlanogramConfig { path: path.clone() });
        }
        if let Some(max) = cli.max_line_bytes {
            self.engine = Some(EngineConfig {
                max_line_bytes: Some(max),
            });
        }
        if let Some(path) = &cli.diagnostics {
            self.diagnostics = Some(DiagnosticsConfig {
                enabled: true,
                path: Some(path.clone()),
            });
        }
        if cli.monitor {
            let json_logs = self.monitoring.as_ref().and_then(|m| m.json_logs);
            self.monitoring = Some(MonitoringConfig {
                enabled: true,
                json_logs,
            });
        }
    }

    pub fn input_encoding(&self) -> Result<InputEncoding> {
        match self.source.encoding.as_deref().unwrap_or("text") {
            "text" => Ok(InputEncoding::Text),
            "hex" => Ok(InputEncoding::Hex),
            other => Err(ShelfError::InvalidConfigValueError {
                field: "source.encoding".to_string(),
                value: other.to_string(),
                reason: "Supported encodings: text, hex".to_string(),
            }),
        }
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("source.path", &self.source.path)?;
        self.input_encoding()?;

        if let Some(bytes) = self.source.read_chunk_bytes {
            validation::validate_range("source.read_chunk_bytes", bytes, 1, 64 * 1024)?;
        }

        validation::validate_path("planogram.path", self.planogram_path())?;
        validation::validate_file_extensions(
            "planogram.path",
            &[self.planogram_path().to_string()],
            &["toml", "json"],
        )?;

        if let Some(max) = self.max_line_bytes() {
            validation::validate_range("engine.max_line_bytes", max, 16, 1 << 20)?;
        }

        if let Some(diagnostics) = &self.diagnostics {
            if let Some(path) = &diagnostics.path {
                validation::validate_path("diagnostics.path", path)?;
            }
        }

        Ok(())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.source.path
    }

    fn planogram_path(&self) -> &str {
        self.planogram
            .as_ref()
            .map(|p| p.path.as_str())
            .unwrap_or(DEFAULT_PLANOGRAM)
    }

    fn hex_input(&self) -> bool {
        matches!(self.input_encoding(), Ok(InputEncoding::Hex))
    }

    fn read_chunk_bytes(&self) -> usize {
        self.source.read_chunk_bytes.unwrap_or(DEFAULT_READ_CHUNK_BYTES)
    }

    fn max_line_bytes(&self) -> Option<usize> {
        self.engine.as_ref().and_then(|e| e.max_line_bytes)
    }

    fn diagnostics_enabled(&self) -> bool {
        self.diagnostics.as_ref().map(|d| d.enabled).unwrap_or(false)
    }

    fn diagnostics_path(&self) -> Option<&str> {
        self.diagnostics
            .as_ref()
            .filter(|d| d.enabled)
            .and_then(|d| d.path.as_deref())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

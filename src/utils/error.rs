use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShelfError {
    #[error("Malformed record: {message}")]
    ParseError { line: String, message: String },

    #[error("Product '{product}' not found on shelf {}", .shelf.as_deref().unwrap_or("N/A"))]
    LookupError {
        product: String,
        shelf: Option<String>,
    },

    #[error("False {action} action on '{product}' prevented: weight check {weight_check:.2}g exceeds {margin}g")]
    ValidationReject {
        product: String,
        action: String,
        weight_check: f64,
        margin: f64,
    },

    #[error("Duplicate {action} on '{product_id}' suppressed")]
    DuplicateSuppressed { product_id: String, action: String },

    #[error("Cart update failed: {message}")]
    CartError { message: String },

    #[error("Transport error: {message}")]
    TransportError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

pub type Result<T> = std::result::Result<T, ShelfError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// 單行資料問題，丟棄後繼續
    Record,
    /// 容差檢查或重複抑制
    Decision,
    /// 序列埠/輸入來源
    Transport,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ShelfError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ShelfError::ParseError { .. } | ShelfError::LookupError { .. } => ErrorCategory::Record,
            ShelfError::ValidationReject { .. } | ShelfError::DuplicateSuppressed { .. } => {
                ErrorCategory::Decision
            }
            ShelfError::TransportError { .. } => ErrorCategory::Transport,
            ShelfError::TomlError(_)
            | ShelfError::ConfigError { .. }
            | ShelfError::InvalidConfigValueError { .. }
            | ShelfError::MissingConfigError { .. } => ErrorCategory::Configuration,
            ShelfError::CartError { .. }
            | ShelfError::IoError(_)
            | ShelfError::SerializationError(_)
            | ShelfError::CsvError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ShelfError::DuplicateSuppressed { .. } | ShelfError::ValidationReject { .. } => {
                ErrorSeverity::Low
            }
            ShelfError::ParseError { .. }
            | ShelfError::LookupError { .. }
            | ShelfError::CartError { .. } => ErrorSeverity::Medium,
            ShelfError::ConfigError { .. }
            | ShelfError::InvalidConfigValueError { .. }
            | ShelfError::MissingConfigError { .. }
            | ShelfError::TomlError(_)
            | ShelfError::CsvError(_)
            | ShelfError::SerializationError(_) => ErrorSeverity::High,
            ShelfError::TransportError { .. } | ShelfError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Record => "Check the sensor board firmware output and the planogram table",
            ErrorCategory::Decision => "No action needed; the reading was treated as sensor noise",
            ErrorCategory::Transport => {
                "Reconnect the weight board and check device permissions, then restart"
            }
            ErrorCategory::Configuration => "Fix the configuration file or command line flags",
            ErrorCategory::System => "Check file paths and disk permissions",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ShelfError::TransportError { message } => {
                format!("Weight board is not reachable: {}", message)
            }
            ShelfError::InvalidConfigValueError { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            ShelfError::MissingConfigError { field } => {
                format!("Setting '{}' is required", field)
            }
            other => other.to_string(),
        }
    }
}

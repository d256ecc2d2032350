use crate::domain::model::TIMESTAMP_FORMAT;
use crate::domain::ports::Clock;

/// 本地時間
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_timestamp(&self) -> String {
        chrono::Local::now().format(TIMESTAMP_FORMAT).to_string()
    }
}

/// 測試用的固定時間
#[derive(Debug, Clone)]
pub struct FixedClock {
    timestamp: String,
}

impl FixedClock {
    pub fn new(timestamp: &str) -> Self {
        Self {
            timestamp: timestamp.to_string(),
        }
    }
}

impl Clock for FixedClock {
    fn now_timestamp(&self) -> String {
        self.timestamp.clone()
    }
}

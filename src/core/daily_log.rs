//! 秤重板每天寫一份紀錄檔，每行是 `<YYYY-MM-DD HH:MM:SS> <json>`：
//!
//! ```text
//! 2025-11-11 13:13:36 {"grams":-969.4,"product":"I9","event":"Removal"}
//! ```
//!
//! 這裡負責解析與換日清檔，跟即時串流無關。

use crate::domain::model::TIMESTAMP_FORMAT;
use crate::utils::error::{Result, ShelfError};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_LOG_DIR: &str = "./weight logs";

const TIMESTAMP_LEN: usize = 19;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLogRecord {
    pub timestamp: NaiveDateTime,
    pub grams: f64,
    pub product: String,
    /// 例如 `Removal`
    pub event: String,
}

#[derive(Debug, Deserialize)]
struct LogPayload {
    grams: f64,
    product: String,
    #[serde(default)]
    event: Option<String>,
}

pub fn parse_log_line(line: &str) -> Result<DailyLogRecord> {
    let line = line.trim();
    let parse_error = |message: String| ShelfError::ParseError {
        line: line.to_string(),
        message,
    };

    let stamp = line
        .get(..TIMESTAMP_LEN)
        .ok_or_else(|| parse_error("line too short for a timestamp".to_string()))?;
    let timestamp = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT)
        .map_err(|e| parse_error(format!("bad timestamp: {}", e)))?;

    let json_start = line
        .find('{')
        .ok_or_else(|| parse_error("no JSON payload".to_string()))?;
    let payload: LogPayload = serde_json::from_str(&line[json_start..])
        .map_err(|e| parse_error(format!("bad payload: {}", e)))?;

    Ok(DailyLogRecord {
        timestamp,
        grams: payload.grams,
        product: payload.product,
        event: payload.event.unwrap_or_default(),
    })
}

/// 空行略過，壞掉的行記警告後略過
pub fn parse_log(contents: &str) -> Vec<DailyLogRecord> {
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match parse_log_line(line) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping log line: {}", e);
                None
            }
        })
        .collect()
}

/// 最後一行的日期早於今天就要清
pub fn needs_rotation(contents: &str, today: NaiveDate) -> bool {
    let Some(last) = contents.lines().rev().find(|line| !line.trim().is_empty()) else {
        return false;
    };

    match last
        .split_whitespace()
        .next()
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
    {
        Some(date) => date < today,
        None => {
            tracing::warn!("Last log line has no readable date: {:?}", last);
            false
        }
    }
}

/// 過期就把檔案清空，回傳有沒有清
pub fn rotate_if_stale<P: AsRef<Path>>(path: P, today: NaiveDate) -> Result<bool> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;

    if needs_rotation(&contents, today) {
        std::fs::write(path, "")?;
        tracing::info!("🧹 Cleared stale weight log {}", path.display());
        Ok(true)
    } else {
        tracing::info!("Weight log {} is up to date", path.display());
        Ok(false)
    }
}

/// 目錄下第一個 `.txt` (依檔名排序)
pub fn find_log_file<P: AsRef<Path>>(dir: P) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("txt"))
        .collect();
    candidates.sort();

    candidates
        .into_iter()
        .next()
        .ok_or_else(|| ShelfError::MissingConfigError {
            field: format!("weight log (.txt) in {}", dir.display()),
        })
}

/// 匯出成 CSV
pub fn write_csv<W: std::io::Write>(records: &[DailyLogRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(["timestamp", "grams", "product", "event"])?;
    for record in records {
        csv_writer.write_record([
            record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            record.grams.to_string(),
            record.product.clone(),
            record.event.clone(),
        ])?;
    }
    csv_writer.flush()?;
    Ok(())
}

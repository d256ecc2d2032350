//! 判斷一筆 take/put 是真的有人動了商品，還是秤的雜訊。
//!
//! 兩個固定容差：
//! - 拿起的重量要和目錄標稱重量大致抵銷 (±50g)；放回的重量要和
//!   最近一次拿起的重量抵銷 (±50g)。
//! - 同一商品新的拿起重量要和上一筆紀錄相差 20g 以內才記入歷史。

use crate::core::history::WeightHistory;
use crate::domain::model::{Action, ProductEntry, StackEntry, WeightEvent};
use crate::utils::error::{Result, ShelfError};

pub const SIMILAR_WEIGHT_MARGIN: f64 = 20.0;
pub const TAKE_ERROR_MARGIN: f64 = 50.0;

/// 放回時拿來比對的重量從哪裡來
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchSource {
    /// 歷史中最近一次拿起
    History,
    /// 歷史中沒有紀錄，改用目錄標稱重量
    Catalog,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Take {
        weight_check: f64,
    },
    Put {
        matched_weight: f64,
        source: MatchSource,
        weight_check: f64,
    },
}

pub fn classify(
    history: &WeightHistory,
    event: &WeightEvent,
    product: &ProductEntry,
) -> Result<Verdict> {
    match event.action {
        Action::Take => {
            let weight_check = product.nominal_weight + event.grams;
            if !within(weight_check, TAKE_ERROR_MARGIN) {
                return Err(reject(event, weight_check));
            }
            Ok(Verdict::Take { weight_check })
        }
        Action::Put => {
            let (matched_weight, source) = match history.most_recent_weight(&event.product) {
                Some(weight) => (weight, MatchSource::History),
                None => (-product.nominal_weight, MatchSource::Catalog),
            };
            let weight_check = matched_weight + event.grams;
            if !within(weight_check, TAKE_ERROR_MARGIN) {
                return Err(reject(event, weight_check));
            }
            Ok(Verdict::Put {
                matched_weight,
                source,
                weight_check,
            })
        }
    }
}

/// 沒有前一筆紀錄時一律算相似
pub fn is_similar_weight(previous: Option<f64>, weight: f64) -> bool {
    match previous {
        Some(previous) => within(previous.abs() - weight.abs(), SIMILAR_WEIGHT_MARGIN),
        None => true,
    }
}

/// 先推入，不相似就撤回。回傳是否保留
pub fn record_take(history: &mut WeightHistory, event: &WeightEvent) -> bool {
    let previous = history.most_recent_weight(&event.product);
    history.push(StackEntry {
        product: event.product.clone(),
        weight: event.grams,
    });

    if is_similar_weight(previous, event.grams) {
        return true;
    }

    history.pop();
    tracing::debug!(
        "Take of {}g on '{}' differs from last recorded {:?}g, not kept",
        event.grams,
        event.product,
        previous
    );
    false
}

fn within(value: f64, margin: f64) -> bool {
    (-margin..=margin).contains(&value)
}

fn reject(event: &WeightEvent, weight_check: f64) -> ShelfError {
    ShelfError::ValidationReject {
        product: event.product.clone(),
        action: event.action.to_string(),
        weight_check,
        margin: TAKE_ERROR_MARGIN,
    }
}

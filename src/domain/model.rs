use serde::{Deserialize, Serialize};
use std::fmt;

/// 事件與紀錄檔共用的時間格式
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 秤重板回報的動作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// 商品被拿起 (重量減少)
    Take,
    /// 商品被放回 (重量增加)
    Put,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Take => "take",
            Action::Put => "put",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 解析完成的一筆感測事件，建立後不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEvent {
    /// `YYYY-MM-DD HH:MM:SS`，收到該行時的本地時間
    pub timestamp: String,
    pub product: String,
    /// 重量變化，負值為拿起、正值為放回
    pub grams: f64,
    pub action: Action,
    pub shelf: Option<String>,
}

/// 尚未被放回配對的一次拿起
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackEntry {
    pub product: String,
    pub weight: f64,
}

/// 目錄解析後的商品資料 (外部提供，核心只讀)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductEntry {
    pub product_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub shelf: Option<String>,
    /// 目錄上的標稱重量 (g)
    #[serde(alias = "grams")]
    pub nominal_weight: f64,
}

/// 購物車內的一項商品
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub cart_id: u64,
    pub product_id: String,
    pub product: ProductEntry,
    pub added_at: String,
    pub weight_event: f64,
    pub shelf: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum CartOp {
    Add,
    Remove { cart_id: u64 },
}

/// 對購物車的一次變更，每個確認的實體動作最多一筆
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartCommand {
    #[serde(flatten)]
    pub op: CartOp,
    pub product: ProductEntry,
    pub timestamp: String,
    /// 觸發這次變更的重量讀數
    pub weight_event: f64,
    pub shelf: Option<String>,
    /// 事件回報的層架與目錄一致
    pub shelf_confirmed: bool,
}

impl CartCommand {
    pub fn product_id(&self) -> &str {
        &self.product.product_id
    }

    pub fn is_add(&self) -> bool {
        matches!(self.op, CartOp::Add)
    }
}

/// 每筆 take/put 處理完後輸出的觀測快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticSnapshot {
    pub timestamp: String,
    pub history_size: usize,
    pub history_contents: Vec<StackEntry>,
    pub cart_length: usize,
    pub product: String,
    pub grams: f64,
    pub action: Action,
    pub shelf: Option<String>,
    pub top_of_history: Option<StackEntry>,
}

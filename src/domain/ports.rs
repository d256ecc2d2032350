use crate::domain::model::{CartCommand, CartItem, DiagnosticSnapshot, ProductEntry, WeightEvent};
use crate::utils::error::Result;
use async_trait::async_trait;
use tokio::sync::mpsc::UnboundedSender;

/// 商品位置解析 (planogram)
pub trait CatalogResolver: Send + Sync {
    fn resolve(&self, product: &str, shelf: Option<&str>) -> Option<ProductEntry>;
}

/// 外部購物車。讀取沒有加鎖保護，外部同時修改屬已知風險
pub trait CartStore: Send {
    /// 目前購物車內容，依加入順序
    fn items(&self) -> Vec<CartItem>;

    fn apply(&mut self, command: &CartCommand) -> Result<()>;

    /// 原始感測紀錄，無論是否觸發變更
    fn record_weight_event(&mut self, _event: &WeightEvent) {}

    fn len(&self) -> usize {
        self.items().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains_product(&self, product_id: &str) -> bool {
        self.items().iter().any(|item| item.product_id == product_id)
    }

    fn find_product(&self, product_id: &str) -> Option<CartItem> {
        self.items()
            .into_iter()
            .find(|item| item.product_id == product_id)
    }
}

/// 觀測用輸出，實作自行吞掉錯誤
pub trait DiagnosticSink: Send {
    fn record(&mut self, snapshot: &DiagnosticSnapshot);
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for Box<T> {
    fn record(&mut self, snapshot: &DiagnosticSnapshot) {
        (**self).record(snapshot)
    }
}

pub trait Clock: Send + Sync {
    /// `YYYY-MM-DD HH:MM:SS`
    fn now_timestamp(&self) -> String;
}

/// 原始資料來源 (序列埠、檔案、stdin)，把讀到的片段推進佇列
#[async_trait]
pub trait ChunkSource: Send {
    /// 讀到 EOF 為止，回傳推送的片段數
    async fn pump(&mut self, sink: UnboundedSender<Vec<u8>>) -> Result<u64>;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn planogram_path(&self) -> &str;
    fn hex_input(&self) -> bool;
    fn read_chunk_bytes(&self) -> usize;
    fn max_line_bytes(&self) -> Option<usize>;
    fn diagnostics_enabled(&self) -> bool;
    fn diagnostics_path(&self) -> Option<&str>;
}

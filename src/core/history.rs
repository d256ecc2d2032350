use crate::domain::model::StackEntry;

/// 尚未配對的拿起紀錄，最新的在最後。
/// 同一商品可以有多筆；查詢與移除都以商品為準，最新的優先，
/// 不管它在堆疊中的實際位置。
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WeightHistory {
    items: Vec<StackEntry>,
}

impl WeightHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: StackEntry) {
        self.items.push(entry);
    }

    pub fn pop(&mut self) -> Option<StackEntry> {
        self.items.pop()
    }

    pub fn peek(&self) -> Option<&StackEntry> {
        self.items.last()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn most_recent_weight(&self, product: &str) -> Option<f64> {
        self.items
            .iter()
            .rev()
            .find(|entry| entry.product == product)
            .map(|entry| entry.weight)
    }

    /// 回傳移除的筆數
    pub fn remove_all(&mut self, product: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|entry| entry.product != product);
        before - self.items.len()
    }

    pub fn entries(&self) -> &[StackEntry] {
        &self.items
    }
}

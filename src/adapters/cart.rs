use crate::domain::model::{CartCommand, CartItem, CartOp, WeightEvent};
use crate::domain::ports::CartStore;
use crate::utils::error::{Result, ShelfError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// 原始紀錄保留筆數
const MAX_WEIGHT_LOG: usize = 1000;

#[derive(Debug, Default)]
struct CartState {
    items: Vec<CartItem>,
    next_cart_id: u64,
    weight_log: VecDeque<WeightEvent>,
}

/// 記憶體內的購物車，clone 之後共用同一份內容 (給 UI 或測試從外面改)
#[derive(Debug, Clone, Default)]
pub struct SharedCart {
    state: Arc<Mutex<CartState>>,
}

impl SharedCart {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 結帳或手動清空
    pub fn clear(&self) {
        self.lock().items.clear();
    }

    pub fn weight_log(&self) -> Vec<WeightEvent> {
        self.lock().weight_log.iter().cloned().collect()
    }
}

impl CartStore for SharedCart {
    fn items(&self) -> Vec<CartItem> {
        self.lock().items.clone()
    }

    fn apply(&mut self, command: &CartCommand) -> Result<()> {
        let mut state = self.lock();
        match command.op {
            CartOp::Add => {
                state.next_cart_id += 1;
                let cart_id = state.next_cart_id;
                state.items.push(CartItem {
                    cart_id,
                    product_id: command.product.product_id.clone(),
                    product: command.product.clone(),
                    added_at: command.timestamp.clone(),
                    weight_event: command.weight_event,
                    shelf: command.shelf.clone(),
                });
            }
            CartOp::Remove { cart_id } => {
                let position = state
                    .items
                    .iter()
                    .position(|item| item.cart_id == cart_id)
                    .ok_or_else(|| ShelfError::CartError {
                        message: format!("cart entry {} no longer exists", cart_id),
                    })?;
                state.items.remove(position);
            }
        }
        Ok(())
    }

    fn record_weight_event(&mut self, event: &WeightEvent) {
        let mut state = self.lock();
        if state.weight_log.len() >= MAX_WEIGHT_LOG {
            state.weight_log.pop_front();
        }
        state.weight_log.push_back(event.clone());
    }

    fn len(&self) -> usize {
        self.lock().items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Action, ProductEntry};

    fn add_command(product_id: &str) -> CartCommand {
        CartCommand {
            op: CartOp::Add,
            product: ProductEntry {
                product_id: product_id.to_string(),
                name: None,
                shelf: None,
                nominal_weight: 100.0,
            },
            timestamp: "2025-11-11 13:13:36".to_string(),
            weight_event: -100.0,
            shelf: None,
            shelf_confirmed: false,
        }
    }

    #[test]
    fn test_clones_share_contents() {
        let mut cart = SharedCart::new();
        let view = cart.clone();

        cart.apply(&add_command("P-1")).unwrap();
        cart.apply(&add_command("P-2")).unwrap();

        assert_eq!(view.len(), 2);
        assert_eq!(view.find_product("P-2").unwrap().cart_id, 2);

        view.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_unknown_cart_id_fails() {
        let mut cart = SharedCart::new();
        let mut remove = add_command("P-1");
        remove.op = CartOp::Remove { cart_id: 42 };
        assert!(cart.apply(&remove).is_err());
    }

    #[test]
    fn test_weight_log_is_bounded() {
        let mut cart = SharedCart::new();
        for i in 0..(MAX_WEIGHT_LOG + 5) {
            cart.record_weight_event(&WeightEvent {
                timestamp: "2025-11-11 13:13:36".to_string(),
                product: "A1".to_string(),
                grams: -(i as f64),
                action: Action::Take,
                shelf: None,
            });
        }

        let log = cart.weight_log();
        assert_eq!(log.len(), MAX_WEIGHT_LOG);
        // 最舊的五筆被擠掉
        assert_eq!(log[0].grams, -5.0);
        assert_eq!(log[MAX_WEIGHT_LOG - 1].grams, -((MAX_WEIGHT_LOG + 4) as f64));
    }
}

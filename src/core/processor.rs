use crate::core::disambiguator::{classify, record_take, Verdict};
use crate::core::framing::FrameReassembler;
use crate::core::history::WeightHistory;
use crate::core::parser::parse_event;
use crate::core::trigger::{fire_put, fire_take, resolve_product};
use crate::domain::model::{CartCommand, DiagnosticSnapshot, WeightEvent};
use crate::domain::ports::{CartStore, CatalogResolver, Clock, DiagnosticSink};
use crate::utils::error::{Result, ShelfError};
use serde::Serialize;

/// 一次購物的狀態，由呼叫端持有。兩個 session 之間不共享任何東西
#[derive(Debug, Default, Clone)]
pub struct ShelfSession {
    frames: FrameReassembler,
    history: WeightHistory,
    last_cart_len: usize,
}

impl ShelfSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_bytes(max_line_bytes: Option<usize>) -> Self {
        Self {
            frames: FrameReassembler::with_max_line_bytes(max_line_bytes),
            ..Self::default()
        }
    }

    pub fn history(&self) -> &WeightHistory {
        &self.history
    }

    pub fn frames(&self) -> &FrameReassembler {
        &self.frames
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProcessorStats {
    pub lines: u64,
    pub commands: u64,
    pub parse_errors: u64,
    pub lookup_errors: u64,
    pub rejected: u64,
    pub suppressed: u64,
    pub cart_errors: u64,
    pub history_resets: u64,
}

/// 把一段段原始資料轉成購物車變更。
/// 每一行依序走 解析 → 查目錄 → 容差判斷 → (更新歷史 | 拒絕) → (發出變更 | 抑制)，
/// 單行的任何錯誤都只影響該行。
pub struct StreamProcessor<R, C, D, K> {
    catalog: R,
    cart: C,
    diagnostics: D,
    clock: K,
    stats: ProcessorStats,
}

impl<R, C, D, K> StreamProcessor<R, C, D, K>
where
    R: CatalogResolver,
    C: CartStore,
    D: DiagnosticSink,
    K: Clock,
{
    pub fn new(catalog: R, cart: C, diagnostics: D, clock: K) -> Self {
        Self {
            catalog,
            cart,
            diagnostics,
            clock,
            stats: ProcessorStats::default(),
        }
    }

    pub fn cart(&self) -> &C {
        &self.cart
    }

    pub fn stats(&self) -> ProcessorStats {
        self.stats
    }

    pub fn process_chunk(&mut self, session: &mut ShelfSession, chunk: &[u8]) -> Vec<CartCommand> {
        let lines = session.frames.feed_bytes(chunk);

        lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .filter_map(|line| self.process_line(session, line).ok())
            .collect()
    }

    /// 處理一行完整資料；錯誤已在這裡記錄與計數
    pub fn process_line(&mut self, session: &mut ShelfSession, line: &str) -> Result<CartCommand> {
        self.stats.lines += 1;

        let result = self.handle_line(session, line);
        match &result {
            Ok(command) => {
                self.stats.commands += 1;
                tracing::info!(
                    "🛒 {} '{}' ({}g, shelf {})",
                    if command.is_add() { "Added" } else { "Removed" },
                    command.product_id(),
                    command.weight_event,
                    command.shelf.as_deref().unwrap_or("N/A")
                );
            }
            Err(e) => self.note_error(e),
        }
        result
    }

    fn handle_line(&mut self, session: &mut ShelfSession, line: &str) -> Result<CartCommand> {
        // 外部可能已經清空購物車
        self.sync_session(session);

        let event = parse_event(line, &self.clock.now_timestamp())?;
        self.cart.record_weight_event(&event);

        let resolved = resolve_product(&self.catalog, &event)?;

        let outcome = match classify(&session.history, &event, &resolved.entry) {
            Ok(Verdict::Take { .. }) => {
                let command = fire_take(&mut self.cart, &resolved, &event);
                record_take(&mut session.history, &event);
                command
            }
            Ok(Verdict::Put { .. }) => {
                let command = fire_put(&mut self.cart, &resolved, &event);
                session.history.remove_all(&event.product);
                command
            }
            Err(e) => Err(e),
        };

        self.sync_session(session);
        self.emit_snapshot(session, &event);
        outcome
    }

    /// 購物車空了就結束這一輪，清掉所有未配對的拿起
    fn sync_session(&mut self, session: &mut ShelfSession) {
        let cart_len = self.cart.len();
        if cart_len == 0 && !session.history.is_empty() {
            tracing::info!(
                "Cart is empty, clearing {} unresolved weight entries",
                session.history.size()
            );
            session.history.clear();
            self.stats.history_resets += 1;
        } else if cart_len == 0 && session.last_cart_len > 0 {
            tracing::debug!("Cart emptied, weight history already clear");
        }
        session.last_cart_len = cart_len;
    }

    fn emit_snapshot(&mut self, session: &ShelfSession, event: &WeightEvent) {
        let snapshot = DiagnosticSnapshot {
            timestamp: self.clock.now_timestamp(),
            history_size: session.history.size(),
            history_contents: session.history.entries().to_vec(),
            cart_length: self.cart.len(),
            product: event.product.clone(),
            grams: event.grams,
            action: event.action,
            shelf: event.shelf.clone(),
            top_of_history: session.history.peek().cloned(),
        };
        self.diagnostics.record(&snapshot);
    }

    fn note_error(&mut self, error: &ShelfError) {
        match error {
            ShelfError::ParseError { line, message } => {
                self.stats.parse_errors += 1;
                tracing::warn!("Dropping malformed line {:?}: {}", line, message);
            }
            ShelfError::LookupError { .. } => {
                self.stats.lookup_errors += 1;
                tracing::warn!("{}", error);
            }
            ShelfError::ValidationReject { .. } => {
                self.stats.rejected += 1;
                tracing::info!("{}", error);
            }
            ShelfError::DuplicateSuppressed { .. } => {
                self.stats.suppressed += 1;
                tracing::debug!("{}", error);
            }
            other => {
                self.stats.cart_errors += 1;
                tracing::error!("❌ Cart update failed: {}", other);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::cart::SharedCart;
    use crate::adapters::clock::FixedClock;
    use crate::adapters::diagnostics::MemoryDiagnostics;
    use crate::domain::model::{CartOp, ProductEntry};
    use std::collections::HashMap;

    struct TestCatalog(HashMap<String, ProductEntry>);

    impl TestCatalog {
        fn new() -> Self {
            let mut products = HashMap::new();
            for (code, id, grams) in [("A1", "P-A", 490.0), ("B2", "P-B", 250.0)] {
                products.insert(
                    code.to_string(),
                    ProductEntry {
                        product_id: id.to_string(),
                        name: None,
                        shelf: Some("1".to_string()),
                        nominal_weight: grams,
                    },
                );
            }
            Self(products)
        }
    }

    impl CatalogResolver for TestCatalog {
        fn resolve(&self, product: &str, _shelf: Option<&str>) -> Option<ProductEntry> {
            self.0.get(product).cloned()
        }
    }

    type TestProcessor = StreamProcessor<TestCatalog, SharedCart, MemoryDiagnostics, FixedClock>;

    fn processor() -> (TestProcessor, SharedCart, MemoryDiagnostics) {
        let cart = SharedCart::new();
        let diagnostics = MemoryDiagnostics::new();
        let processor = StreamProcessor::new(
            TestCatalog::new(),
            cart.clone(),
            diagnostics.clone(),
            FixedClock::new("2025-11-11 13:13:36"),
        );
        (processor, cart, diagnostics)
    }

    fn line(action: &str, product: &str, grams: f64) -> String {
        format!(
            r#"{{"action":"{}","product":"{}","grams":{},"shelf":"1"}}"#,
            action, product, grams
        )
    }

    #[test]
    fn test_take_issues_single_add() {
        let (mut processor, cart, _) = processor();
        let mut session = ShelfSession::new();

        let first = processor.process_line(&mut session, &line("take", "A1", -500.0));
        let replay = processor.process_line(&mut session, &line("take", "A1", -500.0));

        assert!(first.unwrap().is_add());
        assert!(matches!(replay, Err(ShelfError::DuplicateSuppressed { .. })));
        assert_eq!(cart.len(), 1);
        assert_eq!(processor.stats().commands, 1);
        assert_eq!(processor.stats().suppressed, 1);
    }

    #[test]
    fn test_put_boundary_accepts_exact_margin() {
        let (mut processor, cart, _) = processor();
        let mut session = ShelfSession::new();

        processor
            .process_line(&mut session, &line("take", "A1", -500.0))
            .unwrap();
        let command = processor
            .process_line(&mut session, &line("put", "A1", 550.0))
            .unwrap();

        assert!(matches!(command.op, CartOp::Remove { .. }));
        assert!(cart.is_empty());
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_put_boundary_rejects_past_margin() {
        let (mut processor, cart, _) = processor();
        let mut session = ShelfSession::new();

        processor
            .process_line(&mut session, &line("take", "A1", -500.0))
            .unwrap();
        let result = processor.process_line(&mut session, &line("put", "A1", 550.01));

        assert!(matches!(result, Err(ShelfError::ValidationReject { .. })));
        assert_eq!(cart.len(), 1);
        assert_eq!(session.history().most_recent_weight("A1"), Some(-500.0));
    }

    #[test]
    fn test_take_history_similarity_boundary() {
        let (mut processor, _, _) = processor();
        let mut session = ShelfSession::new();

        let _ = processor.process_line(&mut session, &line("take", "A1", -500.0));
        let _ = processor.process_line(&mut session, &line("take", "A1", -480.0));
        assert_eq!(session.history().size(), 2);

        let _ = processor.process_line(&mut session, &line("take", "A1", -500.0));
        let _ = processor.process_line(&mut session, &line("take", "A1", -479.99));
        assert_eq!(session.history().size(), 3);
        assert_eq!(session.history().most_recent_weight("A1"), Some(-500.0));
    }

    #[test]
    fn test_history_cleared_when_cart_emptied_externally() {
        let (mut processor, cart, _) = processor();
        let mut session = ShelfSession::new();

        processor
            .process_line(&mut session, &line("take", "A1", -500.0))
            .unwrap();
        processor
            .process_line(&mut session, &line("take", "B2", -250.0))
            .unwrap();
        assert_eq!(session.history().size(), 2);

        // 收銀員在別的畫面把購物車清空
        cart.clear();

        let result = processor.process_line(&mut session, &line("put", "B2", 250.0));
        assert!(matches!(result, Err(ShelfError::DuplicateSuppressed { .. })));
        assert!(session.history().is_empty());
        assert_eq!(processor.stats().history_resets, 1);
    }

    #[test]
    fn test_put_that_empties_cart_clears_leftover_history() {
        let (mut processor, cart, _) = processor();
        let mut session = ShelfSession::new();

        processor
            .process_line(&mut session, &line("take", "A1", -500.0))
            .unwrap();
        processor
            .process_line(&mut session, &line("take", "B2", -250.0))
            .unwrap();

        // 店員手動把 B2 從購物車移掉，秤上的紀錄還在
        let item = cart.find_product("P-B").unwrap();
        let mut handle = cart.clone();
        handle
            .apply(&CartCommand {
                op: CartOp::Remove {
                    cart_id: item.cart_id,
                },
                product: item.product.clone(),
                timestamp: "2025-11-11 13:14:00".to_string(),
                weight_event: 0.0,
                shelf: None,
                shelf_confirmed: false,
            })
            .unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(session.history().size(), 2);

        let command = processor
            .process_line(&mut session, &line("put", "A1", 500.0))
            .unwrap();

        assert!(matches!(command.op, CartOp::Remove { .. }));
        assert!(cart.is_empty());
        assert!(session.history().is_empty());
        assert_eq!(session.history().most_recent_weight("B2"), None);
        assert_eq!(processor.stats().history_resets, 1);
    }

    #[test]
    fn test_invalid_line_does_not_stop_chunk() {
        let (mut processor, cart, _) = processor();
        let mut session = ShelfSession::new();

        let chunk = format!("{{not json\n\n{}\n", line("take", "A1", -500.0));
        let commands = processor.process_chunk(&mut session, chunk.as_bytes());

        assert_eq!(commands.len(), 1);
        assert_eq!(cart.len(), 1);
        assert_eq!(processor.stats().parse_errors, 1);
        assert_eq!(processor.stats().lines, 2);
    }

    #[test]
    fn test_unknown_product_is_dropped() {
        let (mut processor, cart, diagnostics) = processor();
        let mut session = ShelfSession::new();

        let result = processor.process_line(&mut session, &line("take", "Z9", -500.0));

        assert!(matches!(result, Err(ShelfError::LookupError { .. })));
        assert!(cart.is_empty());
        assert!(diagnostics.snapshots().is_empty());
    }

    #[test]
    fn test_false_take_is_rejected_without_history() {
        let (mut processor, cart, diagnostics) = processor();
        let mut session = ShelfSession::new();

        let result = processor.process_line(&mut session, &line("take", "A1", -50.0));

        assert!(matches!(result, Err(ShelfError::ValidationReject { .. })));
        assert!(cart.is_empty());
        assert!(session.history().is_empty());
        assert_eq!(diagnostics.snapshots().len(), 1);
    }

    #[test]
    fn test_snapshot_reflects_state_after_command() {
        let (mut processor, _, diagnostics) = processor();
        let mut session = ShelfSession::new();

        processor
            .process_line(&mut session, &line("take", "A1", -500.0))
            .unwrap();

        let snapshots = diagnostics.snapshots();
        let last = snapshots.last().unwrap();
        assert_eq!(last.cart_length, 1);
        assert_eq!(last.history_size, 1);
        assert_eq!(last.top_of_history.as_ref().unwrap().weight, -500.0);
        assert_eq!(last.shelf.as_deref(), Some("1"));
    }

    #[test]
    fn test_sessions_are_independent() {
        let (mut processor, _, _) = processor();
        let mut first = ShelfSession::new();
        let mut second = ShelfSession::new();

        processor.process_chunk(&mut first, b"{\"action\":\"take\",");
        processor.process_chunk(&mut second, b"\n");

        assert_eq!(first.frames().pending(), "{\"action\":\"take\",");
        assert_eq!(processor.stats().lines, 0);
    }
}

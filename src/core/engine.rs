use crate::core::processor::{ProcessorStats, ShelfSession, StreamProcessor};
use crate::domain::model::CartCommand;
use crate::domain::ports::{CartStore, CatalogResolver, Clock, DiagnosticSink};
use crate::utils::error::{Result, ShelfError};
use crate::utils::monitor::SystemMonitor;
use serde::Serialize;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// 傳輸層拿來推資料的把手。`push` 不會阻塞，可以直接在收資料的 callback 裡呼叫
#[derive(Debug, Clone)]
pub struct ChunkSender {
    tx: UnboundedSender<Vec<u8>>,
}

impl ChunkSender {
    pub fn push(&self, chunk: impl Into<Vec<u8>>) -> Result<()> {
        self.tx
            .send(chunk.into())
            .map_err(|_| ShelfError::TransportError {
                message: "stream engine has stopped".to_string(),
            })
    }

    pub fn into_inner(self) -> UnboundedSender<Vec<u8>> {
        self.tx
    }
}

pub fn chunk_channel() -> (ChunkSender, UnboundedReceiver<Vec<u8>>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChunkSender { tx }, rx)
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct EngineReport {
    pub chunks: u64,
    pub stats: ProcessorStats,
    /// 結束時還沒等到換行的 byte 數，直接丟掉
    pub dropped_partial_bytes: usize,
}

/// 單一消費者：依序取出片段處理，History 只有這裡會寫
pub struct StreamEngine<R, C, D, K> {
    processor: StreamProcessor<R, C, D, K>,
    session: ShelfSession,
    monitor: SystemMonitor,
    command_tx: Option<UnboundedSender<CartCommand>>,
}

impl<R, C, D, K> StreamEngine<R, C, D, K>
where
    R: CatalogResolver,
    C: CartStore,
    D: DiagnosticSink,
    K: Clock,
{
    pub fn new(processor: StreamProcessor<R, C, D, K>, session: ShelfSession) -> Self {
        Self::new_with_monitoring(processor, session, false)
    }

    pub fn new_with_monitoring(
        processor: StreamProcessor<R, C, D, K>,
        session: ShelfSession,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            processor,
            session,
            monitor: SystemMonitor::new(monitor_enabled),
            command_tx: None,
        }
    }

    /// 每筆發出的購物車變更另外轉送一份 (例如印到 stdout 給 UI)
    pub fn with_command_sink(mut self, tx: UnboundedSender<CartCommand>) -> Self {
        self.command_tx = Some(tx);
        self
    }

    /// 跑到所有 sender 都關閉為止
    pub async fn run(mut self, mut rx: UnboundedReceiver<Vec<u8>>) -> EngineReport {
        tracing::info!("⚖️ Weight stream engine started");
        self.monitor.log_stats("Start");

        let mut chunks = 0u64;
        while let Some(chunk) = rx.recv().await {
            chunks += 1;
            let commands = self.processor.process_chunk(&mut self.session, &chunk);

            if let Some(tx) = self.command_tx.take() {
                if commands.into_iter().all(|command| tx.send(command).is_ok()) {
                    self.command_tx = Some(tx);
                } else {
                    tracing::debug!("Command observer went away");
                }
            }
        }

        let dropped_partial_bytes = self.session.frames().pending_len();
        if dropped_partial_bytes > 0 {
            tracing::debug!(
                "Stream closed with {} bytes of unterminated input",
                dropped_partial_bytes
            );
        }

        let stats = self.processor.stats();
        self.monitor.log_final_stats(stats.lines);
        tracing::info!(
            "Weight stream closed: {} chunks, {} lines, {} cart updates",
            chunks,
            stats.lines,
            stats.commands
        );

        EngineReport {
            chunks,
            stats,
            dropped_partial_bytes,
        }
    }
}

impl<R, C, D, K> StreamEngine<R, C, D, K>
where
    R: CatalogResolver + 'static,
    C: CartStore + 'static,
    D: DiagnosticSink + 'static,
    K: Clock + 'static,
{
    pub fn spawn(self, rx: UnboundedReceiver<Vec<u8>>) -> tokio::task::JoinHandle<EngineReport> {
        tokio::spawn(self.run(rx))
    }
}

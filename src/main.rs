use clap::Parser;
use shelf_weight::adapters::{
    open_input, InputEncoding, JsonLinesDiagnostics, NullDiagnostics, Planogram, ReaderSource,
    SharedCart, SystemClock, TracingDiagnostics,
};
use shelf_weight::core::{ConfigProvider, DiagnosticSink};
use shelf_weight::domain::ports::ChunkSource;
use shelf_weight::utils::error::ErrorSeverity;
use shelf_weight::utils::{logger, validation::Validate};
use shelf_weight::{
    chunk_channel, CliConfig, ShelfError, ShelfSession, StreamEngine, StreamProcessor, TomlConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 載入 TOML 配置 (如果有指定)
    let toml_config = match &cli.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(mut config) => {
                config.apply_overrides(&cli);
                Some(config)
            }
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => None,
    };

    // 初始化日誌
    let json_logs = cli.json_logs || toml_config.as_ref().is_some_and(|c| c.json_logs());
    if json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("🚀 Starting shelf-weight");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 驗證配置
    let validated = match &toml_config {
        Some(config) => config.validate(),
        None => cli.validate(),
    };
    if let Err(e) = validated {
        fail(&e);
    }

    let monitor_enabled = cli.monitor || toml_config.as_ref().is_some_and(|c| c.monitoring_enabled());
    let provider: Box<dyn ConfigProvider> = match toml_config {
        Some(config) => Box::new(config),
        None => Box::new(cli),
    };

    if let Err(e) = run(provider.as_ref(), monitor_enabled).await {
        fail(&e);
    }

    Ok(())
}

async fn run(config: &dyn ConfigProvider, monitor_enabled: bool) -> shelf_weight::Result<()> {
    let planogram = Planogram::from_file(config.planogram_path())?;
    planogram.validate()?;
    tracing::info!(
        "📋 Planogram loaded: {} positions, {} products",
        planogram.positions.len(),
        planogram.products.len()
    );

    let diagnostics = diagnostics_sink(config);
    let cart = SharedCart::new();
    let processor = StreamProcessor::new(planogram, cart.clone(), diagnostics, SystemClock);
    let session = ShelfSession::with_max_line_bytes(config.max_line_bytes());

    // 傳輸層失敗只記一次，處理器不會啟動
    let reader = open_input(config.input_path()).await?;
    let encoding = if config.hex_input() {
        InputEncoding::Hex
    } else {
        InputEncoding::Text
    };
    let mut source = ReaderSource::new(reader, config.read_chunk_bytes(), encoding);
    tracing::info!("🔌 Reading weight board feed from {}", config.input_path());

    let (sender, rx) = chunk_channel();
    let (command_tx, mut command_rx) = tokio::sync::mpsc::unbounded_channel();

    // 購物車變更以 JSON 一行一筆輸出給前端
    let printer = tokio::spawn(async move {
        while let Some(command) = command_rx.recv().await {
            match serde_json::to_string(&command) {
                Ok(json) => println!("{}", json),
                Err(e) => tracing::warn!("Failed to serialize cart command: {}", e),
            }
        }
    });

    let engine = StreamEngine::new_with_monitoring(processor, session, monitor_enabled)
        .with_command_sink(command_tx)
        .spawn(rx);
    let pump = tokio::spawn(async move { source.pump(sender.into_inner()).await });

    // 來源中途斷線時仍先把已收到的資料處理完，再以傳輸錯誤結束
    let source_error = tokio::select! {
        result = pump => source_outcome(result),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            return Ok(());
        }
    };

    let report = engine.await.map_err(|e| ShelfError::TransportError {
        message: format!("stream engine task failed: {}", e),
    })?;
    let _ = printer.await;

    tracing::info!(
        "✅ Done: {} lines, {} cart updates, {} rejected, {} dropped, {} items left in cart",
        report.stats.lines,
        report.stats.commands,
        report.stats.rejected,
        report.stats.parse_errors + report.stats.lookup_errors,
        shelf_weight::core::CartStore::len(&cart)
    );

    if let Some(e) = source_error {
        return Err(e);
    }
    Ok(())
}

fn diagnostics_sink(config: &dyn ConfigProvider) -> Box<dyn DiagnosticSink> {
    if let Some(path) = config.diagnostics_path() {
        match JsonLinesDiagnostics::open(path) {
            Ok(sink) => return Box::new(sink),
            Err(e) => tracing::warn!(
                "Cannot open diagnostics file {}: {}, logging snapshots instead",
                path,
                e
            ),
        }
    }

    if config.diagnostics_enabled() {
        Box::new(TracingDiagnostics)
    } else {
        Box::new(NullDiagnostics)
    }
}

fn fail(e: &ShelfError) -> ! {
    tracing::error!(
        "❌ shelf-weight failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    std::process::exit(exit_code(e.severity()));
}

/// 讀取任務的結果；回傳 `Some` 表示來源中途失敗
fn source_outcome(
    result: std::result::Result<shelf_weight::Result<u64>, tokio::task::JoinError>,
) -> Option<ShelfError> {
    match result {
        Ok(Ok(chunks)) => {
            tracing::info!("Input closed after {} chunks", chunks);
            None
        }
        Ok(Err(e)) => {
            tracing::warn!("⚠️ Weight board feed lost, draining buffered input");
            Some(e)
        }
        Err(e) => Some(ShelfError::TransportError {
            message: format!("input task failed: {}", e),
        }),
    }
}

// 根據錯誤嚴重程度決定退出碼
fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

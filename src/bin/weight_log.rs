use clap::{Parser, ValueEnum};
use shelf_weight::core::daily_log::{self, DEFAULT_LOG_DIR};
use shelf_weight::utils::logger;
use shelf_weight::Result;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Csv,
}

#[derive(Parser)]
#[command(name = "weight-log")]
#[command(about = "Reads the daily weight board log, clearing it when it is from a previous day")]
struct Args {
    /// Directory holding the daily `.txt` log
    #[arg(short, long, default_value = DEFAULT_LOG_DIR)]
    dir: String,

    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Never clear the file, even when it is stale
    #[arg(long)]
    no_rotate: bool,

    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    if let Err(e) = run(&args) {
        tracing::error!("❌ Weight log failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let path = daily_log::find_log_file(&args.dir)?;
    tracing::info!("📁 Weight log: {}", path.display());

    // 先讀內容再清檔，昨天的紀錄仍然會輸出一次
    let contents = std::fs::read_to_string(&path)?;
    if !args.no_rotate {
        let today = chrono::Local::now().date_naive();
        daily_log::rotate_if_stale(&path, today)?;
    }

    let records = daily_log::parse_log(&contents);
    tracing::info!("📊 {} weight records", records.len());

    match args.format {
        OutputFormat::Json => {
            let stdout = std::io::stdout();
            serde_json::to_writer_pretty(stdout.lock(), &records)?;
            println!();
        }
        OutputFormat::Csv => daily_log::write_csv(&records, std::io::stdout().lock())?,
    }

    Ok(())
}

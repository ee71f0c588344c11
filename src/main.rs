use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use zaqar_pubsub::cli::{self, Command, OutputFormat};
use zaqar_pubsub::{Config, Overrides};

/// Topics, subscriptions and monitors for Zaqar-style messaging services
#[derive(Parser, Debug)]
#[command(name = "zaqar-pubsub", version = zaqar_pubsub::VERSION, about, long_about = None)]
struct Args {
    /// Messaging service endpoint, e.g. http://localhost:8888
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Project the requests are scoped to
    #[arg(long, global = true)]
    project_id: Option<String>,

    /// Pre-issued auth token (default: OS_AUTH_TOKEN)
    #[arg(long, global = true)]
    auth_token: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off", global = true)]
    log_level: LogLevel,

    /// Output format
    #[arg(long, value_enum, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|e| anyhow::anyhow!("Failed to open log file {:?}: {}", log_path, e))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("zaqar-pubsub started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("zaqar-pubsub").join("zaqar-pubsub.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".zaqar-pubsub").join("zaqar-pubsub.log");
    }
    PathBuf::from("zaqar-pubsub.log")
}

/// Message shown to the user; library errors get their friendly form
fn describe(err: &anyhow::Error) -> String {
    match err.downcast_ref::<zaqar_pubsub::Error>() {
        Some(e) => e.user_message(),
        None => format!("{err:#}"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = match setup_logging(args.log_level) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        },
    };

    let mut config = Config::load();
    let overrides = Overrides {
        endpoint: args.endpoint,
        project_id: args.project_id,
        auth_token: args.auth_token,
    };

    let format = args.format;
    let result = cli::run(args.command, &mut config, &overrides)
        .await
        .and_then(|output| output.render(format));

    match result {
        Ok(text) => {
            if !text.is_empty() {
                println!("{text}");
            }
            ExitCode::SUCCESS
        },
        Err(err) => {
            tracing::error!("Command failed: {:#}", err);
            eprintln!("Error: {}", describe(&err));
            ExitCode::FAILURE
        },
    }
}

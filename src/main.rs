//! Cardioscope: Cardiovascular disease risk assessment.
//!
//! Main entry point. Runs either the terminal dashboard (default) or the
//! HTTP front-end, both backed by the same inference service.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardioscope::adapters::sanitize::SanitizingMakeWriter;
use cardioscope::application::InferenceService;
use cardioscope::tui::App;

#[derive(Parser)]
#[command(name = "cardioscope", about = "Cardiovascular disease risk assessment")]
struct Cli {
    /// Directory holding model.json, scaler.json and the signed manifest.
    #[arg(long, env = "CARDIOSCOPE_MODEL_DIR", default_value = "models")]
    model_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP front-end.
    Serve {
        /// Address to bind.
        #[arg(long, env = "CARDIOSCOPE_BIND", default_value = "127.0.0.1:8080")]
        bind: String,
    },
    /// Run the interactive terminal dashboard (default).
    Dashboard,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let interactive_dashboard = !matches!(cli.command, Some(Command::Serve { .. }));

    // Initialize logging.
    //
    // IMPORTANT: writing logs to the terminal would corrupt the TUI
    // (alternate screen). Default behavior:
    // - dashboard on an interactive TTY: log to a file
    // - serve mode or non-interactive: log to stdout
    let log_mode =
        std::env::var("CARDIOSCOPE_LOG_MODE").unwrap_or_else(|_| "auto".to_string());

    let interactive = std::io::stdout().is_terminal();
    let use_file = match log_mode.as_str() {
        "file" => true,
        "stdout" => false,
        // auto
        _ => interactive_dashboard && interactive,
    };

    let (writer, _guard) = if use_file {
        let log_file = std::env::var("CARDIOSCOPE_LOG_FILE")
            .unwrap_or_else(|_| "cardioscope.log".to_string());

        if let Some(parent) = std::path::Path::new(&log_file).parent() {
            // Best-effort: don't fail startup just because the directory is missing.
            let _ = std::fs::create_dir_all(parent);
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)?;
        tracing_appender::non_blocking(file)
    } else {
        tracing_appender::non_blocking(std::io::stdout())
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting cardioscope...");

    let service = Arc::new(InferenceService::load(&cli.model_dir));

    match cli.command {
        Some(Command::Serve { bind }) => {
            actix_web::rt::System::new().block_on(cardioscope::http::serve(&bind, service))?;
        }
        Some(Command::Dashboard) | None => {
            let mut app = App::with_service(service);
            app.run()?;
        }
    }

    tracing::info!("Cardioscope shutdown complete.");
    Ok(())
}

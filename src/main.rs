use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;

use netscan_console::backend::{HttpBackend, DEFAULT_BACKEND_URL};
use netscan_console::controller::{ScanController, ScanOutcome};
use netscan_console::request::SCAN_LABELS;
use netscan_console::reveal::{self, Reveal, Typewriter, TAGLINE};
use netscan_console::types::ResultModel;
use netscan_console::{presenter, server};

/// netscan-console — ask a remote scanning service to scan one target and print what it found.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "netscan-console",
    version,
    about = "Ask a remote scanning service to scan one target and print what it found.",
    long_about = None
)]
struct Cli {
    /// IP address or hostname to scan.
    #[arg(long)]
    target: Option<String>,

    /// Scan mode, by its label.
    #[arg(long, default_value = "Fast Scan", value_parser = clap::builder::PossibleValuesParser::new(SCAN_LABELS))]
    scan: String,

    /// Base URL of the scanning service (POST {url}/scan).
    #[arg(long = "backend-url", env = "NETSCAN_BACKEND_URL", default_value = DEFAULT_BACKEND_URL)]
    backend_url: String,

    /// Transport timeout for the scan request, in seconds.
    #[arg(long = "timeout-secs", default_value_t = 600)]
    timeout_secs: u64,

    /// Write a successful result as pretty JSON to this path (optional).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Run the local control API instead of a one-shot scan.
    #[arg(long = "serve-ui", default_value_t = false)]
    serve_ui: bool,

    /// Bind address for the control API.
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Static directory served next to the control API (optional).
    #[arg(long = "ui-dir")]
    ui_dir: Option<PathBuf>,

    /// Print the tagline at once instead of typing it out.
    #[arg(long = "no-reveal", default_value_t = false)]
    no_reveal: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "netscan_console=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let backend = HttpBackend::new(&cli.backend_url, Duration::from_secs(cli.timeout_secs))?;
    tracing::info!(url = backend.scan_url(), timeout_secs = cli.timeout_secs, "scanning service configured");
    let controller = Arc::new(ScanController::new(backend));

    print_tagline(cli.no_reveal).await?;

    if cli.serve_ui {
        let shutdown = CancellationToken::new();
        let on_ctrl_c = shutdown.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            on_ctrl_c.cancel();
        });
        println!("Control API at http://{}/api (Ctrl+C to stop)", cli.bind);
        server::serve(&cli.bind, controller, cli.ui_dir.clone(), shutdown).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(target) = cli.target.as_deref() else {
        eprintln!("Nothing to do: pass --target <HOST> or --serve-ui.");
        return Ok(ExitCode::from(2));
    };

    println!("Running {} against {}...", cli.scan, target);
    let outcome = match controller.request_scan(target, &cli.scan).await {
        Ok(outcome) => outcome,
        Err(err) => {
            eprintln!("{err}");
            return Ok(ExitCode::from(2));
        }
    };

    match outcome {
        ScanOutcome::Succeeded(model) => {
            print_report(&model);
            if let Some(path) = cli.output.as_deref() {
                if let Err(e) = write_results_json(path, &model) {
                    eprintln!("Failed to write JSON to {}: {e:#}", path.display());
                } else {
                    println!("Wrote JSON results to {}", path.display());
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        ScanOutcome::Failed(message) => {
            eprintln!("{message}");
            Ok(ExitCode::FAILURE)
        }
        ScanOutcome::Idle | ScanOutcome::InFlight => unreachable!("request_scan returns a settled outcome"),
    }
}

async fn print_tagline(instant: bool) -> Result<()> {
    let mut stdout = std::io::stdout();
    if instant {
        reveal::Instant.reveal(TAGLINE, &mut stdout).await?;
    } else {
        Typewriter::default().reveal(TAGLINE, &mut stdout).await?;
    }
    writeln!(stdout)?;
    Ok(())
}

fn print_report(model: &ResultModel) {
    if model.hosts.is_empty() {
        println!("\nNo hosts reported.");
        return;
    }
    println!();
    for line in presenter::render_lines(&presenter::present(model)) {
        println!("{line}");
    }
}

fn write_results_json(path: &Path, model: &ResultModel) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(file, model)?;
    Ok(())
}

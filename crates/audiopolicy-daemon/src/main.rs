//! Audio Policy Daemon
//!
//! Owns the process-wide audio policy and serves it over a line protocol:
//! one command per stdin line, one JSON response per stdout line. Policy
//! events are logged to stderr as they are dispatched.
//!
//! Startup:
//! 1. Load configuration (`--config`, a mock profile, or the default paths)
//! 2. Apply `AUDIOPOLICY_*` environment overrides
//! 3. Subscribe event loggers
//! 4. Serve commands until `quit`, EOF or a shutdown signal

mod command;

use anyhow::{Context, Result, bail};
use audiopolicy_config::PolicyConfig;
use audiopolicy_core::mock::MockProfile;
use audiopolicy_core::{AsyncAudioManager, AudioManager, EventKind, PolicyEvent};
use command::{Command, Response};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{debug, error, info, warn};

/// Command-line options
#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    config: Option<PathBuf>,
    save_on_exit: Option<PathBuf>,
}

impl Options {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Options::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = args.next().context("--config requires a path")?;
                    options.config = Some(PathBuf::from(path));
                }
                "--save-on-exit" => {
                    let path = args.next().context("--save-on-exit requires a path")?;
                    options.save_on_exit = Some(PathBuf::from(path));
                }
                other => bail!("Unknown argument: {}", other),
            }
        }

        Ok(options)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging();

    let options = Options::parse(std::env::args().skip(1))?;
    info!("Audio policy daemon starting...");

    let config = load_config(&options)?;
    let manager = AudioManager::from_config(&config).context("Failed to initialize audio policy")?;
    subscribe_event_log(&manager)?;

    let api = AsyncAudioManager::new(manager.handle());
    serve(&api).await?;

    if let Some(path) = &options.save_on_exit {
        manager
            .export_config()
            .context("Failed to export policy state")?
            .save(path)
            .with_context(|| format!("Failed to save policy state to {}", path.display()))?;
    }

    info!("Audio policy daemon stopped");
    Ok(())
}

/// Setup logging to stderr; stdout carries responses only
fn setup_logging() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn load_config(options: &Options) -> Result<PolicyConfig> {
    let mut config = match (&options.config, MockProfile::from_env()) {
        (Some(path), _) => PolicyConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        (None, Some(profile)) => {
            info!("Using mock profile: {}", profile.name());
            profile.to_config()
        }
        (None, None) => PolicyConfig::load_default().context("Failed to load configuration")?,
    };

    config
        .apply_env()
        .context("Failed to apply environment overrides")?;
    Ok(config)
}

fn subscribe_event_log(manager: &AudioManager) -> Result<()> {
    for kind in [
        EventKind::VolumeChange,
        EventKind::RingerModeChange,
        EventKind::DeviceChange,
    ] {
        manager.on(kind, log_event)?;
    }
    Ok(())
}

fn log_event(event: &PolicyEvent) {
    match serde_json::to_string(event) {
        Ok(json) => info!("event {}", json),
        Err(e) => warn!("Failed to encode {} event: {}", event.kind().name(), e),
    }
}

/// Read commands until quit, EOF or a shutdown signal
async fn serve(api: &AsyncAudioManager) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut sigterm = signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read command")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }
        };

        let Some(line) = line else {
            debug!("Input closed");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let (response, quit) = match Command::parse(&line) {
            Ok(Command::Quit) => (Response::ok(None), true),
            Ok(command) => {
                debug!("Executing {:?}", command);
                (command::execute(api, command).await, false)
            }
            Err(e) => {
                warn!("Rejected command '{}': {}", line.trim(), e);
                (Response::error(e.to_string()), false)
            }
        };

        if let Some(message) = &response.error {
            debug!("Command failed: {}", message);
        }

        let mut out = response.to_line();
        out.push('\n');
        if let Err(e) = stdout.write_all(out.as_bytes()).await {
            error!("Failed to write response: {}", e);
            break;
        }
        stdout.flush().await.context("Failed to flush stdout")?;

        if quit {
            break;
        }
    }

    Ok(())
}

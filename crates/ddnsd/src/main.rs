// # ddnsd - DDNS Daemon
//
// The ddnsd daemon is a thin integration layer. All DDNS logic lives in
// ddns-core; this binary is responsible for:
// 1. Loading `.env` and reading configuration from environment variables
// 2. Initializing tracing and the runtime
// 3. Wiring the metadata address source and the Cloudflare provider
// 4. Running the scheduler (daemon) or a single attempt (once)
//
// ## Configuration
//
// ### Required
// - `CF_API_TOKEN`: Cloudflare API token with Zone:DNS:Edit permissions
// - `DOMAIN`: Hostname whose A record is managed (e.g., home.example.com)
//
// ### Optional
// - `DDNS_MODE`: `daemon` (default) runs forever, `once` runs one attempt
// - `DDNS_DRY_RUN`: `true` to look up records without updating them
// - `DDNS_LOG_LEVEL`: trace, debug, info (default), warn, error
//   (`RUST_LOG` overrides it when set)
//
// ## Example
//
// ```bash
// export CF_API_TOKEN=your_token
// export DOMAIN=home.example.com
//
// ddnsd
// ```

use anyhow::Result;
use ddns_core::{Config, ReconcileError, Reconciler, Scheduler};
use ddns_ip_metadata::MetadataAddressSource;
use ddns_provider_cloudflare::CloudflareProvider;
use std::env;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown (or a successful one-shot run)
/// - 1: Configuration or startup error
/// - 2: Runtime error (including a failed one-shot run)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// How the process invokes the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    /// Attempt at startup, then every 60 seconds until a shutdown signal
    Daemon,
    /// Exactly one attempt; its failure is the process failure
    Once,
}

/// Daemon settings (everything except the reconciliation config)
#[derive(Debug, Clone, PartialEq, Eq)]
struct Settings {
    mode: RunMode,
    dry_run: bool,
    log_level: String,
}

impl Settings {
    /// Load settings from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup("DDNS_MODE")
            .unwrap_or_else(|| "daemon".to_string())
            .to_lowercase()
            .as_str()
        {
            "daemon" => RunMode::Daemon,
            "once" => RunMode::Once,
            other => anyhow::bail!(
                "DDNS_MODE '{}' is not supported. Supported modes: daemon, once",
                other
            ),
        };

        let dry_run = match lookup("DDNS_DRY_RUN")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "" | "false" | "0" | "no" => false,
            "true" | "1" | "yes" => true,
            other => anyhow::bail!("DDNS_DRY_RUN '{}' is not a boolean", other),
        };

        let log_level = lookup("DDNS_LOG_LEVEL")
            .unwrap_or_else(|| "info".to_string())
            .to_lowercase();
        match log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                log_level
            ),
        }

        Ok(Self {
            mode,
            dry_run,
            log_level,
        })
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

fn main() -> ExitCode {
    // Must happen before anything reads the environment
    let dotenv = dotenvy::dotenv();

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = init_tracing(&settings.log_level) {
        eprintln!("{}", e);
        return DdnsExitCode::ConfigError.into();
    }

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => info!("No .env file found, using environment variables"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    }

    // Missing CF_API_TOKEN or DOMAIN stops here, before any network call
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    info!("Starting ddnsd for {} ({:?} mode)", config.hostname(), settings.mode);

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        match run(config, &settings).await {
            Ok(code) => code,
            Err(e) => {
                error!("Startup error: {}", e);
                DdnsExitCode::ConfigError
            }
        }
    });

    result.into()
}

/// Wire the components and run in the configured mode
///
/// Errors returned here are startup failures; reconciliation failures are
/// mapped to exit codes directly.
async fn run(config: Config, settings: &Settings) -> Result<DdnsExitCode> {
    let source = MetadataAddressSource::new()?;
    let provider = CloudflareProvider::new(&config)?.with_dry_run(settings.dry_run);

    if settings.dry_run {
        warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
    }

    let reconciler = Reconciler::new(config, Box::new(source), Box::new(provider));
    let (scheduler, events) = Scheduler::new(reconciler);
    // Attempts are already logged; the event stream is for embedders
    drop(events);

    match settings.mode {
        RunMode::Once => match scheduler.run_once().await {
            Ok(_) => Ok(DdnsExitCode::CleanShutdown),
            Err(e) => {
                error!("Reconciliation failed at {}: {}", e.step(), e);
                Ok(failure_exit_code(&e))
            }
        },
        RunMode::Daemon => {
            info!("Checking every {:?}", scheduler.interval());
            let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

            tokio::spawn(async move {
                match wait_for_shutdown().await {
                    Ok(signal) => {
                        info!("Received shutdown signal: {}", signal);
                        let _ = shutdown_tx.send(());
                    }
                    Err(e) => {
                        error!("Shutdown error: {}", e);
                        // Dropping the sender would stop the scheduler
                        let _keep = shutdown_tx;
                        std::future::pending::<()>().await
                    }
                }
            });

            scheduler.run_with_shutdown(shutdown_rx).await;
            info!("Shutting down daemon");
            Ok(DdnsExitCode::CleanShutdown)
        }
    }
}

/// Exit code for a failed one-shot attempt
fn failure_exit_code(error: &ReconcileError) -> DdnsExitCode {
    if error.is_fatal() {
        DdnsExitCode::ConfigError
    } else {
        DdnsExitCode::RuntimeError
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let received = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(received)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}

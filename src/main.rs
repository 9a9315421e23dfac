// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/vigil-rs

//! Vigil - Personal-Safety Monitoring Engine
//!
//! Runs the safety engine against a real backend, or fully self-contained
//! in demo mode with simulated device streams and an in-memory backend.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::sync::broadcast;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use vigil::backend::{EventBackend, HttpBackend, MemoryBackend, SafeZone};
use vigil::core::{EngineRuntime, EventBus, NoticePayload};
use vigil::detectors::{DeviceSimulator, GeoPoint};
use vigil::session::{Role, SessionContext};
use vigil::{Config, VERSION};

/// Vigil - Personal-Safety Monitoring Engine
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(author = "Vigil Project")]
#[command(version = VERSION)]
#[command(about = "Client-side safety monitoring: falls, geofences and SOS escalation")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,

    /// Demo mode with simulated device streams
    #[arg(long)]
    demo: bool,

    /// Backend base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Backend session token
    #[arg(long, env = "VIGIL_TOKEN")]
    token: Option<String>,

    /// Session role: user (monitored) or caregiver (observer)
    #[arg(long, default_value = "user")]
    role: RoleArg,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum RoleArg {
    User,
    Caregiver,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::User => Role::User,
            RoleArg::Caregiver => Role::Caregiver,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Vigil v{} - Personal-Safety Monitoring Engine", VERSION);

    // Load or create configuration
    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    // Override with command line args
    if args.demo {
        config.demo_mode = true;
    }
    if let Some(base_url) = args.base_url.clone() {
        config.backend.base_url = base_url;
    }

    info!("Configuration loaded from {:?}", config_path);
    info!("Demo mode: {}", config.demo_mode);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(config, args))
}

async fn run(config: Config, args: Args) -> Result<()> {
    let role: Role = args.role.into();
    let token = args.token.clone().unwrap_or_default();
    if token.is_empty() && !config.demo_mode {
        anyhow::bail!("a session token is required outside demo mode (--token or VIGIL_TOKEN)");
    }
    let session = SessionContext::new(token, role);

    let home = GeoPoint::new(45.4642, 9.19);
    let backend: Arc<dyn EventBackend> = if config.demo_mode {
        let memory = Arc::new(MemoryBackend::new());
        memory
            .set_safe_zone(SafeZone::centered(
                home,
                config.geofence.default_radius_meters,
            ))
            .await?;
        memory
    } else {
        Arc::new(HttpBackend::new(
            &config.backend.base_url,
            &session.token,
            config.backend.timeout(),
        )?)
    };

    let bus = Arc::new(EventBus::default());
    let (runtime, handle) = EngineRuntime::new(&config, &session, backend, bus.clone());

    let (shutdown_tx, _) = broadcast::channel(1);
    let engine_task = tokio::spawn(runtime.run(shutdown_tx.subscribe()));

    if config.demo_mode && role.is_monitored() {
        let simulator = DeviceSimulator::new(home);
        tokio::spawn(simulator.run(handle.clone(), shutdown_tx.subscribe()));
    }

    // Log engine notices until interrupted.
    let mut notices = bus.subscribe_notices();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            notice = notices.recv() => match notice {
                Ok(notice) => match notice.payload {
                    NoticePayload::StatusChanged { from, to } => {
                        info!(?from, ?to, "safety status changed");
                    }
                    NoticePayload::IncidentReported(event) => {
                        warn!(kind = event.kind.as_str(), id = %event.id, "incident reported");
                    }
                    NoticePayload::TransientError { message } => {
                        warn!(%message, "transient backend error");
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "notice subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    info!("Shutdown signal received, cleaning up...");
    let _ = shutdown_tx.send(());
    match engine_task.await {
        Ok(result) => result?,
        Err(err) => error!(%err, "engine task panicked"),
    }

    info!("Vigil shutdown complete");
    Ok(())
}

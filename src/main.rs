//! Predictive dialer daemon and operator commands.
//!
//! Usage:
//! ```bash
//! predictive-dialer serve                  # Monitor loop + HTTP API
//! predictive-dialer start <campaign_id>    # One dialing run
//! predictive-dialer stats <campaign_id>    # Print campaign stats
//! predictive-dialer print-config           # Show effective configuration
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use predictive_dialer::application::{DialerServices, Repositories, TelephonyLauncher};
use predictive_dialer::config::Config;
use predictive_dialer::domain::agent::Agent;
use predictive_dialer::domain::caller_id::CallerId;
use predictive_dialer::domain::campaign::{Campaign, CampaignRepository};
use predictive_dialer::domain::contact::Contact;
use predictive_dialer::domain::notification::Notifier;
use predictive_dialer::domain::shared::value_objects::{CampaignId, PhoneNumber};
use predictive_dialer::infrastructure::persistence::InMemoryDialerStore;
use predictive_dialer::infrastructure::telephony::SimulatedTelephony;
use predictive_dialer::interface::api::{build_router, init_metrics, AppState, EventBroadcaster};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "postgres")]
use predictive_dialer::infrastructure::persistence::{
    create_pool, run_migrations, PgDialerStore, PoolConfig,
};

#[derive(Debug, Parser)]
#[command(name = "predictive-dialer", author, version, about)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Use a seeded in-memory store instead of PostgreSQL
    #[arg(long, global = true)]
    in_memory: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the campaign monitor and the HTTP API until interrupted
    Serve {
        /// Seconds between monitor iterations
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Run one dialing pass for a campaign and wait for its calls
    Start { campaign_id: CampaignId },

    /// Print the dialing stats of a campaign
    Stats { campaign_id: CampaignId },

    /// Print the effective configuration as TOML
    PrintConfig,
}

struct Runtime {
    services: DialerServices,
    launcher: Arc<TelephonyLauncher>,
    broadcaster: Arc<EventBroadcaster>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::PrintConfig => {
            print!("{}", config.to_toml().context("Failed to render configuration")?);
            Ok(())
        }
        Command::Serve { interval } => {
            if let Some(interval) = interval {
                config.monitor.interval_secs = interval;
            }
            let runtime = build_runtime(&config, cli.in_memory).await?;
            serve(&config, runtime).await
        }
        Command::Start { campaign_id } => {
            let runtime = build_runtime(&config, cli.in_memory).await?;
            start(runtime, campaign_id).await
        }
        Command::Stats { campaign_id } => {
            let runtime = build_runtime(&config, cli.in_memory).await?;
            let stats = runtime.services.stats.snapshot(&campaign_id).await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
    }
}

async fn build_runtime(config: &Config, in_memory: bool) -> Result<Runtime> {
    let repositories = open_store(config, in_memory).await?;

    let broadcaster = Arc::new(EventBroadcaster::default());
    let notifier: Arc<dyn Notifier> = broadcaster.clone();
    let telephony = Arc::new(SimulatedTelephony::from_config(&config.telephony)?);

    let mut launcher = None;
    let services = DialerServices::build_with(&config.dialing, repositories, notifier, |reporter| {
        let telephony_launcher = Arc::new(TelephonyLauncher::new(telephony, reporter));
        launcher = Some(telephony_launcher.clone());
        telephony_launcher
    });
    let launcher = launcher.context("Telephony launcher was not created")?;

    Ok(Runtime {
        services,
        launcher,
        broadcaster,
    })
}

#[cfg(feature = "postgres")]
async fn open_store(config: &Config, in_memory: bool) -> Result<Repositories> {
    if in_memory {
        return Ok(Repositories::from_store(demo_store().await?));
    }

    info!("Initializing database connection...");
    let pool = create_pool(&PoolConfig::from_database_config(&config.database)).await?;
    info!("Database connection pool created");

    info!("Running database migrations...");
    run_migrations(&pool).await?;
    info!("Database migrations completed");

    Ok(Repositories::from_store(Arc::new(PgDialerStore::new(pool))))
}

#[cfg(not(feature = "postgres"))]
async fn open_store(_config: &Config, in_memory: bool) -> Result<Repositories> {
    if !in_memory {
        warn!("Built without PostgreSQL support, using the in-memory demo store");
    }
    Ok(Repositories::from_store(demo_store().await?))
}

/// In-memory store with one campaign, a few agents and caller-ids
async fn demo_store() -> Result<Arc<InMemoryDialerStore>> {
    let store = Arc::new(InMemoryDialerStore::new());

    let campaign = Campaign::new("Demo collection campaign").with_product_type("personal_loan");
    let mut contacts = Vec::new();
    for i in 0..50 {
        let phone = PhoneNumber::parse(&format!("+62812{:07}", i)).map_err(anyhow::Error::msg)?;
        contacts.push(
            Contact::new(campaign.id, format!("Demo contact {}", i + 1), phone)
                .with_balance(1_500_000.0 + 10_000.0 * i as f64, 50_000.0),
        );
    }

    store.insert_campaign(campaign.clone()).await;
    store.insert_contacts(contacts).await;
    for (name, extension) in [("Agent Sari", "1001"), ("Agent Budi", "1002"), ("Agent Dewi", "1003")] {
        store.insert_agent(Agent::new(name, extension)).await;
    }
    store.insert_caller_id(CallerId::new("02150001")).await;
    store.insert_caller_id(CallerId::new("02150002")).await;

    info!(campaign_id = %campaign.id, "Seeded in-memory demo campaign");
    Ok(store)
}

async fn serve(config: &Config, runtime: Runtime) -> Result<()> {
    info!("Starting predictive dialer");

    info!("Initializing Prometheus metrics exporter");
    let prometheus_handle = init_metrics().context("Failed to install metrics recorder")?;

    let state = AppState::from_services(&runtime.services);
    let app = build_router(state, prometheus_handle, runtime.broadcaster.clone());
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("REST API server listening on {}", addr);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let monitor = runtime.services.monitor(config.monitor.clone());
    let monitor_handle = tokio::spawn(async move { monitor.run(shutdown_rx).await });

    let mut api_shutdown = shutdown_tx.subscribe();
    let api_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = api_shutdown.wait_for(|stop| *stop).await;
            })
            .await
    });

    tokio::signal::ctrl_c().await.context("Failed to listen for shutdown signal")?;
    info!("Shutdown signal received, stopping...");
    let _ = shutdown_tx.send(true);

    monitor_handle.await.context("Campaign monitor task panicked")?;
    api_handle
        .await
        .context("API server task panicked")?
        .context("API server failed")?;

    info!(in_flight = runtime.launcher.in_flight(), "Waiting for calls in flight");
    runtime.launcher.drain().await;

    info!("Predictive dialer stopped");
    Ok(())
}

async fn start(runtime: Runtime, campaign_id: CampaignId) -> Result<()> {
    let campaign = runtime
        .services
        .campaigns
        .find_by_id(&campaign_id)
        .await?
        .with_context(|| format!("Campaign {} not found", campaign_id))?;

    info!(campaign = %campaign.name, "Starting predictive dialing");
    let result = runtime.services.scheduler.run(&campaign).await?;

    if result.is_started() {
        info!(calls = result.calls_initiated(), "Predictive dialing started");
        runtime.launcher.drain().await;
    } else {
        warn!(result = %result, "{}", result.message());
    }

    let stats = runtime.services.stats.snapshot(&campaign_id).await?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

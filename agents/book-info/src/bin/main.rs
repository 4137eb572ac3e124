//! Book Info Agent entry point
//!
//! Monitored synthetic transactions against the book content service.

use book_info::client::{ContentClient, ContentConfig, DEFAULT_BASE_URL};
use book_info::contracts::*;
use book_info::engine::{
    FailurePolicy, LoopConfig, RunnerConfig, TransactionLoop, TransactionRunner,
};
use book_info::telemetry::{agent_targets, init_sink, MonitorConfig};
use clap::{Args, Parser, Subcommand};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use txn_span::SamplingPolicy;

#[derive(Parser)]
#[command(name = "book-info")]
#[command(about = "Book Info Agent - monitored synthetic book lookups")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    content: ContentArgs,

    #[command(flatten)]
    monitor: MonitorArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ContentArgs {
    /// Base URL of the works resource
    #[arg(long, env = "BOOKS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Content service user
    #[arg(long, env = "BOOKS_USER", default_value = "testuser")]
    user: String,

    /// Content service password
    #[arg(long, env = "BOOKS_PASSWORD", default_value = "testpassword", hide_env_values = true)]
    password: String,

    /// Duration of the simulated persistence call in milliseconds
    #[arg(long, default_value = "137")]
    persistence_ms: u64,

    /// Fixed seed for work selection
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args)]
struct MonitorArgs {
    /// Monitoring controller host
    #[arg(long, env = "APPD_CONT", default_value = "")]
    controller_host: String,

    /// Monitoring controller port
    #[arg(long, env = "APPD_PORT", default_value = "443")]
    controller_port: u16,

    /// Connect to the controller without TLS
    #[arg(long)]
    no_ssl: bool,

    /// Monitoring account name
    #[arg(long, env = "APPD_ACC", default_value = "")]
    account: String,

    /// Monitoring access key
    #[arg(long, env = "APPD_KEY", default_value = "", hide_env_values = true)]
    access_key: String,

    /// Application name reported to the controller
    #[arg(long, default_value = "Example App Instrumentation - Rust")]
    app_name: String,

    /// Tier name reported to the controller
    #[arg(long, default_value = "Rust-Example-InfoGatherer")]
    tier_name: String,

    /// Node name reported to the controller
    #[arg(long, default_value = "rs-01")]
    node_name: String,

    /// Initialisation timeout in milliseconds (0 = async, -1 = wait forever)
    #[arg(long, default_value = "1000", allow_negative_numbers = true)]
    init_timeout_ms: i64,

    /// Snapshot every Nth transaction (1 = always, 0 = never)
    #[arg(long, default_value = "1")]
    sample_every: SamplingPolicy,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the transaction loop
    Run {
        /// Number of transactions to run
        #[arg(short = 'n', long, env = "TRANSACTION_COUNT", default_value = "1000")]
        transactions: u64,

        /// Pause between transactions in milliseconds
        #[arg(long, env = "TRANSACTION_DELAY_MS", default_value = "10000")]
        delay_ms: u64,

        /// What to do when a transaction fails: abort or skip
        #[arg(long, default_value = "abort")]
        on_error: FailurePolicy,
    },

    /// Run a single transaction and print the parsed work
    Once {
        /// Work to fetch instead of a random one
        #[arg(long)]
        work_id: Option<WorkId>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let cli = Cli::parse();

    let content = ContentConfig {
        base_url: cli.content.base_url,
        user: cli.content.user,
        password: cli.content.password,
    };
    let monitor = MonitorConfig {
        app_name: cli.monitor.app_name,
        tier_name: cli.monitor.tier_name,
        node_name: cli.monitor.node_name,
        controller_host: cli.monitor.controller_host,
        controller_port: cli.monitor.controller_port,
        use_ssl: !cli.monitor.no_ssl,
        account: cli.monitor.account,
        access_key: cli.monitor.access_key,
        init_timeout_ms: cli.monitor.init_timeout_ms,
        sampling: cli.monitor.sample_every,
        ..Default::default()
    };

    let sink = init_sink(&monitor, agent_targets(&content.base_url)?)?;
    let runner = TransactionRunner::new(
        ContentClient::new(&content),
        sink.clone(),
        RunnerConfig {
            persistence_delay: Duration::from_millis(cli.content.persistence_ms),
            seed: cli.content.seed,
            ..Default::default()
        },
    );

    let result = match cli.command {
        Commands::Run {
            transactions,
            delay_ms,
            on_error,
        } => {
            let cancel = CancellationToken::new();
            let on_signal = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Interrupt received, finishing current transaction");
                    on_signal.cancel();
                }
            });

            let mut driver = TransactionLoop::new(
                runner,
                sink.clone(),
                LoopConfig {
                    count: transactions,
                    delay: Duration::from_millis(delay_ms),
                    on_error,
                    ..Default::default()
                },
            );
            driver
                .run(cancel)
                .await
                .map(|summary| println!("{}", serde_json::json!(summary)))
        }

        Commands::Once { work_id } => {
            let mut runner = runner;
            let transaction = sink.begin_transaction(TRANSACTION_NAME, None);
            let outcome = match work_id {
                Some(id) => runner.run_work(&transaction, id).await,
                None => runner.run_once(&transaction).await,
            };
            let error = outcome.as_ref().err().map(ToString::to_string);
            sink.end_transaction(transaction, error.as_deref());
            outcome.map(|record| println!("{}", serde_json::json!(record)))
        }
    };

    sink.shutdown();
    result?;
    Ok(())
}

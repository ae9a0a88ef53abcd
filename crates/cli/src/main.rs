mod bridge_commands;
mod db_commands;
mod runtime;

use {
    clap::{Parser, Subcommand},
    tracing::{debug, info},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "bridgekeeper", about = "Bridgekeeper: cross-platform channel bridges")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of searching the standard locations.
    #[arg(long, global = true, env = "BRIDGEKEEPER_CONFIG")]
    config: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a channel to a bridge, creating the bridge if needed.
    Join(bridge_commands::JoinArgs),
    /// Remove a channel from its bridge.
    Leave(bridge_commands::LeaveArgs),
    /// Leave and rejoin, optionally under a different bridge name.
    Reset(bridge_commands::JoinArgs),
    /// Print the bridge a channel belongs to, or a bridge by id.
    Show(bridge_commands::ShowArgs),
    /// Print the cached mirrors of a forwarded message.
    Deliveries {
        #[arg(long)]
        message_id: String,
    },
    /// List configured platform adapters.
    Adapters,
    /// Database management.
    Db {
        #[command(subcommand)]
        action: db_commands::DbAction,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<bridgekeeper_config::BridgekeeperConfig> {
    let mut config = match &cli.config {
        Some(path) => bridgekeeper_config::load_config(path)?,
        None => bridgekeeper_config::discover_and_load(),
    };
    bridgekeeper_config::apply_env_overrides(&mut config);
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_telemetry(&cli);
    debug!(version = env!("CARGO_PKG_VERSION"), "bridgekeeper starting");

    let config = load_config(&cli)?;

    if let Commands::Adapters = cli.command {
        let registry = bridgekeeper_bridges::AdapterRegistry::from_config(&config.adapters);
        let names = registry.list();
        if names.is_empty() {
            println!("No adapters configured.");
        }
        for name in names {
            println!("{name}");
        }
        return Ok(());
    }
    if let Commands::Db { action } = cli.command {
        return db_commands::handle_db(action, &config).await;
    }

    let rt = runtime::Runtime::open(&config).await?;
    let result = match cli.command {
        Commands::Join(args) => bridge_commands::join(&rt, args).await,
        Commands::Leave(args) => bridge_commands::leave(&rt, args).await,
        Commands::Reset(args) => bridge_commands::reset(&rt, args).await,
        Commands::Show(args) => bridge_commands::show(&rt, args).await,
        Commands::Deliveries { message_id } => {
            bridge_commands::deliveries(&rt, &message_id).await
        },
        Commands::Adapters | Commands::Db { .. } => Ok(()),
    };
    rt.close().await;
    info!("done");
    result
}

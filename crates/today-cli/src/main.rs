mod cli;
mod config;
mod dates;
mod locale;
mod storage;
mod tasks;
mod tui;

use crate::cli::{Command, ConfigCommand, GlobalOpts};
use clap::Parser;
use color_eyre::Result;
use today_core::storage::{InMemoryStore, KeyValueStore};
use today_task::{LoadPolicy, TaskListView};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Entry point wiring the CLI to the task list view.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = cli::Cli::parse();
    let command = cli.command.unwrap_or(Command::Tui);
    // The TUI owns the terminal; keep logs quiet there unless asked for.
    init_tracing(if command == Command::Tui { "off" } else { "info" });
    let config = config::load()?;

    match command {
        Command::Tui => {
            let mut view = mount_view(&cli.opts, &config).await?;
            tui::launch(&mut view, config.locale)?;
            close_view(view).await?
        }
        Command::Version => print_version(),
        Command::Health => run_health_check(&config).await?,
        Command::Config(ConfigCommand::Init) => init_config(&config)?,
        Command::Task(cmd) => {
            let mut view = mount_view(&cli.opts, &config).await?;
            tasks::handle(cmd, &mut view, config.locale, &mut std::io::stdout())?;
            close_view(view).await?
        }
    }

    Ok(())
}

fn init_tracing(default_level: &str) {
    // Respect user-provided filters; logs go to stderr so stdout stays scriptable.
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("today {}", env!("CARGO_PKG_VERSION"));
}

async fn mount_view(opts: &GlobalOpts, config: &config::Config) -> Result<TaskListView> {
    let policy = if opts.strict {
        LoadPolicy::Strict
    } else {
        config.load_policy()
    };
    let view = if opts.ephemeral {
        info!("ephemeral session, state will not be saved to disk");
        TaskListView::mount(InMemoryStore::new(), policy).await
    } else {
        TaskListView::mount(storage::store_from_config(config)?, policy).await
    };
    view.map_err(|e| color_eyre::eyre::eyre!(e.to_string()))
}

async fn close_view(view: TaskListView) -> Result<()> {
    view.shutdown()
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))
}

/// Runs a write/read round trip against the configured store.
async fn run_health_check(config: &config::Config) -> Result<()> {
    let store = storage::store_from_config(config)?;
    run_store_health(&store).await?;
    println!("Storage: ok ({})", store.root().display());
    Ok(())
}

async fn run_store_health<S: KeyValueStore>(store: &S) -> Result<()> {
    let probe_key = "health/probe";
    let payload = b"ok";
    store
        .put(probe_key, payload)
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;
    let round_trip = store
        .get(probe_key)
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;

    if round_trip != payload {
        color_eyre::eyre::bail!("storage round-trip failed");
    }
    Ok(())
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}

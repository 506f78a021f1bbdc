//! little-lemon: command-line front end for the Little Lemon local store.
//!
//! Every invocation opens the menu cache and the preferences database in the
//! data directory, hydrates the session and runs one command.

mod app;
mod commands;
mod config;
mod remote;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lemon_store::EventFilter;
use lemon_types::events::Event;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::app::App;
use crate::commands::ProfileFields;
use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "little-lemon", about = "Little Lemon menu cache and profile")]
struct Cli {
    /// Data directory holding config.toml and the databases.
    #[arg(long, global = true, env = config::DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a JSON menu document into the cache
    Seed {
        /// Path to the menu document
        file: PathBuf,
    },
    /// Search cached dishes
    Menu {
        /// Case-insensitive substring of the dish name
        #[arg(long, short, default_value = "")]
        search: String,
        /// Restrict to a category; repeat for several
        #[arg(long = "category", short)]
        categories: Vec<String>,
    },
    /// Log in with a new profile
    Login(ProfileArgs),
    /// Edit the logged-in profile
    Profile(ProfileArgs),
    /// Toggle a notification preference by id
    Notify {
        key: String,
    },
    /// Show the logged-in user
    Whoami,
    /// Drop the menu cache and clear the session
    Logout,
}

#[derive(Args)]
struct ProfileArgs {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone_number: Option<String>,
    #[arg(long)]
    avatar: Option<String>,
}

impl From<ProfileArgs> for ProfileFields {
    fn from(args: ProfileArgs) -> Self {
        Self {
            first_name: args.first_name,
            last_name: args.last_name,
            email: args.email,
            phone_number: args.phone_number,
            avatar: args.avatar,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load(cli.data_dir.as_deref())?;

    // Initialize tracing
    let level = &config.logging.level;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("lemon={level}").parse()?)
                .add_directive(format!("little_lemon={level}").parse()?),
        )
        .init();

    info!(data_dir = %config.data_dir().display(), "Little Lemon starting");

    let app = App::start(config).await?;
    let mut diagnostics = app.events.subscribe();

    let result = run(&app, cli.command).await;
    drain_failures(&mut diagnostics);

    if let Err(ref e) = result {
        error!("Command failed: {e:#}");
    }
    result
}

async fn run(app: &App, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Seed { file } => commands::seed(app, &file).await,
        Command::Menu { search, categories } => commands::menu(app, &search, &categories).await,
        Command::Login(args) => commands::login(app, args.into()).await,
        Command::Profile(args) => commands::update_profile(app, args.into()).await,
        Command::Notify { key } => commands::toggle_notification(app, &key).await,
        Command::Whoami => {
            commands::whoami(app);
            Ok(())
        }
        Command::Logout => commands::logout(app).await,
    }
}

/// Log failure events emitted while the command ran.
fn drain_failures(receiver: &mut broadcast::Receiver<Event>) {
    let filter = EventFilter {
        categories: None,
        failures_only: true,
    };
    while let Ok(event) = receiver.try_recv() {
        if filter.matches(&event) {
            warn!(event = ?event.kind, "persistence diagnostic");
        }
    }
}

//! Bookshelf API server and administration commands

use anyhow::{Context, bail};
use bookshelf::{
    access_control::Permission,
    auth::manager,
    config::{AppConfig, LogFormat, load_config},
    seed::{seed_demo_users, seed_groups},
    server,
    store::Store,
};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Bookshelf - permission-gated book catalogue API
#[derive(Parser, Debug)]
#[command(name = "bookshelf")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "BOOKSHELF_CONFIG", global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides logging.level
    #[arg(long, env = "BOOKSHELF_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run migrations, then serve the HTTP API (default)
    Serve,

    /// Apply pending database migrations
    Migrate,

    /// Create the Viewers, Editors and Admins groups with their permissions
    SeedGroups,

    /// Create one demo identity per group (password: testpass123)
    SeedUsers,

    /// Create a regular identity; the password comes from --password or BOOKSHELF_PASSWORD
    CreateUser {
        email: String,
        #[arg(long, env = "BOOKSHELF_PASSWORD")]
        password: String,
    },

    /// Create a superuser
    CreateSuperuser {
        email: String,
        #[arg(long, env = "BOOKSHELF_PASSWORD")]
        password: String,
    },

    /// Activate or deactivate an identity
    SetActive {
        email: String,
        #[arg(action = ArgAction::Set)]
        active: bool,
    },

    /// Add an identity to a group
    AddToGroup { email: String, group: String },

    /// Grant a permission directly to an identity
    Grant { email: String, permission: String },
}

fn init_logging(config: &AppConfig, level: Option<&str>) {
    let level = level.unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    match config.logging.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

async fn open_store(config: &AppConfig) -> anyhow::Result<Store> {
    let store = Store::connect(&config.database)
        .await
        .with_context(|| format!("Failed to open database {}", config.database.url))?;
    store.migrate().await.context("Failed to apply migrations")?;
    Ok(store)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    init_logging(&config, args.log_level.as_deref());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        database = %config.database.url,
        "Starting bookshelf"
    );

    let pepper = config.auth.pepper().map(str::to_owned);
    let pepper = pepper.as_deref();

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            if let Err(e) = server::run(config).await {
                error!(error = %e, "Server failed");
                return Err(e.into());
            }
        }
        Command::Migrate => {
            open_store(&config).await?;
            println!("Migrations applied.");
        }
        Command::SeedGroups => {
            let store = open_store(&config).await?;
            let report = seed_groups(&store).await?;
            print!("{report}");
            println!("Groups and permissions setup complete.");
        }
        Command::SeedUsers => {
            let store = open_store(&config).await?;
            let report = seed_demo_users(&store, pepper).await?;
            print!("{report}");
        }
        Command::CreateUser { email, password } => {
            let store = open_store(&config).await?;
            let mut conn = store.acquire().await?;
            let identity = manager::create_user(&mut conn, &email, &password, pepper).await?;
            println!("Created identity {} (id {})", identity.email, identity.id);
        }
        Command::CreateSuperuser { email, password } => {
            let store = open_store(&config).await?;
            let mut conn = store.acquire().await?;
            let identity = manager::create_superuser(&mut conn, &email, &password, pepper).await?;
            println!("Created superuser {} (id {})", identity.email, identity.id);
        }
        Command::SetActive { email, active } => {
            let store = open_store(&config).await?;
            let mut conn = store.acquire().await?;
            manager::set_active(&mut conn, &email, active).await?;
            println!(
                "{} is now {}",
                email,
                if active { "active" } else { "inactive" }
            );
        }
        Command::AddToGroup { email, group } => {
            let store = open_store(&config).await?;
            let mut conn = store.acquire().await?;
            if manager::add_to_group(&mut conn, &email, &group).await? {
                println!("Added {} to {}", email, group);
            } else {
                println!("{} is already in {}", email, group);
            }
        }
        Command::Grant { email, permission } => {
            let Some(permission) = Permission::try_parse(&permission) else {
                let known: Vec<_> = Permission::all().iter().map(|p| p.codename()).collect();
                bail!(
                    "Unknown permission '{}'; expected one of: {}",
                    permission,
                    known.join(", ")
                );
            };
            let store = open_store(&config).await?;
            let mut conn = store.acquire().await?;
            if manager::grant_permission(&mut conn, &email, permission).await? {
                println!("Granted {} ({}) to {}", permission, permission.label(), email);
            } else {
                println!("{} already holds {}", email, permission);
            }
        }
    }

    Ok(())
}

use anyhow::Context;
use clap::{Parser, Subcommand};
use nutriwise_core::catalog::{CatalogStore, StaticCatalog};
use nutriwise_core::domain::contract::ProfileRequest;
use nutriwise_core::stack::{build_stack, StackOptions};
use nutriwise_core::storage::catalog::PgCatalog;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod sync;

#[derive(Debug, Parser)]
#[command(name = "nutriwise_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load the supplement catalog into the database.
    SyncCatalog {
        /// Use the built-in reference catalog instead of CATALOG_BASE_URL.
        #[arg(long)]
        seed: bool,

        /// Fetch and validate the catalog without writing to the database.
        #[arg(long)]
        dry_run: bool,
    },

    /// Build a stack for a profile JSON file and print it.
    Build {
        #[arg(long)]
        profile: PathBuf,

        /// Store the stack in the database.
        #[arg(long)]
        persist: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = nutriwise_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    match args.command {
        Command::SyncCatalog { seed, dry_run } => {
            let source = if seed {
                sync::CatalogSource::Seed
            } else {
                sync::CatalogSource::Http
            };

            if dry_run {
                let candidates = sync::fetch_catalog(&settings, source).await?;
                tracing::info!(
                    source = source.as_str(),
                    dry_run = true,
                    candidates_len = candidates.len(),
                    "catalog sync (dry-run)"
                );
                return Ok(());
            }

            let pool = connect(&settings).await?;
            sync::sync_catalog(&pool, &settings, source).await?;
        }
        Command::Build { profile, persist } => {
            let raw = std::fs::read_to_string(&profile)
                .with_context(|| format!("failed to read profile file {}", profile.display()))?;
            let request: ProfileRequest = serde_json::from_str(&raw)
                .with_context(|| format!("profile file is not a valid profile: {}", profile.display()))?;
            let user_profile = request.validate_and_into_profile()?;

            let pool = if settings.database_url.is_some() || persist {
                Some(connect(&settings).await?)
            } else {
                None
            };

            let (catalog_source, candidates) = match &pool {
                Some(pool) => {
                    let store = PgCatalog::new(pool.clone());
                    (store.store_name(), store.list_candidates().await?)
                }
                None => {
                    let store = StaticCatalog::default();
                    (store.store_name(), store.list_candidates().await?)
                }
            };

            let stack = build_stack(&user_profile, &candidates, &StackOptions::from_env());

            if persist {
                if let Some(pool) = &pool {
                    let stack_id = nutriwise_core::storage::stacks::persist_stack(
                        pool,
                        &user_profile,
                        catalog_source,
                        &stack,
                    )
                    .await?;
                    tracing::info!(%stack_id, "persisted supplement stack");
                }
            }

            println!("{}", serde_json::to_string_pretty(&stack)?);
        }
    }

    Ok(())
}

async fn connect(settings: &nutriwise_core::config::Settings) -> anyhow::Result<sqlx::PgPool> {
    let db_url = settings.require_database_url()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(db_url)
        .await
        .context("connect DATABASE_URL failed")?;

    nutriwise_core::storage::migrate(&pool).await?;
    Ok(pool)
}

fn init_sentry(settings: &nutriwise_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

use anyhow::{Context, Result};
use avs_genai::GeminiClient;
use avs_objects::LocalObjectStore;
use avs_server::{routes, seed, AppState, StudioConfig, VERSION};
use avs_store::{MemoryStorage, Storage};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let config = Arg::new("config")
        .long("config")
        .short('c')
        .value_parser(value_parser!(PathBuf))
        .help("Path to a TOML configuration file");

    Command::new("avs-server")
        .version(VERSION)
        .about("Ad Variants Studio API server")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("serve")
                .about("Run the HTTP API")
                .arg(config.clone())
                .arg(
                    Arg::new("log-json")
                        .long("log-json")
                        .action(ArgAction::SetTrue)
                        .help("Emit logs as JSON lines"),
                )
                .arg(
                    Arg::new("seed")
                        .long("seed")
                        .action(ArgAction::SetTrue)
                        .help("Insert the demo dataset before serving"),
                ),
        )
        .subcommand(
            Command::new("seed")
                .about("Insert the demo dataset into the configured storage")
                .arg(config),
        )
}

fn init_tracing(json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|err| anyhow::anyhow!("installing log subscriber: {err}"))
}

fn load_config(args: &ArgMatches) -> Result<StudioConfig> {
    let path = args.get_one::<PathBuf>("config");
    StudioConfig::load(path.map(PathBuf::as_path)).context("loading configuration")
}

async fn open_storage(config: &StudioConfig) -> Result<Arc<dyn Storage>> {
    match &config.storage.database_url {
        None => {
            info!("Using in-memory storage");
            Ok(Arc::new(MemoryStorage::new()))
        }
        #[cfg(feature = "postgres")]
        Some(url) => {
            let max = config.storage.max_connections.unwrap_or(10);
            let storage = avs_store::PgStorage::connect(url, max)
                .await
                .context("connecting to database")?;
            storage.migrate().await.context("running migrations")?;
            info!("Using PostgreSQL storage");
            Ok(Arc::new(storage))
        }
        #[cfg(not(feature = "postgres"))]
        Some(_) => anyhow::bail!("DATABASE_URL is set but PostgreSQL support is not compiled in"),
    }
}

fn print_summary(summary: &seed::SeedSummary) {
    if summary.is_empty() {
        println!("Demo data already present, nothing inserted.");
        return;
    }
    println!("Seeded demo data:");
    println!("  Users:    {}", summary.users);
    println!("  Clients:  {}", summary.clients);
    println!("  Projects: {}", summary.projects);
    println!("  Assets:   {}", summary.assets);
    println!("  Variants: {}", summary.variants);
    println!();
    println!("Login credentials:");
    println!("  Admin: {} / admin123", seed::ADMIN_EMAIL);
    println!("  User:  {} / user123", seed::USER_EMAIL);
}

async fn serve(args: &ArgMatches) -> Result<()> {
    init_tracing(args.get_flag("log-json"))?;
    let config = load_config(args)?;

    let storage = open_storage(&config).await?;
    if args.get_flag("seed") {
        if !config.is_memory_storage() {
            warn!("Seeding a persistent database at startup");
        }
        seed(storage.as_ref()).await.context("seeding demo data")?;
    }

    if config.genai.api_key.is_none() {
        warn!("No GEMINI_API_KEY or GOOGLE_AI_API_KEY set; generation requests will fail");
    }
    let generator = GeminiClient::new(config.genai.clone()).context("building AI client")?;
    let objects = LocalObjectStore::new(&config.objects.root);

    let addr = config.addr();
    let state = AppState::new(config, storage, Arc::new(generator), Arc::new(objects));
    info!(%addr, version = VERSION, "Ad Variants Studio listening");

    let (_, server) = warp::serve(routes::app(&state))
        .try_bind_with_graceful_shutdown(addr, async {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutting down");
        })
        .with_context(|| format!("binding {addr}"))?;
    server.await;
    Ok(())
}

async fn seed_command(args: &ArgMatches) -> Result<()> {
    init_tracing(false)?;
    let config = load_config(args)?;
    let storage = open_storage(&config).await?;
    if config.is_memory_storage() {
        warn!("No DATABASE_URL configured; seeded data lives only for this process");
    }
    let summary = seed(storage.as_ref()).await.context("seeding demo data")?;
    print_summary(&summary);
    Ok(())
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();

    let result = match matches.subcommand() {
        Some(("serve", args)) => serve(args).await,
        Some(("seed", args)) => seed_command(args).await,
        _ => Ok(()),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

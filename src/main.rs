use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use repograph::config::Config;
use repograph::github::GithubClient;
use repograph::repository::{Language, RepositoryDescriptor};
use repograph::server::{self, AppState};
use repograph::service::{DependencyDataService, build_manifest_graph};
use repograph::snapshot::storage_keys;
use repograph::storage::FileObjectStore;

#[derive(Parser)]
#[command(name = "repograph")]
#[command(about = "Dependency graph aggregation for project health dashboards", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "REPOGRAPH_CONFIG", default_value = "repograph.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default behavior)
    Serve,
    /// Rebuild the dependency graph once, store it and exit
    Build,
    /// Parse a local manifest and print its graph contribution as JSON
    Parse {
        /// Path to the manifest (pyproject.toml or package.json)
        #[arg(short, long)]
        file: PathBuf,

        /// Repository language: python or javascript
        #[arg(short, long)]
        language: String,

        /// Repository name used for the repository node
        #[arg(short, long, default_value = "local")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let result = match cli.command {
        Some(Commands::Build) => run_build(&cli.config).await,
        Some(Commands::Parse {
            file,
            language,
            name,
        }) => run_parse(&cli.config, file, language, name).await,
        Some(Commands::Serve) | None => run_serve(&cli.config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn app_state(config: Config) -> anyhow::Result<AppState> {
    let github = GithubClient::from_config(&config.github)?;
    Ok(AppState {
        service: DependencyDataService::new(Arc::new(github), config.owners),
        repositories: config.repositories,
        store: Arc::new(FileObjectStore::new(config.storage.root)),
        site_folder: config.storage.site_folder,
    })
}

async fn run_serve(config_path: &Path) -> anyhow::Result<()> {
    let config = Config::load(config_path)?;
    tracing::info!(
        "Starting repograph with {} configured repositories",
        config.repositories.len()
    );
    let listen_addr = config.server.listen_addr.clone();
    server::serve(Arc::new(app_state(config)?), &listen_addr).await
}

async fn run_build(config_path: &Path) -> anyhow::Result<()> {
    let state = app_state(Config::load(config_path)?)?;
    let envelope = state.refresh().await?;

    let keys = storage_keys(&state.site_folder, &envelope.metadata.created_at);
    println!("{}", keys.timestamped);
    println!("{}", keys.latest);
    if !envelope.metadata.failed_repositories.is_empty() {
        eprintln!(
            "Failed repositories: {}",
            envelope.metadata.failed_repositories.join(", ")
        );
    }
    Ok(())
}

async fn run_parse(
    config_path: &Path,
    file: PathBuf,
    language: String,
    name: String,
) -> anyhow::Result<()> {
    // Configured repositories and owner rules apply when there is a config file
    let config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        Config::default()
    };

    let repository = RepositoryDescriptor {
        name,
        owner: "local".to_string(),
        build_name: None,
        language: Language::from(language),
        branch: None,
    };
    let content = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let graph = build_manifest_graph(
        &repository,
        &content,
        &config.repositories,
        &config.owners,
    )?;
    println!("{}", serde_json::to_string_pretty(&graph)?);
    Ok(())
}

//! StarCache - caching proxy for GitHub trending repositories
//!
//! Main entry point for the StarCache CLI.

use clap::{Parser, Subcommand};
use serde::Serialize;
use starcache::config::{validate_config_result, AppConfig};
use starcache::server::StarCacheServer;
use starcache::service::{ReadmeService, TrendingService};
use starcache::storage::{Database, ProjectStore, ReadmeStore};
use starcache::upstream::{GitHubClient, TimeWindow, Upstream};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

/// StarCache - GitHub trending cache and API server
#[derive(Parser, Debug)]
#[command(name = "starcache")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: ~/.config/starcache/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for the HTTP server
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Path to the SQLite database
    #[arg(long, env = "STARCACHE_DATABASE")]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write the default configuration file
    Init,

    /// Run the HTTP API server
    Serve,

    /// Show trending repositories with their READMEs
    Trending {
        /// Language filter (empty for all languages)
        #[arg(short, long, default_value = "")]
        language: String,

        /// Time window: daily, weekly or monthly
        #[arg(short, long, default_value = "monthly")]
        since: String,

        /// Number of repositories to return
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },

    /// Show the README for a repository
    Readme {
        /// Repository owner
        owner: String,

        /// Repository name
        repo: String,
    },

    /// List cached projects, most starred first
    List {
        /// Rows to skip
        #[arg(long, default_value_t = 0)]
        skip: usize,

        /// Maximum rows to return
        #[arg(short = 'n', long, default_value_t = 100)]
        limit: usize,
    },

    /// Search cached projects by name or description
    Search {
        /// Search text
        query: String,

        /// Maximum rows to return
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Show a cached project
    Show {
        /// Project id
        id: String,
    },

    /// Delete a cached project and its README
    Delete {
        /// Project id
        id: String,
    },
}

fn main() {
    // Initialize logging
    if let Err(e) = starcache::logging::init() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> starcache::Result<()> {
    // Handle init command first (creates config)
    if let Commands::Init = cli.command {
        return handle_init_command(cli.config.as_deref());
    }

    let config = load_config(&cli)?;
    validate_config_result(&config)?;

    let db = Database::open(&config.database)?;
    let projects = ProjectStore::new(db.clone());

    match cli.command {
        // Handled above
        Commands::Init => {}
        Commands::Serve => {
            let upstream = github_client(&config)?;
            let addr = config.server.bind_addr();
            block_on(StarCacheServer::new(&config, db, upstream).run(&addr))?;
        }
        Commands::Trending {
            language,
            since,
            count,
        } => {
            let upstream = github_client(&config)?;
            let readmes = ReadmeService::new(projects.clone(), ReadmeStore::new(db), upstream.clone());
            let trending = TrendingService::new(projects, readmes, upstream);
            let window = TimeWindow::parse(&since);
            let rows = block_on(trending.get_with_cache(&language, window, count))?;
            print_json(&rows)?;
        }
        Commands::Readme { owner, repo } => {
            let upstream = github_client(&config)?;
            let readmes = ReadmeService::new(projects, ReadmeStore::new(db), upstream);
            let text = block_on(async { Ok(readmes.get_with_cache(&owner, &repo).await) })?;
            println!("{}", text);
        }
        Commands::List { skip, limit } => {
            print_json(&projects.list(skip, limit)?)?;
        }
        Commands::Search { query, limit } => {
            if query.is_empty() {
                return Err(starcache::StarCacheError::Other(
                    "Search query must not be empty".to_string(),
                ));
            }
            print_json(&projects.search(&query, limit)?)?;
        }
        Commands::Show { id } => match projects.get(&id)? {
            Some(project) => print_json(&project)?,
            None => {
                return Err(starcache::StarCacheError::NotFound(format!(
                    "Project {}",
                    id
                )))
            }
        },
        Commands::Delete { id } => {
            if !projects.delete(&id)? {
                return Err(starcache::StarCacheError::NotFound(format!(
                    "Project {}",
                    id
                )));
            }
            println!("✓ Deleted project {}", id);
        }
    }

    Ok(())
}

/// Config file (explicit path, default path, or defaults) with CLI overrides applied
fn load_config(cli: &Cli) -> starcache::Result<AppConfig> {
    let mut config = match cli.config {
        Some(ref path) => AppConfig::load(path)?,
        None => AppConfig::load_or_default()?,
    };

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref database) = cli.database {
        config.database.path = database.clone();
    }

    tracing::debug!(
        port = config.server.port,
        database = %config.database.path.display(),
        "Configuration resolved"
    );
    Ok(config)
}

fn github_client(config: &AppConfig) -> starcache::Result<Arc<dyn Upstream>> {
    let client = GitHubClient::new(&config.github)?;
    tracing::debug!(authenticated = client.is_authenticated(), "GitHub client ready");
    Ok(Arc::new(client))
}

fn block_on<F, T>(future: F) -> starcache::Result<T>
where
    F: std::future::Future<Output = starcache::Result<T>>,
{
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(future)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> starcache::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_init_command(config_path: Option<&std::path::Path>) -> starcache::Result<()> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => AppConfig::default_path(),
    };

    // Check if already initialized
    if config_file.exists() {
        println!("Configuration already exists at {}", config_file.display());
        return Ok(());
    }

    let config = AppConfig::default();
    config.save(&config_file)?;

    println!("✓ Created configuration at {}", config_file.display());
    println!();
    println!("Next steps:");
    println!("  1. Export a GitHub token to raise the API rate limit:");
    println!("     export {}=<token>", config.github.token_env);
    println!();
    println!("  2. Start the API server:");
    println!("     starcache serve");

    Ok(())
}

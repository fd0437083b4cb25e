//! git-revcache - serve a cached view of a git repository's history
//!
//! # Usage
//! ```bash
//! git-revcache /path/to/repository            # Start server
//! git-revcache /path/to/repository --port 8080
//! git-revcache check                          # Report git version compatibility
//! ```

use axum::Router;
use clap::{Parser, Subcommand};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use git_revcache::git::{CacheConfig, Registry, Retention, discover_git_dir, git_version};
use git_revcache::routes;

/// Revision cache server for git repositories
#[derive(Parser)]
#[command(name = "git-revcache")]
#[command(about = "Cached commit graph and history queries over HTTP", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the git repository (working tree or git directory)
    #[arg(value_name = "REPO_PATH")]
    repo_path: Option<String>,

    /// Port to run the server on
    #[arg(short, long, default_value = "3001")]
    port: u16,

    /// Git executable used for every repository query
    #[arg(long, global = true, default_value = "git")]
    git_bin: String,

    /// Number of parsed commit messages kept in memory
    #[arg(long, default_value = "200")]
    commit_cache_size: usize,

    /// Number of object sizes kept in memory
    #[arg(long, default_value = "2000")]
    object_cache_size: usize,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the git version and whether it is supported
    Check,
}

fn handle_check(git_bin: &str) {
    match git_version(git_bin) {
        Ok(version) if version.compatible => {
            println!("✓ {} (>= {})", version.version, version.minimum);
        }
        Ok(version) => {
            eprintln!("✗ {} is too old", version.version);
            eprintln!("  At least git {} is required", version.minimum);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("✗ Could not run '{}': {}", git_bin, e);
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Check) = cli.command {
        handle_check(&cli.git_bin);
        return Ok(());
    }

    let repo_path = match cli.repo_path {
        Some(path) => path,
        None => {
            eprintln!("Usage: git-revcache <REPO_PATH>");
            eprintln!("       git-revcache check");
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let version = git_version(&cli.git_bin)?;
    if !version.compatible {
        eprintln!("✗ {} is too old, need at least {}", version.version, version.minimum);
        std::process::exit(1);
    }
    tracing::info!("using {}", version.version);

    let git_dir = match discover_git_dir(&repo_path) {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("✗ Failed to open repository: {}", e);
            eprintln!("  Path: {}", repo_path);
            std::process::exit(1);
        }
    };

    let config = CacheConfig {
        git_bin: cli.git_bin,
        commit_cache_size: cli.commit_cache_size,
        object_size_cache_size: cli.object_cache_size,
    };
    let registry = Registry::new(config);
    let cache = registry.acquire(&git_dir, Retention::Strong)?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::create_router(cache))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("127.0.0.1:{}", cli.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("✗ Failed to bind to port {}: {}", cli.port, e);
            eprintln!("  Try a different port with --port <PORT>");
            std::process::exit(1);
        }
    };

    println!();
    println!("  Repository: {}", git_dir.display());
    println!("  Server:     http://{}", addr);
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
        }
        println!("\n  Shutting down...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

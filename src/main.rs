//! CLI entry point for cms-blog

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cms_blog::commands::list::PageLimit;

#[derive(Parser)]
#[command(name = "cms-blog")]
#[command(version)]
#[command(about = "A static blog generator backed by a headless CMS", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new blog
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Generate static files
    #[command(alias = "g")]
    Generate {
        /// Regenerate every post, ignoring the cache
        #[arg(short, long)]
        force: bool,
    },

    /// Start a local preview server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Serve the existing build without generating first
        #[arg(long)]
        no_generate: bool,
    },

    /// Clean the public folder and cache
    Clean,

    /// List posts as the listing page loads them
    List {
        /// Number of listing pages to load
        #[arg(long, default_value = "1", conflicts_with = "all")]
        pages: usize,

        /// Load every page
        #[arg(long)]
        all: bool,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "cms_blog=debug,info"
    } else {
        "cms_blog=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing blog in {:?}", target_dir);
            cms_blog::commands::init::init_site(&target_dir)?;
            println!("Initialized blog in {:?}", target_dir);
        }

        Commands::Generate { force } => {
            let blog = cms_blog::Blog::new(&base_dir)?;
            tracing::info!("Generating static files...");
            blog.generate(force).await?;
            println!("Generated successfully!");
        }

        Commands::Server {
            port,
            ip,
            no_generate,
        } => {
            let blog = cms_blog::Blog::new(&base_dir)?;

            if !no_generate {
                tracing::info!("Generating static files...");
                // Posts that failed to build are retried on request
                if let Err(e) = blog.generate(false).await {
                    tracing::warn!("{:#}", e);
                }
            }

            let generator = cms_blog::generator::Generator::new(&blog)?;
            tracing::info!("Starting server at http://{}:{}", ip, port);
            cms_blog::server::start(generator, &ip, port, blog.config.server.fallback).await?;
        }

        Commands::Clean => {
            let blog = cms_blog::Blog::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            blog.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { pages, all } => {
            let blog = cms_blog::Blog::new(&base_dir)?;
            let limit = if all {
                PageLimit::All
            } else {
                PageLimit::Pages(pages)
            };
            cms_blog::commands::list::run(&blog, limit).await?;
        }

        Commands::Version => {
            println!("cms-blog version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

//! CLI entry point for cardpress

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cardpress::commands::commit::CommitOutcome;
use cardpress::config::{SourceKind, TargetKind};
use cardpress::Cardpress;

#[derive(Parser)]
#[command(name = "cardpress")]
#[command(version)]
#[command(about = "Sync blog posts from Trello, the CardPress API or GitHub and publish them", long_about = None)]
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
    /// Create cardpress.yml, .env.example and the content directories
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Fetch posts from a source and publish them to a target
    Sync {
        /// Source to read posts from (defaults to `sync.source`)
        #[arg(long, value_enum)]
        from: Option<SourceKind>,

        /// Target to write posts to (defaults to `sync.target`)
        #[arg(long, value_enum)]
        to: Option<TargetKind>,

        /// Trigger the deploy hook after publishing
        #[arg(long)]
        deploy: bool,
    },

    /// Upload the content directory (or the generated site) to GitHub
    Publish {
        /// GitHub target to use
        #[arg(long, value_enum)]
        to: Option<TargetKind>,

        /// Publish the generated site instead of the markdown content
        #[arg(long)]
        site: bool,

        /// Branch to publish to
        #[arg(short, long)]
        branch: Option<String>,

        /// Trigger the deploy hook after publishing
        #[arg(long)]
        deploy: bool,
    },

    /// Generate the static site
    #[command(alias = "g")]
    Generate,

    /// Point bare image references in HTML files at /imgs/
    FixImages {
        /// Directory to fix (defaults to the output directory)
        dir: Option<PathBuf>,
    },

    /// List local content
    List {
        /// Type of content to list (post, tag)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Delete the output directory
    Clean,

    /// Commit and push the working tree
    Commit,

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "cardpress=debug,info"
    } else {
        "cardpress=info"
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
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing cardpress site in {:?}", target_dir);
            cardpress::commands::init::init_site(&target_dir)?;
            println!("Initialized cardpress site in {:?}", target_dir);
        }

        Commands::Sync { from, to, deploy } => {
            let app = Cardpress::new(&base_dir)?;
            cardpress::commands::sync::run(&app, from, to, deploy).await?;
        }

        Commands::Publish {
            to,
            site,
            branch,
            deploy,
        } => {
            let app = Cardpress::new(&base_dir)?;
            cardpress::commands::publish::run(&app, to, site, branch.as_deref(), deploy).await?;
        }

        Commands::Generate => {
            let app = Cardpress::new(&base_dir)?;
            tracing::info!("Generating static files...");
            let report = cardpress::commands::generate::run(&app)?;
            println!(
                "Generated {} posts, {} categories and {} images in {:?}",
                report.posts, report.categories, report.images, app.output_dir
            );
        }

        Commands::FixImages { dir } => {
            let app = Cardpress::new(&base_dir)?;
            let dir = dir.map(|d| if d.is_absolute() { d } else { base_dir.join(d) });
            let changed = cardpress::commands::fix_images::run(&app, dir.as_deref())?;
            println!("Fixed image paths in {} files", changed);
        }

        Commands::List { r#type } => {
            let app = Cardpress::new(&base_dir)?;
            cardpress::commands::list::run(&app, &r#type)?;
        }

        Commands::Clean => {
            let app = Cardpress::new(&base_dir)?;
            if cardpress::commands::clean::run(&app)? {
                println!("Cleaned successfully!");
            }
        }

        Commands::Commit => {
            let app = Cardpress::new(&base_dir)?;
            match cardpress::commands::commit::run(&app)? {
                CommitOutcome::NothingToCommit => println!("No changes to commit"),
                CommitOutcome::Pushed { message } => println!("Committed and pushed: {}", message),
            }
        }

        Commands::Version => {
            println!("cardpress version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

//! Scion - dependency graphs, project knowledge, and feature transplants

use clap::{Parser, Subcommand};
use scion_core::Language;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "scion")]
#[command(about = "Index codebases, keep what you learn about them, and move features between them")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Project root directory
    #[arg(short, long, global = true, default_value = ".")]
    root: PathBuf,

    /// Project registry used to find other projects by name
    #[arg(long, global = true)]
    registry: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Index the project and replace its dependency graph
    Index {
        /// Declared project language; detected from manifests when omitted
        #[arg(short, long)]
        language: Option<Language>,

        /// Project name; the root directory name when omitted
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Search modules, or learnings with --knowledge
    Find {
        query: String,

        #[arg(short, long)]
        knowledge: bool,

        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },

    /// Show which modules depend on a module, directly or not
    Impact { module: String },

    /// Package a module and its dependency closure as a feature
    Extract {
        /// Search query selecting the primary module
        query: Option<String>,

        /// Use this module as the primary instead of searching
        #[arg(long, conflicts_with = "query")]
        from: Option<String>,

        #[arg(short, long)]
        name: Option<String>,

        /// Embed the text of every component
        #[arg(long)]
        snapshots: bool,
    },

    /// Plan how an extracted feature maps onto another project
    Plan {
        feature: String,

        /// Registered name of the target project
        #[arg(short, long)]
        target: String,
    },

    /// Record what a module does
    Learn {
        module: String,
        summary: String,

        #[arg(long)]
        purpose: Option<String>,

        /// `name=description`, repeatable
        #[arg(long = "function")]
        functions: Vec<String>,

        #[arg(long = "gotcha")]
        gotchas: Vec<String>,

        /// Replace an existing learning
        #[arg(long)]
        relearn: bool,
    },

    /// Re-capture the source reference of a stale learning
    Refresh { module: String },

    /// List learnings whose source changed since they were recorded
    Stale,

    /// Move knowledge out of a legacy graph document
    Migrate,

    /// Remove the project's data directory
    Clear,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::new(format!("scion={}", log_level)))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Scion v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Index { language, project } => commands::index(cli.root, project, language),
        Commands::Find {
            query,
            knowledge,
            limit,
        } => commands::find(cli.root, &query, knowledge, limit),
        Commands::Impact { module } => commands::impact(cli.root, &module),
        Commands::Extract {
            query,
            from,
            name,
            snapshots,
        } => commands::extract(cli.root, query, from, name, snapshots),
        Commands::Plan { feature, target } => {
            commands::plan(cli.root, cli.registry, &feature, &target)
        }
        Commands::Learn {
            module,
            summary,
            purpose,
            functions,
            gotchas,
            relearn,
        } => commands::learn(
            cli.root,
            commands::LearnArgs {
                module,
                summary,
                purpose,
                functions,
                gotchas,
                relearn,
            },
        ),
        Commands::Refresh { module } => commands::refresh(cli.root, &module),
        Commands::Stale => commands::stale(cli.root),
        Commands::Migrate => commands::migrate(cli.root),
        Commands::Clear => commands::clear(cli.root),
    }
}

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};

use molviewspec_embed::assemble::{BuildPlan, DEFAULT_ENTRY};

#[derive(Parser)]
#[command(name = "molviewspec-build", version)]
#[command(about = "Assemble the MolViewSpec document-embedding bundles")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the main bundle and the editor worker bundles
    Build {
        /// Entry module of the main bundle
        #[arg(long, default_value = DEFAULT_ENTRY)]
        entry: String,

        /// Loader configuration (import map) shared by all compile steps
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory for the extension bundle
        #[arg(long, default_value = "_extensions/molviewspec-quarto")]
        extension_dir: PathBuf,

        /// esbuild binary to invoke
        #[arg(long, default_value = "esbuild")]
        esbuild: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Build {
            entry,
            config,
            extension_dir,
            esbuild,
        } => {
            let mut plan = BuildPlan::new(extension_dir);
            plan.entry = entry;
            plan.config_path = config;

            let report =
                molviewspec_embed::build_bundles(&plan, esbuild).context("build failed")?;

            eprintln!("build complete:");
            for artifact in &report.artifacts {
                eprintln!("  - {}", artifact.display());
            }
            Ok(())
        }
    }
}

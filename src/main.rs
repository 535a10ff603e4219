use clap::{Parser, Subcommand};
use pressa::pipeline::{self, BuildOptions};
use pressa::{config, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that read content.
#[derive(clap::Args, Clone)]
struct CacheArgs {
    /// Disable the read cache — force re-parsing of all documents
    #[arg(long)]
    no_cache: bool,
}

#[derive(Parser)]
#[command(name = "pressa")]
#[command(about = "Static site generator for multilingual writing")]
#[command(long_about = "\
Static site generator for multilingual writing

Your filesystem is the data source. Markdown files become pages, directories
become categories, and a language suffix in the filename marks a translation.

Content structure:

  content/
  ├── site.toml                    # Site config (optional)
  ├── prose/                       # Directory name = default category
  │   ├── hello.md                 # Canonical document (default language)
  │   ├── hello.fr.md              # French translation of the same slug
  │   └── drafts-welcome.md        # status = \"draft\" renders under drafts/
  └── notes/
      └── quick.md

Front matter is TOML between +++ fences:

  +++
  title = \"Hello\"
  date = 2024-01-15
  tags = [\"rust\", \"writing\"]
  +++

Metadata resolution (first available wins):
  Slug:     front matter → filename stem (minus language suffix)
  Language: front matter → filename suffix (hello.fr.md → \"fr\") → default
  Category: front matter → parent directory name

Run 'pressa gen-config' to generate a documented site.toml.")]
#[command(version)]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read content and render the full site
    Build(CacheArgs),
    /// Validate content without writing anything
    Check,
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Build(cache_args) => {
            println!("==> Building {}", cli.source.display());
            let summary = pipeline::build(&BuildOptions {
                source: cli.source,
                output: cli.output.clone(),
                no_cache: cache_args.no_cache,
            })?;
            output::print_build_summary(&summary);
            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let report = pipeline::check(&cli.source)?;
            output::print_check_report(&report);
            if !report.is_clean() {
                std::process::exit(1);
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

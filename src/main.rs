use clap::Parser;
use paprika_export::auth::{self, FileTokenStore, MemoryTokenStore, StdinPrompt, TokenStore};
use paprika_export::export::{self, ExportOptions};
use paprika_export::{config, output};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "paprika-export")]
#[command(about = "Export Paprika recipes to Markdown and .paprikarecipe archives")]
#[command(long_about = "\
Export Paprika recipes to Markdown and .paprikarecipe archives

Each recipe in your Paprika cloud account is written twice:

  <MARKDOWN_DIR>/weeknight-dal.md              # YAML frontmatter + body
  <ARCHIVE_DIR>/Weeknight Dal.paprikarecipe    # importable into Paprika

Only recipes that changed since the last export are fetched. The Markdown
directory is the record of what was exported: delete a file there to
re-export that recipe, or pass --skip-cache-check to re-export everything.

Credentials: a cached token is reused while Paprika accepts it. Otherwise
PAPRIKA_EMAIL and PAPRIKA_PASSWORD are read from the environment, or asked
for on the terminal.")]
#[command(version)]
struct Cli {
    /// Directory for Markdown documents (must exist)
    markdown_dir: PathBuf,

    /// Directory for .paprikarecipe archives (must exist)
    archive_dir: PathBuf,

    /// Re-export every recipe, ignoring stored hashes
    #[arg(short = 's', long)]
    skip_cache_check: bool,

    /// Config file (default: <config dir>/paprika-export/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Run one export. `Ok(false)` means some recipe could not be written.
async fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let config = config::load_config(cli.config.as_deref())?;

    let store: Box<dyn TokenStore> = match FileTokenStore::for_credentials(&config.credentials) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("Token will not be cached: {e}");
            Box::new(MemoryTokenStore::new())
        }
    };
    let client = auth::authenticate(&config.api, store.as_ref(), &StdinPrompt).await?;

    let options = ExportOptions::new(
        &cli.markdown_dir,
        &cli.archive_dir,
        cli.skip_cache_check,
        &config.markdown.layout,
    );
    let report = export::export(&client, &options).await?;
    output::print_report(&report, &cli.markdown_dir, &cli.archive_dir);
    Ok(report.is_success())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

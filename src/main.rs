// Entrypoint for the CLI application.
// - Keeps `main` small: resolve configuration, build the API client and
//   hand it to the interactive menu, or run a single search.
// - Returns `anyhow::Result` so setup errors are reported with context.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use imgmatch_cli::api::ApiClient;
use imgmatch_cli::config::{Config, Overrides};
use imgmatch_cli::controller::Controller;
use imgmatch_cli::ui;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "imgmatch", about = "Find similar images with a remote similarity service")]
struct Cli {
    /// Base address of the similarity service
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Request timeout in seconds (0 disables it)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load one image, submit it and print the matches.
    Search(SearchArgs),
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Image URL to download
    #[arg(long, conflicts_with = "file", required_unless_present = "file")]
    url: Option<String>,
    /// Local image file
    #[arg(long)]
    file: Option<PathBuf>,
    /// Print matches as JSON instead of the grid
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    // Logs go to stderr so they never mix with menu output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&Overrides {
        base_url: cli.base_url,
        timeout_secs: cli.timeout_secs,
    })?;
    tracing::debug!(?config, "resolved configuration");
    let api = ApiClient::new(&config)?;

    match cli.command {
        None => ui::main_menu(api)?,
        Some(Commands::Search(args)) => search_once(api, args)?,
    }
    Ok(())
}

fn search_once(api: ApiClient, args: SearchArgs) -> Result<()> {
    let mut controller = Controller::new(api);
    let acquired = match (&args.url, &args.file) {
        (Some(url), _) => controller.select_by_url(url).map(|_| ()),
        (None, Some(path)) => controller.select_by_file(path).map(|_| ()),
        (None, None) => anyhow::bail!("either --url or --file is required"),
    };
    if let Err(notice) = acquired {
        anyhow::bail!("{}", notice);
    }
    if let Some(image) = controller.selection() {
        if !args.json {
            ui::print_preview(image, false);
        }
    }

    let results = match controller.submit() {
        Ok(results) => results,
        Err(notice) => anyhow::bail!("{}", notice),
    };
    if args.json {
        let out = serde_json::to_string_pretty(results.images()).context("Serializing matches")?;
        println!("{}", out);
    } else {
        ui::print_results(&results);
    }
    Ok(())
}

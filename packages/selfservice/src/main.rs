use std::path::PathBuf;

use clap::Parser;
use tokio::io::BufReader;

use crest_core::ConnectionFactory;
use crest_selfservice::{
    initialise, list_resources, logging, serve_lines, Config, Error, Overrides, LOG_ENV,
};

/// Self-service example - a user collection and an e-mail action behind a router
#[derive(Parser, Debug)]
#[command(name = "selfservice-example")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Route of the user collection
    #[arg(long)]
    users_path: Option<String>,

    /// Route of the e-mail singleton
    #[arg(long)]
    email_path: Option<String>,

    /// Start with an empty user collection
    #[arg(long)]
    no_seed: bool,

    /// Read JSON-lines requests from this file instead of stdin
    #[arg(long, conflicts_with = "no_input")]
    requests: Option<PathBuf>,

    /// Don't serve requests; print the users and exit
    #[arg(long)]
    no_input: bool,

    /// Log filter directives (overrides CREST_LOG and RUST_LOG)
    #[arg(long)]
    log_filter: Option<String>,

    /// Log as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn load_config(args: &Args) -> Result<Config, Error> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let overrides = Overrides {
        users_path: args.users_path.clone(),
        email_path: args.email_path.clone(),
        no_seed: args.no_seed,
        log_filter: args.log_filter.clone(),
        log_json: args.log_json,
    };
    Ok(config.apply_overrides(std::env::var(LOG_ENV).ok(), &overrides))
}

async fn run(args: Args) -> Result<(), Error> {
    let config = load_config(&args)?;
    logging::init(&config.log)?;

    let factory = initialise(&config).await?;
    let connection = factory.connection()?;

    if args.no_input {
        list_resources(&connection, &config.users_path, tokio::io::stdout()).await?;
        return Ok(());
    }

    let stats = match &args.requests {
        Some(path) => {
            let file = tokio::fs::File::open(path).await?;
            serve_lines(&connection, BufReader::new(file), tokio::io::stdout()).await?
        }
        None => {
            serve_lines(
                &connection,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            )
            .await?
        }
    };
    tracing::info!(succeeded = stats.succeeded, failed = stats.failed, "done");
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

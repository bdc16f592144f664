//! Poolsync CLI - import Cognito user pool members into a Mailchimp audience.

mod commands;
mod config;
mod progress;
mod shutdown;

use clap::{CommandFactory, Parser};
use console::Term;
use tracing_subscriber::EnvFilter;

use crate::commands::import::ImportTarget;

#[derive(Parser)]
#[command(name = "poolsync")]
#[command(version)]
#[command(about = "Import AWS Cognito users into a Mailchimp audience")]
#[command(
    long_about = "Poolsync reads every user of an AWS Cognito user pool, page by page, and \
subscribes each user's email address to a Mailchimp audience. Users the audience \
rejects are reported and skipped. Failed page fetches are retried with an \
escalating delay until the pool is exhausted."
)]
#[command(after_long_help = r#"EXAMPLES
    Import a user pool:
        $ poolsync us-east-1_AbCdEfGhI 0123456789abcdef0123456789abcdef-us6 a1b2c3d4e5

    Give up on a page after 5 failed attempts:
        $ poolsync --max-attempts 5 us-east-1_AbCdEfGhI <api-key> <list-id>

MAILCHIMP
    API key:      https://mailchimp.com/help/about-api-keys/#Find_or_generate_your_API_key
    Audience id:  https://mailchimp.com/help/find-audience-id/

AWS CREDENTIALS
    Cognito is queried with the standard AWS credential chain (environment,
    ~/.aws/credentials, SSO or instance profile). The credentials need the
    cognito-idp:ListUsers permission on the pool. The region is taken from
    the pool id.

CONFIGURATION
    Poolsync reads configuration from:
      1. ~/.config/poolsync/config.toml (or $XDG_CONFIG_HOME/poolsync/config.toml)
      2. ./poolsync.toml
      3. Environment variables (POOLSYNC_* prefix, sections separated by __)
      4. .env file in current directory

ENVIRONMENT VARIABLES
    POOLSYNC_COGNITO__POOL_ID         Cognito user pool id
    POOLSYNC_COGNITO__PAGE_SIZE       Users per page (1-60)
    POOLSYNC_MAILCHIMP__API_KEY       Mailchimp API key
    POOLSYNC_MAILCHIMP__LIST_ID       Mailchimp audience id
    POOLSYNC_IMPORT__MAX_ATTEMPTS     Attempts per page before giving up (default: unlimited)
"#)]
struct Cli {
    /// Cognito user pool id, e.g. us-east-1_AbCdEfGhI
    pool_id: Option<String>,

    /// Mailchimp API key, ending in the data center suffix (e.g. -us6)
    api_key: Option<String>,

    /// Mailchimp audience (list) id
    list_id: Option<String>,

    /// Give up after this many failed attempts at one page (default: retry forever)
    #[arg(short = 'm', long, value_parser = clap::value_parser!(u32).range(1..))]
    max_attempts: Option<u32>,

    /// Users to request per page (1-60)
    #[arg(short = 'p', long, value_parser = clap::value_parser!(i32).range(1..=60))]
    page_size: Option<i32>,

    /// Delay before the first retry of a failed page, in milliseconds
    #[arg(long)]
    initial_backoff_ms: Option<u64>,

    /// Maximum delay between retries, in milliseconds
    #[arg(long)]
    max_backoff_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing for non-TTY mode (structured logging)
    if !Term::stdout().is_term() {
        let env_filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::new("poolsync=info,poolsync_cli=info"),
        };

        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    // Load configuration (config file -> env vars -> defaults)
    let mut config = config::Config::load();

    let cli = Cli::parse();

    if let Some(ms) = cli.initial_backoff_ms {
        config.import.initial_backoff_ms = ms;
    }
    if let Some(ms) = cli.max_backoff_ms {
        config.import.max_backoff_ms = ms;
    }
    let options = config.import.import_options(cli.max_attempts);

    let Some(target) =
        ImportTarget::resolve(cli.pool_id, cli.api_key, cli.list_id, cli.page_size, &config)
    else {
        Cli::command().print_long_help()?;
        return Ok(());
    };

    let cancel = shutdown::setup_shutdown_handler();
    commands::import::handle_import(target, options, cancel).await?;

    Ok(())
}

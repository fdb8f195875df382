use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use guichet::browser::CdpBrowser;
use guichet::config::{default_config_path, Config};
use guichet::models::AccountRequest;
use guichet::ocr::TesseractRecognizer;
use guichet::portal::CaisseEpargne;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "guichet")]
#[command(about = "Fetches bank balances from an image-keypad protected portal")]
struct Cli {
    /// Path to config file (defaults to guichet.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the configured checking account balance
    Checking,
    /// Fetch balances for specific euro account ids
    Balances { account_ids: Vec<String> },
    /// Show current configuration
    Config,
}

async fn build_portal(config: &Config) -> Result<CaisseEpargne<CdpBrowser, TesseractRecognizer>> {
    let browser = CdpBrowser::launch().await?;
    let recognizer = TesseractRecognizer::new(config.recognition.tessdata_path.clone());
    Ok(CaisseEpargne::new(
        browser,
        recognizer,
        config.portal.clone(),
        config.timing.clone(),
    ))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "info,chromiumoxide=warn,chromiumoxide::conn=off,chromiumoxide::handler=off",
            )
        }))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.unwrap_or_else(default_config_path);
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    match cli.command.unwrap_or(Command::Checking) {
        Command::Config => {
            println!("Config file: {}", config_path.display());
            println!("Portal identifier: {}", config.portal.account_id);
            println!("Checking account: {}", config.portal.checking_account);
        }
        Command::Checking => {
            let portal = build_portal(&config).await?;
            let balance = portal.get_checking_account_balance().await?;
            println!(
                "{}: {} {}",
                config.portal.checking_account, balance.amount, balance.currency
            );
        }
        Command::Balances { account_ids } => {
            let portal = build_portal(&config).await?;
            let requests: Vec<AccountRequest> =
                account_ids.into_iter().map(AccountRequest::eur).collect();
            let balances = portal.get_balances(&requests).await?;
            for (account_id, balance) in &balances {
                println!("{account_id}: {} {}", balance.amount, balance.currency);
            }
        }
    }

    Ok(())
}

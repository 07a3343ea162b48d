use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use clap::{Args, Parser, Subcommand};
use pares_domain::seed::demo_dataset;
use pares_marketplace_service::auth::{AuthService, PasswordHashing, seeded_store};
use pares_marketplace_service::config::Config;
use serde_json::json;

#[derive(Parser)]
#[command(name = "pares-ops")]
#[command(about = "Operator commands for the Pares marketplace service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(name = "token:issue")]
    TokenIssue(TokenIssueArgs),
    #[command(name = "password:hash")]
    PasswordHash(PasswordHashArgs),
    #[command(name = "seed:dump")]
    SeedDump(SeedDumpArgs),
}

#[derive(Args)]
struct TokenIssueArgs {
    /// Email of a demo account.
    #[arg(long)]
    email: String,
}

#[derive(Args)]
struct PasswordHashArgs {
    password: String,
}

#[derive(Args)]
struct SeedDumpArgs {
    #[arg(long)]
    compact: bool,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::TokenIssue(args) => run_token_issue(args).await,
        Commands::PasswordHash(args) => run_password_hash(args),
        Commands::SeedDump(args) => run_seed_dump(args),
    }
}

async fn run_token_issue(args: TokenIssueArgs) -> Result<()> {
    let config = Config::from_env().context("failed to load config")?;
    let hashing = PasswordHashing::from_config(&config);
    let store = seeded_store(&hashing, Utc::now());
    let auth = AuthService::from_config(&config, store);

    let session = auth
        .issue_for_email(args.email.trim())
        .await
        .with_context(|| format!("cannot issue a token for {}", args.email.trim()))?;

    let output = json!({
        "userId": session.user.id,
        "userType": session.user.user_type.as_str(),
        "token": session.token.token,
        "expiresAt": session.token.expires_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        "cookieName": config.auth_cookie_name,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_password_hash(args: PasswordHashArgs) -> Result<()> {
    let config = Config::from_env().context("failed to load config")?;
    let hash = PasswordHashing::from_config(&config)
        .hash(&args.password)
        .context("failed to hash password")?;
    println!("{hash}");
    Ok(())
}

fn run_seed_dump(args: SeedDumpArgs) -> Result<()> {
    let dataset = demo_dataset(Utc::now());
    let encoded = if args.compact {
        serde_json::to_string(&dataset)?
    } else {
        serde_json::to_string_pretty(&dataset)?
    };
    println!("{encoded}");
    Ok(())
}

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};
use std::io::Read;

use stellar_credit::auth::password::{DEFAULT_HASH_COST, DEFAULT_HASH_MEMORY_KIB};
use stellar_credit::auth::CredentialHasher;

#[derive(Parser)]
#[command(name = "credit-cli")]
#[command(about = "Client CLI for the Stellar credit service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Bearer token from `session` or `login`.
    #[arg(short, long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a wallet session
    Session {
        address: String,
        #[arg(long, default_value = "")]
        message: String,
        #[arg(long)]
        signature: String,
    },
    /// Operator login
    Login { username: String, password: String },
    /// Score a wallet and check a loan request
    Score {
        wallet: String,
        #[arg(long)]
        amount: f64,
        #[arg(long, default_value_t = 12)]
        duration_months: u32,
    },
    /// Show the most recent score of a wallet
    LastScore { wallet: String },
    /// List offers for a score
    Offers { score: u16 },
    /// Show rate limiter statistics (operator token required)
    Limiter,
    /// Show service status (operator token required)
    Status,
    /// Hash a password read from stdin for the operator config
    HashPassword {
        #[arg(long, default_value_t = DEFAULT_HASH_COST)]
        cost: u32,
        #[arg(long, default_value_t = DEFAULT_HASH_MEMORY_KIB)]
        memory_kib: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token))?,
        );
    }

    match cli.command {
        Commands::Session {
            address,
            message,
            signature,
        } => {
            let res = client
                .post(format!("{}/api/v1/auth/session", cli.url))
                .json(&json!({ "address": address, "message": message, "signature": signature }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Login { username, password } => {
            let res = client
                .post(format!("{}/api/v1/auth/login", cli.url))
                .json(&json!({ "username": username, "password": password }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Score {
            wallet,
            amount,
            duration_months,
        } => {
            let res = client
                .post(format!("{}/api/v1/score", cli.url))
                .headers(headers)
                .json(&json!({
                    "wallet": wallet,
                    "amount": amount,
                    "duration_months": duration_months
                }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::LastScore { wallet } => {
            let res = client
                .get(format!("{}/api/v1/score/{}", cli.url, wallet))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Offers { score } => {
            let res = client
                .get(format!("{}/api/v1/offers/{}", cli.url, score))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Limiter => {
            let res = client
                .get(format!("{}/api/v1/admin/limiter", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Status => {
            let res = client
                .get(format!("{}/api/v1/admin/status", cli.url))
                .headers(headers)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::HashPassword { cost, memory_kib } => {
            let mut password = String::new();
            std::io::stdin().read_to_string(&mut password)?;
            let password = password.trim_end_matches(['\r', '\n']);
            if password.is_empty() {
                eprintln!("Error: no password on stdin");
                return Ok(());
            }
            let hasher = CredentialHasher::new(cost, memory_kib)?;
            println!("{}", hasher.hash(password)?);
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the service gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    /// Registry API key, sent as x-api-key on mutating calls.
    #[arg(short, long)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every registered service now
    Health,
    /// List registered services
    Registry,
    /// Show circuit breaker state per service
    Circuits,
    /// Register (or refresh) a service
    Register {
        name: String,
        base_url: String,
        #[arg(long, default_value = "1.0.0")]
        version: String,
        #[arg(long = "endpoint")]
        endpoints: Vec<String>,
    },
    /// Report a service's health
    Heartbeat {
        name: String,
        #[arg(long)]
        unhealthy: bool,
    },
    /// Remove a service from the registry
    Deregister { name: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert("x-api-key", HeaderValue::from_str(key)?);
    }

    let res = match cli.command {
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
        Commands::Registry => client.get(format!("{}/registry", base)).send().await?,
        Commands::Circuits => client.get(format!("{}/registry/circuits", base)).send().await?,
        Commands::Register {
            name,
            base_url,
            version,
            endpoints,
        } => {
            client
                .post(format!("{}/registry/register", base))
                .headers(headers)
                .json(&json!({
                    "name": name,
                    "baseUrl": base_url,
                    "version": version,
                    "endpoints": endpoints,
                }))
                .send()
                .await?
        }
        Commands::Heartbeat { name, unhealthy } => {
            client
                .post(format!("{}/registry/heartbeat", base))
                .headers(headers)
                .json(&json!({ "name": name, "healthy": !unhealthy }))
                .send()
                .await?
        }
        Commands::Deregister { name } => {
            client
                .delete(format!("{}/registry/{}", base, name))
                .headers(headers)
                .send()
                .await?
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        eprintln!("Response: {}", text);
        return Ok(());
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}

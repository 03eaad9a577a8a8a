use clap::{Parser, Subcommand};
use serde_json::Value;

use failover_proxy::http::server::DIAGNOSTIC_PATH;

#[derive(Parser)]
#[command(name = "failover-cli")]
#[command(about = "Operational CLI for the failover proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current health snapshot and last failover event
    Status,
    /// List per-origin statuses only
    Origins,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}{}", cli.url, DIAGNOSTIC_PATH))
        .header("accept", "application/json")
        .send()
        .await?;

    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: diagnostic endpoint returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    match cli.command {
        Commands::Status => {
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::Origins => {
            let origins = json.get("origins").cloned().unwrap_or(Value::Null);
            println!("{}", serde_json::to_string_pretty(&origins)?);
        }
    }

    Ok(())
}

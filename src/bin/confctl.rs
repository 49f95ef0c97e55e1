use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "confctl")]
#[command(about = "Inspect and edit a live-config admin API", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:5500")]
    url: String,

    /// Bearer token, if the server requires one
    #[arg(short, long, env = "LIVE_CONFIG_API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show manager state and source
    Status,
    /// List the scalar fields of the live configuration
    Fields,
    /// Submit a JSON file as the new configuration
    Save {
        /// JSON payload; keys it omits keep their current value
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    }

    let res = match cli.command {
        Commands::Status => {
            client
                .get(format!("{}/status", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Fields => {
            client
                .get(format!("{}/fields.json", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::Save { file } => {
            let body = std::fs::read(&file)?;
            serde_json::from_slice::<Value>(&body)
                .map_err(|e| format!("{} is not valid JSON: {}", file.display(), e))?;
            client
                .post(format!("{}/save", cli.url))
                .headers(headers)
                .header(CONTENT_TYPE, "application/json; charset=utf-8")
                .body(body)
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
        eprintln!("Error: admin API returned status {}", status);
        if !text.is_empty() {
            eprintln!("{}", text);
        }
        std::process::exit(1);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gatekeeper-cli")]
#[command(about = "Inspection CLI for a running gatekeeper", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Bearer token; without one the anonymous table answers.
    #[arg(short, long)]
    token: Option<String>,

    /// Origin header to send (restricted environments require the allowed domain).
    #[arg(short, long)]
    origin: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check gateway status
    Status,
    /// List the routes reachable with the given credentials
    Routes,
    /// Show the identity bound to the token
    Whoami,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}"))?);
    }
    if let Some(origin) = &cli.origin {
        headers.insert("origin", HeaderValue::from_str(origin)?);
    }

    let path = match cli.command {
        Commands::Status => "/status",
        Commands::Routes => "/routes",
        Commands::Whoami => "/whoami",
    };

    let res = client
        .get(format!("{}{}", cli.url.trim_end_matches('/'), path))
        .headers(headers)
        .send()
        .await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let body: Value = match res.json().await {
        Ok(body) => body,
        Err(e) => {
            eprintln!("Error: gateway returned status {status} with a non-JSON body ({e})");
            return Ok(());
        }
    };

    if !status.is_success() {
        eprintln!("Error: gateway returned status {status}");
        if let Some(message) = body.get("message").and_then(Value::as_str) {
            eprintln!("Message: {message}");
        }
        return Ok(());
    }

    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "proxygrid-cli")]
#[command(about = "Query a running ProxyGrid gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, default_value = "/api/proxygrid")]
    prefix: String,

    /// Bearer token forwarded to the backend.
    #[arg(short, long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a search
    Search {
        /// Search engine (e.g. google)
        engine: String,
        query: String,
    },
    /// Fetch video data by id
    Video {
        id: String,
        /// Fetch the metadata view
        #[arg(long)]
        info: bool,
    },
    /// GET an arbitrary endpoint path, e.g. "/content/hackernews?type=top"
    Get { path: String },
    /// Check gateway health
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token))?);
    }

    let base = format!("{}{}", cli.url.trim_end_matches('/'), cli.prefix);
    let request = match &cli.command {
        Commands::Search { engine, query } => client
            .get(format!("{}/search/{}", base, engine))
            .query(&[("q", query)]),
        Commands::Video { id, info } => {
            let suffix = if *info { "/info" } else { "" };
            client.get(format!("{}/video/youtube/{}{}", base, id, suffix))
        }
        Commands::Get { path } => client.get(format!("{}/{}", base, path.trim_start_matches('/'))),
        Commands::Health => client.get(format!("{}/health", cli.url.trim_end_matches('/'))),
    };

    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if let Some(remaining) = res.headers().get("x-ratelimit-remaining") {
        eprintln!("Rate limit remaining: {}", remaining.to_str().unwrap_or("?"));
    }
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
    }

    let is_json = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/json"));

    if is_json {
        let json: Value = res.json().await?;
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else if let Ok(text) = res.text().await {
        println!("{}", text);
    }
    Ok(())
}

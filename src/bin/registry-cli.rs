use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "registry-cli")]
#[command(about = "Management CLI for the route registry", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8089")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check registry status and table size
    Status,
    /// Dump the routing table
    Routes,
    /// Register a backend for one or more URIs
    Register(EventArgs),
    /// Unregister a backend from one or more URIs
    Unregister(EventArgs),
}

#[derive(clap::Args)]
struct EventArgs {
    #[arg(long)]
    host: String,

    #[arg(long)]
    port: u16,

    /// Repeatable: --uri foo.example.com --uri bar.example.com
    #[arg(long, required = true)]
    uri: Vec<String>,

    #[arg(long, default_value = "")]
    app: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Status => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Routes => {
            let res = client.get(format!("{}/routes", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Register(args) => {
            let res = client
                .post(format!("{}/events/register", cli.url))
                .json(&event_body(&args))
                .send()
                .await?;
            println!("{}", res.status());
        }
        Commands::Unregister(args) => {
            let res = client
                .post(format!("{}/events/unregister", cli.url))
                .json(&event_body(&args))
                .send()
                .await?;
            println!("{}", res.status());
        }
    }

    Ok(())
}

fn event_body(args: &EventArgs) -> Value {
    json!({
        "host": args.host,
        "port": args.port,
        "uris": args.uri,
        "app": args.app,
    })
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: registry API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

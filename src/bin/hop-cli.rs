use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use hop_trace::http::DegradedTrace;
use hop_trace::trace::normalize_target;
use hop_trace::HopChain;
use reqwest::StatusCode;

#[derive(Parser)]
#[command(name = "hop-cli")]
#[command(about = "Query a hop-trace responder and print the path it reports", long_about = None)]
struct Cli {
    /// Responder to query, as a URL or bare host:port
    #[arg(default_value = "localhost:8080")]
    target: String,

    /// Path to request on the responder
    #[arg(short, long, default_value = "/")]
    path: String,

    /// Request timeout in milliseconds
    #[arg(short, long, default_value_t = 10_000)]
    timeout_ms: u64,

    /// Print the raw JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}

/// Returns `Ok(false)` when the responder reported a degraded trace.
async fn run(cli: &Cli) -> Result<bool, Box<dyn std::error::Error>> {
    let base = normalize_target(&cli.target)?;
    let url = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        cli.path.trim_start_matches('/')
    );

    let client = reqwest::Client::builder()
        .timeout(Duration::from_millis(cli.timeout_ms))
        .no_proxy()
        .build()?;
    let res = client.get(&url).send().await?;
    let status = res.status();
    let body = res.bytes().await?;

    match status {
        StatusCode::OK => {
            let chain: HopChain = serde_json::from_slice(&body)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&chain)?);
            } else {
                print_chain(&chain);
            }
            Ok(true)
        }
        StatusCode::BAD_GATEWAY => {
            let degraded: DegradedTrace = serde_json::from_slice(&body)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&degraded)?);
            } else {
                eprintln!("Trace degraded: {}", degraded.error);
                print_chain(&degraded.chain);
            }
            Ok(false)
        }
        other => {
            eprintln!("Error: responder returned status {other}");
            if let Ok(text) = std::str::from_utf8(&body) {
                eprintln!("Response: {text}");
            }
            Err(format!("unexpected status {other}").into())
        }
    }
}

fn print_chain(chain: &HopChain) {
    println!(
        "{:<4} {:<20} {:<20} {:<24} {:<24} {}",
        "HOP", "POD", "NODE", "SOURCE", "DESTINATION", "URL"
    );
    // Farthest hop first, so the queried responder is the last row.
    for (i, hop) in chain.iter().enumerate() {
        println!(
            "{:<4} {:<20} {:<20} {:<24} {:<24} {}",
            i + 1,
            or_dash(hop.pod_name()),
            or_dash(hop.node_name()),
            or_dash(hop.request_source()),
            or_dash(hop.request_destination()),
            hop.request_url()
        );
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

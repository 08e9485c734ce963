//! Transflow CLI - Command-line client for the translation daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;
use tabled::{Table, Tabled};

const DEFAULT_RPC_URL: &str = "http://127.0.0.1:9527";

#[derive(Parser)]
#[command(name = "transflow")]
#[command(about = "Transflow translation pipeline CLI", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// RPC server URL
    #[arg(long, env = "TRANSFLOW_RPC_URL", default_value = DEFAULT_RPC_URL)]
    rpc_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a text for translation
    Submit {
        /// Target language code (e.g., en, fr, de)
        #[arg(short, long)]
        target_language: String,

        /// Text to translate
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        text: Option<String>,

        /// Read the text from a file
        #[arg(long)]
        file: Option<PathBuf>,

        /// Job id (default: random UUID)
        #[arg(long)]
        client_id: Option<String>,
    },

    /// Show the snapshot of one job
    Status {
        /// Job id
        client_id: String,
    },

    /// List every known job
    List,

    /// Show dispatcher queue state
    Queue,

    /// Show job counts and uptime
    Stats,

    /// Poll a job until it completes or fails
    Watch {
        /// Job id
        client_id: String,

        /// Poll interval in milliseconds
        #[arg(short, long, default_value = "1000")]
        interval_ms: u64,
    },
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: serde_json::Value,
    id: u64,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: String,
    #[allow(dead_code)]
    id: u64,
    result: Option<serde_json::Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Deserialize, Tabled)]
struct SubmitResult {
    client_id: String,
    status: String,
}

#[derive(Debug, Clone, Deserialize)]
struct Snapshot {
    client_id: String,
    target_language: String,
    status: String,
    phase: Option<String>,
    packet_count: usize,
    packets_processed: usize,
    time_remaining: i64,
    translated_text: String,
    stage_a_done: bool,
    stage_a_output: String,
    stage_b_done: bool,
    stage_b_output: String,
}

impl Snapshot {
    fn is_terminal(&self) -> bool {
        self.status == "COMPLETED" || self.status == "ERROR"
    }

    fn state_label(&self) -> String {
        match &self.phase {
            Some(phase) => format!("{}/{}", self.status, phase),
            None => self.status.clone(),
        }
    }

    fn progress(&self) -> String {
        format!("{}/{}", self.packets_processed, self.packet_count)
    }
}

#[derive(Tabled)]
struct SnapshotRow {
    client_id: String,
    language: String,
    state: String,
    packets: String,
    stage_a: bool,
    stage_b: bool,
}

impl From<&Snapshot> for SnapshotRow {
    fn from(s: &Snapshot) -> Self {
        Self {
            client_id: s.client_id.clone(),
            language: s.target_language.clone(),
            state: s.state_label(),
            packets: s.progress(),
            stage_a: s.stage_a_done,
            stage_b: s.stage_b_done,
        }
    }
}

#[derive(Deserialize)]
struct ListResult {
    count: usize,
    translations: BTreeMap<String, Snapshot>,
}

#[derive(Deserialize)]
struct QueueResult {
    status_message: String,
    pending: usize,
    in_flight: Vec<String>,
}

async fn call_rpc(url: &str, method: &str, params: serde_json::Value) -> Result<serde_json::Value> {
    let request = JsonRpcRequest {
        jsonrpc: "2.0".to_string(),
        method: method.to_string(),
        params,
        id: 1,
    };

    let client = reqwest::Client::new();
    let response: JsonRpcResponse = client
        .post(url)
        .json(&request)
        .send()
        .await
        .context("Failed to connect to daemon")?
        .json()
        .await
        .context("Failed to parse response")?;

    if let Some(error) = response.error {
        anyhow::bail!("RPC error ({}): {}", error.code, error.message);
    }

    response
        .result
        .ok_or_else(|| anyhow::anyhow!("No result in response"))
}

async fn fetch_snapshot(url: &str, client_id: &str) -> Result<Snapshot> {
    let result = call_rpc(url, "translation.status.v1", json!({ "client_id": client_id })).await?;
    serde_json::from_value(result).context("Unexpected status payload")
}

fn print_snapshot(snapshot: &Snapshot) {
    let status = match snapshot.status.as_str() {
        "COMPLETED" => snapshot.status.green().bold(),
        "ERROR" => snapshot.status.red().bold(),
        "PROCESSING" => snapshot.status.yellow().bold(),
        _ => snapshot.status.normal(),
    };

    println!("  {} {}", "Client:".bold(), snapshot.client_id);
    println!("  {} {}", "Status:".bold(), status);
    if let Some(phase) = &snapshot.phase {
        println!("  {} {}", "Phase:".bold(), phase);
    }
    println!("  {} {}", "Packets:".bold(), snapshot.progress());
    if !snapshot.is_terminal() {
        println!("  {} ~{}s", "Remaining:".bold(), snapshot.time_remaining);
    }

    if snapshot.status == "ERROR" {
        println!("  {} {}", "Error:".bold(), snapshot.translated_text.red());
    } else if !snapshot.translated_text.is_empty() {
        println!();
        println!("{}", "Translation".cyan().bold());
        println!("{}", snapshot.translated_text);
    }
    if snapshot.stage_a_done {
        println!();
        println!("{}", "Transform stage".cyan().bold());
        println!("{}", snapshot.stage_a_output);
    }
    if snapshot.stage_b_done {
        println!();
        println!("{}", "Secondary translation".cyan().bold());
        println!("{}", snapshot.stage_b_output);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Submit {
            target_language,
            text,
            file,
            client_id,
        } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                (None, None) => anyhow::bail!("Either --text or --file is required"),
            };
            let client_id = client_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

            let params = json!({
                "client_id": client_id,
                "text": text,
                "target_language": target_language,
            });

            let result = call_rpc(&cli.rpc_url, "translation.submit.v1", params).await?;
            let submit_result: SubmitResult = serde_json::from_value(result)?;

            println!("{}", "✓ Translation submitted".green().bold());
            println!();
            println!("{}", Table::new(vec![submit_result]));
        }

        Commands::Status { client_id } => {
            let snapshot = fetch_snapshot(&cli.rpc_url, &client_id).await?;
            print_snapshot(&snapshot);
        }

        Commands::List => {
            let result = call_rpc(&cli.rpc_url, "translation.list.v1", json!({})).await?;
            let list: ListResult = serde_json::from_value(result)?;

            if list.count == 0 {
                println!("{}", "No translations".yellow());
            } else {
                let rows: Vec<SnapshotRow> = list.translations.values().map(SnapshotRow::from).collect();
                println!("{}", Table::new(rows));
                println!("{} translation(s)", list.count);
            }
        }

        Commands::Queue => {
            let result = call_rpc(&cli.rpc_url, "translation.queue.v1", json!({})).await?;
            let queue: QueueResult = serde_json::from_value(result)?;

            println!("  {} {}", "Status:".bold(), queue.status_message);
            println!("  {} {}", "Pending:".bold(), queue.pending);
            if queue.in_flight.is_empty() {
                println!("  {} none", "In flight:".bold());
            } else {
                println!("  {} {}", "In flight:".bold(), queue.in_flight.join(", "));
            }
        }

        Commands::Stats => {
            println!("{}", "System Status".cyan().bold());
            println!();

            match call_rpc(&cli.rpc_url, "admin.stats.v1", json!({})).await {
                Ok(stats) => {
                    println!("  {} {}", "RPC URL:".bold(), cli.rpc_url);
                    println!("  {} {}", "Status:".bold(), "ONLINE".green());
                    println!();
                    println!("  {} {}", "Total:".bold(), stats["total"]);
                    println!("  {} {}", "Queued:".bold(), stats["queued"]);
                    println!("  {} {}", "Processing:".bold(), stats["processing"]);
                    println!("  {} {}", "Completed:".bold(), stats["completed"]);
                    println!("  {} {}", "Error:".bold(), stats["error"]);
                    println!("  {} {}", "Pending:".bold(), stats["pending"]);
                    println!();
                    println!("  {} {} seconds", "Uptime:".bold(), stats["uptime_seconds"]);
                }
                Err(e) => {
                    println!("  {} {}", "Status:".bold(), "ERROR".red());
                    println!("  {} {}", "Error:".bold(), e);
                }
            }
        }

        Commands::Watch {
            client_id,
            interval_ms,
        } => {
            let interval = Duration::from_millis(interval_ms.max(100));
            let mut last_line = String::new();

            let snapshot = loop {
                let snapshot = fetch_snapshot(&cli.rpc_url, &client_id).await?;
                let line = format!("{} packets {}", snapshot.state_label(), snapshot.progress());
                if line != last_line {
                    println!("  {} {}", "•".bold(), line);
                    last_line = line;
                }
                if snapshot.is_terminal() {
                    break snapshot;
                }
                tokio::time::sleep(interval).await;
            };

            println!();
            print_snapshot(&snapshot);
            if snapshot.status == "ERROR" {
                anyhow::bail!("Translation {} failed", client_id);
            }
        }
    }

    Ok(())
}

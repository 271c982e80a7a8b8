use clap::{Parser, Subcommand};

use dagwatch::client::{Client, ClientError};
use dagwatch::state::NodeStatus;

#[derive(Parser, Debug)]
#[command(name = "dagwatch", about = "DAG compute session CLI")]
struct Cli {
    /// WebSocket address of the compute server.
    #[arg(long, env = "DAGWATCH_URL", default_value = "ws://127.0.0.1:8765")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream node status transitions until the server closes.
    Watch,
    /// Send one parameter update after the handshake completes.
    Set {
        node_ind: usize,
        key: String,
        value: f64,
        /// Treat VALUE as a percentage (sent normalized to 0..1).
        #[arg(long)]
        percentage: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Watch => run_watch(&cli.url).await,
        Command::Set {
            node_ind,
            key,
            value,
            percentage,
        } => run_set(&cli.url, node_ind, &key, value, percentage).await,
    }
}

async fn run_watch(url: &str) -> Result<(), ClientError> {
    let mut client = Client::new();
    client.connect(url).await?;

    let mut seen: Vec<(NodeStatus, f64)> = Vec::new();
    let mut load_done = false;

    while let Some(alerts) = client.step().await? {
        for alert in alerts {
            eprintln!("{alert}");
        }

        let state = client.state();
        if seen.len() != state.nodes().len() {
            println!("dag ready: {} nodes", state.nodes().len());
            seen = vec![(NodeStatus::NotReady, 0.0); state.nodes().len()];
        }
        for (index, node) in state.nodes().iter().enumerate() {
            let current = (node.status, node.progress);
            if seen[index] != current {
                println!(
                    "node {index}: {:?} {:.0}%",
                    node.status,
                    node.progress * 100.0
                );
                seen[index] = current;
            }
        }
        if !load_done && state.load_complete() {
            println!("initial load complete");
            load_done = true;
        }
    }

    println!("connection closed");
    Ok(())
}

async fn run_set(
    url: &str,
    node_ind: usize,
    key: &str,
    value: f64,
    percentage: bool,
) -> Result<(), ClientError> {
    let mut client = Client::new();
    client.connect(url).await?;

    // Wait for the handshake so the update lands on a known node list.
    while !client.state().got_initial() {
        let Some(alerts) = client.step().await? else {
            eprintln!("connection closed before handshake");
            return Ok(());
        };
        for alert in alerts {
            eprintln!("{alert}");
        }
    }

    client.update_param(node_ind, key, value, percentage).await?;
    println!("param update sent: node {node_ind} {key}={value}");

    client.disconnect().await?;
    // Drain until the close completes on the wire.
    while client.step().await?.is_some() {}
    Ok(())
}

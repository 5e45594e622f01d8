//! Scripted client walk-through against a running server.
//!
//! Connects, performs the handshake, lists tools, calls `add_numbers(5, 7)`,
//! lists resources, and reads the example file, printing every exchange.

use serde_json::{json, Value};

use toolwire::{Client, ClientConfig, McpResult};

use crate::resources::example;
use crate::tools::add_numbers;

/// One request/response pair of the walk-through.
#[derive(Debug, Clone)]
pub struct DemoStep {
    pub title: &'static str,
    pub result: Value,
}

/// Run the walk-through on an initialized client.
pub async fn run_steps(client: &Client) -> McpResult<Vec<DemoStep>> {
    let mut steps = Vec::new();

    let tools = client.list_tools().await?;
    steps.push(DemoStep {
        title: "Available tools",
        result: serde_json::to_value(&tools)?,
    });

    let sum = client
        .call_tool(add_numbers::NAME, json!({"a": 5, "b": 7}))
        .await?;
    steps.push(DemoStep {
        title: "add_numbers(5, 7)",
        result: sum,
    });

    let resources = client.list_resources().await?;
    steps.push(DemoStep {
        title: "Available resources",
        result: serde_json::to_value(&resources)?,
    });

    let contents = client.read_resource(example::URI).await?;
    steps.push(DemoStep {
        title: "Read file:///example.txt",
        result: serde_json::to_value(&contents)?,
    });

    Ok(steps)
}

/// Connect to `url`, run the walk-through, and print it to stdout.
pub async fn run(url: &str, config: ClientConfig) -> anyhow::Result<()> {
    println!("Connecting to {url}");
    let client = Client::connect_websocket(url, config).await?;

    if let Some(server) = client.server().await {
        println!(
            "Initialized: {} v{} (protocol {})",
            server.server_info.name, server.server_info.version, server.protocol_version
        );
    }

    let steps = run_steps(&client).await;
    client.close().await?;

    for step in steps? {
        println!();
        println!("== {} ==", step.title);
        println!("{}", serde_json::to_string_pretty(&step.result)?);
    }

    println!();
    println!("MCP Demo Complete!");
    Ok(())
}

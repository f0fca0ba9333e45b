//! List the tools of an MCP server and optionally call one.
//!
//! Run with: cargo run --example probe_server -- <server> [tool] [json-args]

use runtime::tools::args::decode_arguments;
use runtime::{McpToolHost, ToolHost};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let Some(server) = args.next() else {
        eprintln!("usage: probe_server <server> [tool] [json-args]");
        std::process::exit(2);
    };

    println!("Spawning MCP server: {server}");
    let host = McpToolHost::spawn(&server).await?;

    let tools = host.list_tools().await?;
    println!("\nDiscovered {} tools:", tools.len());
    for tool in &tools {
        println!("  - {}", tool.name);
        if !tool.description.is_empty() {
            println!("    {}", tool.description);
        }
    }

    if let Some(name) = args.next() {
        let raw = args.next().unwrap_or_else(|| "{}".to_string());
        let arguments = decode_arguments(&name, &serde_json::Value::String(raw))?;

        println!("\nCalling {name}...");
        match host.call_tool(&name, arguments).await {
            Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            Err(e) => println!("Error: {e}"),
        }
    }

    host.shutdown().await?;
    Ok(())
}

//! Stdio MCP transport for Claude Code and other stdio-based clients.
//!
//! One JSON-RPC message per line on stdin, one response per line on stdout.
//! Logs go to stderr - stdout belongs to the protocol.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use crate::protocol;
use crate::tools::Registry;

/// Serve MCP over stdin/stdout until EOF.
pub async fn run(registry: Registry) -> Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(stdin).lines();

    info!("MCP server ready on stdio");

    while let Some(line) = lines
        .next_line()
        .await
        .context("Failed to read from stdin")?
    {
        if line.trim().is_empty() {
            continue;
        }

        let response = match protocol::handle_line(&registry, &line) {
            Some(response) => response,
            None => continue,
        };

        let body = serde_json::to_string(&response).context("Failed to serialize response")?;
        stdout.write_all(body.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}

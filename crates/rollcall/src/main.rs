//! rollcall - schema-validated user registry served over MCP stdio
//!
//! Startup creates the in-memory users table, registers the addUser and
//! getUsers tools, and blocks serving stdin until EOF. A failure to open
//! the store aborts the process.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use rollcall::db::Database;
use rollcall::serve;
use rollcall::tools::Registry;

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(about = "Schema-validated user registry served over MCP stdio")]
#[command(version)]
struct Cli {}

#[tokio::main]
async fn main() -> Result<()> {
    let _cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let db = Arc::new(Database::in_memory()?);
    let registry = Registry::with_user_tools(db);

    serve::run(registry).await
}

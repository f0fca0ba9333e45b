use std::process::ExitCode;
use std::sync::Arc;

use reddit::{ContentApi, Credentials, RedditClient, RedditError, RedditServer};
use rmcp::ServiceExt;
use rmcp::transport::stdio;
use thiserror::Error;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum Error {
    #[error(transparent)]
    Reddit(#[from] RedditError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("mcp error: {0}")]
    Serve(String),
}

fn main() -> ExitCode {
    // stdout carries MCP frames.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Error> {
    let credentials = Credentials::from_env()?;
    // The blocking HTTP client must be dropped outside the runtime.
    let client = Arc::new(RedditClient::new(credentials)?);
    let api: Arc<dyn ContentApi> = client.clone();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let served = runtime.block_on(serve(api));
    drop(runtime);
    drop(client);
    served
}

async fn serve(api: Arc<dyn ContentApi>) -> Result<(), Error> {
    info!("serving Reddit tools on stdio");
    let service = RedditServer::new(api)
        .serve(stdio())
        .await
        .map_err(|e| Error::Serve(e.to_string()))?;
    let reason = service
        .waiting()
        .await
        .map_err(|e| Error::Serve(e.to_string()))?;
    info!(?reason, "server stopped");
    Ok(())
}

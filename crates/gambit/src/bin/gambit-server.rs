//! Standalone Gambit server.
//!
//! Flags and their environment variables are listed by `--help`; log
//! filtering follows `RUST_LOG`.

use clap::Parser;
use gambit::prelude::*;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

#[tokio::main]
async fn main() -> Result<(), GambitError> {
    let config = ServerConfig::from(ServerArgs::parse());

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!(
        bind = %config.bind_addr,
        liveness_timeout = ?config.liveness_timeout,
        outbound_buffer = config.outbound_buffer,
        "starting gambit server"
    );

    let server = GambitServer::builder().config(config).build().await?;
    server
        .run_until(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("shutdown signal received"),
                Err(e) => {
                    tracing::error!(error = %e, "cannot listen for shutdown signal");
                    std::future::pending::<()>().await;
                }
            }
        })
        .await
}

use clap::Parser;
use printquote::config::Args;
use printquote::{Application, Config, telemetry};
use tokio::signal;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load(&args)?;

    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    // The OTLP exporter's TLS client needs a process-wide crypto provider
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    telemetry::init_telemetry(config.enable_otel_export)?;
    debug!(?args, "Parsed command line");

    Application::new(config).await?.serve(shutdown_signal()).await
}

/// Resolve on SIGTERM or Ctrl+C. A handler that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => "Ctrl+C",
            Err(e) => {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&str>();

    let received = tokio::select! {
        name = ctrl_c => name,
        name = terminate => name,
    };

    info!(signal = received, "Shutting down gracefully");
}

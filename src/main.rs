use tarot_oracle::config::OracleConfig;
use tarot_oracle::shell::Shell;
use tracing_appender::non_blocking::WorkerGuard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Held until exit so buffered log lines are flushed
    let _log_guard = init_tracing();

    let config = OracleConfig::from_env()?;
    tracing::info!(
        mode = %config.mode,
        provider = %config.provider,
        locale = %config.locale,
        "Starting tarot oracle"
    );

    Shell::new(config).run().await
}

/// Logs go to stderr, or to a daily file under `TAROT_ORACLE_LOG_DIR`.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };

    match std::env::var("TAROT_ORACLE_LOG_DIR") {
        Ok(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "tarot-oracle.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter())
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
            None
        }
    }
}

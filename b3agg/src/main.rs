use b3_axum::start_server;
use b3_sqlite::Db;
use b3agg::{AppConfig, Cli, Commands, impls::App, ingest_file};
use tokio_util::sync::CancellationToken;
use tracing::{Level, event};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::import()?;

    let AppConfig {
        server,
        database,
        ingest,
    } = AppConfig::load(&cli)?;

    let db = Db::open(&database).await?;

    match cli.command {
        Commands::Serve => start_server(server, App { db }).await?,
        Commands::Ingest { file } => {
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    event!(Level::WARN, "interrupted, cancelling ingestion");
                    on_interrupt.cancel();
                }
            });

            ingest_file(&file, db, ingest, cancel).await?;
        }
    }

    Ok(())
}

use clap::Parser;
use jobs_tonic_client::config::{CliArgs, ClientConfig};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = ClientConfig::try_from(CliArgs::parse())?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339()),
        )
        .init();

    tracing::info!("Starting gRPC client...");
    let report = jobs_tonic_client::run(&config).await?;
    tracing::info!(
        listed = report.listed.len(),
        "Demo finished for job {}",
        report.created.id
    );

    Ok(())
}

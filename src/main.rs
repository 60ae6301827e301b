use cloud_inventory::{Aggregator, ConfigBundle};
use std::error::Error;
use std::io;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    dotenvy::dotenv().ok();

    // Logs go to stderr, the inventory document to stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let bundle = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration, path={}", path);
            ConfigBundle::from_file(&path)?
        }
        None => {
            info!("Loading configuration from environment");
            let bundle = ConfigBundle::from_env();
            bundle.validate()?;
            bundle
        }
    };

    if bundle.enabled().is_empty() {
        info!("No providers configured");
    }

    let aggregator = Aggregator::builder()
        .with_bundle_defaults(&bundle)
        .build();
    let report = aggregator.run_bundle(&bundle).await?;

    eprintln!("{}", report);
    report.write_json(io::stdout().lock(), true)?;

    Ok(())
}

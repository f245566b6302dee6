use collector::CollectorTable;
use nsq_exporter::{CliArgs, ExporterServer};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = CliArgs::parse_args();
    let config = args.load_config()?;

    ExporterServer::new(config, &CollectorTable::builtin())?
        .run()
        .await?;
    Ok(())
}

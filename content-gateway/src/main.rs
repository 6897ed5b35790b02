use clap::Parser;
use content_gateway::config::Config;
use content_gateway::metrics_defs;
use metrics_exporter_statsd::StatsdBuilder;
use tracing_subscriber::EnvFilter;

/// Read-only aggregation gateway: fetches partial content representations
/// from upstream services and merges them into one canonical document.
#[derive(Parser)]
#[command(name = "content-gateway")]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, env = "CONFIG", default_value = "config.yaml")]
    config: std::path::PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = Config::from_file(&cli.config)?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Keep the guard alive for the lifetime of the process.
    let _sentry_guard = config.sentry_dsn.as_deref().map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    if let Some(metrics_config) = &config.metrics {
        let recorder = StatsdBuilder::from(
            metrics_config.statsd_host.as_str(),
            metrics_config.statsd_port,
        )
        .build(Some(metrics_config.prefix.as_str()))?;
        if metrics::set_global_recorder(recorder).is_err() {
            tracing::warn!("a metrics recorder was already installed");
        }
        metrics_defs::describe_all();
    }

    tracing::info!(
        event = "service_started",
        sources = config.sources.len(),
        handler_path = %config.handler_path,
        api_host = %config.api_host,
        "content-gateway starting"
    );

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(content_gateway::run(config))?;

    Ok(())
}

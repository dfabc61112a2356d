//! Registry host binary.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (`--config`, `SEEDBANK_CONFIG`, or `seedbank.yaml`)
//! 2. Initialize structured logging to stderr
//! 3. Open the snapshot store and restore the registry, if persistence is on
//! 4. Serve NDJSON requests from stdin until it closes

use seedbank_host::config::{self, LoggingConfig};
use seedbank_host::serve;
use seedbank_host::startup::{build_service, load_config, open_registry};
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let (config_path, explicit) =
        config::resolve_config_path(std::env::args().skip(1), std::env::var(config::CONFIG_ENV).ok());
    let config = load_config(&config_path, explicit)?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging);
    info!(
        registry = config.registry.name,
        config = %config_path.display(),
        persistence = config.persistence.enabled,
        dedup = config.dedup.enabled,
        "seedbank-host starting"
    );

    // 3. Open the store and restore state.
    let (registry, store) = open_registry(&config.persistence)?;
    info!(
        species = registry.species_count(),
        next_species_id = registry.ids().peek(seedbank_registry::IdNamespace::Species),
        "Registry ready"
    );
    let service = build_service(&config, registry, store);

    // 4. Serve.
    let stats = serve(
        &service,
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
    )
    .await?;
    info!(
        responses = stats.responses,
        malformed = stats.malformed,
        "seedbank-host stopped"
    );
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// configured level; output goes to stderr so stdout carries only responses.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

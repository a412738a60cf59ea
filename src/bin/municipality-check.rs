//! municipality-check: populate or drain the municipality check queue.

use anyhow::Context as _;
use clap::Parser;
use municipality_check::config::secrets::ExposeSecret;
use municipality_check::config::{Config, RuleSet};
use municipality_check::db::{Db, NexusDatabase, WorkQueue};
use municipality_check::engine::{QueueDriver, QueuePopulator, ReferenceResolver, TaskOrchestrator};
use municipality_check::model::work::State;
use municipality_check::nexus::NexusClient;
use municipality_check::telemetry::{TelemetryConfig, init_telemetry};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "municipality-check",
    about = "Kontrol af betalings- og handlekommune"
)]
struct Cli {
    /// TOML rule file naming the organisations to check
    #[arg(long, default_value = "./regelsaet.toml")]
    rules: PathBuf,

    /// Clear pending items, repopulate the queue and exit
    #[arg(long)]
    queue: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let rules = RuleSet::load(&cli.rules)?;
    let config = Config::from_env()?;

    let _guard = init_telemetry(TelemetryConfig {
        endpoint: config.otel_endpoint.clone(),
        service_name: "municipality-check".to_string(),
        log_level: config.log_level.clone(),
    })?;

    let db = Db::connect(config.database_url.expose_secret())
        .await
        .context("connecting to queue database")?;
    db.migrate().await?;
    let db = Arc::new(db);

    let nexus = Arc::new(NexusClient::new(&config.nexus, rules.pathway_view.clone())?);

    if cli.queue {
        let cleared = db.clear(State::New).await?;
        info!(cleared, "pending items cleared");
        let populator = QueuePopulator::new(nexus, db, rules);
        populator.populate().await?;
        return Ok(());
    }

    let nexus_db = NexusDatabase::connect(config.nexus_database_url.expose_secret())
        .await
        .context("connecting to nexus database")?;

    let resolver = ReferenceResolver::new(nexus.clone(), Arc::new(nexus_db), nexus.clone());
    let orchestrator = TaskOrchestrator::new(resolver, nexus.clone(), db.clone(), db.clone());
    let driver = QueueDriver::new(db, nexus, orchestrator);

    // Per-item failures live on the queue; the run itself succeeds.
    driver.run().await?;
    Ok(())
}

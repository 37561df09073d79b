//! # autocard — card preview tool
//!
//! Composition root that wires a host environment to the card service and
//! prints the assembled card configuration.
//!
//! ## Responsibilities
//! - Parse configuration (TOML file, env var overrides)
//! - Initialize tracing
//! - Wire an environment: a registry-export snapshot passed as the first
//!   argument, or the built-in demo diffuser
//! - Run one refresh/classification pass
//! - Serialize the assembled layout through the rendering adapter to stdout
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no classification logic belongs here.

mod config;
mod snapshot;

use std::path::Path;

use anyhow::Context;

use autocard_adapter_virtual::VirtualEnvironment;
use autocard_app::catalog::Catalog;
use autocard_app::ports::{ActionInvoker, RegistryReader, StateReader};
use autocard_app::services::CardService;

use crate::config::Config;
use crate::snapshot::SnapshotEnvironment;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.logging.filter))
        .with_writer(std::io::stderr)
        .init();

    let mut catalog = Catalog::diffuser().context("building the built-in catalog")?;
    if let Some(title) = &config.card.title {
        catalog = catalog.with_title(title.clone());
    }
    if !config.card.platforms.is_empty() {
        catalog = catalog.with_integrations(config.card.platforms.clone());
    }

    match std::env::args().nth(1) {
        Some(path) => {
            let env = SnapshotEnvironment::load(Path::new(&path))?;
            run(env, catalog, config.output.pretty).await
        }
        None => {
            tracing::info!("no snapshot given, using the demo diffuser");
            let env = VirtualEnvironment::diffuser_demo();
            run(env, catalog, config.output.pretty).await
        }
    }
}

async fn run<E>(env: E, catalog: Catalog, pretty: bool) -> anyhow::Result<()>
where
    E: RegistryReader + StateReader + ActionInvoker + Clone,
{
    let service = CardService::new(env.clone(), env.clone(), env, catalog);
    service
        .refresh()
        .await
        .context("refreshing the registry snapshot")?;

    let view = service.view().await.context("no view was assembled")?;
    for pick in &view.devices {
        tracing::info!(key = %pick.key, label = %pick.label, "discovered device");
    }
    tracing::info!(subtitle = %view.subtitle, nodes = view.nodes.len(), "assembled card");

    let card = autocard_adapter_lovelace::render(&view.nodes);
    let output = if pretty {
        serde_json::to_string_pretty(&card)?
    } else {
        serde_json::to_string(&card)?
    };
    println!("{output}");
    Ok(())
}

//! planforge CLI — compile enhancement batches into ordered manifests.
//!
//! Thin adapter over the engine coordinator. Collaborator endpoints come
//! from the environment (PLANFORGE_GENERATOR_URL, PLANFORGE_VECTOR_URL);
//! without them the offline static generator and in-memory store are used.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use planforge_core::EngineConfig;
use planforge_engine::{AgentRegistry, CancellationToken, Coordinator};
use planforge_llm::{GeneratorConfig, HttpGenerator, StaticGenerator, TextGenerator};
use planforge_vector::{HttpVectorStore, MemoryStore, SimilarityStore, VectorConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    name = "planforge",
    version = env!("CARGO_PKG_VERSION"),
    about = "Compile enhancement batches into dependency-ordered manifests"
)]
struct Cli {
    /// Engine configuration document (JSON or YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Agent roster document (JSON or YAML)
    #[arg(long, global = true)]
    agents: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile a batch document into a manifest
    Compile {
        /// Batch document listing enhancement areas
        input: PathBuf,
        /// Where to write the manifest (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Where to write the audit trail as JSON lines
        #[arg(long)]
        audit: Option<PathBuf>,
        /// Skip network collaborators even when endpoints are configured
        #[arg(long)]
        offline: bool,
    },
    /// Re-validate a compiled manifest
    Validate {
        manifest: PathBuf,
    },
    /// Print the ordered delegation plan for a manifest
    Delegate {
        manifest: PathBuf,
    },
    /// Build the dependency graph from declared dependencies only
    Graph {
        input: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "planforge=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => planforge::load_config(path)?,
        None => EngineConfig::default(),
    };

    let registry = Arc::new(AgentRegistry::new());
    if let Some(path) = &cli.agents {
        for meta in planforge::load_agents(path)? {
            registry
                .register(meta)
                .with_context(|| format!("loading roster {}", path.display()))?;
        }
        info!(agents = registry.len(), "roster loaded");
    }

    match cli.command {
        Command::Compile {
            input,
            output,
            audit,
            offline,
        } => {
            let areas = planforge::load_areas(&input)?;
            let coordinator = build_coordinator(&config, registry, offline)?;

            let cancel = CancellationToken::new();
            {
                let cancel = cancel.clone();
                tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        warn!("interrupt received, cancelling batch");
                        cancel.cancel();
                    }
                });
            }

            let manifest = coordinator.compile_manifest(areas, cancel).await?;
            let rendered = serde_json::to_string_pretty(&manifest)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, rendered)
                        .with_context(|| format!("writing {}", path.display()))?;
                    info!(path = %path.display(), "manifest written");
                }
                None => println!("{}", rendered),
            }
            if let Some(path) = audit {
                std::fs::write(&path, coordinator.audit().to_jsonl())
                    .with_context(|| format!("writing {}", path.display()))?;
            }
        }

        Command::Validate { manifest } => {
            let manifest = planforge::load_manifest(&manifest)?;
            let coordinator = build_coordinator(&config, registry, true)?;
            let report = coordinator.validate_outputs(&manifest);
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.valid {
                std::process::exit(1);
            }
        }

        Command::Delegate { manifest } => {
            let manifest = planforge::load_manifest(&manifest)?;
            let coordinator = build_coordinator(&config, registry, true)?;
            let records = coordinator.execute_delegation(&manifest).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }

        Command::Graph { input } => {
            let areas = planforge::load_areas(&input)?;
            let pairs: Vec<(String, Vec<String>)> = areas
                .into_iter()
                .map(|a| (a.name, a.depends_on))
                .collect();
            let graph = planforge_engine::build_pairs(&pairs)?;
            println!("{}", serde_json::to_string_pretty(&graph)?);
        }
    }

    Ok(())
}

/// Wire collaborators from the environment, falling back to the offline
/// pair when endpoints are absent or --offline was passed.
fn build_coordinator(
    config: &EngineConfig,
    registry: Arc<AgentRegistry>,
    offline: bool,
) -> Result<Coordinator> {
    let generator: Arc<dyn TextGenerator> =
        match (offline, std::env::var("PLANFORGE_GENERATOR_URL")) {
            (false, Ok(base_url)) => {
                info!(%base_url, "using HTTP generator");
                Arc::new(HttpGenerator::new(GeneratorConfig {
                    base_url,
                    api_key: std::env::var("PLANFORGE_GENERATOR_KEY").ok(),
                    max_retries: config.retry.max_attempts,
                    retry_backoff_ms: config.retry.backoff_base_ms,
                    cache_ttl: Duration::from_secs(config.cache.ttl_secs),
                    ..Default::default()
                })?)
            }
            _ => {
                info!("using offline static generator");
                Arc::new(StaticGenerator::new())
            }
        };

    let store: Arc<dyn SimilarityStore> =
        match (offline, std::env::var("PLANFORGE_VECTOR_URL")) {
            (false, Ok(base_url)) => {
                info!(%base_url, "using HTTP similarity store");
                Arc::new(HttpVectorStore::new(VectorConfig {
                    base_url,
                    auth_token: std::env::var("PLANFORGE_VECTOR_TOKEN").ok(),
                    max_retries: config.retry.max_attempts,
                    retry_backoff_ms: config.retry.backoff_base_ms,
                    ..Default::default()
                })?)
            }
            _ => {
                info!("using in-memory similarity store");
                Arc::new(MemoryStore::new())
            }
        };

    Ok(Coordinator::new(
        generator,
        store,
        registry,
        config.clone(),
    ))
}

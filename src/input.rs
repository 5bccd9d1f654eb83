//! Batch document loading
//!
//! Batches, rosters, manifests, and configs arrive as structured JSON or
//! YAML documents, picked by file extension. Parse failures name the file
//! and the reason; nothing here guesses at malformed input.

use anyhow::{bail, Context, Result};
use planforge_core::{AgentMeta, EngineConfig, EnhancementArea, Manifest};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

/// A batch document is either a bare list of areas or a wrapping object
/// with an `areas` field.
#[derive(Deserialize)]
#[serde(untagged)]
enum BatchDocument {
    Bare(Vec<EnhancementArea>),
    Wrapped { areas: Vec<EnhancementArea> },
}

fn parse_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&contents)
            .with_context(|| format!("parsing {} as JSON", path.display())),
        Some("yaml") | Some("yml") => serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing {} as YAML", path.display())),
        other => bail!(
            "unsupported document extension {:?} for {}; expected json, yaml, or yml",
            other,
            path.display()
        ),
    }
}

pub fn load_areas(path: &Path) -> Result<Vec<EnhancementArea>> {
    let doc: BatchDocument = parse_document(path)?;
    let areas = match doc {
        BatchDocument::Bare(areas) => areas,
        BatchDocument::Wrapped { areas } => areas,
    };
    if areas.is_empty() {
        bail!("{} contains no enhancement areas", path.display());
    }
    Ok(areas)
}

pub fn load_manifest(path: &Path) -> Result<Manifest> {
    parse_document(path)
}

pub fn load_config(path: &Path) -> Result<EngineConfig> {
    parse_document(path)
}

pub fn load_agents(path: &Path) -> Result<Vec<AgentMeta>> {
    parse_document(path)
}

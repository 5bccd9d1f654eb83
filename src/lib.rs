//! Planforge - batch document loading for the CLI

pub mod input;

pub use input::{load_agents, load_areas, load_config, load_manifest};

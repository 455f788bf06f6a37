use super::method::ServiceDescriptor;
use super::types::TypeGraph;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A complete resolved design: the shared type graph plus every service to
/// generate for. This is the on-disk contract between the upstream resolver
/// and the generator CLI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Design {
    pub types: TypeGraph,
    pub services: Vec<ServiceDescriptor>,
}

/// Loads a resolved design from a JSON or YAML file, chosen by extension.
pub fn load_design(path: &Path) -> anyhow::Result<Design> {
    let content = std::fs::read_to_string(path)?;
    let design: Design = if path
        .extension()
        .map(|ext| ext == "yaml" || ext == "yml")
        .unwrap_or(false)
    {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(design)
}

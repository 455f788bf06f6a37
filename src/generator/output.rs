use super::registry::{Artifact, ArtifactKind};
use anyhow::Context;
use std::fs;
use std::path::Path;
use tracing::debug;

const HEADER: &str = "// Code generated by bodygen, DO NOT EDIT.";

/// Renders one service's artifacts into a single Rust module: file header,
/// imports, then every type declaration followed by every function, in
/// generation order within each group.
pub fn render_module(service: &str, artifacts: &[Artifact]) -> String {
    let mut out = String::new();
    out.push_str(HEADER);
    out.push('\n');
    out.push_str(&format!("//\n// HTTP body types for the \"{service}\" service.\n\n"));
    if artifacts
        .iter()
        .any(|a| a.kind == ArtifactKind::TypeDecl)
    {
        out.push_str("use serde::{Deserialize, Serialize};\n");
    }
    if artifacts.iter().any(|a| a.uses_json) {
        out.push_str("use serde_json::json;\n");
    }
    out.push('\n');
    for kind in [ArtifactKind::TypeDecl, ArtifactKind::FnDecl] {
        for artifact in artifacts.iter().filter(|a| a.kind == kind) {
            out.push_str(&artifact.code);
            out.push('\n');
        }
    }
    out
}

/// Writes one service's generated module to `<out_dir>/<service>_bodies.rs`.
///
/// Existing files are only overwritten with `force`; a skipped file is
/// reported, not an error, so regeneration over a dirty tree stays safe.
///
/// # Errors
///
/// Fails if the output directory cannot be created or the file cannot be
/// written.
pub fn write_service_file(
    out_dir: &Path,
    service: &str,
    artifacts: &[Artifact],
    force: bool,
) -> anyhow::Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;
    let file_name = format!("{}_bodies.rs", super::to_snake_case(service));
    let path = out_dir.join(&file_name);
    if path.exists() && !force {
        println!("⚠️  Skipping existing file: {} (use --force to overwrite)", path.display());
        return Ok(());
    }
    let content = render_module(service, artifacts);
    fs::write(&path, &content).with_context(|| format!("writing {}", path.display()))?;
    debug!(file = %path.display(), bytes = content.len(), "wrote generated module");
    println!("✅ Generated: {}", path.display());
    Ok(())
}

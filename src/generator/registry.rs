use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Kind of generated source artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    TypeDecl,
    FnDecl,
}

/// One generated declaration, ready for textual emission by a writer.
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub name: String,
    pub code: String,
    /// The code calls `serde_json::json!`; the module writer adds the
    /// import when any artifact sets this.
    pub uses_json: bool,
}

/// What a generated conversion or validation function does, part of its
/// dedup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConversionKind {
    Marshal,
    Unmarshal,
    Validate,
}

/// Dedup unit for generated functions: one function per distinct key is
/// emitted per run, no matter how many methods reference it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ConversionKey {
    pub kind: ConversionKind,
    pub source: String,
    pub target: String,
    pub view: Option<String>,
}

/// Outcome of reserving a conversion key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// The function already exists (or is being generated higher up the
    /// recursion); call it by name instead of emitting again.
    Reused(String),
    /// The key was free and is now taken; the caller must emit the function.
    Reserved(String),
}

/// Run-scoped generation state: emitted declarations, reserved conversion
/// functions and the ordered artifact list.
///
/// Created at the start of a generation run, passed explicitly to every
/// synthesizer, discarded at run end. Reserving a key *before* recursing is
/// what breaks infinite regeneration on recursive type graphs: the first
/// encounter takes the slot, recursive encounters resolve to the reserved
/// function name.
#[derive(Debug, Default)]
pub struct Registry {
    decls: BTreeSet<String>,
    conversions: BTreeMap<ConversionKey, String>,
    artifacts: Vec<Artifact>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Claims a declaration name. Returns false if the declaration was
    /// already emitted in this run.
    pub fn declare(&mut self, name: &str) -> bool {
        if self.decls.contains(name) {
            debug!(decl = name, "skipping duplicate declaration");
            return false;
        }
        self.decls.insert(name.to_string());
        true
    }

    /// Reserves a conversion key, binding it to `fn_name` if free.
    pub fn reserve(&mut self, key: ConversionKey, fn_name: String) -> Slot {
        if let Some(existing) = self.conversions.get(&key) {
            debug!(function = existing.as_str(), "reusing conversion function");
            return Slot::Reused(existing.clone());
        }
        self.conversions.insert(key, fn_name.clone());
        Slot::Reserved(fn_name)
    }

    /// Appends a finished artifact. Artifacts are immutable once pushed.
    pub fn push(&mut self, kind: ArtifactKind, name: impl Into<String>, code: String) {
        self.push_with_json(kind, name, code, false);
    }

    /// Appends a finished artifact, recording whether its code needs the
    /// `serde_json::json!` import.
    pub fn push_with_json(
        &mut self,
        kind: ArtifactKind,
        name: impl Into<String>,
        code: String,
        uses_json: bool,
    ) {
        self.artifacts.push(Artifact {
            kind,
            name: name.into(),
            code,
            uses_json,
        });
    }

    /// Number of functions emitted so far, used by tests to assert dedup.
    pub fn conversion_count(&self) -> usize {
        self.conversions.len()
    }

    pub fn finish(self) -> Vec<Artifact> {
        self.artifacts
    }
}

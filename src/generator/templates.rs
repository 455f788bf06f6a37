use askama::Template;

/// One field of a generated wire struct.
#[derive(Debug, Clone)]
pub struct FieldDecl {
    /// Sanitized Rust field name.
    pub name: String,
    /// Original wire attribute name, kept as the serde rename.
    pub rename: String,
    /// Rendered Rust type, already wrapped in `Option<..>` when nullable.
    pub ty: String,
    pub optional: bool,
}

/// Template for a generated wire body struct declaration.
#[derive(Template)]
#[template(
    source = "{{ doc }}\n#[derive(Debug, Clone, Default, Serialize, Deserialize)]\npub struct {{ name }} {\n{% for f in fields %}    #[serde(rename = \"{{ f.rename }}\"{% if f.optional %}, default, skip_serializing_if = \"Option::is_none\"{% endif %})]\n    pub {{ f.name }}: {{ f.ty }},\n{% endfor %}}\n",
    ext = "txt",
    escape = "none"
)]
pub struct StructDeclTemplate {
    pub doc: String,
    pub name: String,
    pub fields: Vec<FieldDecl>,
}

/// Template for a generated function. Body lines carry their own
/// indentation so nested blocks render exactly as built.
#[derive(Template)]
#[template(
    source = "{{ doc }}\n{{ vis }}fn {{ signature }} {\n{% for line in lines %}{{ line }}\n{% endfor %}}\n",
    ext = "txt",
    escape = "none"
)]
pub struct FunctionTemplate {
    pub doc: String,
    /// "pub " for the per-method entry points, "" for shared helpers.
    pub vis: &'static str,
    pub signature: String,
    pub lines: Vec<String>,
}

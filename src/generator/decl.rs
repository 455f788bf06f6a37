use super::body::{nested_body_name, BodyType, Direction, HttpVariant};
use super::naming::field_name;
use super::registry::{ArtifactKind, Registry};
use super::templates::{FieldDecl, StructDeclTemplate};
use crate::design::{Attribute, DataType, TypeGraph, TypeId};
use anyhow::Context;
use askama::Template;

/// Service/method context for declaration doc comments.
#[derive(Debug, Clone, Copy)]
pub struct DeclContext<'a> {
    pub service: &'a str,
    pub method: &'a str,
}

/// Whether an attribute renders nullable in the given direction.
///
/// Decode-side fields are always nullable so the validation function can
/// report missing required attributes; encode-side fields follow the
/// attribute's own flags.
pub fn is_nullable(attr: &Attribute, direction: Direction) -> bool {
    match direction {
        Direction::Encode => attr.is_nullable(),
        Direction::Decode => true,
    }
}

/// Renders the Rust type a [`DataType`] takes inside a wire body.
pub fn wire_type(graph: &TypeGraph, ty: &DataType, direction: Direction) -> anyhow::Result<String> {
    Ok(match ty {
        DataType::Primitive(kind) => kind.rust_type().to_string(),
        DataType::Array(elem) => format!("Vec<{}>", wire_type(graph, elem, direction)?),
        DataType::Map(key, value) => format!(
            "std::collections::HashMap<{}, {}>",
            wire_type(graph, key, direction)?,
            wire_type(graph, value, direction)?
        ),
        DataType::Ref(id) => {
            let ut = graph.get(*id)?;
            nested_body_name(&ut.name, direction)
        }
        DataType::Any => "serde_json::Value".to_string(),
        // Nested inline objects are rejected by the design check; top-level
        // objects never reach this function.
        DataType::Object(_) => anyhow::bail!("inline object has no wire type name"),
    })
}

fn field_decl(
    graph: &TypeGraph,
    attr: &Attribute,
    direction: Direction,
) -> anyhow::Result<FieldDecl> {
    let mut base = wire_type(graph, &attr.ty, direction)?;
    // Direct nested-body fields are boxed so recursive user types produce a
    // finite struct layout. Collection indirection already takes care of
    // refs inside arrays and maps.
    if matches!(attr.ty, DataType::Ref(_)) {
        base = format!("Box<{base}>");
    }
    let optional = is_nullable(attr, direction);
    Ok(FieldDecl {
        name: field_name(&attr.name),
        rename: attr.name.clone(),
        ty: if optional {
            format!("Option<{base}>")
        } else {
            base
        },
        optional,
    })
}

fn direction_noun(direction: Direction) -> &'static str {
    match direction {
        Direction::Encode => "request",
        Direction::Decode => "response",
    }
}

fn body_doc(ctx: DeclContext<'_>, body: &BodyType) -> String {
    match &body.variant {
        HttpVariant::Request => format!(
            "/// {} is the type of the \"{}\" service \"{}\" endpoint HTTP request body.",
            body.name, ctx.service, ctx.method
        ),
        HttpVariant::Response { .. } => format!(
            "/// {} is the type of the \"{}\" service \"{}\" endpoint HTTP response body.",
            body.name, ctx.service, ctx.method
        ),
        HttpVariant::Error { name } => format!(
            "/// {} is the type of the \"{}\" service \"{}\" endpoint HTTP response body for the \"{}\" error.",
            body.name, ctx.service, ctx.method, name
        ),
    }
}

fn emit_object_decl(
    graph: &TypeGraph,
    reg: &mut Registry,
    name: &str,
    doc: String,
    attrs: &[Attribute],
    direction: Direction,
) -> anyhow::Result<()> {
    if !reg.declare(name) {
        return Ok(());
    }
    let fields = attrs
        .iter()
        .map(|attr| field_decl(graph, attr, direction))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let code = StructDeclTemplate {
        doc,
        name: name.to_string(),
        fields,
    }
    .render()
    .with_context(|| format!("rendering declaration {name}"))?;
    reg.push(ArtifactKind::TypeDecl, name, code);

    // Nested user types referenced from the fields, in field order.
    let mut refs = Vec::new();
    for attr in attrs {
        graph.collect_refs(&attr.ty, &mut refs);
    }
    for id in refs {
        emit_nested_decl(graph, reg, id, direction)?;
    }
    Ok(())
}

fn emit_nested_decl(
    graph: &TypeGraph,
    reg: &mut Registry,
    id: TypeId,
    direction: Direction,
) -> anyhow::Result<()> {
    let ut = graph.get(id)?;
    let name = nested_body_name(&ut.name, direction);
    let doc = format!(
        "/// {} is used to define fields on HTTP {} body types.",
        name,
        direction_noun(direction)
    );
    emit_object_decl(graph, reg, &name, doc, &ut.attributes, direction)
}

/// Emits the declaration for a derived body type, plus declarations for
/// every nested user type it references, each exactly once per run.
///
/// Degenerate (non-object) bodies have no declaration of their own but may
/// still pull in nested declarations, e.g. a body that is an array of a
/// user type.
pub fn emit_body_decls(
    graph: &TypeGraph,
    reg: &mut Registry,
    ctx: DeclContext<'_>,
    body: &BodyType,
) -> anyhow::Result<()> {
    let direction = body.direction();
    match &body.data {
        DataType::Object(attrs) => {
            emit_object_decl(graph, reg, &body.name, body_doc(ctx, body), attrs, direction)
        }
        other => {
            let mut refs = Vec::new();
            graph.collect_refs(other, &mut refs);
            for id in refs {
                emit_nested_decl(graph, reg, id, direction)?;
            }
            Ok(())
        }
    }
}

use super::body::{nested_body_name, BodyType, Direction};
use super::decl::wire_type;
use super::naming::{field_name, to_camel_case, to_snake_case};
use super::registry::{ArtifactKind, ConversionKey, ConversionKind, Registry, Slot};
use super::templates::FunctionTemplate;
use super::CodegenOptions;
use crate::design::{Attribute, DataType, MethodDescriptor, PrimitiveKind, TypeGraph, TypeId};
use anyhow::Context;
use askama::Template;

/// Renders the Rust type of a domain value, qualified with the configured
/// domain module path.
pub fn domain_type(
    graph: &TypeGraph,
    ty: &DataType,
    opts: &CodegenOptions,
) -> anyhow::Result<String> {
    Ok(match ty {
        DataType::Primitive(kind) => kind.rust_type().to_string(),
        DataType::Array(elem) => format!("Vec<{}>", domain_type(graph, elem, opts)?),
        DataType::Map(key, value) => format!(
            "std::collections::HashMap<{}, {}>",
            domain_type(graph, key, opts)?,
            domain_type(graph, value, opts)?
        ),
        DataType::Ref(id) => {
            let ut = graph.get(*id)?;
            format!("{}::{}", opts.domain_path, to_camel_case(&ut.name))
        }
        DataType::Any => "serde_json::Value".to_string(),
        DataType::Object(_) => anyhow::bail!("inline object has no domain type name"),
    })
}

/// Domain type of a method payload for marshal signatures. Inline object
/// payloads are assumed to be named `<Method>Payload` by the domain layer.
fn payload_type(
    graph: &TypeGraph,
    method: &MethodDescriptor,
    payload: &DataType,
    opts: &CodegenOptions,
) -> anyhow::Result<String> {
    match payload {
        DataType::Object(_) => Ok(format!(
            "{}::{}Payload",
            opts.domain_path,
            to_camel_case(&method.name)
        )),
        other => domain_type(graph, other, opts),
    }
}

fn domain_name(graph: &TypeGraph, payload: &DataType, method: &MethodDescriptor) -> String {
    match payload {
        DataType::Ref(id) => graph
            .get(*id)
            .map(|ut| ut.name.clone())
            .unwrap_or_else(|_| format!("{}Payload", to_camel_case(&method.name))),
        _ => format!("{}Payload", to_camel_case(&method.name)),
    }
}

/// Whether converting a value of this type requires per-element work
/// (a nested user type somewhere inside), as opposed to a plain copy.
fn has_ref(ty: &DataType) -> bool {
    match ty {
        DataType::Ref(_) => true,
        DataType::Array(elem) => has_ref(elem),
        DataType::Map(_, value) => has_ref(value),
        DataType::Object(attrs) => attrs.iter().any(|a| has_ref(&a.ty)),
        DataType::Primitive(_) | DataType::Any => false,
    }
}

/// Widening/identity coercion between primitive kinds applied element-wise
/// when a domain kind and its wire kind differ. Identical kinds pass the
/// expression through untouched.
pub fn coerce_primitive(src: PrimitiveKind, dst: PrimitiveKind, expr: &str) -> String {
    if src == dst {
        return expr.to_string();
    }
    if src.is_numeric() && dst.is_numeric() {
        return format!("{expr} as {}", dst.rust_type());
    }
    expr.to_string()
}

/// Expression converting a domain place of type `ty` into its wire value.
/// `by_ref` states whether `place` denotes a reference rather than an owned
/// field access.
fn encode_expr(
    graph: &TypeGraph,
    reg: &mut Registry,
    ty: &DataType,
    place: &str,
    by_ref: bool,
    opts: &CodegenOptions,
) -> anyhow::Result<String> {
    Ok(match ty {
        DataType::Primitive(kind) => {
            if kind.is_copy() {
                if by_ref {
                    format!("*{place}")
                } else {
                    place.to_string()
                }
            } else {
                format!("{place}.clone()")
            }
        }
        DataType::Any => format!("{place}.clone()"),
        DataType::Array(elem) => {
            if !has_ref(elem) {
                format!("{place}.clone()")
            } else if let DataType::Ref(id) = elem.as_ref() {
                let helper = ensure_marshal_helper(graph, reg, *id, opts)?;
                format!("{place}.iter().map({helper}).collect()")
            } else {
                let inner = encode_expr(graph, reg, elem, "item", true, opts)?;
                format!("{place}.iter().map(|item| {inner}).collect()")
            }
        }
        DataType::Map(_, value) => {
            if !has_ref(value) {
                format!("{place}.clone()")
            } else {
                let inner = encode_expr(graph, reg, value, "v", true, opts)?;
                format!("{place}.iter().map(|(k, v)| (k.clone(), {inner})).collect()")
            }
        }
        DataType::Ref(id) => {
            let helper = ensure_marshal_helper(graph, reg, *id, opts)?;
            if by_ref {
                format!("{helper}({place})")
            } else {
                format!("{helper}(&{place})")
            }
        }
        DataType::Object(_) => anyhow::bail!("inline object in marshal expression"),
    })
}

/// Field initializer for one wire attribute, absence-guarded when the
/// attribute is optional. Required attributes copy directly with no guard.
fn field_expr(
    graph: &TypeGraph,
    reg: &mut Registry,
    attr: &Attribute,
    prefix: &str,
    opts: &CodegenOptions,
) -> anyhow::Result<String> {
    let place = format!("{prefix}.{}", field_name(&attr.name));
    if !attr.is_nullable() {
        // Direct nested-body fields are boxed in the wire struct.
        if let DataType::Ref(id) = &attr.ty {
            let helper = ensure_marshal_helper(graph, reg, *id, opts)?;
            return Ok(format!("Box::new({helper}(&{place}))"));
        }
        return encode_expr(graph, reg, &attr.ty, &place, false, opts);
    }
    // Optional: an absent domain value propagates as absent, never as a
    // zero-valued wire object.
    Ok(match &attr.ty {
        DataType::Ref(id) => {
            let helper = ensure_marshal_helper(graph, reg, *id, opts)?;
            format!("{place}.as_ref().map(|value| Box::new({helper}(value)))")
        }
        ty if has_ref(ty) => {
            let inner = encode_expr(graph, reg, ty, "value", true, opts)?;
            format!("{place}.as_ref().map(|value| {inner})")
        }
        DataType::Primitive(kind) if kind.is_copy() => place,
        _ => format!("{place}.clone()"),
    })
}

fn object_literal_lines(
    graph: &TypeGraph,
    reg: &mut Registry,
    attrs: &[Attribute],
    prefix: &str,
    body_name: &str,
    opts: &CodegenOptions,
) -> anyhow::Result<Vec<String>> {
    let mut lines = vec![format!("    let body = {body_name} {{")];
    for attr in attrs {
        let expr = field_expr(graph, reg, attr, prefix, opts)?;
        lines.push(format!("        {}: {expr},", field_name(&attr.name)));
    }
    lines.push("    };".to_string());
    lines.push("    body".to_string());
    Ok(lines)
}

/// Emits (or reuses) the shared helper converting one user type into its
/// request body type. The conversion key is reserved before the body is
/// synthesized, so recursive type graphs resolve to this same function
/// instead of expanding forever.
fn ensure_marshal_helper(
    graph: &TypeGraph,
    reg: &mut Registry,
    id: TypeId,
    opts: &CodegenOptions,
) -> anyhow::Result<String> {
    let ut = graph.get(id)?;
    let target = nested_body_name(&ut.name, Direction::Encode);
    let key = ConversionKey {
        kind: ConversionKind::Marshal,
        source: ut.name.clone(),
        target: target.clone(),
        view: None,
    };
    let fn_name = format!(
        "marshal_{}_to_{}",
        to_snake_case(&ut.name),
        to_snake_case(&target)
    );
    match reg.reserve(key, fn_name) {
        Slot::Reused(name) => Ok(name),
        Slot::Reserved(name) => {
            let source_ty = format!("{}::{}", opts.domain_path, to_camel_case(&ut.name));
            let lines = object_literal_lines(graph, reg, &ut.attributes, "v", &target, opts)?;
            let code = FunctionTemplate {
                doc: format!(
                    "/// Builds a value of type {target} from a value of type {source_ty}."
                ),
                vis: "",
                signature: format!("{name}(v: &{source_ty}) -> {target}"),
                lines,
            }
            .render()
            .with_context(|| format!("rendering marshal helper {name}"))?;
            reg.push(ArtifactKind::FnDecl, name.clone(), code);
            Ok(name)
        }
    }
}

/// Emits the request-direction marshal function for one method: domain
/// payload in, wire body value out.
pub fn emit_request_marshal(
    graph: &TypeGraph,
    reg: &mut Registry,
    service: &str,
    method: &MethodDescriptor,
    body: &BodyType,
    opts: &CodegenOptions,
) -> anyhow::Result<()> {
    let payload = method
        .payload
        .as_ref()
        .context("marshal requested for a method without a payload")?;
    let payload_ty = payload_type(graph, method, payload, opts)?;
    let fn_name = format!("new_{}", to_snake_case(&body.name));
    let key = ConversionKey {
        kind: ConversionKind::Marshal,
        source: domain_name(graph, payload, method),
        target: body.name.clone(),
        view: None,
    };
    if matches!(reg.reserve(key, fn_name.clone()), Slot::Reused(_)) {
        return Ok(());
    }

    let (ret, lines) = match &body.data {
        DataType::Object(attrs) => (
            body.name.clone(),
            object_literal_lines(graph, reg, attrs, "p", &body.name, opts)?,
        ),
        other => {
            let expr = encode_expr(graph, reg, other, "p", true, opts)?;
            (
                wire_type(graph, other, Direction::Encode)?,
                vec![format!("    {expr}")],
            )
        }
    };
    let code = FunctionTemplate {
        doc: format!(
            "/// Builds the HTTP request body from the payload of the \"{}\" endpoint\n/// of the \"{}\" service.",
            method.name, service
        ),
        vis: "pub ",
        signature: format!("{fn_name}(p: &{payload_ty}) -> {ret}"),
        lines,
    }
    .render()
    .with_context(|| format!("rendering marshal function {fn_name}"))?;
    reg.push(ArtifactKind::FnDecl, fn_name, code);
    Ok(())
}

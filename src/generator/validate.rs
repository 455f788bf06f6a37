use super::body::{nested_body_name, BodyType, Direction};
use super::decl::wire_type;
use super::naming::{field_name, to_snake_case};
use super::registry::{ArtifactKind, ConversionKey, ConversionKind, Registry, Slot};
use super::templates::FunctionTemplate;
use super::CodegenOptions;
use crate::design::{Attribute, Constraints, DataType, TypeGraph, TypeId};
use anyhow::Context;
use askama::Template;
use std::collections::BTreeSet;

/// Whether any attribute in the slice gives the decode-side validation
/// function something to check: a required attribute (missing-field check),
/// a constraint, or a nested type that itself needs validation.
fn attrs_need_validation(graph: &TypeGraph, attrs: &[Attribute], seen: &mut BTreeSet<TypeId>) -> bool {
    attrs.iter().any(|attr| {
        (attr.required && !attr.has_default)
            || !attr.constraints.is_empty()
            || type_needs_validation(graph, &attr.ty, seen)
    })
}

fn type_needs_validation(graph: &TypeGraph, ty: &DataType, seen: &mut BTreeSet<TypeId>) -> bool {
    match ty {
        DataType::Primitive(_) | DataType::Any => false,
        DataType::Array(elem) => type_needs_validation(graph, elem, seen),
        DataType::Map(_, value) => type_needs_validation(graph, value, seen),
        DataType::Object(attrs) => attrs_need_validation(graph, attrs, seen),
        DataType::Ref(id) => {
            // A type already on the path contributes nothing new; whatever
            // checks it has were counted at the first visit.
            if !seen.insert(*id) {
                return false;
            }
            graph
                .get(*id)
                .map(|ut| attrs_need_validation(graph, &ut.attributes, seen))
                .unwrap_or(false)
        }
    }
}

/// Emits one runtime call per constraint present on the attribute. `value`
/// is bound by reference in the enclosing `if let Some(value)` guard.
/// Returns whether any emitted line needs the `serde_json::json!` import.
fn constraint_lines(
    constraints: &Constraints,
    ty: &DataType,
    ctx: &str,
    indent: &str,
    lines: &mut Vec<String>,
) -> bool {
    if let Some(pattern) = &constraints.pattern {
        lines.push(format!(
            "{indent}violations.pattern(\"{ctx}\", value, {:?});",
            pattern
        ));
    }
    if let Some(format) = &constraints.format {
        lines.push(format!(
            "{indent}violations.format(\"{ctx}\", value, {:?});",
            format
        ));
    }
    if let Some(min) = constraints.minimum {
        lines.push(format!(
            "{indent}violations.minimum(\"{ctx}\", *value as f64, {min}f64);"
        ));
    }
    if let Some(max) = constraints.maximum {
        lines.push(format!(
            "{indent}violations.maximum(\"{ctx}\", *value as f64, {max}f64);"
        ));
    }
    let mut uses_json = false;
    if let Some(values) = &constraints.enum_values {
        uses_json = true;
        let rendered = values
            .iter()
            .map(|v| format!("json!({v})"))
            .collect::<Vec<_>>()
            .join(", ");
        // Enum constraints on array attributes apply to the elements, not
        // to the array as a whole.
        if matches!(ty, DataType::Array(_)) {
            lines.push(format!("{indent}for item in value {{"));
            lines.push(format!(
                "{indent}    violations.enum_of(\"{ctx}\", &json!(item), &[{rendered}]);"
            ));
            lines.push(format!("{indent}}}"));
        } else {
            lines.push(format!(
                "{indent}violations.enum_of(\"{ctx}\", &json!(value), &[{rendered}]);"
            ));
        }
    }
    if let Some(min) = constraints.min_length {
        lines.push(format!(
            "{indent}violations.min_length(\"{ctx}\", value.len(), {min});"
        ));
    }
    if let Some(max) = constraints.max_length {
        lines.push(format!(
            "{indent}violations.max_length(\"{ctx}\", value.len(), {max});"
        ));
    }
    uses_json
}

/// Emits recursion into nested user types reachable from `place`, looping
/// over collections as needed. Types without their own checks produce no
/// code at all.
fn nested_lines(
    graph: &TypeGraph,
    reg: &mut Registry,
    ty: &DataType,
    place: &str,
    indent: &str,
    opts: &CodegenOptions,
    lines: &mut Vec<String>,
) -> anyhow::Result<()> {
    match ty {
        DataType::Primitive(_) | DataType::Any | DataType::Object(_) => {}
        DataType::Ref(id) => {
            if let Some(helper) = ensure_validate_helper(graph, reg, *id, opts)? {
                lines.push(format!(
                    "{indent}if let Err(nested) = {helper}({place}) {{"
                ));
                lines.push(format!("{indent}    violations.merge(nested);"));
                lines.push(format!("{indent}}}"));
            }
        }
        DataType::Array(elem) => {
            let mut probe = BTreeSet::new();
            if type_needs_validation(graph, elem, &mut probe) {
                lines.push(format!("{indent}for item in {place} {{"));
                nested_lines(
                    graph,
                    reg,
                    elem,
                    "item",
                    &format!("{indent}    "),
                    opts,
                    lines,
                )?;
                lines.push(format!("{indent}}}"));
            }
        }
        DataType::Map(_, value) => {
            let mut probe = BTreeSet::new();
            if type_needs_validation(graph, value, &mut probe) {
                lines.push(format!("{indent}for item in {place}.values() {{"));
                nested_lines(
                    graph,
                    reg,
                    value,
                    "item",
                    &format!("{indent}    "),
                    opts,
                    lines,
                )?;
                lines.push(format!("{indent}}}"));
            }
        }
    }
    Ok(())
}

/// Validation statements for all attributes of a decode-side wire object.
/// Every field is `Option` on this side, so required attributes get a
/// missing-field check and everything else runs behind a presence guard.
fn object_validation_lines(
    graph: &TypeGraph,
    reg: &mut Registry,
    attrs: &[Attribute],
    opts: &CodegenOptions,
) -> anyhow::Result<(Vec<String>, bool)> {
    let mut lines = vec![format!(
        "    let mut violations = {}::Violations::new();",
        opts.runtime_path
    )];
    let mut uses_json = false;
    for attr in attrs {
        let field = field_name(&attr.name);
        let ctx = format!("body.{}", attr.name);
        if attr.required && !attr.has_default {
            lines.push(format!("    if body.{field}.is_none() {{"));
            lines.push(format!(
                "        violations.missing_field({:?}, \"body\");",
                attr.name
            ));
            lines.push("    }".to_string());
        }
        let mut probe = BTreeSet::new();
        let has_nested = type_needs_validation(graph, &attr.ty, &mut probe);
        if attr.constraints.is_empty() && !has_nested {
            continue;
        }
        lines.push(format!("    if let Some(value) = &body.{field} {{"));
        uses_json |= constraint_lines(&attr.constraints, &attr.ty, &ctx, "        ", &mut lines);
        nested_lines(graph, reg, &attr.ty, "value", "        ", opts, &mut lines)?;
        lines.push("    }".to_string());
    }
    lines.push("    violations.finish()".to_string());
    Ok((lines, uses_json))
}

/// Emits (or reuses) the shared validation helper for one user type's
/// response body. Returns `None` when the type has nothing to validate, in
/// which case callers emit no recursion either.
fn ensure_validate_helper(
    graph: &TypeGraph,
    reg: &mut Registry,
    id: TypeId,
    opts: &CodegenOptions,
) -> anyhow::Result<Option<String>> {
    let ut = graph.get(id)?;
    let mut seen = BTreeSet::from([id]);
    if !attrs_need_validation(graph, &ut.attributes, &mut seen) {
        return Ok(None);
    }
    let body_name = nested_body_name(&ut.name, Direction::Decode);
    let key = ConversionKey {
        kind: ConversionKind::Validate,
        source: body_name.clone(),
        target: ut.name.clone(),
        view: None,
    };
    let fn_name = format!("validate_{}", to_snake_case(&body_name));
    match reg.reserve(key, fn_name) {
        Slot::Reused(name) => Ok(Some(name)),
        Slot::Reserved(name) => {
            let (lines, uses_json) = object_validation_lines(graph, reg, &ut.attributes, opts)?;
            let code = FunctionTemplate {
                doc: format!("/// Runs the validations defined on {body_name}."),
                vis: "",
                signature: format!(
                    "{name}(body: &{body_name}) -> Result<(), {}::Violations>",
                    opts.runtime_path
                ),
                lines,
            }
            .render()
            .with_context(|| format!("rendering validation helper {name}"))?;
            reg.push_with_json(ArtifactKind::FnDecl, name.clone(), code, uses_json);
            Ok(Some(name))
        }
    }
}

/// Emits the validation function for one decode-side body, when the body has
/// anything to check. Encode-side bodies are built from already-validated
/// domain values and get no validation function.
pub fn emit_body_validation(
    graph: &TypeGraph,
    reg: &mut Registry,
    body: &BodyType,
    opts: &CodegenOptions,
) -> anyhow::Result<()> {
    if body.direction() != Direction::Decode {
        return Ok(());
    }
    let (param_ty, lines, uses_json) = match &body.data {
        DataType::Object(attrs) => {
            let mut seen = BTreeSet::new();
            if !attrs_need_validation(graph, attrs, &mut seen) {
                return Ok(());
            }
            let (lines, uses_json) = object_validation_lines(graph, reg, attrs, opts)?;
            (body.name.clone(), lines, uses_json)
        }
        other => {
            let mut seen = BTreeSet::new();
            if !type_needs_validation(graph, other, &mut seen) {
                return Ok(());
            }
            let mut lines = vec![format!(
                "    let mut violations = {}::Violations::new();",
                opts.runtime_path
            )];
            nested_lines(graph, reg, other, "body", "    ", opts, &mut lines)?;
            lines.push("    violations.finish()".to_string());
            (wire_type(graph, other, Direction::Decode)?, lines, false)
        }
    };
    let fn_name = format!("validate_{}", to_snake_case(&body.name));
    let key = ConversionKey {
        kind: ConversionKind::Validate,
        source: body.name.clone(),
        target: body.name.clone(),
        view: None,
    };
    if matches!(reg.reserve(key, fn_name.clone()), Slot::Reused(_)) {
        return Ok(());
    }
    let code = FunctionTemplate {
        doc: format!("/// Runs the validations defined on {}.", body.name),
        vis: "pub ",
        signature: format!(
            "{fn_name}(body: &{param_ty}) -> Result<(), {}::Violations>",
            opts.runtime_path
        ),
        lines,
    }
    .render()
    .with_context(|| format!("rendering validation function {fn_name}"))?;
    reg.push_with_json(ArtifactKind::FnDecl, fn_name, code, uses_json);
    Ok(())
}

use super::body::{nested_body_name, out_of_body, BodyType, Direction};
use super::decl::wire_type;
use super::marshal::domain_type;
use super::naming::{field_name, status_suffix, to_camel_case, to_snake_case};
use super::registry::{ArtifactKind, ConversionKey, ConversionKind, Registry, Slot};
use super::templates::FunctionTemplate;
use super::CodegenOptions;
use crate::design::{
    Attribute, DataType, ErrorDescriptor, MethodDescriptor, ResponseDescriptor, TypeGraph, TypeId,
    View,
};
use anyhow::{bail, Context};
use askama::Template;

fn has_ref(ty: &DataType) -> bool {
    match ty {
        DataType::Ref(_) => true,
        DataType::Array(elem) => has_ref(elem),
        DataType::Map(_, value) => has_ref(value),
        DataType::Object(attrs) => attrs.iter().any(|a| has_ref(&a.ty)),
        DataType::Primitive(_) | DataType::Any => false,
    }
}

/// Expression converting an owned wire value into its domain value.
/// `sub_view` is the view to apply to the first user type reached, resolved
/// statically at synthesis time.
fn decode_value(
    graph: &TypeGraph,
    reg: &mut Registry,
    ty: &DataType,
    place: &str,
    sub_view: Option<&str>,
    opts: &CodegenOptions,
) -> anyhow::Result<String> {
    Ok(match ty {
        DataType::Primitive(_) | DataType::Any => place.to_string(),
        DataType::Array(elem) => {
            if !has_ref(elem) {
                place.to_string()
            } else if let DataType::Ref(id) = elem.as_ref() {
                let helper = ensure_unmarshal_helper(graph, reg, *id, sub_view, opts)?;
                format!("{place}.into_iter().map({helper}).collect()")
            } else {
                let inner = decode_value(graph, reg, elem, "item", sub_view, opts)?;
                format!("{place}.into_iter().map(|item| {inner}).collect()")
            }
        }
        DataType::Map(_, value) => {
            if !has_ref(value) {
                place.to_string()
            } else {
                let inner = decode_value(graph, reg, value, "v", sub_view, opts)?;
                format!("{place}.into_iter().map(|(k, v)| (k, {inner})).collect()")
            }
        }
        DataType::Ref(id) => {
            let helper = ensure_unmarshal_helper(graph, reg, *id, sub_view, opts)?;
            format!("{helper}({place})")
        }
        DataType::Object(_) => bail!("inline object in unmarshal expression"),
    })
}

/// Field initializer for one body-sourced domain attribute. Decode-side
/// wire fields are always `Option`; required attributes unwrap to their
/// default, which the validation function rules out beforehand.
fn field_expr(
    graph: &TypeGraph,
    reg: &mut Registry,
    attr: &Attribute,
    prefix: &str,
    sub_view: Option<&str>,
    opts: &CodegenOptions,
) -> anyhow::Result<String> {
    let place = format!("{prefix}.{}", field_name(&attr.name));
    if !has_ref(&attr.ty) {
        return Ok(if attr.is_nullable() {
            place
        } else {
            format!("{place}.unwrap_or_default()")
        });
    }
    Ok(match &attr.ty {
        DataType::Ref(id) => {
            // Wire fields holding a nested body directly are boxed.
            let helper = ensure_unmarshal_helper(graph, reg, *id, sub_view, opts)?;
            if attr.is_nullable() {
                format!("{place}.map(|value| {helper}(*value))")
            } else {
                format!("{place}.map(|value| {helper}(*value)).unwrap_or_default()")
            }
        }
        ty => {
            let inner = decode_value(graph, reg, ty, "value", sub_view, opts)?;
            if attr.is_nullable() {
                format!("{place}.map(|value| {inner})")
            } else {
                format!("{place}.map(|value| {inner}).unwrap_or_default()")
            }
        }
    })
}

/// Lines constructing a domain value from a wire object. When a view is
/// active only its members are populated; everything else falls back to the
/// domain type's `Default`.
fn object_literal_lines(
    graph: &TypeGraph,
    reg: &mut Registry,
    attrs: &[Attribute],
    view: Option<&View>,
    prefix: &str,
    domain_ty: &str,
    mutable: bool,
    opts: &CodegenOptions,
) -> anyhow::Result<Vec<String>> {
    let binding = if mutable { "let mut v" } else { "let v" };
    let mut lines = vec![format!("    {binding} = {domain_ty} {{")];
    let mut populated = 0usize;
    for attr in attrs {
        let sub_view = match view {
            Some(view) => {
                let Some(member) = view.members.iter().find(|m| m.attribute == attr.name) else {
                    continue;
                };
                member.sub_view.as_deref()
            }
            None => None,
        };
        let expr = field_expr(graph, reg, attr, prefix, sub_view, opts)?;
        lines.push(format!("        {}: {expr},", field_name(&attr.name)));
        populated += 1;
    }
    if populated < attrs.len() {
        lines.push("        ..Default::default()".to_string());
    }
    lines.push("    };".to_string());
    Ok(lines)
}

/// Emits (or reuses) the shared helper converting one user type's response
/// body into the domain type, projected through `view` when given. The key
/// is reserved before recursing, which is what terminates synthesis on
/// recursive type graphs.
fn ensure_unmarshal_helper(
    graph: &TypeGraph,
    reg: &mut Registry,
    id: TypeId,
    view: Option<&str>,
    opts: &CodegenOptions,
) -> anyhow::Result<String> {
    let ut = graph.get(id)?;
    // An unviewed reference to a multi-view type projects through its
    // "default" view, exactly as if the view had been named. Normalizing
    // here keeps both reach paths on one key and one function.
    let view = match view {
        Some(v) => Some(v),
        None if ut.view("default").is_some() => Some("default"),
        None => None,
    };
    let source = nested_body_name(&ut.name, Direction::Decode);
    let view_suffix = match view.filter(|v| *v != "default") {
        Some(v) => format!("_{}", to_snake_case(v)),
        None => String::new(),
    };
    let key = ConversionKey {
        kind: ConversionKind::Unmarshal,
        source: source.clone(),
        target: ut.name.clone(),
        view: view.map(String::from),
    };
    let fn_name = format!(
        "unmarshal_{}_to_{}{view_suffix}",
        to_snake_case(&source),
        to_snake_case(&ut.name)
    );
    match reg.reserve(key, fn_name) {
        Slot::Reused(name) => Ok(name),
        Slot::Reserved(name) => {
            let active_view = match view {
                Some(v) => match ut.view(v) {
                    Some(view) => Some(view.clone()),
                    None => bail!("view '{v}' is not defined on type {}", ut.name),
                },
                None => None,
            };
            let domain_ty = format!("{}::{}", opts.domain_path, to_camel_case(&ut.name));
            let mut lines = object_literal_lines(
                graph,
                reg,
                &ut.attributes,
                active_view.as_ref(),
                "v",
                &domain_ty,
                false,
                opts,
            )?;
            lines.push("    v".to_string());
            let doc = match view {
                Some(v) => format!(
                    "/// Builds a value of type {domain_ty} from a value of type {source},\n/// projected through the \"{v}\" view."
                ),
                None => format!(
                    "/// Builds a value of type {domain_ty} from a value of type {source}."
                ),
            };
            let code = FunctionTemplate {
                doc,
                vis: "",
                signature: format!("{name}(v: {source}) -> {domain_ty}"),
                lines,
            }
            .render()
            .with_context(|| format!("rendering unmarshal helper {name}"))?;
            reg.push(ArtifactKind::FnDecl, name.clone(), code);
            Ok(name)
        }
    }
}

fn result_domain_type(
    graph: &TypeGraph,
    method: &MethodDescriptor,
    result: &DataType,
    opts: &CodegenOptions,
) -> anyhow::Result<String> {
    match result {
        DataType::Object(_) => Ok(format!(
            "{}::{}Result",
            opts.domain_path,
            to_camel_case(&method.name)
        )),
        other => domain_type(graph, other, opts),
    }
}

/// Views to generate for one response: the explicitly requested view, every
/// declared view of a multi-view result type, or the single unnamed
/// projection.
fn views_in_use(graph: &TypeGraph, response: &ResponseDescriptor) -> Vec<Option<String>> {
    if let Some(view) = &response.view {
        return vec![Some(view.clone())];
    }
    if let Some(DataType::Ref(id)) = &response.result {
        if let Ok(ut) = graph.get(*id) {
            if ut.is_multi_view() {
                return ut.views.iter().map(|v| Some(v.name.clone())).collect();
            }
        }
    }
    vec![None]
}

/// Emits the unmarshal functions for one response variant of a method: one
/// function per view in use. Each function takes the decoded body plus one
/// parameter per out-of-body attribute, in binding order; those parameters
/// are assigned unconditionally, independent of the active view.
pub fn emit_response_unmarshal(
    graph: &TypeGraph,
    reg: &mut Registry,
    service: &str,
    method: &MethodDescriptor,
    response: &ResponseDescriptor,
    body: Option<&BodyType>,
    opts: &CodegenOptions,
) -> anyhow::Result<()> {
    let Some(result) = &response.result else {
        return Ok(());
    };
    let domain_ty = result_domain_type(graph, method, result, opts)?;
    let status = status_suffix(response.status);

    for view in views_in_use(graph, response) {
        let view_suffix = match view.as_deref().filter(|v| *v != "default") {
            Some(v) => format!("_{}", to_snake_case(v)),
            None => String::new(),
        };
        let fn_name = format!(
            "new_{}{view_suffix}_{}",
            to_snake_case(&method.name),
            to_snake_case(&status)
        );
        // Body-less variants are keyed by the response variant itself, so
        // two statuses sharing a result type keep distinct constructors.
        let source = match body {
            Some(b) => b.name.clone(),
            None => format!("{}{}Response", to_camel_case(&method.name), status),
        };
        let key = ConversionKey {
            kind: ConversionKind::Unmarshal,
            source,
            target: domain_ty.clone(),
            view: view.clone(),
        };
        if matches!(reg.reserve(key, fn_name.clone()), Slot::Reused(_)) {
            continue;
        }

        let mut params = Vec::new();
        if let Some(body) = body {
            let body_ty = match &body.data {
                DataType::Object(_) => body.name.clone(),
                other => wire_type(graph, other, Direction::Decode)?,
            };
            params.push(format!("body: {body_ty}"));
        }
        let out_attrs = match graph.attributes_of(result) {
            Some(attrs) => out_of_body(attrs, &response.bindings),
            None => Vec::new(),
        };
        for (attr, _) in &out_attrs {
            let base = domain_type(graph, &attr.ty, opts)?;
            let ty = if attr.is_nullable() {
                format!("Option<{base}>")
            } else {
                base
            };
            params.push(format!("{}: {ty}", field_name(&attr.name)));
        }

        let lines = match (graph.attributes_of(result), body) {
            (Some(attrs), Some(body_ty)) => {
                let DataType::Object(body_attrs) = &body_ty.data else {
                    bail!("object result with a non-object body");
                };
                let active_view = resolve_view(graph, result, view.as_deref())?;
                // The literal only covers body-sourced attributes; the rest
                // come from Default and the out-of-body assignments below.
                let literal_attrs: Vec<Attribute> = attrs
                    .iter()
                    .filter(|a| body_attrs.iter().any(|b| b.name == a.name))
                    .cloned()
                    .collect();
                let covers_all = literal_attrs.len() == attrs.len();
                let mut lines = object_literal_lines(
                    graph,
                    reg,
                    &literal_attrs,
                    active_view.as_ref(),
                    "body",
                    &domain_ty,
                    !out_attrs.is_empty(),
                    opts,
                )?;
                let needs_default = !covers_all || active_view.is_some();
                if needs_default && !lines.iter().any(|l| l.contains("..Default::default()")) {
                    let close = lines.len() - 1;
                    lines.insert(close, "        ..Default::default()".to_string());
                }
                for (attr, _) in &out_attrs {
                    let name = field_name(&attr.name);
                    lines.push(format!("    v.{name} = {name};"));
                }
                lines.push("    v".to_string());
                lines
            }
            (Some(_), None) => {
                let mut lines = vec![format!("    let mut v = {domain_ty}::default();")];
                for (attr, _) in &out_attrs {
                    let name = field_name(&attr.name);
                    lines.push(format!("    v.{name} = {name};"));
                }
                lines.push("    v".to_string());
                lines
            }
            (None, Some(_)) => {
                let expr = decode_value(graph, reg, result, "body", view.as_deref(), opts)?;
                vec![format!("    {expr}")]
            }
            (None, None) => return Ok(()),
        };

        let code = FunctionTemplate {
            doc: format!(
                "/// Builds a \"{}\" service \"{}\" endpoint result from an HTTP \"{}\"\n/// response.",
                service, method.name, status
            ),
            vis: "pub ",
            signature: format!("{fn_name}({}) -> {domain_ty}", params.join(", ")),
            lines,
        }
        .render()
        .with_context(|| format!("rendering unmarshal function {fn_name}"))?;
        reg.push(ArtifactKind::FnDecl, fn_name, code);
    }
    Ok(())
}

fn resolve_view(
    graph: &TypeGraph,
    result: &DataType,
    view: Option<&str>,
) -> anyhow::Result<Option<View>> {
    let Some(view) = view else { return Ok(None) };
    match result {
        DataType::Ref(id) => {
            let ut = graph.get(*id)?;
            match ut.view(view) {
                Some(v) => Ok(Some(v.clone())),
                None => bail!("view '{view}' is not defined on type {}", ut.name),
            }
        }
        _ => bail!("view '{view}' given for a result that is not a user type"),
    }
}

/// Emits the unmarshal function for one named error of a method.
pub fn emit_error_unmarshal(
    graph: &TypeGraph,
    reg: &mut Registry,
    service: &str,
    method: &MethodDescriptor,
    error: &ErrorDescriptor,
    body: &BodyType,
    opts: &CodegenOptions,
) -> anyhow::Result<()> {
    let domain_ty = match &error.ty {
        DataType::Object(_) => format!(
            "{}::{}Error",
            opts.domain_path,
            to_camel_case(&error.name)
        ),
        other => domain_type(graph, other, opts)?,
    };
    let fn_name = format!(
        "new_{}_{}",
        to_snake_case(&method.name),
        to_snake_case(&error.name)
    );
    let key = ConversionKey {
        kind: ConversionKind::Unmarshal,
        source: body.name.clone(),
        target: domain_ty.clone(),
        view: None,
    };
    if matches!(reg.reserve(key, fn_name.clone()), Slot::Reused(_)) {
        return Ok(());
    }

    let (param_ty, lines) = match &body.data {
        DataType::Object(attrs) => {
            let mut lines =
                object_literal_lines(graph, reg, attrs, None, "body", &domain_ty, false, opts)?;
            lines.push("    v".to_string());
            (body.name.clone(), lines)
        }
        other => {
            let expr = decode_value(graph, reg, other, "body", None, opts)?;
            (
                wire_type(graph, other, Direction::Decode)?,
                vec![format!("    {expr}")],
            )
        }
    };
    let code = FunctionTemplate {
        doc: format!(
            "/// Builds a \"{}\" service \"{}\" endpoint \"{}\" error.",
            service, method.name, error.name
        ),
        vis: "pub ",
        signature: format!("{fn_name}(body: {param_ty}) -> {domain_ty}"),
        lines,
    }
    .render()
    .with_context(|| format!("rendering error unmarshal {fn_name}"))?;
    reg.push(ArtifactKind::FnDecl, fn_name, code);
    Ok(())
}

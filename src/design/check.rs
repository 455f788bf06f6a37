use super::method::{MethodDescriptor, ServiceDescriptor};
use super::types::{Attribute, Constraints, DataType, PrimitiveKind, TypeGraph, UserType};
use anyhow::bail;
use std::collections::HashSet;

/// One problem found while checking a design before generation.
///
/// All issues are fatal: the run aborts before emitting anything, because
/// generated artifacts are only useful as a complete, mutually consistent
/// set.
#[derive(Debug, Clone)]
pub struct DesignIssue {
    pub location: String,
    pub kind: String,
    pub message: String,
}

impl DesignIssue {
    pub fn new(
        location: impl Into<String>,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        DesignIssue {
            location: location.into(),
            kind: kind.into(),
            message: message.into(),
        }
    }
}

fn render_issues(issues: &[DesignIssue]) -> String {
    let mut out = format!("design check failed, {} issue(s) found:", issues.len());
    for issue in issues {
        out.push_str(&format!("\n[{}] {}: {}", issue.kind, issue.location, issue.message));
    }
    out
}

/// Checks a service design against the type graph.
///
/// Detects every synthesis-time error class: dangling type references,
/// unknown views, and constraint/type mismatches (including patterns that
/// do not compile). Issues are collected rather than reported fail-fast,
/// then surfaced as a single aggregate error.
pub fn check_design(graph: &TypeGraph, service: &ServiceDescriptor) -> anyhow::Result<()> {
    let mut issues = Vec::new();

    let mut seen_names = HashSet::new();
    for ut in &graph.user_types {
        if !seen_names.insert(ut.name.as_str()) {
            issues.push(DesignIssue::new(
                format!("type {}", ut.name),
                "DuplicateType",
                "user type names must be unique within a design",
            ));
        }
    }

    for ut in &graph.user_types {
        check_user_type(graph, ut, &mut issues);
    }
    for method in &service.methods {
        check_method(graph, service, method, &mut issues);
    }

    if !issues.is_empty() {
        bail!("{}", render_issues(&issues));
    }
    Ok(())
}

fn check_user_type(graph: &TypeGraph, ut: &UserType, issues: &mut Vec<DesignIssue>) {
    let location = format!("type {}", ut.name);
    for attr in &ut.attributes {
        check_attribute(graph, &location, attr, issues);
    }
    for view in &ut.views {
        for member in &view.members {
            let loc = format!("{} → view {}", location, view.name);
            let Some(attr) = ut.attribute(&member.attribute) else {
                issues.push(DesignIssue::new(
                    loc,
                    "UnknownViewMember",
                    format!("view names attribute '{}' which does not exist", member.attribute),
                ));
                continue;
            };
            if let Some(sub) = &member.sub_view {
                check_sub_view(graph, &loc, attr, sub, issues);
            }
        }
    }
}

fn check_sub_view(
    graph: &TypeGraph,
    location: &str,
    attr: &Attribute,
    sub_view: &str,
    issues: &mut Vec<DesignIssue>,
) {
    // Sub-views only make sense when the attribute (or its element type)
    // resolves to a multi-view user type.
    let elem = match &attr.ty {
        DataType::Array(elem) => elem.as_ref(),
        DataType::Map(_, value) => value.as_ref(),
        other => other,
    };
    let target = match elem {
        DataType::Ref(id) => graph.get(*id).ok(),
        _ => None,
    };
    match target {
        Some(ut) if ut.view(sub_view).is_some() => {}
        Some(ut) => issues.push(DesignIssue::new(
            format!("{} → {}", location, attr.name),
            "UnknownView",
            format!("sub-view '{}' is not defined on type {}", sub_view, ut.name),
        )),
        None => issues.push(DesignIssue::new(
            format!("{} → {}", location, attr.name),
            "UnknownView",
            format!(
                "sub-view '{}' given for an attribute that is not a user type",
                sub_view
            ),
        )),
    }
}

fn check_method(
    graph: &TypeGraph,
    service: &ServiceDescriptor,
    method: &MethodDescriptor,
    issues: &mut Vec<DesignIssue>,
) {
    let location = format!("{}.{}", service.name, method.name);

    if let Some(payload) = &method.payload {
        check_shape(graph, &format!("{} → payload", location), payload, issues);
        check_bindings(graph, &location, payload, &method.request_bindings, issues);
    } else if !method.request_bindings.is_empty() {
        issues.push(DesignIssue::new(
            &location,
            "DanglingBinding",
            "request bindings given for a method without a payload",
        ));
    }

    for response in &method.responses {
        let loc = format!("{} → response {}", location, response.status);
        if let Some(result) = &response.result {
            check_shape(graph, &loc, result, issues);
            check_bindings(graph, &loc, result, &response.bindings, issues);
            if let Some(view) = &response.view {
                match result {
                    DataType::Ref(id) => match graph.get(*id) {
                        Ok(ut) if ut.view(view).is_some() => {}
                        Ok(ut) => issues.push(DesignIssue::new(
                            &loc,
                            "UnknownView",
                            format!("view '{}' is not defined on type {}", view, ut.name),
                        )),
                        Err(_) => {}
                    },
                    _ => issues.push(DesignIssue::new(
                        &loc,
                        "UnknownView",
                        format!("view '{}' given for a result that is not a user type", view),
                    )),
                }
            }
        } else if response.view.is_some() || !response.bindings.is_empty() {
            issues.push(DesignIssue::new(
                &loc,
                "DanglingBinding",
                "view or bindings given for a response without a result type",
            ));
        }
    }

    for error in &method.errors {
        let loc = format!("{} → error {}", location, error.name);
        check_shape(graph, &loc, &error.ty, issues);
    }
}

fn check_bindings(
    graph: &TypeGraph,
    location: &str,
    shape: &DataType,
    bindings: &[super::method::Binding],
    issues: &mut Vec<DesignIssue>,
) {
    if bindings.is_empty() {
        return;
    }
    let Some(attrs) = graph.attributes_of(shape) else {
        issues.push(DesignIssue::new(
            location,
            "DanglingBinding",
            "attribute bindings given for a non-object type",
        ));
        return;
    };
    for binding in bindings {
        if !attrs.iter().any(|a| a.name == binding.attribute) {
            issues.push(DesignIssue::new(
                location,
                "DanglingBinding",
                format!(
                    "binding names attribute '{}' which does not exist",
                    binding.attribute
                ),
            ));
        }
    }
}

/// Checks a top-level payload/result/error shape. Inline objects are only
/// allowed at the top level; nested objects must be interned as user types
/// by the resolver so generated declarations can be deduplicated by type
/// identity.
fn check_shape(graph: &TypeGraph, location: &str, ty: &DataType, issues: &mut Vec<DesignIssue>) {
    match ty {
        DataType::Object(attrs) => {
            for attr in attrs {
                check_attribute(graph, location, attr, issues);
            }
        }
        other => check_type(graph, location, other, issues),
    }
}

fn check_attribute(
    graph: &TypeGraph,
    location: &str,
    attr: &Attribute,
    issues: &mut Vec<DesignIssue>,
) {
    let loc = format!("{} → {}", location, attr.name);
    check_type(graph, &loc, &attr.ty, issues);
    check_constraints(&loc, attr, issues);
}

fn check_type(graph: &TypeGraph, location: &str, ty: &DataType, issues: &mut Vec<DesignIssue>) {
    match ty {
        DataType::Primitive(_) | DataType::Any => {}
        DataType::Array(elem) => check_type(graph, location, elem, issues),
        DataType::Map(key, value) => {
            if key.as_primitive().is_none() {
                issues.push(DesignIssue::new(
                    location,
                    "InvalidMapKey",
                    "map keys must be primitive",
                ));
            }
            check_type(graph, location, value, issues);
        }
        DataType::Object(_) => issues.push(DesignIssue::new(
            location,
            "UnnamedObject",
            "nested inline object; the resolver must intern nested objects as user types",
        )),
        DataType::Ref(id) => {
            if graph.get(*id).is_err() {
                issues.push(DesignIssue::new(
                    location,
                    "DanglingRef",
                    format!("reference to unknown type {id}"),
                ));
            }
        }
    }
}

fn check_constraints(location: &str, attr: &Attribute, issues: &mut Vec<DesignIssue>) {
    let c: &Constraints = &attr.constraints;
    if c.is_empty() {
        return;
    }
    let kind = attr.ty.as_primitive();
    let elem_kind = match &attr.ty {
        DataType::Array(elem) => elem.as_primitive(),
        _ => None,
    };
    let is_string = kind.map(|k| k.is_string()).unwrap_or(false);
    let is_numeric = kind.map(|k| k.is_numeric()).unwrap_or(false);

    if let Some(pattern) = &c.pattern {
        if !is_string {
            issues.push(DesignIssue::new(
                location,
                "ConstraintMismatch",
                "pattern constraint on a non-string attribute",
            ));
        } else if let Err(err) = regex::Regex::new(pattern) {
            issues.push(DesignIssue::new(
                location,
                "InvalidPattern",
                format!("pattern does not compile: {err}"),
            ));
        }
    }
    if c.format.is_some() && !is_string {
        issues.push(DesignIssue::new(
            location,
            "ConstraintMismatch",
            "format constraint on a non-string attribute",
        ));
    }
    if (c.minimum.is_some() || c.maximum.is_some()) && !is_numeric {
        issues.push(DesignIssue::new(
            location,
            "ConstraintMismatch",
            "range constraint on a non-numeric attribute",
        ));
    }
    if (c.min_length.is_some() || c.max_length.is_some())
        && !is_string
        && !matches!(attr.ty, DataType::Array(_))
    {
        issues.push(DesignIssue::new(
            location,
            "ConstraintMismatch",
            "length constraint on an attribute that is neither string nor array",
        ));
    }
    if let Some(values) = &c.enum_values {
        let ok = values.iter().all(|v| match (kind, elem_kind) {
            (Some(PrimitiveKind::Str), _) => v.is_string(),
            (Some(PrimitiveKind::Bool), _) => v.is_boolean(),
            (Some(k), _) if k.is_numeric() => v.is_number(),
            (None, Some(PrimitiveKind::Str)) => v.is_string(),
            (None, Some(k)) if k.is_numeric() => v.is_number(),
            _ => false,
        });
        if !ok {
            issues.push(DesignIssue::new(
                location,
                "ConstraintMismatch",
                "enum values do not match the attribute type",
            ));
        }
    }
}

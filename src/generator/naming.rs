//! Deterministic naming for generated types and functions.
//!
//! All dedup keys and artifact names flow through these helpers, so output
//! naming is stable across runs for identical input.

/// Convert a snake_case string to CamelCase.
///
/// # Example
///
/// ```rust,ignore
/// assert_eq!(to_camel_case("list_pets"), "ListPets");
/// ```
pub fn to_camel_case(s: &str) -> String {
    s.split(['_', '-'])
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// Convert a CamelCase (or mixed) string to snake_case.
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    let chars: Vec<char> = s.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev_lower = i > 0 && chars[i - 1].is_ascii_lowercase();
            let next_lower = chars.get(i + 1).map(|n| n.is_ascii_lowercase()).unwrap_or(false);
            if i > 0 && (prev_lower || (chars[i - 1].is_ascii_uppercase() && next_lower)) {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else if *c == '-' {
            out.push('_');
        } else {
            out.push(*c);
        }
    }
    out
}

fn sanitize_rust_identifier(name: &str) -> String {
    const KEYWORDS: &[&str] = &[
        "as", "break", "const", "continue", "crate", "else", "enum", "extern", "false", "fn",
        "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref",
        "return", "self", "Self", "static", "struct", "super", "trait", "true", "type", "unsafe",
        "use", "where", "while", "async", "await", "dyn",
    ];
    if KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_string()
    }
}

/// Sanitized Rust field name for a wire attribute. The original attribute
/// name is preserved separately for the serde rename.
pub fn field_name(name: &str) -> String {
    let mut s: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.is_empty() {
        s = "_".to_string();
    }
    if s.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
        s.insert(0, '_');
    }
    sanitize_rust_identifier(&to_snake_case(&s))
}

/// Canonical suffix for a response status code, used in body type and
/// function names ("Ok", "Created", "Status422", ...).
pub fn status_suffix(status: u16) -> String {
    match status {
        200 => "Ok".to_string(),
        201 => "Created".to_string(),
        202 => "Accepted".to_string(),
        204 => "NoContent".to_string(),
        400 => "BadRequest".to_string(),
        401 => "Unauthorized".to_string(),
        403 => "Forbidden".to_string(),
        404 => "NotFound".to_string(),
        409 => "Conflict".to_string(),
        500 => "InternalError".to_string(),
        other => format!("Status{other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case() {
        assert_eq!(to_camel_case("list_pets"), "ListPets");
        assert_eq!(to_camel_case("method-b"), "MethodB");
        assert_eq!(to_camel_case("single"), "Single");
        assert_eq!(to_camel_case(""), "");
    }

    #[test]
    fn snake_case() {
        assert_eq!(to_snake_case("MethodARequestBody"), "method_a_request_body");
        assert_eq!(to_snake_case("InnerType"), "inner_type");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("HTTPBody"), "http_body");
    }

    #[test]
    fn field_names() {
        assert_eq!(field_name("user-id"), "user_id");
        assert_eq!(field_name("type"), "r#type");
        assert_eq!(field_name("3d"), "_3d");
        assert_eq!(field_name(""), "_");
    }

    #[test]
    fn status_suffixes() {
        assert_eq!(status_suffix(200), "Ok");
        assert_eq!(status_suffix(204), "NoContent");
        assert_eq!(status_suffix(422), "Status422");
    }
}

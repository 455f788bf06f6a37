use crate::design::{
    Attribute, BindingLocation, DataType, ErrorDescriptor, MethodDescriptor, ResponseDescriptor,
    TypeGraph, TypeId,
};
use super::naming::{status_suffix, to_camel_case};

/// Direction a body travels in, which decides how nullability renders.
///
/// Encode-side bodies (request bodies built from a payload) follow the
/// attribute's own required/default flags. Decode-side bodies (response and
/// error bodies parsed off the wire) render every field nullable so the
/// validation function can report missing required attributes instead of
/// failing during deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Encode,
    Decode,
}

/// The HTTP variant a body type serves.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpVariant {
    Request,
    Response { status: u16 },
    Error { name: String },
}

/// A derived wire body type: exactly the attributes transmitted in one HTTP
/// body for one (method, direction, variant). Never authored by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyType {
    pub name: String,
    /// Originating user type, when the body was derived from a named type.
    pub source: Option<TypeId>,
    /// Object of the selected attributes, or the bare payload type when the
    /// body degenerates to a non-object.
    pub data: DataType,
    pub variant: HttpVariant,
}

impl BodyType {
    pub fn direction(&self) -> Direction {
        match self.variant {
            HttpVariant::Request => Direction::Encode,
            _ => Direction::Decode,
        }
    }
}

/// Name of the nested body type derived for a user type in one direction.
pub fn nested_body_name(user_type: &str, direction: Direction) -> String {
    match direction {
        Direction::Encode => format!("{}RequestBody", to_camel_case(user_type)),
        Direction::Decode => format!("{}ResponseBody", to_camel_case(user_type)),
    }
}

/// Intersects an object shape with the body partition of the bindings.
/// Attributes without an explicit binding belong to the body.
fn body_partition(attrs: &[Attribute], bindings: &[crate::design::Binding]) -> Vec<Attribute> {
    attrs
        .iter()
        .filter(|attr| {
            bindings
                .iter()
                .find(|b| b.attribute == attr.name)
                .map(|b| b.location == BindingLocation::Body)
                .unwrap_or(true)
        })
        .cloned()
        .collect()
}

/// Attributes routed out of the body, paired with their location, in the
/// order the bindings declare them. This order fixes the extra parameters of
/// generated unmarshal functions.
pub fn out_of_body<'a>(
    attrs: &'a [Attribute],
    bindings: &'a [crate::design::Binding],
) -> Vec<(&'a Attribute, BindingLocation)> {
    bindings
        .iter()
        .filter(|b| b.location != BindingLocation::Body)
        .filter_map(|b| {
            attrs
                .iter()
                .find(|a| a.name == b.attribute)
                .map(|a| (a, b.location))
        })
        .collect()
}

fn derive_body(
    graph: &TypeGraph,
    ty: &DataType,
    bindings: &[crate::design::Binding],
    name: String,
    variant: HttpVariant,
) -> Option<BodyType> {
    match graph.attributes_of(ty) {
        Some(attrs) => {
            let selected = body_partition(attrs, bindings);
            if selected.is_empty() {
                return None;
            }
            let source = match ty {
                DataType::Ref(id) => Some(*id),
                _ => None,
            };
            Some(BodyType {
                name,
                source,
                data: DataType::Object(selected),
                variant,
            })
        }
        // Non-object payloads degenerate: the wire body is the whole value,
        // not a field of a wrapping object.
        None => Some(BodyType {
            name,
            source: None,
            data: ty.clone(),
            variant,
        }),
    }
}

/// Derives the request body type of a method, if any attribute routes to the
/// body.
pub fn derive_request_body(graph: &TypeGraph, method: &MethodDescriptor) -> Option<BodyType> {
    let payload = method.payload.as_ref()?;
    let name = format!("{}RequestBody", to_camel_case(&method.name));
    derive_body(
        graph,
        payload,
        &method.request_bindings,
        name,
        HttpVariant::Request,
    )
}

/// Derives the response body type for one response variant of a method.
pub fn derive_response_body(
    graph: &TypeGraph,
    method: &MethodDescriptor,
    response: &ResponseDescriptor,
) -> Option<BodyType> {
    let result = response.result.as_ref()?;
    let method_camel = to_camel_case(&method.name);
    let name = if response.status == 200 {
        format!("{method_camel}ResponseBody")
    } else {
        format!("{method_camel}{}ResponseBody", status_suffix(response.status))
    };
    derive_body(
        graph,
        result,
        &response.bindings,
        name,
        HttpVariant::Response {
            status: response.status,
        },
    )
}

/// Derives the response body type for one named error of a method. Error
/// bodies always carry the full error type.
pub fn derive_error_body(
    graph: &TypeGraph,
    method: &MethodDescriptor,
    error: &ErrorDescriptor,
) -> Option<BodyType> {
    let name = format!(
        "{}{}ResponseBody",
        to_camel_case(&method.name),
        to_camel_case(&error.name)
    );
    derive_body(
        graph,
        &error.ty,
        &[],
        name,
        HttpVariant::Error {
            name: error.name.clone(),
        },
    )
}

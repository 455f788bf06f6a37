use super::types::DataType;
use serde::{Deserialize, Serialize};

/// Where one attribute of a payload or result travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BindingLocation {
    Path,
    Query,
    Header,
    Body,
}

impl std::fmt::Display for BindingLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingLocation::Path => write!(f, "Path"),
            BindingLocation::Query => write!(f, "Query"),
            BindingLocation::Header => write!(f, "Header"),
            BindingLocation::Body => write!(f, "Body"),
        }
    }
}

/// Binds one attribute name to a wire location. Attributes with no binding
/// default to the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub attribute: String,
    pub location: BindingLocation,
}

/// One response variant of a method: a status code, the domain result type
/// carried by that status, the view to project (if the result type is
/// multi-view) and the response-direction attribute bindings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDescriptor {
    pub status: u16,
    #[serde(default)]
    pub result: Option<DataType>,
    #[serde(default)]
    pub view: Option<String>,
    #[serde(default)]
    pub bindings: Vec<Binding>,
}

/// A named error result of a method. Error bodies carry the full error type;
/// per-attribute bindings are not supported for errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: DataType,
}

/// Fully resolved descriptor of one service method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,
    #[serde(default)]
    pub payload: Option<DataType>,
    /// Request-direction bindings for top-level payload attributes.
    #[serde(default)]
    pub request_bindings: Vec<Binding>,
    #[serde(default)]
    pub responses: Vec<ResponseDescriptor>,
    #[serde(default)]
    pub errors: Vec<ErrorDescriptor>,
}

impl MethodDescriptor {
    /// Location of a payload attribute in the request direction.
    pub fn request_location(&self, attribute: &str) -> BindingLocation {
        self.request_bindings
            .iter()
            .find(|b| b.attribute == attribute)
            .map(|b| b.location)
            .unwrap_or(BindingLocation::Body)
    }
}

/// A service and its methods, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    pub name: String,
    pub methods: Vec<MethodDescriptor>,
}

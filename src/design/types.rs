use anyhow::bail;
use serde::{Deserialize, Serialize};

/// Index of a [`UserType`] in the [`TypeGraph`] arena.
///
/// Identity, not shape, distinguishes user types: two structurally identical
/// types with different ids are different types for every purpose, including
/// deduplication of generated code.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TypeId(pub u32);

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Primitive wire kinds supported by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Bool,
    Int32,
    Int64,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Str,
    Bytes,
}

impl PrimitiveKind {
    /// Rust type the kind renders to in generated code.
    pub fn rust_type(&self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int32 => "i32",
            PrimitiveKind::Int64 => "i64",
            PrimitiveKind::UInt32 => "u32",
            PrimitiveKind::UInt64 => "u64",
            PrimitiveKind::Float32 => "f32",
            PrimitiveKind::Float64 => "f64",
            PrimitiveKind::Str => "String",
            PrimitiveKind::Bytes => "Vec<u8>",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PrimitiveKind::Int32
                | PrimitiveKind::Int64
                | PrimitiveKind::UInt32
                | PrimitiveKind::UInt64
                | PrimitiveKind::Float32
                | PrimitiveKind::Float64
        )
    }

    /// Kinds that are `Copy` in the generated code and never need `.clone()`.
    pub fn is_copy(&self) -> bool {
        !matches!(self, PrimitiveKind::Str | PrimitiveKind::Bytes)
    }

    pub fn is_string(&self) -> bool {
        matches!(self, PrimitiveKind::Str)
    }
}

/// Closed tagged union of attribute types.
///
/// Every synthesizer matches exhaustively on this enum; there is no runtime
/// type inspection anywhere in the generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataType {
    Primitive(PrimitiveKind),
    Array(Box<DataType>),
    Map(Box<DataType>, Box<DataType>),
    Object(Vec<Attribute>),
    Ref(TypeId),
    Any,
}

impl DataType {
    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match self {
            DataType::Primitive(k) => Some(*k),
            _ => None,
        }
    }

    /// Whether the type resolves to an object shape (inline or named).
    pub fn is_object_like(&self) -> bool {
        matches!(self, DataType::Object(_) | DataType::Ref(_))
    }
}

/// Validation rules attached to an attribute.
///
/// The generator never evaluates these itself; it emits calls into an
/// external runtime validator, one call per constraint kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    pub pattern: Option<String>,
    pub format: Option<String>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub enum_values: Option<Vec<serde_json::Value>>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
            && self.format.is_none()
            && self.minimum.is_none()
            && self.maximum.is_none()
            && self.enum_values.is_none()
            && self.min_length.is_none()
            && self.max_length.is_none()
    }
}

/// A named, typed member of an object shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: DataType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub has_default: bool,
    #[serde(default)]
    pub constraints: Constraints,
}

impl Attribute {
    /// Whether the attribute renders as a nullable field on the encode side.
    ///
    /// Required attributes without a default render as plain values; anything
    /// optional, or defaulted elsewhere, renders as `Option<T>`. This mapping
    /// is a pure function of the two flags.
    pub fn is_nullable(&self) -> bool {
        !self.required || self.has_default
    }
}

/// Entry in a view: one attribute, optionally projected through a sub-view
/// when the attribute's own type is itself multi-view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewMember {
    pub attribute: String,
    #[serde(default)]
    pub sub_view: Option<String>,
}

/// Named partial projection over a multi-view result type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct View {
    pub name: String,
    pub members: Vec<ViewMember>,
}

/// A named object type in the design.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserType {
    pub name: String,
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub views: Vec<View>,
}

impl UserType {
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn view(&self, name: &str) -> Option<&View> {
        self.views.iter().find(|v| v.name == name)
    }

    pub fn is_multi_view(&self) -> bool {
        !self.views.is_empty()
    }
}

/// Arena of all user types in a design, addressed by [`TypeId`].
///
/// The graph is immutable for the duration of a generation run. Recursive
/// types are expressed through [`DataType::Ref`] indices, never through
/// ownership cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeGraph {
    pub user_types: Vec<UserType>,
}

impl TypeGraph {
    pub fn get(&self, id: TypeId) -> anyhow::Result<&UserType> {
        match self.user_types.get(id.0 as usize) {
            Some(ut) => Ok(ut),
            None => bail!("dangling type reference {id}"),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.user_types
            .iter()
            .position(|ut| ut.name == name)
            .map(|i| TypeId(i as u32))
    }

    /// Attributes of an object-shaped type, following one level of `Ref`.
    /// Returns `None` for primitives, collections and `Any`.
    pub fn attributes_of<'a>(&'a self, ty: &'a DataType) -> Option<&'a [Attribute]> {
        match ty {
            DataType::Object(attrs) => Some(attrs),
            DataType::Ref(id) => self
                .user_types
                .get(id.0 as usize)
                .map(|ut| ut.attributes.as_slice()),
            _ => None,
        }
    }

    /// Collects every `Ref` reachable from `ty` in declaration order,
    /// following nested user types transitively. Cycle-safe: a type already
    /// collected is not revisited.
    pub fn collect_refs(&self, ty: &DataType, out: &mut Vec<TypeId>) {
        match ty {
            DataType::Primitive(_) | DataType::Any => {}
            DataType::Array(elem) => self.collect_refs(elem, out),
            DataType::Map(key, value) => {
                self.collect_refs(key, out);
                self.collect_refs(value, out);
            }
            DataType::Object(attrs) => {
                for attr in attrs {
                    self.collect_refs(&attr.ty, out);
                }
            }
            DataType::Ref(id) => {
                if out.contains(id) {
                    return;
                }
                out.push(*id);
                if let Some(ut) = self.user_types.get(id.0 as usize) {
                    for attr in &ut.attributes {
                        self.collect_refs(&attr.ty, out);
                    }
                }
            }
        }
    }
}

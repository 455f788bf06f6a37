//! # Design Module
//!
//! In-memory representation of a fully resolved service design: the type
//! graph (arena of user-defined types addressed by [`TypeId`]), per-method
//! descriptors with their HTTP attribute bindings, and the synthesis-time
//! design checks that must pass before any code is generated.
//!
//! The design is produced by an upstream resolver and consumed read-only by
//! the [`crate::generator`] module. Nothing in this module performs I/O
//! except [`load_design`], which reads a resolved design from a JSON or
//! YAML file for the CLI.

mod check;
mod load;
mod method;
mod types;

pub use check::{check_design, DesignIssue};
pub use load::{load_design, Design};
pub use method::{
    Binding, BindingLocation, ErrorDescriptor, MethodDescriptor, ResponseDescriptor,
    ServiceDescriptor,
};
pub use types::{
    Attribute, Constraints, DataType, PrimitiveKind, TypeGraph, TypeId, UserType, View, ViewMember,
};

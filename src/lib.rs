//! # bodygen
//!
//! Generator for the HTTP body layer of a service: given a fully resolved
//! design (type graph, methods, attribute bindings), it synthesizes the
//! Rust source for wire body structs, marshal/unmarshal conversion
//! functions and decode-side validation functions. The generated code is
//! plain `serde`-annotated Rust that compiles into the consuming crate next
//! to its own domain types.
//!
//! ## Architecture
//!
//! - **[`design`]** - resolved design model: type graph arena, method and
//!   binding descriptors, view definitions, and the pre-generation design
//!   checks
//! - **[`generator`]** - the synthesizers: body-type derivation,
//!   declarations, marshal, unmarshal (with view projection), validation,
//!   and the run-scoped dedup registry
//! - **[`cli`]** - the `bodygen-gen` command line front end
//!
//! ## Generation Flow
//!
//! A run loads a resolved design, checks it, then walks each service's
//! methods in order. Every method contributes its request body (encode
//! direction) and one body per response status and named error (decode
//! direction). Declarations and shared nested helpers are deduplicated per
//! run, so two methods exchanging the same user type share one conversion
//! function.
//!
//! The generator itself performs no HTTP and owns no runtime: constraint
//! checks in generated code call into a runtime module of the consuming
//! crate, addressed by a configurable path.

pub mod cli;
pub mod design;
pub mod generator;

pub use design::{load_design, Design};
pub use generator::{generate_design, generate_service, CodegenOptions};

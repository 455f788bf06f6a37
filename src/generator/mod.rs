//! # Generator Module
//!
//! Synthesizes the HTTP body layer of a service: wire struct declarations,
//! marshal functions (domain payload to request body), unmarshal functions
//! (response/error body plus out-of-body parameters to domain value, with
//! view projection) and decode-side validation functions.
//!
//! All synthesis is pure string building over the [`crate::design`] model;
//! a [`Registry`] scoped to one run deduplicates declarations and shared
//! conversion helpers. File output lives in [`output`], everything else
//! returns [`Artifact`] lists.

mod body;
mod decl;
mod marshal;
mod naming;
mod output;
mod registry;
mod templates;
mod unmarshal;
mod validate;

#[cfg(test)]
mod tests;

pub use body::{
    derive_error_body, derive_request_body, derive_response_body, nested_body_name, BodyType,
    Direction, HttpVariant,
};
pub use marshal::coerce_primitive;
pub use naming::{status_suffix, to_camel_case, to_snake_case};
pub use output::{render_module, write_service_file};
pub use registry::{Artifact, ArtifactKind, ConversionKey, ConversionKind, Registry};

use crate::design::{check_design, Design, ServiceDescriptor, TypeGraph};
use decl::DeclContext;
use tracing::info;

/// Paths the generated code is wired against.
#[derive(Debug, Clone)]
pub struct CodegenOptions {
    /// Module path of the domain (service-layer) types, e.g. `crate::types`.
    pub domain_path: String,
    /// Module path of the runtime validation support, e.g. `crate::runtime`.
    pub runtime_path: String,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        CodegenOptions {
            domain_path: "crate::types".to_string(),
            runtime_path: "crate::runtime".to_string(),
        }
    }
}

/// Generates every body-layer artifact for one service: declarations first
/// per body, then the conversion and validation functions, method by method
/// in declaration order. Output is deterministic for a given design.
///
/// # Errors
///
/// Fails if the design check rejects the service or a synthesizer meets a
/// shape the check should have ruled out (a dangling reference, an inline
/// object where a named type is required).
pub fn generate_service(
    graph: &TypeGraph,
    service: &ServiceDescriptor,
    opts: &CodegenOptions,
) -> anyhow::Result<Vec<Artifact>> {
    check_design(graph, service)?;
    let mut reg = Registry::new();
    for method in &service.methods {
        let ctx = DeclContext {
            service: &service.name,
            method: &method.name,
        };
        if let Some(body) = derive_request_body(graph, method) {
            decl::emit_body_decls(graph, &mut reg, ctx, &body)?;
            marshal::emit_request_marshal(graph, &mut reg, &service.name, method, &body, opts)?;
        }
        for response in &method.responses {
            let body = derive_response_body(graph, method, response);
            if let Some(body) = &body {
                decl::emit_body_decls(graph, &mut reg, ctx, body)?;
            }
            unmarshal::emit_response_unmarshal(
                graph,
                &mut reg,
                &service.name,
                method,
                response,
                body.as_ref(),
                opts,
            )?;
            if let Some(body) = &body {
                validate::emit_body_validation(graph, &mut reg, body, opts)?;
            }
        }
        for error in &method.errors {
            if let Some(body) = derive_error_body(graph, method, error) {
                decl::emit_body_decls(graph, &mut reg, ctx, &body)?;
                unmarshal::emit_error_unmarshal(
                    graph,
                    &mut reg,
                    &service.name,
                    method,
                    error,
                    &body,
                    opts,
                )?;
                validate::emit_body_validation(graph, &mut reg, &body, opts)?;
            }
        }
    }
    let artifacts = reg.finish();
    info!(
        service = service.name.as_str(),
        artifacts = artifacts.len(),
        "generated body layer"
    );
    Ok(artifacts)
}

/// Generates the body layer for every service in a design, in order.
pub fn generate_design(
    design: &Design,
    opts: &CodegenOptions,
) -> anyhow::Result<Vec<(String, Vec<Artifact>)>> {
    design
        .services
        .iter()
        .map(|service| {
            generate_service(&design.types, service, opts)
                .map(|artifacts| (service.name.clone(), artifacts))
        })
        .collect()
}

use super::*;
use crate::design::{
    Attribute, Binding, BindingLocation, Constraints, DataType, ErrorDescriptor, MethodDescriptor,
    PrimitiveKind, ResponseDescriptor, ServiceDescriptor, TypeGraph, TypeId, UserType, View,
    ViewMember,
};

fn attr(name: &str, ty: DataType, required: bool) -> Attribute {
    Attribute {
        name: name.to_string(),
        ty,
        required,
        has_default: false,
        constraints: Constraints::default(),
    }
}

fn string() -> DataType {
    DataType::Primitive(PrimitiveKind::Str)
}

fn int32() -> DataType {
    DataType::Primitive(PrimitiveKind::Int32)
}

fn user_type(name: &str, attributes: Vec<Attribute>) -> UserType {
    UserType {
        name: name.to_string(),
        attributes,
        views: Vec::new(),
    }
}

fn service(methods: Vec<MethodDescriptor>) -> ServiceDescriptor {
    ServiceDescriptor {
        name: "pets".to_string(),
        methods,
    }
}

fn method(name: &str) -> MethodDescriptor {
    MethodDescriptor {
        name: name.to_string(),
        payload: None,
        request_bindings: Vec::new(),
        responses: Vec::new(),
        errors: Vec::new(),
    }
}

fn find<'a>(artifacts: &'a [Artifact], name: &str) -> &'a Artifact {
    artifacts
        .iter()
        .find(|a| a.name == name)
        .unwrap_or_else(|| panic!("missing artifact {name}"))
}

#[test]
fn request_body_skips_attributes_bound_elsewhere() {
    let graph = TypeGraph::default();
    let mut m = method("create");
    m.payload = Some(DataType::Object(vec![
        attr("name", string(), true),
        attr("trace", string(), false),
    ]));
    m.request_bindings = vec![Binding {
        attribute: "trace".to_string(),
        location: BindingLocation::Header,
    }];
    let body = derive_request_body(&graph, &m).unwrap();
    match body.data {
        DataType::Object(attrs) => {
            assert_eq!(attrs.len(), 1);
            assert_eq!(attrs[0].name, "name");
        }
        other => panic!("expected object body, got {other:?}"),
    }
}

#[test]
fn no_request_body_when_everything_is_bound_elsewhere() {
    let graph = TypeGraph::default();
    let mut m = method("ping");
    m.payload = Some(DataType::Object(vec![attr("id", string(), true)]));
    m.request_bindings = vec![Binding {
        attribute: "id".to_string(),
        location: BindingLocation::Path,
    }];
    assert!(derive_request_body(&graph, &m).is_none());
}

#[test]
fn degenerate_array_payload_keeps_the_bare_type() {
    let graph = TypeGraph::default();
    let mut m = method("bulk");
    m.payload = Some(DataType::Array(Box::new(string())));
    let body = derive_request_body(&graph, &m).unwrap();
    assert_eq!(body.data, DataType::Array(Box::new(string())));
}

#[test]
fn marshal_copies_required_fields_without_a_guard() {
    let graph = TypeGraph {
        user_types: vec![user_type(
            "inner_type",
            vec![attr("a", string(), true), attr("b", int32(), false)],
        )],
    };
    let mut m = method("create");
    m.payload = Some(DataType::Object(vec![
        attr("name", string(), true),
        attr("inner", DataType::Ref(TypeId(0)), false),
    ]));
    let svc = service(vec![m]);
    let artifacts = generate_service(&graph, &svc, &CodegenOptions::default()).unwrap();

    let entry = find(&artifacts, "new_create_request_body");
    assert!(entry.code.contains("pub fn new_create_request_body(p: &crate::types::CreatePayload) -> CreateRequestBody"));
    assert!(entry.code.contains("name: p.name.clone(),"));
    assert!(entry.code.contains(
        "inner: p.inner.as_ref().map(|value| Box::new(marshal_inner_type_to_inner_type_request_body(value))),"
    ));

    let helper = find(&artifacts, "marshal_inner_type_to_inner_type_request_body");
    assert!(helper.code.starts_with("/// Builds a value of type InnerTypeRequestBody"));
    assert!(!helper.code.contains("pub fn"));

    let decl = find(&artifacts, "CreateRequestBody");
    assert!(decl.code.contains("#[serde(rename = \"name\")]"));
    assert!(decl
        .code
        .contains("rename = \"inner\", default, skip_serializing_if = \"Option::is_none\""));
    assert!(decl
        .code
        .contains("pub inner: Option<Box<InnerTypeRequestBody>>,"));
}

#[test]
fn shared_nested_type_gets_one_helper_across_methods() {
    let graph = TypeGraph {
        user_types: vec![user_type("inner_type", vec![attr("a", string(), false)])],
    };
    let mut first = method("method_a");
    first.payload = Some(DataType::Object(vec![attr(
        "inner",
        DataType::Ref(TypeId(0)),
        true,
    )]));
    let mut second = method("method_b");
    second.payload = Some(DataType::Object(vec![attr(
        "inner",
        DataType::Ref(TypeId(0)),
        false,
    )]));
    let svc = service(vec![first, second]);
    let artifacts = generate_service(&graph, &svc, &CodegenOptions::default()).unwrap();

    let helpers: Vec<_> = artifacts
        .iter()
        .filter(|a| a.name == "marshal_inner_type_to_inner_type_request_body")
        .collect();
    assert_eq!(helpers.len(), 1);
    let decls: Vec<_> = artifacts
        .iter()
        .filter(|a| a.name == "InnerTypeRequestBody")
        .collect();
    assert_eq!(decls.len(), 1);
}

#[test]
fn multi_view_result_generates_one_function_per_view() {
    let graph = TypeGraph {
        user_types: vec![UserType {
            name: "result_type".to_string(),
            attributes: vec![attr("a", string(), false), attr("b", int32(), false)],
            views: vec![
                View {
                    name: "default".to_string(),
                    members: vec![
                        ViewMember {
                            attribute: "a".to_string(),
                            sub_view: None,
                        },
                        ViewMember {
                            attribute: "b".to_string(),
                            sub_view: None,
                        },
                    ],
                },
                View {
                    name: "tiny".to_string(),
                    members: vec![ViewMember {
                        attribute: "a".to_string(),
                        sub_view: None,
                    }],
                },
            ],
        }],
    };
    let mut m = method("list");
    m.responses = vec![ResponseDescriptor {
        status: 200,
        result: Some(DataType::Ref(TypeId(0))),
        view: None,
        bindings: Vec::new(),
    }];
    let svc = service(vec![m]);
    let artifacts = generate_service(&graph, &svc, &CodegenOptions::default()).unwrap();

    let default_fn = find(&artifacts, "new_list_ok");
    assert!(default_fn.code.contains("a: body.a,"));
    assert!(default_fn.code.contains("b: body.b,"));

    let tiny_fn = find(&artifacts, "new_list_tiny_ok");
    assert!(tiny_fn.code.contains("a: body.a,"));
    assert!(!tiny_fn.code.contains("b: body.b,"));
    assert!(tiny_fn.code.contains("..Default::default()"));
}

#[test]
fn header_bound_result_attribute_becomes_a_parameter() {
    let graph = TypeGraph {
        user_types: vec![user_type(
            "stats",
            vec![attr("name", string(), true), attr("etag", string(), false)],
        )],
    };
    let mut m = method("show");
    m.responses = vec![ResponseDescriptor {
        status: 200,
        result: Some(DataType::Ref(TypeId(0))),
        view: None,
        bindings: vec![Binding {
            attribute: "etag".to_string(),
            location: BindingLocation::Header,
        }],
    }];
    let svc = service(vec![m]);
    let artifacts = generate_service(&graph, &svc, &CodegenOptions::default()).unwrap();

    let f = find(&artifacts, "new_show_ok");
    assert!(f
        .code
        .contains("new_show_ok(body: ShowResponseBody, etag: Option<String>) -> crate::types::Stats"));
    assert!(f.code.contains("let mut v = crate::types::Stats {"));
    assert!(f.code.contains("v.etag = etag;"));
    // The header field never appears inside the struct literal itself.
    assert!(!f.code.contains("etag: body.etag"));
}

#[test]
fn decode_side_body_fields_are_all_optional() {
    let graph = TypeGraph {
        user_types: vec![user_type("stats", vec![attr("name", string(), true)])],
    };
    let mut m = method("show");
    m.responses = vec![ResponseDescriptor {
        status: 200,
        result: Some(DataType::Ref(TypeId(0))),
        view: None,
        bindings: Vec::new(),
    }];
    let svc = service(vec![m]);
    let artifacts = generate_service(&graph, &svc, &CodegenOptions::default()).unwrap();

    let decl = find(&artifacts, "ShowResponseBody");
    assert!(decl.code.contains("pub name: Option<String>,"));

    let f = find(&artifacts, "new_show_ok");
    assert!(f.code.contains("name: body.name.unwrap_or_default(),"));
}

#[test]
fn validation_reports_missing_required_fields() {
    let mut constrained = attr("name", string(), true);
    constrained.constraints.pattern = Some("^[a-z]+$".to_string());
    let graph = TypeGraph {
        user_types: vec![user_type("stats", vec![constrained])],
    };
    let mut m = method("show");
    m.responses = vec![ResponseDescriptor {
        status: 200,
        result: Some(DataType::Ref(TypeId(0))),
        view: None,
        bindings: Vec::new(),
    }];
    let svc = service(vec![m]);
    let artifacts = generate_service(&graph, &svc, &CodegenOptions::default()).unwrap();

    let f = find(&artifacts, "validate_show_response_body");
    assert!(f.code.contains("violations.missing_field(\"name\", \"body\");"));
    assert!(f
        .code
        .contains("violations.pattern(\"body.name\", value, \"^[a-z]+$\");"));
    assert!(f.code.contains("violations.finish()"));
}

#[test]
fn bodies_without_checks_get_no_validation_function() {
    let graph = TypeGraph {
        user_types: vec![user_type("stats", vec![attr("name", string(), false)])],
    };
    let mut m = method("show");
    m.responses = vec![ResponseDescriptor {
        status: 200,
        result: Some(DataType::Ref(TypeId(0))),
        view: None,
        bindings: Vec::new(),
    }];
    let svc = service(vec![m]);
    let artifacts = generate_service(&graph, &svc, &CodegenOptions::default()).unwrap();
    assert!(!artifacts
        .iter()
        .any(|a| a.name == "validate_show_response_body"));
}

#[test]
fn recursive_types_terminate_with_one_helper() {
    let graph = TypeGraph {
        user_types: vec![user_type(
            "node",
            vec![
                attr("value", string(), true),
                attr("next", DataType::Ref(TypeId(0)), false),
            ],
        )],
    };
    let mut m = method("tree");
    m.responses = vec![ResponseDescriptor {
        status: 200,
        result: Some(DataType::Ref(TypeId(0))),
        view: None,
        bindings: Vec::new(),
    }];
    let svc = service(vec![m]);
    let artifacts = generate_service(&graph, &svc, &CodegenOptions::default()).unwrap();

    let helpers: Vec<_> = artifacts
        .iter()
        .filter(|a| a.name == "unmarshal_node_response_body_to_node")
        .collect();
    assert_eq!(helpers.len(), 1);
    assert!(helpers[0]
        .code
        .contains("next: v.next.map(|value| unmarshal_node_response_body_to_node(*value)),"));

    let validators: Vec<_> = artifacts
        .iter()
        .filter(|a| a.name == "validate_node_response_body")
        .collect();
    assert_eq!(validators.len(), 1);
}

#[test]
fn error_bodies_generate_their_own_constructor() {
    let graph = TypeGraph {
        user_types: vec![user_type(
            "not_found_err",
            vec![attr("message", string(), true)],
        )],
    };
    let mut m = method("show");
    m.errors = vec![ErrorDescriptor {
        name: "not_found".to_string(),
        ty: DataType::Ref(TypeId(0)),
    }];
    let svc = service(vec![m]);
    let artifacts = generate_service(&graph, &svc, &CodegenOptions::default()).unwrap();

    let f = find(&artifacts, "new_show_not_found");
    assert!(f.code.contains(
        "new_show_not_found(body: ShowNotFoundResponseBody) -> crate::types::NotFoundErr"
    ));
    assert!(f.code.contains("message: body.message.unwrap_or_default(),"));
}

#[test]
fn default_view_and_unviewed_paths_share_one_helper() {
    let graph = TypeGraph {
        user_types: vec![
            UserType {
                name: "inner".to_string(),
                attributes: vec![attr("a", string(), false), attr("b", int32(), false)],
                views: vec![View {
                    name: "default".to_string(),
                    members: vec![ViewMember {
                        attribute: "a".to_string(),
                        sub_view: None,
                    }],
                }],
            },
            UserType {
                name: "outer".to_string(),
                attributes: vec![
                    attr("x", DataType::Ref(TypeId(0)), false),
                    attr("y", DataType::Ref(TypeId(0)), false),
                ],
                views: vec![View {
                    name: "full".to_string(),
                    members: vec![
                        ViewMember {
                            attribute: "x".to_string(),
                            sub_view: Some("default".to_string()),
                        },
                        ViewMember {
                            attribute: "y".to_string(),
                            sub_view: None,
                        },
                    ],
                }],
            },
        ],
    };
    let mut m = method("show");
    m.responses = vec![ResponseDescriptor {
        status: 200,
        result: Some(DataType::Ref(TypeId(1))),
        view: Some("full".to_string()),
        bindings: Vec::new(),
    }];
    let svc = service(vec![m]);
    let artifacts = generate_service(&graph, &svc, &CodegenOptions::default()).unwrap();

    // One attribute names the "default" sub-view explicitly, the other has
    // no sub-view; both must resolve to the same default-projected helper.
    let helpers: Vec<_> = artifacts
        .iter()
        .filter(|a| a.name == "unmarshal_inner_response_body_to_inner")
        .collect();
    assert_eq!(helpers.len(), 1);
    assert!(helpers[0].code.contains("a: v.a,"));
    assert!(!helpers[0].code.contains("b: v.b,"));
    assert!(helpers[0].code.contains("..Default::default()"));
}

#[test]
fn enum_constrained_arrays_check_each_element() {
    let mut tags = attr("tags", DataType::Array(Box::new(string())), false);
    tags.constraints.enum_values = Some(vec![
        serde_json::json!("cat"),
        serde_json::json!("dog"),
    ]);
    let graph = TypeGraph {
        user_types: vec![user_type("pet", vec![tags])],
    };
    let mut m = method("show");
    m.responses = vec![ResponseDescriptor {
        status: 200,
        result: Some(DataType::Ref(TypeId(0))),
        view: None,
        bindings: Vec::new(),
    }];
    let svc = service(vec![m]);
    let artifacts = generate_service(&graph, &svc, &CodegenOptions::default()).unwrap();

    let f = find(&artifacts, "validate_show_response_body");
    assert!(f.code.contains("for item in value {"));
    assert!(f.code.contains(
        "violations.enum_of(\"body.tags\", &json!(item), &[json!(\"cat\"), json!(\"dog\")]);"
    ));
    // The whole array is never compared against the scalar enum members.
    assert!(!f.code.contains("&json!(value)"));
    assert!(f.uses_json);

    let module = render_module("pets", &artifacts);
    assert!(module.contains("use serde_json::json;"));
}

#[test]
fn body_less_responses_keep_distinct_constructors() {
    let graph = TypeGraph {
        user_types: vec![user_type("pet", vec![attr("etag", string(), false)])],
    };
    let mut m = method("show");
    let bindings = vec![Binding {
        attribute: "etag".to_string(),
        location: BindingLocation::Header,
    }];
    m.responses = vec![
        ResponseDescriptor {
            status: 200,
            result: Some(DataType::Ref(TypeId(0))),
            view: None,
            bindings: bindings.clone(),
        },
        ResponseDescriptor {
            status: 204,
            result: Some(DataType::Ref(TypeId(0))),
            view: None,
            bindings,
        },
    ];
    let svc = service(vec![m]);
    let artifacts = generate_service(&graph, &svc, &CodegenOptions::default()).unwrap();

    for name in ["new_show_ok", "new_show_no_content"] {
        let f = find(&artifacts, name);
        assert!(f.code.contains("let mut v = crate::types::Pet::default();"));
        assert!(f.code.contains("v.etag = etag;"));
    }
}

#[test]
fn generation_is_deterministic() {
    let graph = TypeGraph {
        user_types: vec![user_type("inner_type", vec![attr("a", string(), true)])],
    };
    let mut m = method("create");
    m.payload = Some(DataType::Object(vec![attr(
        "inner",
        DataType::Ref(TypeId(0)),
        true,
    )]));
    let svc = service(vec![m]);
    let opts = CodegenOptions::default();
    let first = generate_service(&graph, &svc, &opts).unwrap();
    let second = generate_service(&graph, &svc, &opts).unwrap();
    assert_eq!(first, second);
}

#[test]
fn coerce_primitive_is_inert_for_identical_kinds() {
    assert_eq!(
        coerce_primitive(PrimitiveKind::Int32, PrimitiveKind::Int32, "v"),
        "v"
    );
    assert_eq!(
        coerce_primitive(PrimitiveKind::Int32, PrimitiveKind::Int64, "v"),
        "v as i64"
    );
    assert_eq!(
        coerce_primitive(PrimitiveKind::Str, PrimitiveKind::Int64, "v"),
        "v"
    );
}

#[test]
fn render_module_emits_header_and_imports() {
    let graph = TypeGraph::default();
    let mut m = method("create");
    m.payload = Some(DataType::Object(vec![attr("name", string(), true)]));
    let svc = service(vec![m]);
    let artifacts = generate_service(&graph, &svc, &CodegenOptions::default()).unwrap();
    let module = render_module("pets", &artifacts);
    assert!(module.starts_with("// Code generated by bodygen, DO NOT EDIT."));
    assert!(module.contains("use serde::{Deserialize, Serialize};"));
    let decl_pos = module.find("pub struct CreateRequestBody").unwrap();
    let fn_pos = module.find("pub fn new_create_request_body").unwrap();
    assert!(decl_pos < fn_pos);
}

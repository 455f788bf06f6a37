use bodygen::cli::{Cli, Commands};
use bodygen::design::load_design;
use bodygen::generator::{generate_design, write_service_file, CodegenOptions};
use clap::Parser;
use std::path::PathBuf;

#[test]
fn parses_the_generate_subcommand() {
    let cli = Cli::try_parse_from([
        "bodygen",
        "generate",
        "--design",
        "design.json",
        "--out",
        "gen",
        "--force",
        "--domain-path",
        "svc::model",
    ])
    .unwrap();
    let Commands::Generate {
        design,
        out,
        force,
        domain_path,
        runtime_path,
    } = cli.command;
    assert_eq!(design, PathBuf::from("design.json"));
    assert_eq!(out, PathBuf::from("gen"));
    assert!(force);
    assert_eq!(domain_path, "svc::model");
    assert_eq!(runtime_path, "crate::runtime");
}

#[test]
fn design_file_flows_through_to_a_generated_module() {
    let dir = tempfile::tempdir().unwrap();
    let design_path = dir.path().join("design.yaml");
    std::fs::write(
        &design_path,
        concat!(
            "types:\n",
            "  user_types:\n",
            "    - name: pet\n",
            "      attributes:\n",
            "        - name: name\n",
            "          type:\n",
            "            Primitive: Str\n",
            "          required: true\n",
            "services:\n",
            "  - name: pets\n",
            "    methods:\n",
            "      - name: create\n",
            "        payload:\n",
            "          Ref: 0\n",
            "        responses:\n",
            "          - status: 200\n",
            "            result:\n",
            "              Ref: 0\n",
        ),
    )
    .unwrap();

    let design = load_design(&design_path).unwrap();
    let opts = CodegenOptions::default();
    let generated = generate_design(&design, &opts).unwrap();
    assert_eq!(generated.len(), 1);

    let out_dir = dir.path().join("generated");
    for (service, artifacts) in &generated {
        write_service_file(&out_dir, service, artifacts, false).unwrap();
    }
    let module = std::fs::read_to_string(out_dir.join("pets_bodies.rs")).unwrap();
    assert!(module.starts_with("// Code generated by bodygen, DO NOT EDIT."));
    assert!(module.contains("pub struct CreateRequestBody"));
    assert!(module.contains("pub fn new_create_request_body"));
    assert!(module.contains("pub fn new_create_ok"));
    assert!(module.contains("pub fn validate_create_response_body"));
}

mod common;

use common::TestWorkspace;
use csv_remap::data::{DataType, Value};
use csv_remap::export::{ExportConfig, ExportFormat};
use csv_remap::mapping::MappingSpec;
use csv_remap::store::{ConfigStore, JsonFileStore, ProjectConfig};

const SPEC_YAML: &str = r#"
mappings:
  - source: { key: a, header: A }
    target: { key: n, header: N }
transformationRules:
  n:
    sourceType: string
    targetType: integer
"#;

const SPEC_JSON: &str = r#"{
  "mappings": [
    {
      "source": { "key": "a", "header": "A" },
      "target": { "key": "n", "header": "N" }
    }
  ],
  "transformationRules": {
    "n": { "sourceType": "string", "targetType": "integer" }
  }
}"#;

#[test]
fn yaml_and_json_specs_parse_to_the_same_document() {
    let workspace = TestWorkspace::new();
    let yaml = MappingSpec::load(&workspace.write("spec.yaml", SPEC_YAML)).unwrap();
    let json = MappingSpec::load(&workspace.write("spec.json", SPEC_JSON)).unwrap();
    assert_eq!(yaml, json);

    assert_eq!(yaml.mappings.len(), 1);
    let rule = yaml.transformation_rules.get("n").expect("rule for n");
    assert_eq!(rule.source_type, DataType::String);
    assert_eq!(rule.target_type, DataType::Integer);
}

#[test]
fn spec_save_then_load_round_trips_in_both_formats() {
    let workspace = TestWorkspace::new();
    let spec = MappingSpec::load(&workspace.write("spec.yaml", SPEC_YAML)).unwrap();

    for name in ["copy.yaml", "copy.json"] {
        let path = workspace.join(name);
        spec.save(&path).unwrap();
        assert_eq!(MappingSpec::load(&path).unwrap(), spec, "format {name}");
    }
}

#[test]
fn out_of_range_confidence_is_rejected_at_load() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "bad.yaml",
        r#"
mappings:
  - source: { key: a, header: A, type: string, confidence: 1.5 }
    target: { key: b, header: B }
"#,
    );
    let err = MappingSpec::load(&path).unwrap_err();
    assert!(err.to_string().contains("Invalid source column 'a'"));
}

#[test]
fn rule_options_survive_the_yaml_round_trip() {
    let workspace = TestWorkspace::new();
    let path = workspace.write(
        "spec.yaml",
        r#"
mappings:
  - source: { key: p, header: P }
    target: { key: phone, header: Phone }
transformationRules:
  phone:
    sourceType: string
    targetType: phone
    options:
      countryCode: "44"
"#,
    );
    let spec = MappingSpec::load(&path).unwrap();
    let rule = spec.transformation_rules.get("phone").expect("phone rule");
    assert_eq!(
        rule.options.get("countryCode"),
        Some(&Value::String("44".to_string()))
    );
}

#[test]
fn project_config_wire_shape_is_camel_case_with_flattened_spec() {
    let spec: MappingSpec = serde_yaml::from_str(SPEC_YAML).unwrap();
    let config = ProjectConfig::new("orders", None, spec, ExportConfig::default());
    let json = serde_json::to_string_pretty(&config).unwrap();

    for key in [
        "\"createdAt\"",
        "\"updatedAt\"",
        "\"exportConfig\"",
        "\"transformationRules\"",
        "\"mappings\"",
        "\"includeHeaders\"",
    ] {
        assert!(json.contains(key), "missing {key} in {json}");
    }
    assert!(!json.contains("\"spec\""));
    // Unset optionals stay off the wire entirely.
    assert!(!json.contains("\"description\""));
    assert!(!json.contains("\"sheetName\""));

    let parsed: ProjectConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn config_description_round_trips_when_present() {
    let spec: MappingSpec = serde_yaml::from_str(SPEC_YAML).unwrap();
    let config = ProjectConfig::new(
        "orders",
        Some("Monthly orders feed".to_string()),
        spec,
        ExportConfig::default(),
    );
    let json = serde_json::to_string(&config).unwrap();
    assert!(json.contains("\"description\":\"Monthly orders feed\""));

    let parsed: ProjectConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.description.as_deref(), Some("Monthly orders feed"));
}

#[test]
fn store_survives_reopening_from_disk() {
    let workspace = TestWorkspace::new();
    let path = workspace.join("configs.json");

    let spec: MappingSpec = serde_yaml::from_str(SPEC_YAML).unwrap();
    let config = ProjectConfig::new(
        "orders",
        None,
        spec,
        ExportConfig {
            format: ExportFormat::Csv,
            include_headers: false,
            sheet_name: None,
        },
    );
    let id = config.id.clone();

    {
        let mut store = JsonFileStore::new(&path);
        store.save(config).unwrap();
    }

    let reopened = JsonFileStore::new(&path);
    let loaded = reopened.load(&id).unwrap().expect("persisted config");
    assert_eq!(loaded.name, "orders");
    assert!(!loaded.export_config.include_headers);
    assert!(!path.with_extension("tmp").exists());
}

#[test]
fn stores_work_behind_the_trait_object() {
    let workspace = TestWorkspace::new();
    let mut store: Box<dyn ConfigStore> =
        Box::new(JsonFileStore::new(workspace.join("configs.json")));

    let config = ProjectConfig::new("a", None, MappingSpec::default(), ExportConfig::default());
    let id = config.id.clone();
    store.save(config).unwrap();
    store
        .save(ProjectConfig::new(
            "b",
            None,
            MappingSpec::default(),
            ExportConfig::default(),
        ))
        .unwrap();

    assert_eq!(store.list().unwrap().len(), 2);
    assert!(store.delete(&id).unwrap());
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn each_new_config_gets_a_distinct_id() {
    let a = ProjectConfig::new("same", None, MappingSpec::default(), ExportConfig::default());
    let b = ProjectConfig::new("same", None, MappingSpec::default(), ExportConfig::default());
    assert_ne!(a.id, b.id);
    assert_eq!(a.id.len(), 36);
}

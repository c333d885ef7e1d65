use crate::{
    config::{ConfigError, DEFAULT_MAX_RANGES, StagePriorities, StoreConfig},
    model::ElementKind,
    schema::{AggregateFunction, GroupRegistry, ValueType},
    stage::StageKind,
};

const CONFIG: &str = r#"
[scan]
max_ranges = 8

[schema.groups.Person]
kind = "entity"

[schema.groups.Person.properties.count]
type = "uint"
aggregate = "sum"

[schema.groups.Person.properties.name]
type = "text"

[schema.groups.Knows]
kind = "edge"
"#;

#[test]
fn parses_schema_and_scan_settings() {
    let config = StoreConfig::from_toml_str(CONFIG).expect("config should parse");

    let person = config
        .schema
        .group("Person")
        .expect("Person should be declared");
    assert_eq!(person.kind, ElementKind::Entity);
    assert_eq!(
        person.property_definition("count").map(|def| def.aggregate),
        Some(Some(AggregateFunction::Sum))
    );
    assert_eq!(
        person.property_definition("name").map(|def| def.value_type),
        Some(ValueType::Text)
    );
    assert_eq!(config.scan.max_ranges, 8);
    assert_eq!(config.stages, StagePriorities::default());
}

#[test]
fn defaults_apply_when_sections_are_missing() {
    let config = StoreConfig::from_toml_str("[schema.groups.Knows]\nkind = \"edge\"\n")
        .expect("config should parse");

    assert_eq!(config.scan.max_ranges, DEFAULT_MAX_RANGES);
    assert_eq!(config.stages.priority(StageKind::RowKeyAggregator), 50);
}

#[test]
fn rejects_non_increasing_priorities() {
    let source = format!("{CONFIG}\n[stages]\ndirection_filter = 5\n");

    assert_eq!(
        StoreConfig::from_toml_str(&source),
        Err(ConfigError::PriorityOrder {
            earlier: "post_aggregation_filter",
            later: "direction_filter",
        })
    );
}

#[test]
fn rejects_empty_schema_and_unknown_fields() {
    assert_eq!(
        StoreConfig::from_toml_str("[scan]\nmax_ranges = 2\n"),
        Err(ConfigError::EmptySchema)
    );
    assert!(matches!(
        StoreConfig::from_toml_str("[scan]\nmax_rangez = 2\n"),
        Err(ConfigError::Parse(_))
    ));
}

use crate::{
    error::{ErrorClass, QueryError},
    filter::{ElementFilter, FilterError, FilterSelection, Predicate},
    model::Element,
    schema::AggregateFunction,
    stage::{
        AggregatorStage, DirectionConstraint, FilterStage, IncludeEdgeType,
        IncludeIncomingOutgoing, PropertyRange, ScanConstraints, ScanRow, Stage, StageDescriptor,
        StageError, StageFactory, StageKind, StagePipeline,
    },
    store::{CborElementCodec, ElementCodec, StoreError},
    test_support::{config, edge_view, entity_view, knows, person},
    value::Value,
    view::ViewElementDefinition,
};
use std::collections::BTreeMap;

fn count_at_least(min: u64) -> ElementFilter {
    ElementFilter::builder()
        .select(FilterSelection::property("count"))
        .execute(Predicate::gte(min))
        .build()
}

fn weight_at_least(min: u64) -> ElementFilter {
    ElementFilter::builder()
        .select(FilterSelection::property("weight"))
        .execute(Predicate::gte(min))
        .build()
}

fn expect_stage_error(
    result: Result<impl std::fmt::Debug, QueryError>,
) -> (&'static str, StageError) {
    match result.expect_err("stage construction should fail") {
        QueryError::StageConstruction { stage, source } => (stage, source),
        other => panic!("expected stage construction error, got {other:?}"),
    }
}

// Encode elements the way a store would and return rows in key order.
fn rows(elements: Vec<Element>) -> Vec<ScanRow> {
    let codec = CborElementCodec;
    let mut rows: Vec<ScanRow> = elements
        .into_iter()
        .zip(0u64..)
        .flat_map(|(element, sequence)| {
            codec
                .encode(&element, sequence)
                .expect("fixture element should encode")
                .into_iter()
                .map(move |entry| ScanRow {
                    key: entry.key,
                    element: element.clone(),
                })
        })
        .collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    rows
}

fn run(stages: &[StageDescriptor], input: Vec<ScanRow>) -> Vec<Element> {
    let pipeline = StagePipeline::install(stages).expect("stack should install");
    pipeline
        .apply(input.into_iter().map(Ok))
        .map(|row| row.expect("row should pass through").element)
        .collect()
}

//
// StageFactory
//

#[test]
fn factory_emits_every_stage_in_fixed_order() {
    let config = config();
    let view = edge_view(
        "Knows",
        ViewElementDefinition::new()
            .pre_aggregation_filter(weight_at_least(1))
            .post_aggregation_filter(weight_at_least(2)),
    );
    let constraints = ScanConstraints {
        direction: Some(DirectionConstraint::new(
            IncludeEdgeType::Directed,
            IncludeIncomingOutgoing::Outgoing,
        )),
        property_range: Some(PropertyRange::inclusive("weight", 1u64, 10u64)),
    };

    let stack = StageFactory::new(&config)
        .build_stages(&view, "Knows", &constraints)
        .expect("stack should build");

    assert_eq!(
        stack.names(),
        vec![
            "pre_aggregation_filter",
            "post_aggregation_filter",
            "direction_filter",
            "property_range_filter",
            "row_key_aggregator",
        ]
    );
    let priorities: Vec<u16> = stack.iter().map(StageDescriptor::priority).collect();
    assert_eq!(priorities, vec![10, 20, 30, 40, 50]);
    assert_eq!(stack.group(), Some("Knows"));
}

#[test]
fn factory_always_emits_the_aggregator() {
    let config = config();
    let view = entity_view("Person", ViewElementDefinition::new());

    let stack = StageFactory::new(&config)
        .build_stages(&view, "Person", &ScanConstraints::default())
        .expect("stack should build");

    assert_eq!(stack.names(), vec!["row_key_aggregator"]);
    let Stage::RowKeyAggregator(AggregatorStage { group, functions }) = stack[0].stage() else {
        panic!("expected aggregator stage");
    };
    assert_eq!(group, "Person");
    assert_eq!(functions.len(), 2);
}

#[test]
fn factory_skips_empty_filters_and_inapplicable_direction() {
    let config = config();
    let view = entity_view(
        "Person",
        ViewElementDefinition::new().pre_aggregation_filter(ElementFilter::default()),
    );
    let constraints = ScanConstraints {
        direction: Some(DirectionConstraint::new(
            IncludeEdgeType::Directed,
            IncludeIncomingOutgoing::Incoming,
        )),
        property_range: None,
    };

    let stack = StageFactory::new(&config)
        .build_stages(&view, "Person", &constraints)
        .expect("stack should build");

    assert!(!stack.contains(StageKind::PreAggregationFilter));
    assert!(!stack.contains(StageKind::DirectionFilter));
}

#[test]
fn factory_skips_permissive_direction_on_edges() {
    let config = config();
    let view = edge_view("Knows", ViewElementDefinition::new());
    let constraints = ScanConstraints {
        direction: Some(DirectionConstraint::default()),
        property_range: None,
    };

    let stack = StageFactory::new(&config)
        .build_stages(&view, "Knows", &constraints)
        .expect("stack should build");

    assert_eq!(stack.names(), vec!["row_key_aggregator"]);
}

#[test]
fn factory_rejects_unknown_group() {
    let config = config();
    let view = entity_view("Planet", ViewElementDefinition::new());

    let (stage, source) = expect_stage_error(StageFactory::new(&config).build_stages(
        &view,
        "Planet",
        &ScanConstraints::default(),
    ));

    assert_eq!(stage, "row_key_aggregator");
    assert_eq!(
        source,
        StageError::UnknownGroup {
            group: "Planet".to_string()
        }
    );
}

#[test]
fn factory_rejects_group_selected_under_wrong_kind() {
    let config = config();
    let view = entity_view("Knows", ViewElementDefinition::new());

    let (_, source) = expect_stage_error(StageFactory::new(&config).build_stages(
        &view,
        "Knows",
        &ScanConstraints::default(),
    ));

    assert!(matches!(source, StageError::GroupKindMismatch { .. }));
}

#[test]
fn factory_rejects_filter_on_undeclared_property() {
    let config = config();
    let filter = ElementFilter::builder()
        .select(FilterSelection::property("height"))
        .execute(Predicate::Exists)
        .build();
    let view = entity_view(
        "Person",
        ViewElementDefinition::new().pre_aggregation_filter(filter),
    );

    let err = StageFactory::new(&config)
        .build_stages(&view, "Person", &ScanConstraints::default())
        .expect_err("unknown property should fail");

    assert_eq!(err.class(), ErrorClass::StageConstruction);
    assert_eq!(err.stage(), Some("pre_aggregation_filter"));
    assert!(matches!(
        err,
        QueryError::StageConstruction {
            source: StageError::Filter(FilterError::UnknownProperty { .. }),
            ..
        }
    ));
}

#[test]
fn factory_rejects_bad_property_ranges() {
    let config = config();
    let view = entity_view("Person", ViewElementDefinition::new());
    let build = |range: PropertyRange| {
        StageFactory::new(&config).build_stages(
            &view,
            "Person",
            &ScanConstraints {
                direction: None,
                property_range: Some(range),
            },
        )
    };

    let (stage, unknown) = expect_stage_error(build(PropertyRange::at_least("height", 1u64)));
    assert_eq!(stage, "property_range_filter");
    assert!(matches!(unknown, StageError::UnknownRangeProperty { .. }));

    let (_, typed) = expect_stage_error(build(PropertyRange::at_least("count", "many")));
    assert_eq!(
        typed,
        StageError::RangeBoundType {
            property: "count".to_string(),
            expected: "uint",
            found: "text",
        }
    );

    let (_, empty) = expect_stage_error(build(PropertyRange::inclusive("count", 5u64, 1u64)));
    assert!(matches!(empty, StageError::EmptyRange { .. }));
}

//
// StageDescriptor
//

#[test]
fn descriptor_options_flatten_payload_fields() {
    let descriptor = StageDescriptor::new(
        50,
        Stage::RowKeyAggregator(AggregatorStage {
            group: "Person".to_string(),
            functions: BTreeMap::from([("count".to_string(), AggregateFunction::Sum)]),
        }),
    );

    let options = descriptor.options().expect("options should encode");

    assert_eq!(options["name"], "row_key_aggregator");
    assert_eq!(options["priority"], "50");
    assert_eq!(options["group"], "Person");
    assert_eq!(options["functions"], r#"{"count":"sum"}"#);
}

//
// StagePipeline
//

#[test]
fn pipeline_rejects_non_increasing_priorities() {
    let aggregator = Stage::RowKeyAggregator(AggregatorStage {
        group: "Person".to_string(),
        functions: BTreeMap::new(),
    });
    let range = Stage::PropertyRangeFilter(PropertyRange::at_least("count", 1u64));

    let err = StagePipeline::install(&[
        StageDescriptor::new(40, range),
        StageDescriptor::new(40, aggregator),
    ])
    .expect_err("equal priorities should be rejected");

    assert_eq!(
        err,
        StoreError::PriorityConflict {
            stage: "row_key_aggregator",
            priority: 40,
            after: 40,
        }
    );
}

#[test]
fn pipeline_requires_an_aggregator() {
    let range = Stage::PropertyRangeFilter(PropertyRange::at_least("count", 1u64));

    assert_eq!(
        StagePipeline::install(&[StageDescriptor::new(40, range)]).map(|_| ()),
        Err(StoreError::MissingAggregator)
    );
}

#[test]
fn pipeline_aggregates_rows_sharing_a_key_within_one_family() {
    let config = config();
    let view = entity_view("Person", ViewElementDefinition::new());
    let stack = StageFactory::new(&config)
        .build_stages(&view, "Person", &ScanConstraints::default())
        .expect("stack should build");

    let output = run(
        stack.as_slice(),
        rows(vec![
            person("a", 1).with_property("name", "first"),
            person("a", 2).with_property("name", "second"),
            person("b", 5),
            knows("a", "b", true, 9),
        ]),
    );

    assert_eq!(output.len(), 2);
    assert_eq!(output[0].property("count"), Some(&Value::Uint(3)));
    assert_eq!(output[0].property("name"), Some(&Value::from("first")));
    assert_eq!(output[1].property("count"), Some(&Value::Uint(5)));
    assert!(output.iter().all(|element| element.group() == "Person"));
}

#[test]
fn pipeline_filters_before_aggregating() {
    let config = config();
    let view = entity_view(
        "Person",
        ViewElementDefinition::new().pre_aggregation_filter(count_at_least(2)),
    );
    let stack = StageFactory::new(&config)
        .build_stages(&view, "Person", &ScanConstraints::default())
        .expect("stack should build");

    let output = run(
        stack.as_slice(),
        rows(vec![person("a", 1), person("a", 2), person("a", 4)]),
    );

    assert_eq!(output.len(), 1);
    assert_eq!(output[0].property("count"), Some(&Value::Uint(6)));
}

#[test]
fn pipeline_direction_filter_keeps_requested_orientation() {
    let config = config();
    let view = edge_view("Knows", ViewElementDefinition::new());
    let constraints = ScanConstraints {
        direction: Some(DirectionConstraint::new(
            IncludeEdgeType::All,
            IncludeIncomingOutgoing::Outgoing,
        )),
        property_range: None,
    };
    let stack = StageFactory::new(&config)
        .build_stages(&view, "Knows", &constraints)
        .expect("stack should build");

    let output = run(
        stack.as_slice(),
        rows(vec![knows("a", "b", true, 1), knows("c", "d", false, 1)]),
    );

    // directed edge: source-led row only; undirected edge: both rows
    assert_eq!(output.len(), 3);
    let directed: Vec<_> = output
        .iter()
        .filter(|element| matches!(element, Element::Edge { directed: true, .. }))
        .collect();
    assert_eq!(directed.len(), 1);
}

#[test]
fn pipeline_property_range_drops_missing_and_out_of_range() {
    let config = config();
    let view = entity_view("Person", ViewElementDefinition::new());
    let constraints = ScanConstraints {
        direction: None,
        property_range: Some(PropertyRange::inclusive("count", 2u64, 3u64)),
    };
    let stack = StageFactory::new(&config)
        .build_stages(&view, "Person", &constraints)
        .expect("stack should build");

    let output = run(
        stack.as_slice(),
        rows(vec![
            person("a", 1),
            person("b", 2),
            Element::entity("Person", "c"),
            person("d", 9),
        ]),
    );

    assert_eq!(output, vec![person("b", 2)]);
}

#[test]
fn post_aggregation_filter_reads_folded_values() {
    let config = config();
    let view = entity_view(
        "Person",
        ViewElementDefinition::new().post_aggregation_filter(count_at_least(5)),
    );
    let stack = StageFactory::new(&config)
        .build_stages(&view, "Person", &ScanConstraints::default())
        .expect("stack should build");

    let output = run(
        stack.as_slice(),
        rows(vec![person("a", 3), person("a", 4), person("b", 2)]),
    );

    assert_eq!(output, vec![person("a", 7)]);
}

#[test]
fn pre_and_post_filters_differ_on_the_same_predicate() {
    let config = config();
    let input = || rows(vec![person("a", 3), person("a", 4)]);
    let build = |def: ViewElementDefinition| {
        StageFactory::new(&config)
            .build_stages(&entity_view("Person", def), "Person", &ScanConstraints::default())
            .expect("stack should build")
    };

    let pre = build(ViewElementDefinition::new().pre_aggregation_filter(count_at_least(5)));
    let post = build(ViewElementDefinition::new().post_aggregation_filter(count_at_least(5)));

    assert!(run(pre.as_slice(), input()).is_empty());
    assert_eq!(run(post.as_slice(), input()), vec![person("a", 7)]);
}

#[test]
fn rows_fold_once_when_a_post_filter_is_installed() {
    let post = Stage::PostAggregationFilter(FilterStage {
        group: "Person".to_string(),
        filter: count_at_least(2),
    });
    let aggregator = Stage::RowKeyAggregator(AggregatorStage {
        group: "Person".to_string(),
        functions: BTreeMap::from([("count".to_string(), AggregateFunction::Count)]),
    });
    let stages = [
        StageDescriptor::new(20, post),
        StageDescriptor::new(50, aggregator),
    ];

    let output = run(
        &stages,
        rows(vec![person("a", 9), person("a", 9), person("b", 9)]),
    );

    assert_eq!(output, vec![person("a", 2)]);
}

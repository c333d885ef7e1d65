use crate::{
    error::{ErrorClass, QueryError},
    filter::{ElementFilter, FilterSelection, Predicate},
    view::{View, ViewElementDefinition, validate},
};

#[test]
fn validate_returns_single_entity_group() {
    let view = View::builder()
        .entity("Person", ViewElementDefinition::new())
        .build();

    assert_eq!(validate(&view).expect("single group is valid"), "Person");
}

#[test]
fn validate_returns_single_edge_group() {
    let view = View::builder()
        .edge("Knows", ViewElementDefinition::new())
        .build();

    assert_eq!(validate(&view).expect("single group is valid"), "Knows");
}

#[test]
fn validate_rejects_mixed_edge_and_entity_groups() {
    let view = View::builder()
        .edge("Knows", ViewElementDefinition::new())
        .entity("Person", ViewElementDefinition::new())
        .build();

    let err = validate(&view).expect_err("two groups must be rejected");
    assert_eq!(err.class(), ErrorClass::InvalidRequest);
    assert!(matches!(err, QueryError::InvalidRequest(message) if message.contains("exactly one group")));
}

#[test]
fn validate_rejects_empty_and_multi_group_views() {
    let empty = View::default();
    let two_entities = View::builder()
        .entity("Person", ViewElementDefinition::new())
        .entity("Place", ViewElementDefinition::new())
        .build();

    assert!(matches!(validate(&empty), Err(QueryError::InvalidRequest(_))));
    assert!(matches!(
        validate(&two_entities),
        Err(QueryError::InvalidRequest(_))
    ));
}

#[test]
fn empty_filters_do_not_count_as_configured() {
    let view = View::builder()
        .entity(
            "Person",
            ViewElementDefinition::new()
                .pre_aggregation_filter(ElementFilter::default())
                .post_aggregation_filter(
                    ElementFilter::builder()
                        .select(FilterSelection::property("age"))
                        .execute(Predicate::Exists)
                        .build(),
                ),
        )
        .build();

    assert!(!view.has_pre_aggregation_filters("Person"));
    assert!(view.has_post_aggregation_filters("Person"));
    assert!(!view.has_post_aggregation_filters("Place"));
}

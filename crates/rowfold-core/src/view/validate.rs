use crate::{error::QueryError, view::View};

/// Enforce the single-group constraint and return the selected group.
///
/// Runs before any stage is built or scan opened.
pub fn validate(view: &View) -> Result<String, QueryError> {
    let edge_groups = view.edge_groups().len();
    let entity_groups = view.entity_groups().len();
    let selected = edge_groups + entity_groups;

    if selected != 1 {
        return Err(QueryError::invalid_request(format!(
            "exactly one group must be selected in the view, found {selected} \
             ({edge_groups} edge, {entity_groups} entity)"
        )));
    }

    view.edge_groups()
        .chain(view.entity_groups())
        .next()
        .map(str::to_string)
        .ok_or_else(|| QueryError::invalid_request("view selection is empty"))
}

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::check::HealthCheckResult;
use crate::status::{ComponentType, StatusLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub component: ComponentType,
    pub previous_status: StatusLevel,
    pub new_status: StatusLevel,
}

/// Diff fresh results against the last known status per component.
///
/// Components absent from `previous` count as operational, so the very first
/// pass only reports components that are not healthy.
pub fn detect_changes(
    previous: &HashMap<ComponentType, StatusLevel>,
    results: &[HealthCheckResult],
) -> Vec<StatusChange> {
    results
        .iter()
        .filter_map(|result| {
            let previous_status = previous
                .get(&result.component)
                .copied()
                .unwrap_or_default();
            (previous_status != result.status).then_some(StatusChange {
                component: result.component,
                previous_status,
                new_status: result.status,
            })
        })
        .collect()
}

/// Worst new status across a batch of changes.
pub fn worst_new_status(changes: &[StatusChange]) -> StatusLevel {
    crate::status::overall_status(changes.iter().map(|change| change.new_status))
}

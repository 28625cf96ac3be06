//! Collects the distinct `serviceId`s an as-yet-unrolled [`Workflow`]
//! references, so the controller can ask the service-metadata registry for
//! exactly the services a submission needs before constructing its
//! `Compiler` — including services only reachable inside a `ForEach` body,
//! since for-each unrolling hasn't run yet at this point.

use std::collections::BTreeSet;

use flowc_types::{Action, Workflow};

pub(crate) fn referenced_service_ids(workflow: &Workflow) -> Vec<String> {
    let mut ids = BTreeSet::new();
    for action in &workflow.actions {
        collect(action, &mut ids);
    }
    ids.into_iter().collect()
}

fn collect(action: &Action, ids: &mut BTreeSet<String>) {
    match action {
        Action::Execute(ea) => {
            ids.insert(ea.service_id.clone());
        }
        Action::ForEach(fe) => {
            for inner in &fe.actions {
                collect(inner, ids);
            }
        }
    }
}

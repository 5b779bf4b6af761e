use std::collections::{HashMap, HashSet};

use lanewise_protocol::SharedStr;
use tracing::warn;

use super::record::InteractionRecord;

/// Walk `parent_uuid` links from `uuid` up to its root.
///
/// Returns the chain root-first, ending at `uuid`. A link that points back
/// into the chain is dropped with a warning and the walk stops there; a
/// dangling parent ends the walk silently. Unknown `uuid` yields an empty
/// chain.
pub fn thread_of(records: &[InteractionRecord], uuid: &str) -> Vec<SharedStr> {
    let parents: HashMap<&str, Option<&SharedStr>> = records
        .iter()
        .map(|r| (r.uuid.as_str(), r.parent_uuid.as_ref()))
        .collect();

    let Some(start) = records.iter().find(|r| r.uuid == uuid) else {
        return Vec::new();
    };

    let mut chain = vec![start.uuid.clone()];
    let mut visited: HashSet<&str> = HashSet::from([start.uuid.as_str()]);
    let mut current = start.uuid.as_str();

    while let Some(Some(parent)) = parents.get(current) {
        if !visited.insert(parent.as_str()) {
            warn!(
                record = current,
                parent = parent.as_str(),
                "cyclic parent reference; dropping the cyclic branch"
            );
            break;
        }
        if !parents.contains_key(parent.as_str()) {
            break;
        }
        chain.push((*parent).clone());
        current = parent.as_str();
    }

    chain.reverse();
    chain
}

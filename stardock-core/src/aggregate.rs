//! Folds a flat resource listing into a sorted [`Snapshot`].
//!
//! Resources carrying a stack label become members of one [`ResourceGroup`]
//! per distinct label; the rest stay standalone. Both levels are ordered by
//! name with a stable sort, so resources with equal names keep the order the
//! runtime reported them in.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::model::{Entry, RawResource, ResourceGroup, ResourceRecord, Snapshot};

/// Token for a group, derived from its name so that aggregating the same
/// input twice yields identical snapshots.
pub fn group_token(name: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

pub fn aggregate(raw: Vec<RawResource>) -> Snapshot {
    let total = raw.len();
    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut entries: Vec<Entry> = Vec::with_capacity(total);
    // Group name -> slot in `entries`, so groups sit at their first encounter
    let mut group_slots: BTreeMap<String, usize> = BTreeMap::new();

    for resource in raw {
        if !seen.insert(resource.id.clone()) {
            warn!(id = %resource.id, "duplicate resource id in listing, keeping first");
            continue;
        }

        let record = ResourceRecord::from_raw(resource);
        let Some(key) = record.group_key.clone() else {
            entries.push(Entry::Standalone(record));
            continue;
        };

        match group_slots.get(&key) {
            Some(&slot) => {
                if let Entry::Group(group) = &mut entries[slot] {
                    group.members.push(record);
                }
            }
            None => {
                group_slots.insert(key.clone(), entries.len());
                entries.push(Entry::Group(ResourceGroup {
                    group_id: group_token(&key),
                    name: key,
                    members: vec![record],
                }));
            }
        }
    }

    for entry in entries.iter_mut() {
        if let Entry::Group(group) = entry {
            group
                .members
                .sort_by(|a, b| a.display_name.cmp(&b.display_name));
        }
    }

    // `str` ordering is byte-wise and case-sensitive; `sort_by` is stable
    entries.sort_by(|a, b| a.name().cmp(b.name()));

    debug!(
        resources = total,
        entries = entries.len(),
        groups = group_slots.len(),
        "aggregated snapshot"
    );

    Snapshot { entries }
}

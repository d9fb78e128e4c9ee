//! # Reconciliation Merge
//!
//! Pure merge of a locally-cached aggregate with a freshly-fetched remote
//! aggregate.
//!
//! ## Merge Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Union-By-Id Merge                                 │
//! │                                                                         │
//! │   local record, id also in other   →  kept as-is; synced flags OR'd    │
//! │   local record, id not in other    →  kept as-is (synced flag kept)    │
//! │   other-side record, id not local  →  appended with its own flag       │
//! │                                                                         │
//! │  The remote store is additive: reconciliation NEVER rewrites a local   │
//! │  record's fields and NEVER drops a record. Concurrent edits to the     │
//! │  same logical record on two devices keep each device's local field     │
//! │  set; the other side's copy only contributes durability evidence       │
//! │  (its synced flag), never content.                                     │
//! │                                                                         │
//! │  The flag is OR'd, not overwritten: a record can only ever move        │
//! │  unsynced → synced through a merge. Mere id-presence on the other      │
//! │  side is NOT proof of durability — its flag is.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::{HashMap, HashSet};

use crate::types::{Domain, UserData};

/// Merges another aggregate (a remote fetch result, or a post-push working
/// copy) into the local aggregate.
///
/// Local record order is preserved; records only present on the other side
/// are appended in that side's order. The result contains every domain, so
/// callers can persist it wholesale.
pub fn merge_aggregate(local: &UserData, other: &UserData) -> UserData {
    let mut merged = UserData::empty();

    for domain in Domain::ALL {
        let local_records = local.domain(domain);
        let other_synced: HashMap<&str, bool> = other
            .domain(domain)
            .iter()
            .map(|r| (r.id.as_str(), r.synced))
            .collect();
        let local_ids: HashSet<&str> =
            local_records.iter().map(|r| r.id.as_str()).collect();

        let mut records = Vec::with_capacity(local_records.len());

        for record in local_records {
            let mut record = record.clone();
            if other_synced.get(record.id.as_str()).copied().unwrap_or(false) {
                record.mark_synced();
            }
            records.push(record);
        }

        for record in other.domain(domain) {
            if !local_ids.contains(record.id.as_str()) {
                records.push(record.clone());
            }
        }

        merged.set_domain(domain, records);
    }

    merged
}

//! # Remote Sync Client
//!
//! Fetches the aggregate from, and pushes unsynced records to, the remote
//! data service.
//!
//! ## Degradation Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        fetch_all(user_id)                               │
//! │                                                                         │
//! │   tasks ─────┐                                                         │
//! │   habits ────┤  one bounded request per domain, all in parallel        │
//! │   memories ──┤                                                         │
//! │   …          ┘                                                         │
//! │                                                                         │
//! │   domain ok        → records, marked synced = true                     │
//! │   domain fails     → empty for that domain (partial data beats none)   │
//! │   domain times out → empty for that domain                             │
//! │                                                                         │
//! │                      push_unsynced(user_id, aggregate)                  │
//! │                                                                         │
//! │   per unsynced record: one create request                              │
//! │   created      → synced = true                                         │
//! │   409 conflict → synced = true  (existing durability, NOT an error)    │
//! │   anything else→ stays unsynced, retried next cycle                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use lifehub_core::{Domain, DomainRecord, UserData};

use crate::api::{DataApi, PushAck};
use crate::config::SyncConfig;
use crate::deadline::{race_deadline, DeadlineOutcome};

// =============================================================================
// Push Summary
// =============================================================================

/// Outcome counts for one push pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PushSummary {
    /// Records the remote store created.
    pub pushed: usize,

    /// Records the remote store already held (409, treated as success).
    pub conflicts: usize,

    /// Records that failed and remain unsynced for the next cycle.
    pub failed: usize,
}

impl PushSummary {
    /// Records now confirmed durable remotely.
    pub fn confirmed(&self) -> usize {
        self.pushed + self.conflicts
    }

    /// Whether every record made it.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

// =============================================================================
// Remote Sync Client
// =============================================================================

/// REST client wrapper applying the engine's degradation policy.
pub struct RemoteSyncClient {
    data: Arc<dyn DataApi>,
    config: Arc<SyncConfig>,
}

impl RemoteSyncClient {
    /// Creates a remote sync client.
    pub fn new(data: Arc<dyn DataApi>, config: Arc<SyncConfig>) -> Self {
        RemoteSyncClient { data, config }
    }

    /// Fetches every domain in parallel, each individually bounded.
    ///
    /// Never fails: a domain whose request errors or times out comes back
    /// empty. Every returned record is marked synced.
    pub async fn fetch_all(&self, user_id: &str) -> UserData {
        let budget = self.config.timeouts.domain_fetch();

        let fetches: Vec<_> = Domain::ALL
            .iter()
            .map(|&domain| {
                let data = self.data.clone();
                let user_id = user_id.to_string();
                async move {
                    match race_deadline(budget, data.list_domain(&user_id, domain)).await {
                        DeadlineOutcome::Completed(Ok(mut records)) => {
                            for record in &mut records {
                                record.mark_synced();
                            }
                            debug!(%domain, count = records.len(), "Domain fetched");
                            (domain, records)
                        }
                        DeadlineOutcome::Completed(Err(e)) => {
                            warn!(%domain, %e, "Domain fetch failed; degrading to empty");
                            (domain, Vec::new())
                        }
                        DeadlineOutcome::DeadlineElapsed => {
                            warn!(
                                %domain,
                                budget_secs = budget.as_secs(),
                                "Domain fetch timed out; degrading to empty"
                            );
                            (domain, Vec::new())
                        }
                    }
                }
            })
            .collect();

        let mut aggregate = UserData::empty();
        for (domain, records) in join_all(fetches).await {
            aggregate.set_domain(domain, records);
        }
        aggregate
    }

    /// Pushes every unsynced record, flipping confirmed ones in place.
    ///
    /// Per-record failures are logged, counted, and left for the next
    /// cycle; this method itself never fails.
    pub async fn push_unsynced(&self, user_id: &str, aggregate: &mut UserData) -> PushSummary {
        let budget = self.config.timeouts.push_request();
        let mut summary = PushSummary::default();

        let pending: Vec<(Domain, DomainRecord)> = aggregate
            .unsynced()
            .map(|(domain, record)| (domain, record.clone()))
            .collect();

        if pending.is_empty() {
            debug!("No unsynced records to push");
            return summary;
        }

        info!(count = pending.len(), "Pushing unsynced records");

        for (domain, record) in pending {
            match race_deadline(budget, self.data.create_record(user_id, domain, &record)).await
            {
                DeadlineOutcome::Completed(Ok(PushAck::Created)) => {
                    aggregate.mark_synced(domain, &record.id);
                    summary.pushed += 1;
                }
                DeadlineOutcome::Completed(Ok(PushAck::Duplicate)) => {
                    // The remote store already holds this record: proof of
                    // durability, same outcome as a successful create.
                    debug!(%domain, id = %record.id, "Record already on remote");
                    aggregate.mark_synced(domain, &record.id);
                    summary.conflicts += 1;
                }
                DeadlineOutcome::Completed(Err(e)) => {
                    warn!(%domain, id = %record.id, %e, "Record push failed; left unsynced");
                    summary.failed += 1;
                }
                DeadlineOutcome::DeadlineElapsed => {
                    warn!(
                        %domain,
                        id = %record.id,
                        budget_secs = budget.as_secs(),
                        "Record push timed out; left unsynced"
                    );
                    summary.failed += 1;
                }
            }
        }

        info!(
            pushed = summary.pushed,
            conflicts = summary.conflicts,
            failed = summary.failed,
            "Push pass complete"
        );
        summary
    }
}

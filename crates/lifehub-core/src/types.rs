//! # Aggregate and Session Types
//!
//! Core types for the Lifehub sync engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Aggregate Types                                 │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    UserData     │   │  DomainRecord   │   │  SessionRecord  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  domains map    │   │  id (UUID)      │   │  user_id        │       │
//! │  │  (fixed set,    │   │  payload (JSON) │   │  access_token   │       │
//! │  │   7 domains)    │   │  synced flag    │   │  expires_at     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  SYNCED FLAG INVARIANT:                                                │
//! │  • synced = false  → durably written locally, unconfirmed remotely     │
//! │  • synced = true   → confirmed (or accepted-as-duplicate) remotely     │
//! │  • transitions unsynced → synced ONLY via a successful or duplicate    │
//! │    remote write; the sync path never deletes a record                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;

// =============================================================================
// Constants
// =============================================================================

/// Seconds before session expiry at which a refresh is required.
pub const REFRESH_HORIZON_SECS: i64 = 300;

/// Prefix marking a trial (non-routable, never-persisted-remotely) identity.
pub const TRIAL_USER_PREFIX: &str = "trial-";

// =============================================================================
// Domain
// =============================================================================

/// The fixed set of named data domains in the aggregate.
///
/// Every user-visible module persists its records under exactly one of
/// these. The set is closed: sync fan-out, merge, and storage all iterate
/// [`Domain::ALL`] so a new domain is a one-line addition here.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Todo items and scheduled tasks.
    Tasks,

    /// Recurring habit definitions and check-ins.
    Habits,

    /// Journal reflections.
    Reflections,

    /// Saved memories and notes.
    Memories,

    /// Personal core values.
    CoreValues,

    /// Configured assistant agents.
    Agents,

    /// Chat conversation transcripts.
    Conversations,
}

impl Domain {
    /// All domains, in canonical order.
    pub const ALL: [Domain; 7] = [
        Domain::Tasks,
        Domain::Habits,
        Domain::Reflections,
        Domain::Memories,
        Domain::CoreValues,
        Domain::Agents,
        Domain::Conversations,
    ];

    /// The wire/storage name of this domain.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Domain::Tasks => "tasks",
            Domain::Habits => "habits",
            Domain::Reflections => "reflections",
            Domain::Memories => "memories",
            Domain::CoreValues => "core_values",
            Domain::Agents => "agents",
            Domain::Conversations => "conversations",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Domain {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tasks" => Ok(Domain::Tasks),
            "habits" => Ok(Domain::Habits),
            "reflections" => Ok(Domain::Reflections),
            "memories" => Ok(Domain::Memories),
            "core_values" => Ok(Domain::CoreValues),
            "agents" => Ok(Domain::Agents),
            "conversations" => Ok(Domain::Conversations),
            other => Err(CoreError::UnknownDomain(other.to_string())),
        }
    }
}

// =============================================================================
// Domain Record
// =============================================================================

/// A single record inside one domain of the aggregate.
///
/// The payload is opaque JSON: the engine synchronizes records, it does not
/// interpret them. Module-specific shape belongs to the UI layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRecord {
    /// Unique identifier (UUID v4). Stable across devices, used for
    /// duplicate detection on the remote store.
    pub id: String,

    /// Module-defined content.
    pub payload: serde_json::Value,

    /// Whether this record is confirmed on the remote store.
    #[serde(default)]
    pub synced: bool,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Last local mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl DomainRecord {
    /// Creates a new, unsynced record with a generated ID.
    pub fn new(payload: serde_json::Value) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), payload)
    }

    /// Creates a new, unsynced record with an explicit ID.
    pub fn with_id(id: impl Into<String>, payload: serde_json::Value) -> Self {
        let now = Utc::now();
        DomainRecord {
            id: id.into(),
            payload,
            synced: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Marks this record as confirmed on the remote store.
    pub fn mark_synced(&mut self) {
        self.synced = true;
    }
}

// =============================================================================
// UserData Aggregate
// =============================================================================

/// The full structured collection of a user's domain records.
///
/// Held in the local store and mirrored remotely. Serialized as a map from
/// domain name to record list; absent domains deserialize as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default)]
    domains: BTreeMap<Domain, Vec<DomainRecord>>,
}

impl UserData {
    /// An aggregate with every domain present and empty.
    pub fn empty() -> Self {
        let mut domains = BTreeMap::new();
        for domain in Domain::ALL {
            domains.insert(domain, Vec::new());
        }
        UserData { domains }
    }

    /// Records in one domain.
    pub fn domain(&self, domain: Domain) -> &[DomainRecord] {
        self.domains.get(&domain).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Replaces the contents of one domain.
    pub fn set_domain(&mut self, domain: Domain, records: Vec<DomainRecord>) {
        self.domains.insert(domain, records);
    }

    /// Inserts or replaces a single record by id.
    pub fn upsert(&mut self, domain: Domain, record: DomainRecord) {
        let records = self.domains.entry(domain).or_default();
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    /// Removes a record by id. Returns whether anything was removed.
    ///
    /// This is the ONLY way a record leaves the aggregate; the sync path
    /// never calls it.
    pub fn remove(&mut self, domain: Domain, id: &str) -> bool {
        match self.domains.get_mut(&domain) {
            Some(records) => {
                let before = records.len();
                records.retain(|r| r.id != id);
                records.len() != before
            }
            None => false,
        }
    }

    /// Iterates every record across all domains.
    pub fn records(&self) -> impl Iterator<Item = (Domain, &DomainRecord)> {
        self.domains
            .iter()
            .flat_map(|(domain, records)| records.iter().map(move |r| (*domain, r)))
    }

    /// Iterates every record that is not yet confirmed remotely.
    pub fn unsynced(&self) -> impl Iterator<Item = (Domain, &DomainRecord)> {
        self.domains
            .iter()
            .flat_map(|(domain, records)| {
                records.iter().filter(|r| !r.synced).map(move |r| (*domain, r))
            })
    }

    /// Number of unsynced records across all domains.
    pub fn unsynced_count(&self) -> usize {
        self.unsynced().count()
    }

    /// Flips one record to synced. Returns whether the record was found.
    pub fn mark_synced(&mut self, domain: Domain, id: &str) -> bool {
        match self
            .domains
            .get_mut(&domain)
            .and_then(|records| records.iter_mut().find(|r| r.id == id))
        {
            Some(record) => {
                record.mark_synced();
                true
            }
            None => false,
        }
    }

    /// Total record count across all domains.
    pub fn total_records(&self) -> usize {
        self.domains.values().map(Vec::len).sum()
    }
}

// =============================================================================
// Session Record
// =============================================================================

/// An authentication session.
///
/// Created on successful authentication, refreshed in place when within
/// [`REFRESH_HORIZON_SECS`] of expiry, destroyed on sign-out or terminal
/// auth failure. Owned by the session manager; cached opportunistically in
/// the local store for fast-path reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// The authenticated user's identifier.
    pub user_id: String,

    /// Opaque bearer token for the remote services.
    pub access_token: String,

    /// Token expiry.
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Creates a session record.
    pub fn new(
        user_id: impl Into<String>,
        access_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        SessionRecord {
            user_id: user_id.into(),
            access_token: access_token.into(),
            expires_at,
        }
    }

    /// Creates a trial session: sentinel identity, non-routable, with an
    /// expiry far enough out that refresh logic never triggers.
    pub fn trial() -> Self {
        SessionRecord {
            user_id: format!("{}{}", TRIAL_USER_PREFIX, Uuid::new_v4()),
            access_token: String::new(),
            expires_at: Utc::now() + Duration::days(3650),
        }
    }

    /// Whether this session needs a refresh before use.
    pub fn needs_refresh(&self) -> bool {
        self.expires_at - Utc::now() < Duration::seconds(REFRESH_HORIZON_SECS)
    }

    /// Whether this session is past its expiry entirely (no grace period).
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Whether this is a trial identity.
    pub fn is_trial(&self) -> bool {
        self.user_id.starts_with(TRIAL_USER_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_domain_round_trip() {
        for domain in Domain::ALL {
            assert_eq!(domain.as_str().parse::<Domain>().unwrap(), domain);
        }
        assert!("moods".parse::<Domain>().is_err());
    }

    #[test]
    fn test_new_record_is_unsynced() {
        let record = DomainRecord::new(json!({"title": "water the plants"}));
        assert!(!record.synced);
        assert!(!record.id.is_empty());
    }

    #[test]
    fn test_aggregate_serde_round_trip() {
        let mut data = UserData::empty();
        data.upsert(Domain::Tasks, DomainRecord::new(json!({"title": "a"})));
        data.upsert(Domain::Habits, DomainRecord::new(json!({"name": "run"})));

        let encoded = serde_json::to_string(&data).unwrap();
        let decoded: UserData = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, data);

        // Domain keys serialize as their wire names
        assert!(encoded.contains("\"tasks\""));
        assert!(encoded.contains("\"core_values\""));
    }

    #[test]
    fn test_unsynced_iteration_and_mark() {
        let mut data = UserData::empty();
        let record = DomainRecord::new(json!({"title": "a"}));
        let id = record.id.clone();
        data.upsert(Domain::Tasks, record);

        let mut synced_record = DomainRecord::new(json!({"title": "b"}));
        synced_record.mark_synced();
        data.upsert(Domain::Tasks, synced_record);

        assert_eq!(data.unsynced_count(), 1);
        assert!(data.mark_synced(Domain::Tasks, &id));
        assert_eq!(data.unsynced_count(), 0);
        assert!(!data.mark_synced(Domain::Tasks, "no-such-id"));
    }

    #[test]
    fn test_remove_is_explicit_only() {
        let mut data = UserData::empty();
        let record = DomainRecord::new(json!({"title": "a"}));
        let id = record.id.clone();
        data.upsert(Domain::Tasks, record);

        assert!(data.remove(Domain::Tasks, &id));
        assert!(!data.remove(Domain::Tasks, &id));
        assert_eq!(data.total_records(), 0);
    }

    #[test]
    fn test_session_refresh_horizon() {
        let fresh = SessionRecord::new("u1", "tok", Utc::now() + Duration::hours(1));
        assert!(!fresh.needs_refresh());
        assert!(!fresh.is_expired());

        let near_expiry = SessionRecord::new("u1", "tok", Utc::now() + Duration::seconds(60));
        assert!(near_expiry.needs_refresh());
        assert!(!near_expiry.is_expired());

        let expired = SessionRecord::new("u1", "tok", Utc::now() - Duration::seconds(1));
        assert!(expired.needs_refresh());
        assert!(expired.is_expired());
    }

    #[test]
    fn test_trial_session() {
        let trial = SessionRecord::trial();
        assert!(trial.is_trial());
        assert!(!trial.needs_refresh());

        let real = SessionRecord::new("u1", "tok", Utc::now());
        assert!(!real.is_trial());
    }
}

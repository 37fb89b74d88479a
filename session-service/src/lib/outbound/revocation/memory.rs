use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::session::models::RevocationEntry;
use crate::domain::session::ports::RevocationStore;
use crate::session::errors::RevocationError;

/// Process-local revocation set.
///
/// Sharded map: inserts and lookups for different token ids do not
/// contend. Suitable for a single instance; multi-instance deployments
/// need a shared store behind the same port.
#[derive(Default)]
pub struct InMemoryRevocationStore {
    entries: DashMap<String, RevocationEntry>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn revoke(&self, entry: RevocationEntry) -> Result<bool, RevocationError> {
        match self.entries.entry(entry.token_id.clone()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(vacant) => {
                vacant.insert(entry);
                Ok(true)
            }
        }
    }

    async fn is_revoked(&self, token_id: &str) -> Result<bool, RevocationError> {
        Ok(self.entries.contains_key(token_id))
    }

    async fn prune(&self, now: DateTime<Utc>) -> Result<usize, RevocationError> {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_prunable(now));
        Ok(before.saturating_sub(self.entries.len()))
    }
}

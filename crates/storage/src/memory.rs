use anyhow::Result;
use async_trait::async_trait;

use crate::{first_match, InvitationStore, StoredInvitation, DUPLICATE_PROBE_LIMIT};

/// Fixed set of records held in memory, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInvitationStore {
    records: Vec<StoredInvitation>,
}

impl InMemoryInvitationStore {
    pub fn new(records: Vec<StoredInvitation>) -> Self {
        Self { records }
    }
}

#[async_trait]
impl InvitationStore for InMemoryInvitationStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<StoredInvitation>> {
        let matches = self
            .records
            .iter()
            .filter(|record| record.phone_number == phone_number)
            .take(DUPLICATE_PROBE_LIMIT as usize)
            .cloned()
            .collect();
        Ok(first_match(self.backend(), phone_number, matches))
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

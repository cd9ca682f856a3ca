//! In-memory policy store, seeded from code or from a JSON file of records.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use dashmap::DashMap;

use rightsgate_core::error::{Result, RightsGateError};
use rightsgate_core::PolicyRecord;

use super::PolicyStore;

/// Tenant-partitioned record store. Reads clone out of the map; writers
/// replace whole tenant partitions or push single records.
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    tenants: DashMap<u64, Vec<PolicyRecord>>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self {
            tenants: DashMap::new(),
        }
    }

    pub fn from_records(records: impl IntoIterator<Item = PolicyRecord>) -> Self {
        let store = Self::new();
        for r in records {
            store.insert(r);
        }
        store
    }

    /// Parse a JSON array of policy records.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let records: Vec<PolicyRecord> = serde_json::from_str(s)
            .map_err(|e| RightsGateError::BadRequest(format!("invalid policy records: {e}")))?;
        Ok(Self::from_records(records))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = fs::read_to_string(path).map_err(|e| {
            RightsGateError::StoreUnavailable(format!("read {} failed: {e}", path.display()))
        })?;
        Self::from_json_str(&s)
    }

    pub fn insert(&self, record: PolicyRecord) {
        self.tenants.entry(record.tenant_id).or_default().push(record);
    }

    pub fn replace_tenant(&self, tenant_id: u64, records: Vec<PolicyRecord>) {
        self.tenants.insert(tenant_id, records);
    }

    pub fn remove_tenant(&self, tenant_id: u64) -> Option<Vec<PolicyRecord>> {
        self.tenants.remove(&tenant_id).map(|(_, records)| records)
    }

    pub fn tenant_ids(&self) -> Vec<u64> {
        self.tenants.iter().map(|e| *e.key()).collect()
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn load_enabled_policies(&self, tenant_id: u64) -> Result<Vec<PolicyRecord>> {
        let Some(records) = self.tenants.get(&tenant_id) else {
            return Ok(vec![]);
        };
        Ok(records.iter().filter(|r| r.enabled).cloned().collect())
    }
}

//! In-memory ticketing service.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::{TicketingError, TicketingResult, WorkItemApi, WorkItemKind};

const FIRST_ID: u64 = 1000;

/// Records every create and hands out sequential IDs starting at 1000.
#[derive(Debug, Default)]
pub struct InMemoryTracker {
    created: Mutex<Vec<(WorkItemKind, Value)>>,
    issued: Mutex<u64>,
    failing_kinds: HashSet<WorkItemKind>,
    failing_names: HashSet<String>,
    zero_id_names: HashSet<String>,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every create of `kind`.
    pub fn failing_kind(mut self, kind: WorkItemKind) -> Self {
        self.failing_kinds.insert(kind);
        self
    }

    /// Reject creates whose `Name` is `name`.
    pub fn failing_name(mut self, name: impl Into<String>) -> Self {
        self.failing_names.insert(name.into());
        self
    }

    /// Accept creates named `name` but answer without an ID.
    pub fn zero_id_for(mut self, name: impl Into<String>) -> Self {
        self.zero_id_names.insert(name.into());
        self
    }

    /// Every accepted or rejected create, in order.
    pub fn created(&self) -> Vec<(WorkItemKind, Value)> {
        self.created.lock().clone()
    }

    /// Payloads created of one kind.
    pub fn created_of(&self, kind: WorkItemKind) -> Vec<Value> {
        self.created.lock().iter().filter(|(k, _)| *k == kind).map(|(_, v)| v.clone()).collect()
    }
}

#[async_trait]
impl WorkItemApi for InMemoryTracker {
    async fn create(&self, kind: WorkItemKind, payload: &Value) -> TicketingResult<u64> {
        self.created.lock().push((kind, payload.clone()));

        let name = payload.get("Name").and_then(Value::as_str).unwrap_or_default();
        if self.failing_kinds.contains(&kind) || self.failing_names.contains(name) {
            return Err(TicketingError::Api {
                status: 400,
                message: format!("Cannot create {} '{}'", kind, name),
            });
        }
        if self.zero_id_names.contains(name) {
            return Ok(0);
        }

        let mut issued = self.issued.lock();
        *issued += 1;
        Ok(FIRST_ID + *issued - 1)
    }
}

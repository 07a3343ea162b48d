//! Structured audit events and in-process counters.
//!
//! Events go through an [`AuditSink`]; the default sink writes them to
//! `tracing` under the `pares.audit` target. Tests swap in a
//! [`RecordingAuditSink`] and inspect what handlers emitted.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

pub const AUDIT_TARGET: &str = "pares.audit";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEvent {
    pub event_name: String,
    pub request_id: String,
    pub outcome: String,
    pub user_id: Option<String>,
    pub attributes: BTreeMap<String, String>,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(event_name: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            event_name: event_name.into(),
            request_id: request_id.into(),
            outcome: "success".to_string(),
            user_id: None,
            attributes: BTreeMap::new(),
            recorded_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: &str) -> Self {
        self.outcome = outcome.to_string();
        self
    }

    #[must_use]
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    #[must_use]
    pub fn with_attribute(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent);
}

#[derive(Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) {
        let attributes = serde_json::to_string(&event.attributes).unwrap_or_default();
        tracing::info!(
            target: AUDIT_TARGET,
            event_name = %event.event_name,
            request_id = %event.request_id,
            outcome = %event.outcome,
            user_id = event.user_id.as_deref().unwrap_or("-"),
            attributes = %attributes,
            "audit event"
        );
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl RecordingAuditSink {
    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: &AuditEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event.clone()),
            Err(poisoned) => poisoned.into_inner().push(event.clone()),
        }
    }
}

#[derive(Clone)]
pub struct Observability {
    sink: Arc<dyn AuditSink>,
    counters: Arc<Mutex<BTreeMap<String, u64>>>,
}

impl Default for Observability {
    fn default() -> Self {
        Self::new(Arc::new(TracingAuditSink))
    }
}

impl Observability {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
            counters: Arc::new(Mutex::new(BTreeMap::new())),
        }
    }

    pub fn audit(&self, event: AuditEvent) {
        self.sink.record(&event);
    }

    pub fn increment_counter(&self, name: &str, request_id: &str) {
        let value = {
            let mut counters = match self.counters.lock() {
                Ok(counters) => counters,
                Err(poisoned) => poisoned.into_inner(),
            };
            let entry = counters.entry(name.to_string()).or_insert(0);
            *entry += 1;
            *entry
        };
        tracing::debug!(counter = name, value, request_id, "counter incremented");
    }

    pub fn counters(&self) -> BTreeMap<String, u64> {
        match self.counters.lock() {
            Ok(counters) => counters.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

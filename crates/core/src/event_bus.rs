//! Notification bus — trait for broadcasting ad lifecycle events.
//!
//! Modules accept an `Arc<dyn AdEventSink>` so the notification transport
//! (push, email, websocket fan-out) is injected rather than reached through
//! a global emitter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdEventKind {
    Requested,
    Reviewed,
    Approved,
    Rejected,
    RequestCancelled,
    Activated,
    Paused,
    Resumed,
    Cancelled,
    Expired,
    Extended,
    RunScheduled,
    RunRetried,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdEvent {
    pub event_id: Uuid,
    pub kind: AdEventKind,
    pub ad_id: Option<Uuid>,
    pub request_id: Option<Uuid>,
    pub vendor_id: Option<Uuid>,
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Trait for broadcasting lifecycle events to interested subscribers.
pub trait AdEventSink: Send + Sync {
    fn emit(&self, event: AdEvent);
}

/// No-op sink for modules that don't need notification fan-out.
pub struct NoOpSink;

impl AdEventSink for NoOpSink {
    fn emit(&self, _event: AdEvent) {}
}

/// Sink that logs every event through `tracing`; the default for the server
/// binary until a real transport is wired in.
pub struct TracingSink;

impl AdEventSink for TracingSink {
    fn emit(&self, event: AdEvent) {
        tracing::info!(
            kind = ?event.kind,
            ad_id = ?event.ad_id,
            request_id = ?event.request_id,
            vendor_id = ?event.vendor_id,
            "ad event"
        );
    }
}

/// In-memory sink that captures events for testing.
#[derive(Default)]
pub struct CaptureSink {
    events: Mutex<Vec<AdEvent>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<AdEvent> {
        self.events.lock().expect("event bus mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().expect("event bus mutex poisoned").len()
    }

    pub fn count_kind(&self, kind: AdEventKind) -> usize {
        self.events
            .lock()
            .expect("event bus mutex poisoned")
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }
}

impl AdEventSink for CaptureSink {
    fn emit(&self, event: AdEvent) {
        self.events.lock().expect("event bus mutex poisoned").push(event);
    }
}

/// Convenience builder for `AdEvent` with minimal boilerplate.
pub fn make_event(
    kind: AdEventKind,
    ad_id: Option<Uuid>,
    request_id: Option<Uuid>,
    vendor_id: Option<Uuid>,
) -> AdEvent {
    AdEvent {
        event_id: Uuid::new_v4(),
        kind,
        ad_id,
        request_id,
        vendor_id,
        detail: None,
        timestamp: Utc::now(),
    }
}

pub fn noop_sink() -> Arc<dyn AdEventSink> {
    Arc::new(NoOpSink)
}

pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}

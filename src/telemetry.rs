//! Operational telemetry events and sinks.
//!
//! Events capture the signals an operator cares about: the active schema
//! version, the outcome of each reconciliation cycle, and webhook
//! deliveries.

use serde::{Deserialize, Serialize};

/// A structured telemetry event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TelemetryEvent {
    /// Records the current database schema version after migrations apply.
    SchemaVersionRecorded {
        /// Diesel migration version string (e.g. `20260110000200`).
        schema_version: String,
    },
    /// Summarises one pass over the tracked set.
    ReconciliationCycleCompleted {
        /// Items visited.
        tracked: usize,
        /// Items whose snapshot changed.
        changed: usize,
        /// Items skipped because of an error.
        failed: usize,
        /// Items dropped from tracking.
        pruned: usize,
        /// Wall-clock duration of the cycle.
        elapsed_millis: u64,
    },
    /// Records a processed webhook delivery.
    WebhookDelivered {
        /// Event type header value.
        event: String,
        /// Whether a handler claimed the event.
        handled: bool,
        /// HTTP status returned to the sender.
        status: u16,
    },
}

/// A sink that can record telemetry events.
pub trait TelemetrySink: Send + Sync {
    /// Records a telemetry event.
    fn record(&self, event: TelemetryEvent);
}

/// Telemetry sink that drops all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetrySink;

impl TelemetrySink for NoopTelemetrySink {
    fn record(&self, _event: TelemetryEvent) {}
}

/// Emits events as structured `tracing` records on the `telemetry` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetrySink;

impl TelemetrySink for TracingTelemetrySink {
    fn record(&self, event: TelemetryEvent) {
        match event {
            TelemetryEvent::SchemaVersionRecorded { schema_version } => {
                tracing::info!(target: "telemetry", %schema_version, "schema version recorded");
            }
            TelemetryEvent::ReconciliationCycleCompleted {
                tracked,
                changed,
                failed,
                pruned,
                elapsed_millis,
            } => {
                tracing::info!(
                    target: "telemetry",
                    tracked,
                    changed,
                    failed,
                    pruned,
                    elapsed_millis,
                    "reconciliation cycle completed"
                );
            }
            TelemetryEvent::WebhookDelivered {
                event,
                handled,
                status,
            } => {
                tracing::info!(target: "telemetry", %event, handled, status, "webhook delivered");
            }
        }
    }
}

/// Test helpers for capturing telemetry.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use std::sync::{Mutex, PoisonError};

    use super::{TelemetryEvent, TelemetrySink};

    /// Sink that keeps every recorded event in memory.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        events: Mutex<Vec<TelemetryEvent>>,
    }

    impl RecordingSink {
        /// Drains the recorded events.
        pub fn take(&self) -> Vec<TelemetryEvent> {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .drain(..)
                .collect()
        }
    }

    impl TelemetrySink for RecordingSink {
        fn record(&self, event: TelemetryEvent) {
            self.events
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(event);
        }
    }
}

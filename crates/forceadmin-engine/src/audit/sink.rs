use std::path::PathBuf;

use forceadmin_core::events::AuditEvent;
use forceadmin_core::traits::EventSink;

use super::log::AuditLog;

/// Collects events in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Vec<AuditEvent>,
}

impl MemorySink {
    pub fn events(&self) -> &[AuditEvent] {
        &self.events
    }
}

impl EventSink for MemorySink {
    fn emit(&mut self, event: &AuditEvent) {
        self.events.push(event.clone());
    }
}

/// Appends events to a hash-chained audit log.
///
/// The sink is fire-and-forget: a failed append is logged, never returned,
/// since the state change it describes has already committed.
#[derive(Debug, Clone)]
pub struct JsonlAuditSink {
    log: AuditLog,
}

impl JsonlAuditSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            log: AuditLog::new(path),
        }
    }

    pub fn log(&self) -> &AuditLog {
        &self.log
    }
}

impl EventSink for JsonlAuditSink {
    fn emit(&mut self, event: &AuditEvent) {
        if let Err(e) = self.log.append(event) {
            tracing::warn!(
                path = %self.log.path().display(),
                err = %e,
                "audit append failed"
            );
        }
    }
}

use forceadmin_core::errors::ForceAdminError;
use forceadmin_core::events::AuditEvent;
use forceadmin_core::keys::{admin_key, FORCE_CHANGE_ADMIN_USED_KEY};
use forceadmin_core::state::UsageFlag;
use forceadmin_core::traits::{EventSink, HeightSource, KvStore, WriteBatch};

use crate::guard::Approval;

/// Height source pinned to one value, e.g. the block being executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedHeight(pub i64);

impl HeightSource for FixedHeight {
    fn current_height(&self) -> i64 {
        self.0
    }
}

/// Applies an approved override.
///
/// The admin record and the usage flag go out in a single batch; the audit
/// event is emitted only once that batch has landed. No re-validation
/// happens here.
pub struct Executor<'a> {
    heights: &'a dyn HeightSource,
}

impl<'a> Executor<'a> {
    pub fn new(heights: &'a dyn HeightSource) -> Self {
        Self { heights }
    }

    pub fn execute<S: KvStore + ?Sized>(
        &self,
        store: &mut S,
        sink: &mut dyn EventSink,
        approval: Approval,
    ) -> Result<AuditEvent, ForceAdminError> {
        let height = self.heights.current_height();

        let mut batch = WriteBatch::new();
        batch.set(&admin_key(approval.contract()), approval.new_admin().as_bytes());
        batch.set(FORCE_CHANGE_ADMIN_USED_KEY, &UsageFlag::at(height).encode());

        if let Err(e) = store.write_batch(batch) {
            tracing::error!(
                contract = %approval.contract(),
                height,
                err = %e,
                "force admin change commit failed"
            );
            return Err(ForceAdminError::ExecutionFailed(e));
        }

        let event = AuditEvent::force_admin_change(
            approval.contract().clone(),
            approval.new_admin().clone(),
            height,
        );
        sink.emit(&event);

        tracing::info!(
            contract = %approval.contract(),
            new_admin = %approval.new_admin(),
            executed_by = %approval.authority(),
            height,
            "admin change executed"
        );
        Ok(event)
    }
}

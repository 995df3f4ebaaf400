//! Per-execution transaction log.
//!
//! Every task execution owns exactly one log: created with a fresh id
//! when the task is constructed, appended to at each phase by the driver,
//! and finalized when `execute()` returns or fails. Errors carry a
//! snapshot of whatever was accumulated up to the failure, so a failed
//! run is still auditable.
//!
//! The log is plain data (serde-serializable) so callers can ship it to
//! structured logging as-is.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::compare::{CompareOutcome, DiffEntry};
use crate::task::{ObjectKeys, ObjectType, TaskAction, TargetState};

/// Caller-supplied ids linking this execution into a larger run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransactionContext {
    pub parent_transaction_id: Option<Uuid>,
    pub group_transaction_id: Option<Uuid>,
}

/// Result of the fetch phase as recorded.
#[derive(Debug, Clone, Serialize)]
pub struct FetchRecord {
    pub exists: bool,
    pub object: Option<Value>,
    pub keys: ObjectKeys,
}

/// Result of the update-required check as recorded.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateCheckRecord {
    pub required: bool,
    pub existing_compare: Value,
    pub requested_compare: Value,
    pub diff: BTreeMap<String, DiffEntry>,
}

/// Result of the create/update/delete phase as recorded.
#[derive(Debug, Clone, Serialize)]
pub struct MutationRecord {
    pub action: TaskAction,
    pub object: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TransactionLog {
    pub transaction_id: Uuid,
    #[serde(flatten)]
    pub context: TransactionContext,
    pub object_type: ObjectType,
    pub target_state: TargetState,
    pub checkmode: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Task configuration as supplied by the caller.
    pub config: Option<Value>,
    pub fetch: Option<FetchRecord>,
    pub update_check: Option<UpdateCheckRecord>,
    pub mutation: Option<MutationRecord>,
    pub final_action: Option<TaskAction>,
}

/// Append-only builder the driver threads through each phase.
///
/// Finalization consumes the builder, so a finished log cannot be
/// appended to.
#[derive(Debug)]
pub struct TransactionLogBuilder {
    log: TransactionLog,
}

impl TransactionLogBuilder {
    pub fn new(
        object_type: ObjectType,
        target_state: TargetState,
        checkmode: bool,
        context: TransactionContext,
    ) -> Self {
        Self {
            log: TransactionLog {
                transaction_id: Uuid::new_v4(),
                context,
                object_type,
                target_state,
                checkmode,
                started_at: Utc::now(),
                finished_at: None,
                config: None,
                fetch: None,
                update_check: None,
                mutation: None,
                final_action: None,
            },
        }
    }

    pub fn transaction_id(&self) -> Uuid {
        self.log.transaction_id
    }

    pub fn record_config(&mut self, config: Value) {
        self.log.config = Some(config);
    }

    pub fn record_fetch(&mut self, exists: bool, object: Option<Value>, keys: ObjectKeys) {
        self.log.fetch = Some(FetchRecord {
            exists,
            object,
            keys,
        });
    }

    pub fn record_update_check(&mut self, required: bool, outcome: &CompareOutcome) {
        self.log.update_check = Some(UpdateCheckRecord {
            required,
            existing_compare: outcome.existing.clone(),
            requested_compare: outcome.requested.clone(),
            diff: outcome.diff.clone(),
        });
    }

    pub fn record_mutation(&mut self, action: TaskAction, object: Option<Value>) {
        self.log.mutation = Some(MutationRecord { action, object });
    }

    /// Snapshot the in-progress log for attachment to an error.
    pub fn snapshot(&self) -> TransactionLog {
        let mut log = self.log.clone();
        log.finished_at = Some(Utc::now());
        log
    }

    /// Finalize with the action the execution settled on.
    pub fn finish(mut self, final_action: TaskAction) -> TransactionLog {
        self.log.final_action = Some(final_action);
        self.log.finished_at = Some(Utc::now());
        self.log
    }
}

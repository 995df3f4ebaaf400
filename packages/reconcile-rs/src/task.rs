//! Generic reconciliation task: capability hooks plus a fixed driver.
//!
//! The driver decides, hooks execute. A task variant implements
//! [`TaskHooks`] (fetch the current remote object, project both sides
//! into compare objects, perform or preview the mutations) and
//! [`TaskDriver`] runs the fixed state machine over it:
//!
//! ```text
//! START ──fetch──► FETCHED ──┬─ target PRESENT, none found ──► create
//!                            ├─ target PRESENT, found ───────► compare ──┬─ differs ─► update
//!                            │                                           └─ equal ───► no action
//!                            ├─ target ABSENT, found ────────► delete
//!                            └─ target ABSENT, none found ───► no action
//! ```
//!
//! Checkmode never skips the fetch (a dry run still reads live state),
//! and replaces every mutation with its non-mutating preview counterpart
//! tagged with the `WOULD_*` action variant.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::compare;
use crate::error::{HookError, TaskError};
use crate::transaction::{TransactionContext, TransactionLog, TransactionLogBuilder};

/// Desired end state for the object a task manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetState {
    Present,
    Absent,
}

/// Which kind of catalog object a task manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjectType {
    ApplicationDomain,
    Enum,
    EnumVersion,
    Schema,
    SchemaVersion,
    Event,
    EventVersion,
    EventApi,
    EventApiVersion,
    Application,
    ApplicationVersion,
}

/// The action a task execution settled on. `WOULD_*` variants are the
/// checkmode predictions of their real counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskAction {
    Create,
    CreateFirstVersion,
    CreateNewVersion,
    Update,
    Delete,
    DeleteVersion,
    NoAction,
    WouldCreate,
    WouldCreateFirstVersion,
    WouldCreateNewVersion,
    WouldUpdate,
    WouldDelete,
    WouldDeleteVersion,
    WouldFailCreateNewVersionOnExactVersionRequirement,
}

impl TaskAction {
    /// The checkmode variant of this action. Already-predictive actions
    /// and `NoAction` map to themselves.
    pub fn would(self) -> TaskAction {
        match self {
            TaskAction::Create => TaskAction::WouldCreate,
            TaskAction::CreateFirstVersion => TaskAction::WouldCreateFirstVersion,
            TaskAction::CreateNewVersion => TaskAction::WouldCreateNewVersion,
            TaskAction::Update => TaskAction::WouldUpdate,
            TaskAction::Delete => TaskAction::WouldDelete,
            TaskAction::DeleteVersion => TaskAction::WouldDeleteVersion,
            other => other,
        }
    }
}

/// The action tags a task variant uses for each mutation kind.
#[derive(Debug, Clone, Copy)]
pub struct ActionLabels {
    pub create: TaskAction,
    pub update: TaskAction,
    pub delete: TaskAction,
}

impl Default for ActionLabels {
    fn default() -> Self {
        Self {
            create: TaskAction::Create,
            update: TaskAction::Update,
            delete: TaskAction::Delete,
        }
    }
}

impl ActionLabels {
    /// Labels used by version-level tasks.
    pub fn versioned() -> Self {
        Self {
            create: TaskAction::CreateFirstVersion,
            update: TaskAction::CreateNewVersion,
            delete: TaskAction::DeleteVersion,
        }
    }
}

/// Identity projection of the object a task touched.
#[derive(Debug, Clone, Serialize)]
pub struct ObjectKeys {
    pub object_type: ObjectType,
    /// Unversioned owner object id; `None` until an object is known.
    pub owner_object_id: Option<String>,
    /// Version object id; `None` for unversioned kinds.
    pub version_object_id: Option<String>,
}

impl ObjectKeys {
    pub fn unknown(object_type: ObjectType) -> Self {
        Self {
            object_type,
            owner_object_id: None,
            version_object_id: None,
        }
    }

    pub fn owner(object_type: ObjectType, owner_object_id: Option<String>) -> Self {
        Self {
            object_type,
            owner_object_id,
            version_object_id: None,
        }
    }

    pub fn version(
        object_type: ObjectType,
        owner_object_id: Option<String>,
        version_object_id: Option<String>,
    ) -> Self {
        Self {
            object_type,
            owner_object_id,
            version_object_id,
        }
    }
}

/// Shared task settings: target state, checkmode, transaction linkage.
/// Immutable once the task executes.
#[derive(Debug, Clone)]
pub struct TaskSettings {
    pub target_state: TargetState,
    pub checkmode: bool,
    pub context: TransactionContext,
}

impl TaskSettings {
    pub fn present() -> Self {
        Self {
            target_state: TargetState::Present,
            checkmode: false,
            context: TransactionContext::default(),
        }
    }

    pub fn absent() -> Self {
        Self {
            target_state: TargetState::Absent,
            checkmode: false,
            context: TransactionContext::default(),
        }
    }

    pub fn checkmode(mut self, checkmode: bool) -> Self {
        self.checkmode = checkmode;
        self
    }

    pub fn context(mut self, context: TransactionContext) -> Self {
        self.context = context;
        self
    }
}

/// What a task execution settled on, plus the finalized log.
#[derive(Debug)]
pub struct TaskOutcome<T> {
    pub action: TaskAction,
    pub object: Option<T>,
    pub object_keys: ObjectKeys,
    pub transaction_log: TransactionLog,
}

/// Capability interface one object kind implements.
///
/// Mutating hooks come in pairs: the real call and a `preview_*`
/// counterpart that synthesizes the would-be result without touching the
/// portal. The driver picks per checkmode; hooks never branch on it.
#[async_trait]
pub trait TaskHooks: Send + Sync {
    type Object: Clone + Send + Sync + Serialize;

    fn object_type(&self) -> ObjectType;

    fn action_labels(&self) -> ActionLabels {
        ActionLabels::default()
    }

    /// The caller-supplied configuration, for the transaction log.
    fn config_value(&self) -> Value;

    /// Identity projection for results and the log.
    fn object_keys(&self, object: Option<&Self::Object>) -> ObjectKeys;

    /// Pre-flight validation. Runs before any remote call.
    async fn validate(&self, _target: TargetState) -> Result<(), HookError> {
        Ok(())
    }

    /// Fetch the current remote object, or `None` if absent. For
    /// versioned kinds this is the latest version by version ordering.
    async fn fetch(&self) -> Result<Option<Self::Object>, HookError>;

    /// Compare-object projection of the fetched remote object.
    fn compare_existing(&self, current: &Self::Object) -> Result<Value, HookError>;

    /// Compare-object projection of the requested configuration.
    fn compare_requested(&self) -> Result<Value, HookError>;

    async fn create(&self) -> Result<Self::Object, HookError>;

    /// Synthesize the object `create` would produce, without remote calls
    /// beyond reads.
    async fn preview_create(&self) -> Result<Self::Object, HookError>;

    async fn update(&self, current: &Self::Object) -> Result<Self::Object, HookError>;

    async fn preview_update(&self, current: &Self::Object) -> Result<Self::Object, HookError>;

    async fn delete(&self, current: &Self::Object) -> Result<(), HookError>;
}

/// Fixed state-machine driver over a set of hooks.
pub struct TaskDriver<H: TaskHooks> {
    hooks: H,
    settings: TaskSettings,
}

impl<H: TaskHooks> TaskDriver<H> {
    pub fn new(hooks: H, settings: TaskSettings) -> Self {
        Self { hooks, settings }
    }

    pub fn settings(&self) -> &TaskSettings {
        &self.settings
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Run the task to completion.
    ///
    /// Succeeds with the settled action and object, or fails with exactly
    /// one classified [`TaskError`] carrying the log accumulated so far.
    /// Nothing is retried here; retry policy belongs to the caller.
    pub async fn execute(&self) -> Result<TaskOutcome<H::Object>, TaskError> {
        let mut log = TransactionLogBuilder::new(
            self.hooks.object_type(),
            self.settings.target_state,
            self.settings.checkmode,
            self.settings.context.clone(),
        );
        log.record_config(self.hooks.config_value());

        tracing::debug!(
            object_type = ?self.hooks.object_type(),
            target = ?self.settings.target_state,
            checkmode = self.settings.checkmode,
            transaction_id = %log.transaction_id(),
            "executing task"
        );

        match self.run(&mut log).await {
            Ok((action, object)) => {
                let object_keys = self.hooks.object_keys(object.as_ref());
                tracing::info!(
                    object_type = ?self.hooks.object_type(),
                    action = ?action,
                    transaction_id = %log.transaction_id(),
                    "task settled"
                );
                Ok(TaskOutcome {
                    action,
                    object,
                    object_keys,
                    transaction_log: log.finish(action),
                })
            }
            Err(err) => {
                tracing::warn!(
                    object_type = ?self.hooks.object_type(),
                    transaction_id = %log.transaction_id(),
                    error = %err,
                    "task failed"
                );
                Err(TaskError::classify(err, log.snapshot()))
            }
        }
    }

    async fn run(
        &self,
        log: &mut TransactionLogBuilder,
    ) -> Result<(TaskAction, Option<H::Object>), HookError> {
        self.hooks.validate(self.settings.target_state).await?;

        // Fetch runs in checkmode too: a dry run predicts against live state.
        let current = self.hooks.fetch().await?;
        log.record_fetch(
            current.is_some(),
            current.as_ref().map(to_log_value),
            self.hooks.object_keys(current.as_ref()),
        );

        let labels = self.hooks.action_labels();
        let checkmode = self.settings.checkmode;

        match (self.settings.target_state, current) {
            (TargetState::Present, None) => {
                let (action, object) = if checkmode {
                    (labels.create.would(), self.hooks.preview_create().await?)
                } else {
                    (labels.create, self.hooks.create().await?)
                };
                log.record_mutation(action, Some(to_log_value(&object)));
                Ok((action, Some(object)))
            }
            (TargetState::Present, Some(current)) => {
                let outcome = compare::compare(
                    self.hooks.compare_existing(&current)?,
                    self.hooks.compare_requested()?,
                )?;
                let required = !outcome.equal;
                log.record_update_check(required, &outcome);
                if !required {
                    return Ok((TaskAction::NoAction, Some(current)));
                }
                if checkmode {
                    match self.hooks.preview_update(&current).await {
                        Ok(object) => {
                            let action = labels.update.would();
                            log.record_mutation(action, Some(to_log_value(&object)));
                            Ok((action, Some(object)))
                        }
                        // The one place a validation error is downgraded:
                        // a dry run reports the exact-version rejection as
                        // an outcome instead of raising it.
                        Err(HookError::VersionStrategy { .. }) => {
                            let action =
                                TaskAction::WouldFailCreateNewVersionOnExactVersionRequirement;
                            log.record_mutation(action, None);
                            Ok((action, Some(current)))
                        }
                        Err(err) => Err(err),
                    }
                } else {
                    let object = self.hooks.update(&current).await?;
                    log.record_mutation(labels.update, Some(to_log_value(&object)));
                    Ok((labels.update, Some(object)))
                }
            }
            (TargetState::Absent, Some(current)) => {
                let action = if checkmode {
                    labels.delete.would()
                } else {
                    self.hooks.delete(&current).await?;
                    labels.delete
                };
                log.record_mutation(action, Some(to_log_value(&current)));
                Ok((action, Some(current)))
            }
            (TargetState::Absent, None) => Ok((TaskAction::NoAction, None)),
        }
    }
}

fn to_log_value<T: Serialize>(object: &T) -> Value {
    serde_json::to_value(object).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Hooks over a fake remote slot, counting mutating calls.
    struct SlotHooks {
        remote: Mutex<Option<Widget>>,
        requested_name: String,
        fail_validation: bool,
        update_error: Option<fn() -> HookError>,
        mutations: AtomicUsize,
    }

    #[derive(Debug, Clone, Serialize, PartialEq)]
    struct Widget {
        id: String,
        name: String,
    }

    impl SlotHooks {
        fn new(remote: Option<Widget>, requested_name: &str) -> Self {
            Self {
                remote: Mutex::new(remote),
                requested_name: requested_name.to_string(),
                fail_validation: false,
                update_error: None,
                mutations: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl TaskHooks for SlotHooks {
        type Object = Widget;

        fn object_type(&self) -> ObjectType {
            ObjectType::Schema
        }

        fn config_value(&self) -> Value {
            json!({ "name": self.requested_name })
        }

        fn object_keys(&self, object: Option<&Widget>) -> ObjectKeys {
            ObjectKeys::owner(ObjectType::Schema, object.map(|w| w.id.clone()))
        }

        async fn validate(&self, _target: TargetState) -> Result<(), HookError> {
            if self.fail_validation {
                return Err(HookError::internal("validation failed"));
            }
            Ok(())
        }

        async fn fetch(&self) -> Result<Option<Widget>, HookError> {
            Ok(self.remote.lock().unwrap().clone())
        }

        fn compare_existing(&self, current: &Widget) -> Result<Value, HookError> {
            Ok(json!({ "name": current.name }))
        }

        fn compare_requested(&self) -> Result<Value, HookError> {
            Ok(json!({ "name": self.requested_name }))
        }

        async fn create(&self) -> Result<Widget, HookError> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            let widget = Widget {
                id: "w-1".into(),
                name: self.requested_name.clone(),
            };
            *self.remote.lock().unwrap() = Some(widget.clone());
            Ok(widget)
        }

        async fn preview_create(&self) -> Result<Widget, HookError> {
            Ok(Widget {
                id: "preview".into(),
                name: self.requested_name.clone(),
            })
        }

        async fn update(&self, current: &Widget) -> Result<Widget, HookError> {
            if let Some(make_err) = self.update_error {
                return Err(make_err());
            }
            self.mutations.fetch_add(1, Ordering::SeqCst);
            let widget = Widget {
                id: current.id.clone(),
                name: self.requested_name.clone(),
            };
            *self.remote.lock().unwrap() = Some(widget.clone());
            Ok(widget)
        }

        async fn preview_update(&self, current: &Widget) -> Result<Widget, HookError> {
            if let Some(make_err) = self.update_error {
                return Err(make_err());
            }
            Ok(Widget {
                id: current.id.clone(),
                name: self.requested_name.clone(),
            })
        }

        async fn delete(&self, _current: &Widget) -> Result<(), HookError> {
            self.mutations.fetch_add(1, Ordering::SeqCst);
            *self.remote.lock().unwrap() = None;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_present_creates_when_absent() {
        let driver = TaskDriver::new(SlotHooks::new(None, "orders"), TaskSettings::present());
        let outcome = driver.execute().await.unwrap();
        assert_eq!(outcome.action, TaskAction::Create);
        assert_eq!(outcome.object.unwrap().name, "orders");
        assert_eq!(outcome.object_keys.owner_object_id.as_deref(), Some("w-1"));
        assert_eq!(
            outcome.transaction_log.final_action,
            Some(TaskAction::Create)
        );
    }

    #[tokio::test]
    async fn test_present_is_idempotent() {
        let existing = Widget {
            id: "w-1".into(),
            name: "orders".into(),
        };
        let driver = TaskDriver::new(
            SlotHooks::new(Some(existing), "orders"),
            TaskSettings::present(),
        );
        let outcome = driver.execute().await.unwrap();
        assert_eq!(outcome.action, TaskAction::NoAction);
        assert_eq!(outcome.object.unwrap().id, "w-1");
        assert_eq!(driver.hooks.mutations.load(Ordering::SeqCst), 0);
        // The no-op still recorded the compare outcome for auditing.
        let check = outcome.transaction_log.update_check.unwrap();
        assert!(!check.required);
    }

    #[tokio::test]
    async fn test_present_updates_on_drift() {
        let existing = Widget {
            id: "w-1".into(),
            name: "orders-old".into(),
        };
        let driver = TaskDriver::new(
            SlotHooks::new(Some(existing), "orders"),
            TaskSettings::present(),
        );
        let outcome = driver.execute().await.unwrap();
        assert_eq!(outcome.action, TaskAction::Update);
        assert_eq!(outcome.object.unwrap().name, "orders");
        let check = outcome.transaction_log.update_check.unwrap();
        assert!(check.required);
        assert!(check.diff.contains_key("name"));
    }

    #[tokio::test]
    async fn test_absent_deletes_existing() {
        let existing = Widget {
            id: "w-1".into(),
            name: "orders".into(),
        };
        let hooks = SlotHooks::new(Some(existing), "orders");
        let driver = TaskDriver::new(hooks, TaskSettings::absent());
        let outcome = driver.execute().await.unwrap();
        assert_eq!(outcome.action, TaskAction::Delete);
        // Deleted object is returned for the caller's records.
        assert_eq!(outcome.object.unwrap().id, "w-1");
        assert!(driver.hooks.remote.lock().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_absent_is_noop_when_missing() {
        let driver = TaskDriver::new(SlotHooks::new(None, "orders"), TaskSettings::absent());
        let outcome = driver.execute().await.unwrap();
        assert_eq!(outcome.action, TaskAction::NoAction);
        assert!(outcome.object.is_none());
        assert!(outcome.object_keys.owner_object_id.is_none());
    }

    #[tokio::test]
    async fn test_checkmode_predicts_without_mutating() {
        let hooks = SlotHooks::new(None, "orders");
        let driver = TaskDriver::new(hooks, TaskSettings::present().checkmode(true));
        let outcome = driver.execute().await.unwrap();
        assert_eq!(outcome.action, TaskAction::WouldCreate);
        assert_eq!(driver.hooks.mutations.load(Ordering::SeqCst), 0);
        assert!(driver.hooks.remote.lock().unwrap().is_none());

        // A real run afterwards still observes "nothing created yet".
        let real = TaskDriver::new(SlotHooks::new(None, "orders"), TaskSettings::present());
        assert_eq!(real.execute().await.unwrap().action, TaskAction::Create);
    }

    #[tokio::test]
    async fn test_checkmode_would_update_and_would_delete() {
        let existing = Widget {
            id: "w-1".into(),
            name: "orders-old".into(),
        };
        let driver = TaskDriver::new(
            SlotHooks::new(Some(existing.clone()), "orders"),
            TaskSettings::present().checkmode(true),
        );
        assert_eq!(
            driver.execute().await.unwrap().action,
            TaskAction::WouldUpdate
        );

        let driver = TaskDriver::new(
            SlotHooks::new(Some(existing), "orders"),
            TaskSettings::absent().checkmode(true),
        );
        let outcome = driver.execute().await.unwrap();
        assert_eq!(outcome.action, TaskAction::WouldDelete);
        assert!(driver.hooks.remote.lock().unwrap().is_some());
    }

    #[tokio::test]
    async fn test_version_strategy_raises_in_real_mode() {
        let existing = Widget {
            id: "w-1".into(),
            name: "orders-old".into(),
        };
        let mut hooks = SlotHooks::new(Some(existing), "orders");
        hooks.update_error = Some(|| HookError::VersionStrategy {
            requested: "1.0.0".into(),
            existing: "1.2.0".into(),
        });
        let driver = TaskDriver::new(hooks, TaskSettings::present());
        let err = driver.execute().await.unwrap_err();
        assert!(matches!(err, TaskError::VersionStrategyValidation { .. }));
        // The failed run's log still carries everything up to the failure.
        assert!(err.transaction_log().fetch.is_some());
    }

    #[tokio::test]
    async fn test_version_strategy_downgrades_in_checkmode() {
        let existing = Widget {
            id: "w-1".into(),
            name: "orders-old".into(),
        };
        let mut hooks = SlotHooks::new(Some(existing), "orders");
        hooks.update_error = Some(|| HookError::VersionStrategy {
            requested: "1.0.0".into(),
            existing: "1.2.0".into(),
        });
        let driver = TaskDriver::new(hooks, TaskSettings::present().checkmode(true));
        let outcome = driver.execute().await.unwrap();
        assert_eq!(
            outcome.action,
            TaskAction::WouldFailCreateNewVersionOnExactVersionRequirement
        );
        // The existing object is returned unchanged.
        assert_eq!(outcome.object.unwrap().id, "w-1");
    }

    #[tokio::test]
    async fn test_validation_fails_before_fetch() {
        let mut hooks = SlotHooks::new(None, "orders");
        hooks.fail_validation = true;
        let driver = TaskDriver::new(hooks, TaskSettings::present());
        let err = driver.execute().await.unwrap_err();
        assert!(matches!(err, TaskError::Internal { .. }));
        assert!(err.transaction_log().fetch.is_none());
    }

    #[test]
    fn test_would_mapping_is_stable() {
        assert_eq!(TaskAction::Create.would(), TaskAction::WouldCreate);
        assert_eq!(
            TaskAction::CreateNewVersion.would(),
            TaskAction::WouldCreateNewVersion
        );
        assert_eq!(TaskAction::NoAction.would(), TaskAction::NoAction);
        assert_eq!(TaskAction::WouldDelete.would(), TaskAction::WouldDelete);
    }
}

//! Versioned-object task specialization.
//!
//! Version objects are immutable snapshots: an "update" is always the
//! creation of a new version, numbered by the task's
//! [`VersionStrategy`], and deletion has no portal counterpart at all.
//! [`VersionedHooks`] wraps a per-kind [`VersionTaskKind`] and adapts it
//! onto the generic [`TaskHooks`] interface, so the driver in
//! [`crate::task`] stays unchanged.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use portal_client::PortalError;

use crate::error::HookError;
use crate::service::{latest_version, RemoteVersion, VersionApi};
use crate::task::{ActionLabels, ObjectKeys, ObjectType, TargetState, TaskHooks};
use crate::version::{self, VersionStrategy, INITIAL_VERSION};

/// Version numbering settings shared by all version-level tasks.
#[derive(Debug, Clone)]
pub struct VersionSettings {
    pub strategy: VersionStrategy,
    /// Version assigned when no version exists yet (ignored by the exact
    /// strategy, which uses its own string).
    pub initial_version: String,
}

impl Default for VersionSettings {
    fn default() -> Self {
        Self {
            strategy: VersionStrategy::BumpPatch,
            initial_version: INITIAL_VERSION.to_string(),
        }
    }
}

impl VersionSettings {
    pub fn exact(version: impl Into<String>) -> Self {
        Self {
            strategy: VersionStrategy::Exact {
                version: version.into(),
            },
            ..Self::default()
        }
    }

    pub fn bump(strategy: VersionStrategy) -> Self {
        Self {
            strategy,
            ..Self::default()
        }
    }
}

/// What one versioned object kind supplies: identity, projections, and
/// payload construction. No control flow.
#[async_trait]
pub trait VersionTaskKind: Send + Sync {
    type Api: VersionApi<Version = Self::Version>;
    type Version: RemoteVersion + Clone + Send + Sync + Serialize;

    fn object_type(&self) -> ObjectType;

    fn api(&self) -> &Self::Api;

    /// Id of the owner object whose versions are being reconciled.
    fn owner_id(&self) -> &str;

    /// Caller configuration, for the transaction log.
    fn config_value(&self) -> Value;

    fn compare_existing(&self, current: &Self::Version) -> Result<Value, HookError>;

    fn compare_requested(&self) -> Result<Value, HookError>;

    /// Build the create payload carrying the given version string.
    /// Read-only remote lookups are allowed (checkmode runs this too).
    async fn build_version(&self, version: &str) -> Result<Self::Version, HookError>;

    /// Portal id of the lifecycle state new versions should end in, or
    /// `None` to leave them as created.
    fn lifecycle_state_id(&self) -> Result<Option<String>, HookError> {
        Ok(None)
    }
}

/// Adapter from a [`VersionTaskKind`] onto the generic hook interface.
pub struct VersionedHooks<K: VersionTaskKind> {
    kind: K,
    versioning: VersionSettings,
}

impl<K: VersionTaskKind> VersionedHooks<K> {
    pub fn new(kind: K, versioning: VersionSettings) -> Self {
        Self { kind, versioning }
    }

    /// Version string for a first version: the exact strategy's string,
    /// otherwise the configured initial version.
    fn first_version(&self) -> &str {
        match &self.versioning.strategy {
            VersionStrategy::Exact { version } => version,
            _ => &self.versioning.initial_version,
        }
    }

    /// Next version after `existing`, per strategy. Exact is accepted
    /// verbatim only when strictly greater than `existing`.
    fn decide_next_version(&self, existing: &str) -> Result<String, HookError> {
        match &self.versioning.strategy {
            VersionStrategy::Exact { version } => {
                if version::is_greater(version, existing)? {
                    Ok(version.clone())
                } else {
                    Err(HookError::VersionStrategy {
                        requested: version.clone(),
                        existing: existing.to_string(),
                    })
                }
            }
            bump_strategy => {
                // bump() is Some for both non-exact strategies.
                let bump = bump_strategy
                    .bump()
                    .ok_or_else(|| HookError::internal("exact strategy reached bump path"))?;
                Ok(version::next_version(existing, bump)?)
            }
        }
    }

    fn existing_version_string<'a>(&self, current: &'a K::Version) -> Result<&'a str, HookError> {
        current
            .version()
            .ok_or(HookError::Portal(PortalError::MissingField {
                object: K::Version::KIND,
                field: "version",
            }))
    }

    /// Move a freshly created version into the kind's target lifecycle
    /// state, if one is configured.
    async fn apply_lifecycle(&self, created: K::Version) -> Result<K::Version, HookError> {
        let Some(state_id) = self.kind.lifecycle_state_id()? else {
            return Ok(created);
        };
        let version_id = created
            .id()
            .ok_or(HookError::Portal(PortalError::MissingField {
                object: K::Version::KIND,
                field: "id",
            }))?;
        Ok(self
            .kind
            .api()
            .update_lifecycle_state(version_id, &state_id)
            .await?)
    }
}

#[async_trait]
impl<K: VersionTaskKind> TaskHooks for VersionedHooks<K> {
    type Object = K::Version;

    fn object_type(&self) -> ObjectType {
        self.kind.object_type()
    }

    fn action_labels(&self) -> ActionLabels {
        ActionLabels::versioned()
    }

    fn config_value(&self) -> Value {
        let mut config = self.kind.config_value();
        if let Value::Object(map) = &mut config {
            map.insert(
                "versionStrategy".into(),
                serde_json::to_value(&self.versioning.strategy).unwrap_or(Value::Null),
            );
        }
        config
    }

    fn object_keys(&self, object: Option<&K::Version>) -> ObjectKeys {
        ObjectKeys::version(
            self.kind.object_type(),
            Some(self.kind.owner_id().to_string()),
            object.and_then(|v| v.id().map(str::to_string)),
        )
    }

    async fn validate(&self, target: TargetState) -> Result<(), HookError> {
        // Version history is immutable; there is no delete-a-version call.
        if target == TargetState::Absent {
            return Err(HookError::FeatureNotSupported {
                feature: "deleting a version",
            });
        }
        if let VersionStrategy::Exact { version } = &self.versioning.strategy {
            if !version::is_valid_version(version) {
                return Err(HookError::InvalidVersion(crate::version::VersionError {
                    version: version.clone(),
                }));
            }
        }
        if !version::is_valid_version(&self.versioning.initial_version) {
            return Err(HookError::InvalidVersion(crate::version::VersionError {
                version: self.versioning.initial_version.clone(),
            }));
        }
        Ok(())
    }

    async fn fetch(&self) -> Result<Option<K::Version>, HookError> {
        latest_version(self.kind.api(), self.kind.owner_id()).await
    }

    fn compare_existing(&self, current: &K::Version) -> Result<Value, HookError> {
        self.kind.compare_existing(current)
    }

    fn compare_requested(&self) -> Result<Value, HookError> {
        self.kind.compare_requested()
    }

    async fn create(&self) -> Result<K::Version, HookError> {
        let payload = self.kind.build_version(self.first_version()).await?;
        let created = self.kind.api().create_version(&payload).await?;
        self.apply_lifecycle(created).await
    }

    async fn preview_create(&self) -> Result<K::Version, HookError> {
        self.kind.build_version(self.first_version()).await
    }

    async fn update(&self, current: &K::Version) -> Result<K::Version, HookError> {
        let existing = self.existing_version_string(current)?;
        let next = self.decide_next_version(existing)?;
        let payload = self.kind.build_version(&next).await?;
        let created = self.kind.api().create_version(&payload).await?;
        self.apply_lifecycle(created).await
    }

    async fn preview_update(&self, current: &K::Version) -> Result<K::Version, HookError> {
        let existing = self.existing_version_string(current)?;
        let next = self.decide_next_version(existing)?;
        self.kind.build_version(&next).await
    }

    async fn delete(&self, _current: &K::Version) -> Result<(), HookError> {
        // validate() rejects ABSENT before this can be reached; kept as a
        // hard stop in case a variant bypasses the driver.
        Err(HookError::FeatureNotSupported {
            feature: "deleting a version",
        })
    }
}

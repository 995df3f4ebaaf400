//! Topic-address enum tasks: the owner object and its versions.
//!
//! Enum values compare order-insensitively; a reordered declaration is
//! not drift.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use portal_client::{EnumValue, TopicAddressEnum, TopicAddressEnumVersion};

use crate::error::HookError;
use crate::lifecycle::{LifecycleState, LifecycleStates};
use crate::service::{ObjectApi, VersionApi};
use crate::task::{ObjectType, TaskDriver, TaskSettings};
use crate::version_task::{VersionSettings, VersionTaskKind, VersionedHooks};

use super::{ObjectHooks, ObjectTaskKind};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumConfig {
    pub application_domain_id: String,
    pub name: String,
    pub shared: bool,
}

impl EnumConfig {
    pub fn new(application_domain_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            application_domain_id: application_domain_id.into(),
            name: name.into(),
            shared: false,
        }
    }

    pub fn shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }
}

pub struct EnumKind<A> {
    api: A,
    config: EnumConfig,
}

impl<A> ObjectTaskKind for EnumKind<A>
where
    A: ObjectApi<Object = TopicAddressEnum>,
{
    type Api = A;
    type Object = TopicAddressEnum;

    fn object_type(&self) -> ObjectType {
        ObjectType::Enum
    }

    fn api(&self) -> &A {
        &self.api
    }

    fn scope(&self) -> Option<&str> {
        Some(&self.config.application_domain_id)
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn config_value(&self) -> Value {
        serde_json::to_value(&self.config).unwrap_or(Value::Null)
    }

    fn compare_existing(&self, current: &TopicAddressEnum) -> Result<Value, HookError> {
        Ok(json!({
            "name": current.name,
            "shared": current.shared,
        }))
    }

    fn compare_requested(&self) -> Result<Value, HookError> {
        Ok(json!({
            "name": self.config.name,
            "shared": self.config.shared,
        }))
    }

    fn build_object(&self, existing_id: Option<&str>) -> Result<TopicAddressEnum, HookError> {
        Ok(TopicAddressEnum {
            id: existing_id.map(str::to_string),
            name: self.config.name.clone(),
            application_domain_id: self.config.application_domain_id.clone(),
            shared: self.config.shared,
        })
    }
}

pub type EnumTask<A> = TaskDriver<ObjectHooks<EnumKind<A>>>;

pub fn enum_task<A>(api: A, config: EnumConfig, settings: TaskSettings) -> EnumTask<A>
where
    A: ObjectApi<Object = TopicAddressEnum>,
{
    TaskDriver::new(ObjectHooks::new(EnumKind { api, config }), settings)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumVersionConfig {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub values: Vec<String>,
    pub state: LifecycleState,
}

impl EnumVersionConfig {
    pub fn new(values: Vec<String>) -> Self {
        Self {
            display_name: None,
            description: None,
            values,
            state: LifecycleState::Released,
        }
    }

    pub fn state(mut self, state: LifecycleState) -> Self {
        self.state = state;
        self
    }
}

pub struct EnumVersionKind<A> {
    api: A,
    enum_id: String,
    config: EnumVersionConfig,
    states: LifecycleStates,
}

impl<A> EnumVersionKind<A> {
    fn state_id(&self) -> Result<String, HookError> {
        Ok(self.states.resolve(self.config.state)?.to_string())
    }
}

#[async_trait]
impl<A> VersionTaskKind for EnumVersionKind<A>
where
    A: VersionApi<Version = TopicAddressEnumVersion>,
{
    type Api = A;
    type Version = TopicAddressEnumVersion;

    fn object_type(&self) -> ObjectType {
        ObjectType::EnumVersion
    }

    fn api(&self) -> &A {
        &self.api
    }

    fn owner_id(&self) -> &str {
        &self.enum_id
    }

    fn config_value(&self) -> Value {
        serde_json::to_value(&self.config).unwrap_or(Value::Null)
    }

    fn compare_existing(&self, current: &TopicAddressEnumVersion) -> Result<Value, HookError> {
        let values: Vec<&str> = current.values.iter().map(|v| v.value.as_str()).collect();
        Ok(json!({
            "displayName": current.display_name,
            "description": current.description,
            "stateId": current.state_id,
            "values": values,
        }))
    }

    fn compare_requested(&self) -> Result<Value, HookError> {
        Ok(json!({
            "displayName": self.config.display_name,
            "description": self.config.description,
            "stateId": self.state_id()?,
            "values": self.config.values,
        }))
    }

    async fn build_version(&self, version: &str) -> Result<TopicAddressEnumVersion, HookError> {
        Ok(TopicAddressEnumVersion {
            id: None,
            enum_id: self.enum_id.clone(),
            version: Some(version.to_string()),
            display_name: self.config.display_name.clone(),
            description: self.config.description.clone(),
            state_id: Some(self.state_id()?),
            values: self
                .config
                .values
                .iter()
                .map(|value| EnumValue {
                    value: value.clone(),
                    label: Some(value.clone()),
                })
                .collect(),
        })
    }

    fn lifecycle_state_id(&self) -> Result<Option<String>, HookError> {
        self.state_id().map(Some)
    }
}

pub type EnumVersionTask<A> = TaskDriver<VersionedHooks<EnumVersionKind<A>>>;

pub fn enum_version_task<A>(
    api: A,
    enum_id: impl Into<String>,
    config: EnumVersionConfig,
    states: LifecycleStates,
    versioning: VersionSettings,
    settings: TaskSettings,
) -> EnumVersionTask<A>
where
    A: VersionApi<Version = TopicAddressEnumVersion>,
{
    TaskDriver::new(
        VersionedHooks::new(
            EnumVersionKind {
                api,
                enum_id: enum_id.into(),
                config,
                states,
            },
            versioning,
        ),
        settings,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskAction;
    use crate::testing::{lifecycle_states, MemoryVersions};
    use std::sync::Arc;

    fn store() -> Arc<MemoryVersions<TopicAddressEnumVersion>> {
        Arc::new(MemoryVersions::new("enumver"))
    }

    fn version_task(
        store: &Arc<MemoryVersions<TopicAddressEnumVersion>>,
        values: Vec<&str>,
        settings: TaskSettings,
    ) -> EnumVersionTask<Arc<MemoryVersions<TopicAddressEnumVersion>>> {
        enum_version_task(
            store.clone(),
            "enum-1",
            EnumVersionConfig::new(values.into_iter().map(String::from).collect()),
            lifecycle_states(),
            VersionSettings::default(),
            settings,
        )
    }

    #[tokio::test]
    async fn test_value_drift_appends_a_version() {
        let store = store();

        let first = version_task(&store, vec!["one", "two"], TaskSettings::present())
            .execute()
            .await
            .unwrap();
        assert_eq!(first.action, TaskAction::CreateFirstVersion);
        assert_eq!(first.object.unwrap().version.as_deref(), Some("1.0.0"));

        let again = version_task(&store, vec!["one", "two"], TaskSettings::present())
            .execute()
            .await
            .unwrap();
        assert_eq!(again.action, TaskAction::NoAction);

        let grown = version_task(&store, vec!["one", "two", "three"], TaskSettings::present())
            .execute()
            .await
            .unwrap();
        assert_eq!(grown.action, TaskAction::CreateNewVersion);
        assert_eq!(grown.object.unwrap().version.as_deref(), Some("1.0.1"));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_value_order_is_not_drift() {
        let store = store();
        version_task(&store, vec!["one", "two"], TaskSettings::present())
            .execute()
            .await
            .unwrap();
        let outcome = version_task(&store, vec!["two", "one"], TaskSettings::present())
            .execute()
            .await
            .unwrap();
        assert_eq!(outcome.action, TaskAction::NoAction);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_created_version_is_released() {
        let store = store();
        let outcome = version_task(&store, vec!["one"], TaskSettings::present())
            .execute()
            .await
            .unwrap();
        assert_eq!(
            outcome.object.unwrap().state_id.as_deref(),
            Some("state-released")
        );
    }

    #[tokio::test]
    async fn test_checkmode_predicts_new_version_without_creating() {
        let store = store();
        version_task(&store, vec!["one"], TaskSettings::present())
            .execute()
            .await
            .unwrap();
        let outcome = version_task(
            &store,
            vec!["one", "two"],
            TaskSettings::present().checkmode(true),
        )
        .execute()
        .await
        .unwrap();
        assert_eq!(outcome.action, TaskAction::WouldCreateNewVersion);
        assert_eq!(outcome.object.unwrap().version.as_deref(), Some("1.0.1"));
        assert_eq!(store.len(), 1);
    }
}

//! Event-API tasks: the owner object and versions declaring produced
//! and consumed event version ids.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use portal_client::{EventApi, EventApiVersion};

use crate::error::HookError;
use crate::lifecycle::{LifecycleState, LifecycleStates};
use crate::service::{ObjectApi, VersionApi};
use crate::task::{ObjectType, TaskDriver, TaskSettings};
use crate::version_task::{VersionSettings, VersionTaskKind, VersionedHooks};

use super::{ObjectHooks, ObjectTaskKind};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventApiConfig {
    pub application_domain_id: String,
    pub name: String,
    pub shared: bool,
    pub broker_type: Option<String>,
}

impl EventApiConfig {
    pub fn new(application_domain_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            application_domain_id: application_domain_id.into(),
            name: name.into(),
            shared: false,
            broker_type: None,
        }
    }

    pub fn shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }
}

pub struct EventApiKind<A> {
    api: A,
    config: EventApiConfig,
}

impl<A> ObjectTaskKind for EventApiKind<A>
where
    A: ObjectApi<Object = EventApi>,
{
    type Api = A;
    type Object = EventApi;

    fn object_type(&self) -> ObjectType {
        ObjectType::EventApi
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

    fn compare_existing(&self, current: &EventApi) -> Result<Value, HookError> {
        Ok(json!({
            "name": current.name,
            "shared": current.shared,
            "brokerType": current.broker_type,
        }))
    }

    fn compare_requested(&self) -> Result<Value, HookError> {
        Ok(json!({
            "name": self.config.name,
            "shared": self.config.shared,
            "brokerType": self.config.broker_type,
        }))
    }

    fn build_object(&self, existing_id: Option<&str>) -> Result<EventApi, HookError> {
        Ok(EventApi {
            id: existing_id.map(str::to_string),
            name: self.config.name.clone(),
            application_domain_id: self.config.application_domain_id.clone(),
            shared: self.config.shared,
            broker_type: self.config.broker_type.clone(),
        })
    }
}

pub type EventApiTask<A> = TaskDriver<ObjectHooks<EventApiKind<A>>>;

pub fn event_api_task<A>(api: A, config: EventApiConfig, settings: TaskSettings) -> EventApiTask<A>
where
    A: ObjectApi<Object = EventApi>,
{
    TaskDriver::new(ObjectHooks::new(EventApiKind { api, config }), settings)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventApiVersionConfig {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub produced_event_version_ids: Vec<String>,
    pub consumed_event_version_ids: Vec<String>,
    pub state: LifecycleState,
}

impl EventApiVersionConfig {
    pub fn new() -> Self {
        Self {
            display_name: None,
            description: None,
            produced_event_version_ids: Vec::new(),
            consumed_event_version_ids: Vec::new(),
            state: LifecycleState::Released,
        }
    }

    pub fn produced(mut self, ids: Vec<String>) -> Self {
        self.produced_event_version_ids = ids;
        self
    }

    pub fn consumed(mut self, ids: Vec<String>) -> Self {
        self.consumed_event_version_ids = ids;
        self
    }

    pub fn state(mut self, state: LifecycleState) -> Self {
        self.state = state;
        self
    }
}

impl Default for EventApiVersionConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EventApiVersionKind<A> {
    api: A,
    event_api_id: String,
    config: EventApiVersionConfig,
    states: LifecycleStates,
}

impl<A> EventApiVersionKind<A> {
    fn state_id(&self) -> Result<String, HookError> {
        Ok(self.states.resolve(self.config.state)?.to_string())
    }
}

#[async_trait]
impl<A> VersionTaskKind for EventApiVersionKind<A>
where
    A: VersionApi<Version = EventApiVersion>,
{
    type Api = A;
    type Version = EventApiVersion;

    fn object_type(&self) -> ObjectType {
        ObjectType::EventApiVersion
    }

    fn api(&self) -> &A {
        &self.api
    }

    fn owner_id(&self) -> &str {
        &self.event_api_id
    }

    fn config_value(&self) -> Value {
        serde_json::to_value(&self.config).unwrap_or(Value::Null)
    }

    fn compare_existing(&self, current: &EventApiVersion) -> Result<Value, HookError> {
        Ok(json!({
            "displayName": current.display_name,
            "description": current.description,
            "stateId": current.state_id,
            "producedEventVersionIds": current.produced_event_version_ids,
            "consumedEventVersionIds": current.consumed_event_version_ids,
        }))
    }

    fn compare_requested(&self) -> Result<Value, HookError> {
        Ok(json!({
            "displayName": self.config.display_name,
            "description": self.config.description,
            "stateId": self.state_id()?,
            "producedEventVersionIds": self.config.produced_event_version_ids,
            "consumedEventVersionIds": self.config.consumed_event_version_ids,
        }))
    }

    async fn build_version(&self, version: &str) -> Result<EventApiVersion, HookError> {
        Ok(EventApiVersion {
            id: None,
            event_api_id: self.event_api_id.clone(),
            version: Some(version.to_string()),
            display_name: self.config.display_name.clone(),
            description: self.config.description.clone(),
            produced_event_version_ids: self.config.produced_event_version_ids.clone(),
            consumed_event_version_ids: self.config.consumed_event_version_ids.clone(),
            state_id: Some(self.state_id()?),
        })
    }

    fn lifecycle_state_id(&self) -> Result<Option<String>, HookError> {
        self.state_id().map(Some)
    }
}

pub type EventApiVersionTask<A> = TaskDriver<VersionedHooks<EventApiVersionKind<A>>>;

pub fn event_api_version_task<A>(
    api: A,
    event_api_id: impl Into<String>,
    config: EventApiVersionConfig,
    states: LifecycleStates,
    versioning: VersionSettings,
    settings: TaskSettings,
) -> EventApiVersionTask<A>
where
    A: VersionApi<Version = EventApiVersion>,
{
    TaskDriver::new(
        VersionedHooks::new(
            EventApiVersionKind {
                api,
                event_api_id: event_api_id.into(),
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

    fn version_task(
        store: &Arc<MemoryVersions<EventApiVersion>>,
        produced: Vec<&str>,
        settings: TaskSettings,
    ) -> EventApiVersionTask<Arc<MemoryVersions<EventApiVersion>>> {
        event_api_version_task(
            store.clone(),
            "eventapi-1",
            EventApiVersionConfig::new()
                .produced(produced.into_iter().map(String::from).collect()),
            lifecycle_states(),
            VersionSettings::default(),
            settings,
        )
    }

    #[tokio::test]
    async fn test_changed_event_references_create_new_version() {
        let store = Arc::new(MemoryVersions::new("eventapiver"));
        version_task(&store, vec!["ev-1"], TaskSettings::present())
            .execute()
            .await
            .unwrap();
        let outcome = version_task(&store, vec!["ev-1", "ev-2"], TaskSettings::present())
            .execute()
            .await
            .unwrap();
        assert_eq!(outcome.action, TaskAction::CreateNewVersion);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_reference_order_is_not_drift() {
        let store = Arc::new(MemoryVersions::new("eventapiver"));
        version_task(&store, vec!["ev-1", "ev-2"], TaskSettings::present())
            .execute()
            .await
            .unwrap();
        let outcome = version_task(&store, vec!["ev-2", "ev-1"], TaskSettings::present())
            .execute()
            .await
            .unwrap();
        assert_eq!(outcome.action, TaskAction::NoAction);
    }
}

//! Application tasks: the owner object and versions declaring which
//! event versions the application produces and consumes.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use portal_client::{Application, ApplicationVersion};

use crate::error::HookError;
use crate::lifecycle::{LifecycleState, LifecycleStates};
use crate::service::{ObjectApi, VersionApi};
use crate::task::{ObjectType, TaskDriver, TaskSettings};
use crate::version_task::{VersionSettings, VersionTaskKind, VersionedHooks};

use super::{ObjectHooks, ObjectTaskKind};

pub const APPLICATION_TYPE_STANDARD: &str = "standard";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationConfig {
    pub application_domain_id: String,
    pub name: String,
    pub application_type: String,
    pub broker_type: Option<String>,
}

impl ApplicationConfig {
    pub fn new(application_domain_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            application_domain_id: application_domain_id.into(),
            name: name.into(),
            application_type: APPLICATION_TYPE_STANDARD.to_string(),
            broker_type: None,
        }
    }
}

pub struct ApplicationKind<A> {
    api: A,
    config: ApplicationConfig,
}

impl<A> ObjectTaskKind for ApplicationKind<A>
where
    A: ObjectApi<Object = Application>,
{
    type Api = A;
    type Object = Application;

    fn object_type(&self) -> ObjectType {
        ObjectType::Application
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

    fn compare_existing(&self, current: &Application) -> Result<Value, HookError> {
        Ok(json!({
            "name": current.name,
            "applicationType": current.application_type,
            "brokerType": current.broker_type,
        }))
    }

    fn compare_requested(&self) -> Result<Value, HookError> {
        Ok(json!({
            "name": self.config.name,
            "applicationType": self.config.application_type,
            "brokerType": self.config.broker_type,
        }))
    }

    fn build_object(&self, existing_id: Option<&str>) -> Result<Application, HookError> {
        Ok(Application {
            id: existing_id.map(str::to_string),
            name: self.config.name.clone(),
            application_domain_id: self.config.application_domain_id.clone(),
            application_type: Some(self.config.application_type.clone()),
            broker_type: self.config.broker_type.clone(),
        })
    }
}

pub type ApplicationTask<A> = TaskDriver<ObjectHooks<ApplicationKind<A>>>;

pub fn application_task<A>(
    api: A,
    config: ApplicationConfig,
    settings: TaskSettings,
) -> ApplicationTask<A>
where
    A: ObjectApi<Object = Application>,
{
    TaskDriver::new(ObjectHooks::new(ApplicationKind { api, config }), settings)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationVersionConfig {
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub declared_produced_event_version_ids: Vec<String>,
    pub declared_consumed_event_version_ids: Vec<String>,
    pub state: LifecycleState,
}

impl ApplicationVersionConfig {
    pub fn new() -> Self {
        Self {
            display_name: None,
            description: None,
            declared_produced_event_version_ids: Vec::new(),
            declared_consumed_event_version_ids: Vec::new(),
            state: LifecycleState::Released,
        }
    }

    pub fn produced(mut self, ids: Vec<String>) -> Self {
        self.declared_produced_event_version_ids = ids;
        self
    }

    pub fn consumed(mut self, ids: Vec<String>) -> Self {
        self.declared_consumed_event_version_ids = ids;
        self
    }

    pub fn state(mut self, state: LifecycleState) -> Self {
        self.state = state;
        self
    }
}

impl Default for ApplicationVersionConfig {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ApplicationVersionKind<A> {
    api: A,
    application_id: String,
    config: ApplicationVersionConfig,
    states: LifecycleStates,
}

impl<A> ApplicationVersionKind<A> {
    fn state_id(&self) -> Result<String, HookError> {
        Ok(self.states.resolve(self.config.state)?.to_string())
    }
}

#[async_trait]
impl<A> VersionTaskKind for ApplicationVersionKind<A>
where
    A: VersionApi<Version = ApplicationVersion>,
{
    type Api = A;
    type Version = ApplicationVersion;

    fn object_type(&self) -> ObjectType {
        ObjectType::ApplicationVersion
    }

    fn api(&self) -> &A {
        &self.api
    }

    fn owner_id(&self) -> &str {
        &self.application_id
    }

    fn config_value(&self) -> Value {
        serde_json::to_value(&self.config).unwrap_or(Value::Null)
    }

    fn compare_existing(&self, current: &ApplicationVersion) -> Result<Value, HookError> {
        Ok(json!({
            "displayName": current.display_name,
            "description": current.description,
            "stateId": current.state_id,
            "declaredProducedEventVersionIds": current.declared_produced_event_version_ids,
            "declaredConsumedEventVersionIds": current.declared_consumed_event_version_ids,
        }))
    }

    fn compare_requested(&self) -> Result<Value, HookError> {
        Ok(json!({
            "displayName": self.config.display_name,
            "description": self.config.description,
            "stateId": self.state_id()?,
            "declaredProducedEventVersionIds": self.config.declared_produced_event_version_ids,
            "declaredConsumedEventVersionIds": self.config.declared_consumed_event_version_ids,
        }))
    }

    async fn build_version(&self, version: &str) -> Result<ApplicationVersion, HookError> {
        Ok(ApplicationVersion {
            id: None,
            application_id: self.application_id.clone(),
            version: Some(version.to_string()),
            display_name: self.config.display_name.clone(),
            description: self.config.description.clone(),
            declared_produced_event_version_ids: self
                .config
                .declared_produced_event_version_ids
                .clone(),
            declared_consumed_event_version_ids: self
                .config
                .declared_consumed_event_version_ids
                .clone(),
            state_id: Some(self.state_id()?),
        })
    }

    fn lifecycle_state_id(&self) -> Result<Option<String>, HookError> {
        self.state_id().map(Some)
    }
}

pub type ApplicationVersionTask<A> = TaskDriver<VersionedHooks<ApplicationVersionKind<A>>>;

pub fn application_version_task<A>(
    api: A,
    application_id: impl Into<String>,
    config: ApplicationVersionConfig,
    states: LifecycleStates,
    versioning: VersionSettings,
    settings: TaskSettings,
) -> ApplicationVersionTask<A>
where
    A: VersionApi<Version = ApplicationVersion>,
{
    TaskDriver::new(
        VersionedHooks::new(
            ApplicationVersionKind {
                api,
                application_id: application_id.into(),
                config,
                states,
            },
            versioning,
        ),
        settings,
    )
}

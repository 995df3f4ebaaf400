//! Schema tasks: the owner object and its content-carrying versions.
//!
//! Schema content is compared structurally when it parses as JSON, so
//! formatting and key order don't register as drift; non-JSON content
//! falls back to a string comparison.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use portal_client::{SchemaObject, SchemaVersion};

use crate::error::HookError;
use crate::lifecycle::{LifecycleState, LifecycleStates};
use crate::service::{ObjectApi, VersionApi};
use crate::task::{ObjectType, TaskDriver, TaskSettings};
use crate::version_task::{VersionSettings, VersionTaskKind, VersionedHooks};

use super::{ObjectHooks, ObjectTaskKind};

pub const SCHEMA_TYPE_JSON: &str = "jsonSchema";
pub const CONTENT_TYPE_JSON: &str = "json";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaConfig {
    pub application_domain_id: String,
    pub name: String,
    pub schema_type: String,
    pub content_type: String,
    pub shared: bool,
}

impl SchemaConfig {
    pub fn new(application_domain_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            application_domain_id: application_domain_id.into(),
            name: name.into(),
            schema_type: SCHEMA_TYPE_JSON.to_string(),
            content_type: CONTENT_TYPE_JSON.to_string(),
            shared: false,
        }
    }

    pub fn shared(mut self, shared: bool) -> Self {
        self.shared = shared;
        self
    }
}

pub struct SchemaKind<A> {
    api: A,
    config: SchemaConfig,
}

impl<A> ObjectTaskKind for SchemaKind<A>
where
    A: ObjectApi<Object = SchemaObject>,
{
    type Api = A;
    type Object = SchemaObject;

    fn object_type(&self) -> ObjectType {
        ObjectType::Schema
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

    fn compare_existing(&self, current: &SchemaObject) -> Result<Value, HookError> {
        Ok(json!({
            "name": current.name,
            "schemaType": current.schema_type,
            "contentType": current.content_type,
            "shared": current.shared,
        }))
    }

    fn compare_requested(&self) -> Result<Value, HookError> {
        Ok(json!({
            "name": self.config.name,
            "schemaType": self.config.schema_type,
            "contentType": self.config.content_type,
            "shared": self.config.shared,
        }))
    }

    fn build_object(&self, existing_id: Option<&str>) -> Result<SchemaObject, HookError> {
        Ok(SchemaObject {
            id: existing_id.map(str::to_string),
            name: self.config.name.clone(),
            application_domain_id: self.config.application_domain_id.clone(),
            schema_type: Some(self.config.schema_type.clone()),
            content_type: Some(self.config.content_type.clone()),
            shared: self.config.shared,
        })
    }
}

pub type SchemaTask<A> = TaskDriver<ObjectHooks<SchemaKind<A>>>;

pub fn schema_task<A>(api: A, config: SchemaConfig, settings: TaskSettings) -> SchemaTask<A>
where
    A: ObjectApi<Object = SchemaObject>,
{
    TaskDriver::new(ObjectHooks::new(SchemaKind { api, config }), settings)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaVersionConfig {
    pub display_name: Option<String>,
    pub description: Option<String>,
    /// Schema document as delivered to the portal, e.g. JSON Schema text.
    pub content: String,
    pub state: LifecycleState,
}

impl SchemaVersionConfig {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            display_name: None,
            description: None,
            content: content.into(),
            state: LifecycleState::Released,
        }
    }

    pub fn state(mut self, state: LifecycleState) -> Self {
        self.state = state;
        self
    }
}

/// Content term for the compare object: parsed JSON when possible, raw
/// text otherwise.
fn content_term(content: &str) -> Value {
    serde_json::from_str(content).unwrap_or_else(|_| Value::String(content.to_string()))
}

pub struct SchemaVersionKind<A> {
    api: A,
    schema_id: String,
    config: SchemaVersionConfig,
    states: LifecycleStates,
}

impl<A> SchemaVersionKind<A> {
    fn state_id(&self) -> Result<String, HookError> {
        Ok(self.states.resolve(self.config.state)?.to_string())
    }
}

#[async_trait]
impl<A> VersionTaskKind for SchemaVersionKind<A>
where
    A: VersionApi<Version = SchemaVersion>,
{
    type Api = A;
    type Version = SchemaVersion;

    fn object_type(&self) -> ObjectType {
        ObjectType::SchemaVersion
    }

    fn api(&self) -> &A {
        &self.api
    }

    fn owner_id(&self) -> &str {
        &self.schema_id
    }

    fn config_value(&self) -> Value {
        serde_json::to_value(&self.config).unwrap_or(Value::Null)
    }

    fn compare_existing(&self, current: &SchemaVersion) -> Result<Value, HookError> {
        Ok(json!({
            "displayName": current.display_name,
            "description": current.description,
            "stateId": current.state_id,
            "content": current.content.as_deref().map(content_term),
        }))
    }

    fn compare_requested(&self) -> Result<Value, HookError> {
        Ok(json!({
            "displayName": self.config.display_name,
            "description": self.config.description,
            "stateId": self.state_id()?,
            "content": content_term(&self.config.content),
        }))
    }

    async fn build_version(&self, version: &str) -> Result<SchemaVersion, HookError> {
        Ok(SchemaVersion {
            id: None,
            schema_id: self.schema_id.clone(),
            version: Some(version.to_string()),
            display_name: self.config.display_name.clone(),
            description: self.config.description.clone(),
            content: Some(self.config.content.clone()),
            state_id: Some(self.state_id()?),
        })
    }

    fn lifecycle_state_id(&self) -> Result<Option<String>, HookError> {
        self.state_id().map(Some)
    }
}

pub type SchemaVersionTask<A> = TaskDriver<VersionedHooks<SchemaVersionKind<A>>>;

pub fn schema_version_task<A>(
    api: A,
    schema_id: impl Into<String>,
    config: SchemaVersionConfig,
    states: LifecycleStates,
    versioning: VersionSettings,
    settings: TaskSettings,
) -> SchemaVersionTask<A>
where
    A: VersionApi<Version = SchemaVersion>,
{
    TaskDriver::new(
        VersionedHooks::new(
            SchemaVersionKind {
                api,
                schema_id: schema_id.into(),
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
        store: &Arc<MemoryVersions<SchemaVersion>>,
        content: &str,
        settings: TaskSettings,
    ) -> SchemaVersionTask<Arc<MemoryVersions<SchemaVersion>>> {
        schema_version_task(
            store.clone(),
            "schema-1",
            SchemaVersionConfig::new(content),
            lifecycle_states(),
            VersionSettings::default(),
            settings,
        )
    }

    #[tokio::test]
    async fn test_reformatted_json_content_is_not_drift() {
        let store = Arc::new(MemoryVersions::new("schemaver"));
        version_task(
            &store,
            r#"{"type":"object","properties":{"id":{"type":"string"}}}"#,
            TaskSettings::present(),
        )
        .execute()
        .await
        .unwrap();

        // Same document, different formatting and key order.
        let outcome = version_task(
            &store,
            "{ \"properties\": { \"id\": { \"type\": \"string\" } }, \"type\": \"object\" }",
            TaskSettings::present(),
        )
        .execute()
        .await
        .unwrap();
        assert_eq!(outcome.action, TaskAction::NoAction);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_changed_content_creates_new_version() {
        let store = Arc::new(MemoryVersions::new("schemaver"));
        version_task(&store, r#"{"type":"object"}"#, TaskSettings::present())
            .execute()
            .await
            .unwrap();
        let outcome = version_task(&store, r#"{"type":"array"}"#, TaskSettings::present())
            .execute()
            .await
            .unwrap();
        assert_eq!(outcome.action, TaskAction::CreateNewVersion);
        assert_eq!(outcome.object.unwrap().version.as_deref(), Some("1.0.1"));
    }

    #[tokio::test]
    async fn test_non_json_content_compares_as_text() {
        let store = Arc::new(MemoryVersions::new("schemaver"));
        version_task(&store, "syntax = \"proto3\";", TaskSettings::present())
            .execute()
            .await
            .unwrap();
        let outcome = version_task(&store, "syntax = \"proto3\";", TaskSettings::present())
            .execute()
            .await
            .unwrap();
        assert_eq!(outcome.action, TaskAction::NoAction);
    }
}

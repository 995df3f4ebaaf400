//! Task variants, one file per catalog object kind.
//!
//! Each file carries a config struct (what the caller declares), a kind
//! struct wiring the config to an API adapter, and a constructor
//! returning a ready [`TaskDriver`]. The control flow all lives in
//! [`crate::task`] and [`crate::version_task`]; these modules only
//! supply identity, projections, and payloads.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use portal_client::PortalError;

use crate::error::HookError;
use crate::service::{ObjectApi, RemoteObject};
use crate::task::{ObjectKeys, ObjectType, TaskHooks};

pub mod application;
pub mod application_domain;
pub mod enumeration;
pub mod event;
pub mod event_api;
pub mod schema;

pub use application::{
    application_task, application_version_task, ApplicationConfig, ApplicationVersionConfig,
};
pub use application_domain::{application_domain_task, ApplicationDomainConfig};
pub use enumeration::{enum_task, enum_version_task, EnumConfig, EnumVersionConfig};
pub use event::{event_task, event_version_task, EventConfig, EventVersionConfig};
pub use event_api::{
    event_api_task, event_api_version_task, EventApiConfig, EventApiVersionConfig,
};
pub use schema::{schema_task, schema_version_task, SchemaConfig, SchemaVersionConfig};

/// What one unversioned object kind supplies to the generic hooks.
pub trait ObjectTaskKind: Send + Sync {
    type Api: ObjectApi<Object = Self::Object>;
    type Object: RemoteObject + Clone + Send + Sync + Serialize;

    fn object_type(&self) -> ObjectType;

    fn api(&self) -> &Self::Api;

    /// Owning application-domain id; `None` for globally scoped kinds.
    fn scope(&self) -> Option<&str>;

    /// Name the object is looked up under.
    fn name(&self) -> &str;

    fn config_value(&self) -> Value;

    fn compare_existing(&self, current: &Self::Object) -> Result<Value, HookError>;

    fn compare_requested(&self) -> Result<Value, HookError>;

    /// Build the request payload. `existing_id` is set on updates so the
    /// synthesized object keeps its identity.
    fn build_object(&self, existing_id: Option<&str>) -> Result<Self::Object, HookError>;
}

/// Adapter from an [`ObjectTaskKind`] onto the generic hook interface.
///
/// Creates POST the built payload; updates PATCH the full payload at the
/// existing object's id. Deletes go by id alone.
pub struct ObjectHooks<K: ObjectTaskKind> {
    kind: K,
}

impl<K: ObjectTaskKind> ObjectHooks<K> {
    pub fn new(kind: K) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> &K {
        &self.kind
    }

    fn existing_id<'a>(&self, current: &'a K::Object) -> Result<&'a str, HookError> {
        current
            .id()
            .ok_or(HookError::Portal(PortalError::MissingField {
                object: "object",
                field: "id",
            }))
    }
}

#[async_trait]
impl<K: ObjectTaskKind> TaskHooks for ObjectHooks<K> {
    type Object = K::Object;

    fn object_type(&self) -> ObjectType {
        self.kind.object_type()
    }

    fn config_value(&self) -> Value {
        self.kind.config_value()
    }

    fn object_keys(&self, object: Option<&K::Object>) -> ObjectKeys {
        ObjectKeys::owner(
            self.kind.object_type(),
            object.and_then(|o| o.id().map(str::to_string)),
        )
    }

    async fn fetch(&self) -> Result<Option<K::Object>, HookError> {
        Ok(self.kind.api().find(self.kind.scope(), self.kind.name()).await?)
    }

    fn compare_existing(&self, current: &K::Object) -> Result<Value, HookError> {
        self.kind.compare_existing(current)
    }

    fn compare_requested(&self) -> Result<Value, HookError> {
        self.kind.compare_requested()
    }

    async fn create(&self) -> Result<K::Object, HookError> {
        let payload = self.kind.build_object(None)?;
        Ok(self.kind.api().create(&payload).await?)
    }

    async fn preview_create(&self) -> Result<K::Object, HookError> {
        self.kind.build_object(None)
    }

    async fn update(&self, current: &K::Object) -> Result<K::Object, HookError> {
        let id = self.existing_id(current)?;
        let payload = self.kind.build_object(Some(id))?;
        Ok(self.kind.api().update(id, &payload).await?)
    }

    async fn preview_update(&self, current: &K::Object) -> Result<K::Object, HookError> {
        let id = self.existing_id(current)?;
        self.kind.build_object(Some(id))
    }

    async fn delete(&self, current: &K::Object) -> Result<(), HookError> {
        let id = self.existing_id(current)?;
        Ok(self.kind.api().delete(id).await?)
    }
}

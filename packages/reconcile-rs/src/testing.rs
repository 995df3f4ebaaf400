//! In-memory portal for tests.
//!
//! Generic stores that implement the service traits over mutex-guarded
//! vectors, so task variants run end to end without a live portal.
//! Enabled for this crate's own tests and for downstream crates via the
//! `testing` feature.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use portal_client::{
    Application, ApplicationDomain, ApplicationVersion, EventApi, EventApiVersion, EventObject,
    EventVersion, PortalError, SchemaObject, SchemaVersion, StateDto, TopicAddressEnum,
    TopicAddressEnumVersion,
};

use crate::error::HookError;
use crate::lifecycle::LifecycleStates;
use crate::service::{
    latest_version, EnumVersionLookup, ObjectApi, RemoteObject, RemoteVersion, VersionApi,
    VersionPage,
};

/// Store-managed mutation hooks for unversioned objects.
pub trait MemoryObject: RemoteObject + Clone + Send + Sync {
    fn set_id(&mut self, id: String);
    /// Owning application-domain id; `None` for globally scoped kinds.
    fn scope_id(&self) -> Option<&str>;
}

/// Store-managed mutation hooks for version objects.
pub trait MemoryVersion: RemoteVersion + Clone + Send + Sync {
    fn set_id(&mut self, id: String);
    fn set_state_id(&mut self, state_id: String);
}

macro_rules! memory_object {
    ($ty:ty, scoped) => {
        impl MemoryObject for $ty {
            fn set_id(&mut self, id: String) {
                self.id = Some(id);
            }

            fn scope_id(&self) -> Option<&str> {
                Some(&self.application_domain_id)
            }
        }
    };
    ($ty:ty, global) => {
        impl MemoryObject for $ty {
            fn set_id(&mut self, id: String) {
                self.id = Some(id);
            }

            fn scope_id(&self) -> Option<&str> {
                None
            }
        }
    };
}

memory_object!(ApplicationDomain, global);
memory_object!(TopicAddressEnum, scoped);
memory_object!(SchemaObject, scoped);
memory_object!(EventObject, scoped);
memory_object!(EventApi, scoped);
memory_object!(Application, scoped);

macro_rules! memory_version {
    ($ty:ty) => {
        impl MemoryVersion for $ty {
            fn set_id(&mut self, id: String) {
                self.id = Some(id);
            }

            fn set_state_id(&mut self, state_id: String) {
                self.state_id = Some(state_id);
            }
        }
    };
}

memory_version!(TopicAddressEnumVersion);
memory_version!(SchemaVersion);
memory_version!(EventVersion);
memory_version!(EventApiVersion);
memory_version!(ApplicationVersion);

fn not_found(what: &str, id: &str) -> PortalError {
    PortalError::Api {
        status: 404,
        message: format!("{what} {id} not found"),
    }
}

/// In-memory [`ObjectApi`] over one kind.
pub struct MemoryObjects<T> {
    prefix: &'static str,
    next_id: AtomicU64,
    items: Mutex<Vec<T>>,
}

impl<T: MemoryObject> MemoryObjects<T> {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            next_id: AtomicU64::new(1),
            items: Mutex::new(Vec::new()),
        }
    }

    fn assign_id(&self) -> String {
        format!("{}-{}", self.prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    pub fn all(&self) -> Vec<T> {
        self.items.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }

    /// Seed a pre-existing object, assigning it an id.
    pub fn seed(&self, mut object: T) -> T {
        object.set_id(self.assign_id());
        self.items.lock().unwrap().push(object.clone());
        object
    }
}

#[async_trait]
impl<T: MemoryObject> ObjectApi for MemoryObjects<T> {
    type Object = T;

    async fn find(&self, scope: Option<&str>, name: &str) -> Result<Option<T>, PortalError> {
        Ok(self
            .items
            .lock()
            .unwrap()
            .iter()
            .find(|item| item.name() == name && item.scope_id() == scope)
            .cloned())
    }

    async fn create(&self, object: &T) -> Result<T, PortalError> {
        let mut stored = object.clone();
        stored.set_id(self.assign_id());
        self.items.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, id: &str, object: &T) -> Result<T, PortalError> {
        let mut items = self.items.lock().unwrap();
        let slot = items
            .iter_mut()
            .find(|item| item.id() == Some(id))
            .ok_or_else(|| not_found("object", id))?;
        let mut updated = object.clone();
        updated.set_id(id.to_string());
        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), PortalError> {
        let mut items = self.items.lock().unwrap();
        let before = items.len();
        items.retain(|item| item.id() != Some(id));
        if items.len() == before {
            return Err(not_found("object", id));
        }
        Ok(())
    }
}

/// In-memory [`VersionApi`] over one kind. Listing honors the page
/// cursor, so the pagination loop gets exercised.
pub struct MemoryVersions<V> {
    prefix: &'static str,
    next_id: AtomicU64,
    items: Mutex<Vec<V>>,
}

impl<V: MemoryVersion> MemoryVersions<V> {
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            next_id: AtomicU64::new(1),
            items: Mutex::new(Vec::new()),
        }
    }

    fn assign_id(&self) -> String {
        format!("{}-{}", self.prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    pub fn all(&self) -> Vec<V> {
        self.items.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }

    pub fn seed(&self, mut version: V) -> V {
        version.set_id(self.assign_id());
        self.items.lock().unwrap().push(version.clone());
        version
    }
}

#[async_trait]
impl<V: MemoryVersion> VersionApi for MemoryVersions<V> {
    type Version = V;

    async fn list_versions(
        &self,
        owner_id: &str,
        page_size: u32,
        page_number: u32,
    ) -> Result<VersionPage<V>, PortalError> {
        let owned: Vec<V> = self
            .items
            .lock()
            .unwrap()
            .iter()
            .filter(|version| version.owner_id() == owner_id)
            .cloned()
            .collect();
        let start = ((page_number.max(1) - 1) as usize) * page_size as usize;
        let end = (start + page_size as usize).min(owned.len());
        let data = if start < owned.len() {
            owned[start..end].to_vec()
        } else {
            vec![]
        };
        let next_page = (end < owned.len()).then(|| page_number + 1);
        Ok(VersionPage { data, next_page })
    }

    async fn create_version(&self, version: &V) -> Result<V, PortalError> {
        let mut stored = version.clone();
        stored.set_id(self.assign_id());
        self.items.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn update_lifecycle_state(
        &self,
        version_id: &str,
        state_id: &str,
    ) -> Result<V, PortalError> {
        let mut items = self.items.lock().unwrap();
        let slot = items
            .iter_mut()
            .find(|version| version.id() == Some(version_id))
            .ok_or_else(|| not_found("version", version_id))?;
        slot.set_state_id(state_id.to_string());
        Ok(slot.clone())
    }
}

/// [`EnumVersionLookup`] over in-memory enum stores.
pub struct MemoryEnumLookup {
    pub enums: Arc<MemoryObjects<TopicAddressEnum>>,
    pub enum_versions: Arc<MemoryVersions<TopicAddressEnumVersion>>,
}

#[async_trait]
impl EnumVersionLookup for MemoryEnumLookup {
    async fn find_latest_enum_version_id(
        &self,
        application_domain_id: &str,
        enum_name: &str,
    ) -> Result<Option<String>, HookError> {
        let Some(owner) = self.enums.find(Some(application_domain_id), enum_name).await? else {
            return Ok(None);
        };
        let Some(owner_id) = owner.id else {
            return Ok(None);
        };
        let latest = latest_version(self.enum_versions.as_ref(), &owner_id).await?;
        Ok(latest.and_then(|version| version.id))
    }
}

/// A lifecycle-state table with fixed well-known ids.
pub fn lifecycle_states() -> LifecycleStates {
    LifecycleStates::from_states(&[
        StateDto {
            id: "state-draft".into(),
            name: "Draft".into(),
        },
        StateDto {
            id: "state-released".into(),
            name: "Released".into(),
        },
        StateDto {
            id: "state-deprecated".into(),
            name: "Deprecated".into(),
        },
        StateDto {
            id: "state-retired".into(),
            name: "Retired".into(),
        },
    ])
}

/// Every store the task variants need, behind shared handles.
pub struct InMemoryPortal {
    pub domains: Arc<MemoryObjects<ApplicationDomain>>,
    pub enums: Arc<MemoryObjects<TopicAddressEnum>>,
    pub enum_versions: Arc<MemoryVersions<TopicAddressEnumVersion>>,
    pub schemas: Arc<MemoryObjects<SchemaObject>>,
    pub schema_versions: Arc<MemoryVersions<SchemaVersion>>,
    pub events: Arc<MemoryObjects<EventObject>>,
    pub event_versions: Arc<MemoryVersions<EventVersion>>,
    pub event_apis: Arc<MemoryObjects<EventApi>>,
    pub event_api_versions: Arc<MemoryVersions<EventApiVersion>>,
    pub applications: Arc<MemoryObjects<Application>>,
    pub application_versions: Arc<MemoryVersions<ApplicationVersion>>,
    pub states: LifecycleStates,
}

impl Default for InMemoryPortal {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPortal {
    pub fn new() -> Self {
        Self {
            domains: Arc::new(MemoryObjects::new("dom")),
            enums: Arc::new(MemoryObjects::new("enum")),
            enum_versions: Arc::new(MemoryVersions::new("enumver")),
            schemas: Arc::new(MemoryObjects::new("schema")),
            schema_versions: Arc::new(MemoryVersions::new("schemaver")),
            events: Arc::new(MemoryObjects::new("event")),
            event_versions: Arc::new(MemoryVersions::new("eventver")),
            event_apis: Arc::new(MemoryObjects::new("eventapi")),
            event_api_versions: Arc::new(MemoryVersions::new("eventapiver")),
            applications: Arc::new(MemoryObjects::new("app")),
            application_versions: Arc::new(MemoryVersions::new("appver")),
            states: lifecycle_states(),
        }
    }

    pub fn enum_lookup(&self) -> MemoryEnumLookup {
        MemoryEnumLookup {
            enums: self.enums.clone(),
            enum_versions: self.enum_versions.clone(),
        }
    }
}

//! Live adapters from the HTTP client onto the service traits.
//!
//! One thin wrapper per object kind, each holding a shared
//! [`PortalClient`]. These carry no reconciliation logic; they exist so
//! the task variants in [`crate::kinds`] depend on [`ObjectApi`] and
//! [`VersionApi`] instead of on concrete client methods.

use std::sync::Arc;

use async_trait::async_trait;

use portal_client::{
    Application, ApplicationDomain, ApplicationVersion, EventApi, EventApiVersion, EventObject,
    EventVersion, ListResponse, PortalClient, PortalError, SchemaObject, SchemaVersion,
    TopicAddressEnum, TopicAddressEnumVersion,
};

use crate::error::HookError;
use crate::service::{
    latest_version, EnumVersionLookup, ObjectApi, RemoteObject, RemoteVersion, VersionApi,
    VersionPage,
};

// =============================================================================
// Trait impls over the wire types
// =============================================================================

macro_rules! remote_object {
    ($ty:ty) => {
        impl RemoteObject for $ty {
            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn name(&self) -> &str {
                &self.name
            }
        }
    };
}

remote_object!(ApplicationDomain);
remote_object!(TopicAddressEnum);
remote_object!(SchemaObject);
remote_object!(EventObject);
remote_object!(EventApi);
remote_object!(Application);

macro_rules! remote_version {
    ($ty:ty, $kind:literal, $owner:ident) => {
        impl RemoteVersion for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn owner_id(&self) -> &str {
                &self.$owner
            }

            fn version(&self) -> Option<&str> {
                self.version.as_deref()
            }
        }
    };
}

remote_version!(TopicAddressEnumVersion, "enumVersion", enum_id);
remote_version!(SchemaVersion, "schemaVersion", schema_id);
remote_version!(EventVersion, "eventVersion", event_id);
remote_version!(EventApiVersion, "eventApiVersion", event_api_id);
remote_version!(ApplicationVersion, "applicationVersion", application_id);

// =============================================================================
// Adapters
// =============================================================================

fn to_page<V>(resp: ListResponse<V>) -> VersionPage<V> {
    VersionPage {
        next_page: resp
            .meta
            .as_ref()
            .and_then(|m| m.pagination.as_ref())
            .and_then(|p| p.next_page),
        data: resp.data,
    }
}

fn required_scope(scope: Option<&str>, object: &'static str) -> Result<String, PortalError> {
    scope
        .map(str::to_string)
        .ok_or(PortalError::MissingField {
            object,
            field: "applicationDomainId",
        })
}

macro_rules! object_service {
    ($name:ident, $object:ty, $kind:literal, scoped,
     $find:ident, $create:ident, $update:ident, $delete:ident) => {
        pub struct $name {
            client: Arc<PortalClient>,
        }

        impl $name {
            pub fn new(client: Arc<PortalClient>) -> Self {
                Self { client }
            }
        }

        #[async_trait]
        impl ObjectApi for $name {
            type Object = $object;

            async fn find(
                &self,
                scope: Option<&str>,
                name: &str,
            ) -> Result<Option<$object>, PortalError> {
                let domain_id = required_scope(scope, $kind)?;
                self.client.$find(&domain_id, name).await
            }

            async fn create(&self, object: &$object) -> Result<$object, PortalError> {
                self.client.$create(object).await
            }

            async fn update(&self, id: &str, object: &$object) -> Result<$object, PortalError> {
                self.client.$update(id, object).await
            }

            async fn delete(&self, id: &str) -> Result<(), PortalError> {
                self.client.$delete(id).await
            }
        }
    };
}

macro_rules! version_service {
    ($name:ident, $version:ty, $list:ident, $create:ident, $state:ident) => {
        pub struct $name {
            client: Arc<PortalClient>,
        }

        impl $name {
            pub fn new(client: Arc<PortalClient>) -> Self {
                Self { client }
            }
        }

        #[async_trait]
        impl VersionApi for $name {
            type Version = $version;

            async fn list_versions(
                &self,
                owner_id: &str,
                page_size: u32,
                page_number: u32,
            ) -> Result<VersionPage<$version>, PortalError> {
                let resp = self.client.$list(owner_id, page_size, page_number).await?;
                Ok(to_page(resp))
            }

            async fn create_version(&self, version: &$version) -> Result<$version, PortalError> {
                self.client.$create(version).await
            }

            async fn update_lifecycle_state(
                &self,
                version_id: &str,
                state_id: &str,
            ) -> Result<$version, PortalError> {
                self.client.$state(version_id, state_id).await
            }
        }
    };
}

// Application domains are the one globally scoped kind, so they get a
// hand-written impl instead of the scoped macro.
pub struct DomainService {
    client: Arc<PortalClient>,
}

impl DomainService {
    pub fn new(client: Arc<PortalClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectApi for DomainService {
    type Object = ApplicationDomain;

    async fn find(
        &self,
        _scope: Option<&str>,
        name: &str,
    ) -> Result<Option<ApplicationDomain>, PortalError> {
        self.client.find_application_domain_by_name(name).await
    }

    async fn create(&self, object: &ApplicationDomain) -> Result<ApplicationDomain, PortalError> {
        self.client.create_application_domain(object).await
    }

    async fn update(
        &self,
        id: &str,
        object: &ApplicationDomain,
    ) -> Result<ApplicationDomain, PortalError> {
        self.client.update_application_domain(id, object).await
    }

    async fn delete(&self, id: &str) -> Result<(), PortalError> {
        self.client.delete_application_domain(id).await
    }
}

object_service!(
    EnumService,
    TopicAddressEnum,
    "enum",
    scoped,
    find_enum_by_name,
    create_enum,
    update_enum,
    delete_enum
);
object_service!(
    SchemaService,
    SchemaObject,
    "schema",
    scoped,
    find_schema_by_name,
    create_schema,
    update_schema,
    delete_schema
);
object_service!(
    EventService,
    EventObject,
    "event",
    scoped,
    find_event_by_name,
    create_event,
    update_event,
    delete_event
);
object_service!(
    EventApiService,
    EventApi,
    "eventApi",
    scoped,
    find_event_api_by_name,
    create_event_api,
    update_event_api,
    delete_event_api
);
object_service!(
    ApplicationService,
    Application,
    "application",
    scoped,
    find_application_by_name,
    create_application,
    update_application,
    delete_application
);

version_service!(
    EnumVersionService,
    TopicAddressEnumVersion,
    list_enum_versions,
    create_enum_version,
    update_enum_version_state
);
version_service!(
    SchemaVersionService,
    SchemaVersion,
    list_schema_versions,
    create_schema_version,
    update_schema_version_state
);
version_service!(
    EventVersionService,
    EventVersion,
    list_event_versions,
    create_event_version,
    update_event_version_state
);
version_service!(
    EventApiVersionService,
    EventApiVersion,
    list_event_api_versions,
    create_event_api_version,
    update_event_api_version_state
);
version_service!(
    ApplicationVersionService,
    ApplicationVersion,
    list_application_versions,
    create_application_version,
    update_application_version_state
);

#[async_trait]
impl EnumVersionLookup for EnumVersionService {
    async fn find_latest_enum_version_id(
        &self,
        application_domain_id: &str,
        enum_name: &str,
    ) -> Result<Option<String>, HookError> {
        let Some(owner) = self
            .client
            .find_enum_by_name(application_domain_id, enum_name)
            .await?
        else {
            return Ok(None);
        };
        let owner_id = owner.id.as_deref().ok_or(PortalError::MissingField {
            object: "enum",
            field: "id",
        })?;
        let Some(latest) = latest_version(self, owner_id).await? else {
            return Ok(None);
        };
        let id = latest.id.ok_or(PortalError::MissingField {
            object: "enumVersion",
            field: "id",
        })?;
        Ok(Some(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_client::{Meta, Pagination};

    #[test]
    fn test_page_conversion_carries_cursor() {
        let resp = ListResponse {
            data: vec![1u32, 2, 3],
            meta: Some(Meta {
                pagination: Some(Pagination {
                    next_page: Some(2),
                    count: Some(3),
                }),
            }),
        };
        let page = to_page(resp);
        assert_eq!(page.data, vec![1, 2, 3]);
        assert_eq!(page.next_page, Some(2));
    }

    #[test]
    fn test_page_conversion_without_meta_has_no_cursor() {
        let resp: ListResponse<u32> = ListResponse {
            data: vec![],
            meta: None,
        };
        assert_eq!(to_page(resp).next_page, None);
    }

    #[test]
    fn test_scope_is_required_for_domain_scoped_kinds() {
        let err = required_scope(None, "enum").unwrap_err();
        assert!(matches!(
            err,
            PortalError::MissingField {
                object: "enum",
                field: "applicationDomainId"
            }
        ));
    }
}

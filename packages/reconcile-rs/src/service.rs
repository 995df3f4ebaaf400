//! Narrow service interfaces the engine consumes.
//!
//! The reconciler never talks to the portal client directly; task
//! variants go through [`ObjectApi`] and [`VersionApi`], which keep the
//! surface to exactly what the state machine needs. Live adapters over
//! the HTTP client live in [`crate::portal`]; the in-memory portal in
//! the `testing` module implements the same traits.

use async_trait::async_trait;

use portal_client::PortalError;

use crate::error::HookError;
use crate::version::VersionError;

/// Page size used for the sequential version-listing loop.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Accessors the engine needs on an unversioned owner object.
pub trait RemoteObject {
    /// Server-assigned id; `None` on a payload not yet persisted.
    fn id(&self) -> Option<&str>;
    fn name(&self) -> &str;
}

/// Accessors the engine needs on a version object.
pub trait RemoteVersion {
    /// Wire name of the kind, for contract-violation errors.
    const KIND: &'static str;

    fn id(&self) -> Option<&str>;
    fn owner_id(&self) -> &str;
    /// Version string; a persisted version without one violates the
    /// portal contract.
    fn version(&self) -> Option<&str>;
}

/// CRUD surface over one unversioned object kind.
#[async_trait]
pub trait ObjectApi: Send + Sync {
    type Object: RemoteObject + Clone + Send + Sync;

    /// Exact-name lookup. `scope` is the owning application-domain id,
    /// `None` for kinds that are scoped globally (application domains).
    async fn find(
        &self,
        scope: Option<&str>,
        name: &str,
    ) -> Result<Option<Self::Object>, PortalError>;

    async fn create(&self, object: &Self::Object) -> Result<Self::Object, PortalError>;

    async fn update(&self, id: &str, object: &Self::Object)
        -> Result<Self::Object, PortalError>;

    async fn delete(&self, id: &str) -> Result<(), PortalError>;
}

/// One page of a version listing.
#[derive(Debug, Clone)]
pub struct VersionPage<V> {
    pub data: Vec<V>,
    pub next_page: Option<u32>,
}

/// Surface over one versioned object kind's version collection.
#[async_trait]
pub trait VersionApi: Send + Sync {
    type Version: RemoteVersion + Clone + Send + Sync;

    async fn list_versions(
        &self,
        owner_id: &str,
        page_size: u32,
        page_number: u32,
    ) -> Result<VersionPage<Self::Version>, PortalError>;

    async fn create_version(&self, version: &Self::Version)
        -> Result<Self::Version, PortalError>;

    async fn update_lifecycle_state(
        &self,
        version_id: &str,
        state_id: &str,
    ) -> Result<Self::Version, PortalError>;
}

// Shared handles delegate, so one store can back a task and still be
// inspected by the caller.
#[async_trait]
impl<A: ObjectApi> ObjectApi for std::sync::Arc<A> {
    type Object = A::Object;

    async fn find(
        &self,
        scope: Option<&str>,
        name: &str,
    ) -> Result<Option<Self::Object>, PortalError> {
        (**self).find(scope, name).await
    }

    async fn create(&self, object: &Self::Object) -> Result<Self::Object, PortalError> {
        (**self).create(object).await
    }

    async fn update(
        &self,
        id: &str,
        object: &Self::Object,
    ) -> Result<Self::Object, PortalError> {
        (**self).update(id, object).await
    }

    async fn delete(&self, id: &str) -> Result<(), PortalError> {
        (**self).delete(id).await
    }
}

#[async_trait]
impl<A: VersionApi> VersionApi for std::sync::Arc<A> {
    type Version = A::Version;

    async fn list_versions(
        &self,
        owner_id: &str,
        page_size: u32,
        page_number: u32,
    ) -> Result<VersionPage<Self::Version>, PortalError> {
        (**self).list_versions(owner_id, page_size, page_number).await
    }

    async fn create_version(&self, version: &Self::Version) -> Result<Self::Version, PortalError> {
        (**self).create_version(version).await
    }

    async fn update_lifecycle_state(
        &self,
        version_id: &str,
        state_id: &str,
    ) -> Result<Self::Version, PortalError> {
        (**self).update_lifecycle_state(version_id, state_id).await
    }
}

/// Lookup used when resolving variable topic segments to enum version
/// references.
#[async_trait]
pub trait EnumVersionLookup: Send + Sync {
    /// Id of the latest version of the enum named `enum_name` in the
    /// given domain, or `None` if the enum or its versions don't exist.
    async fn find_latest_enum_version_id(
        &self,
        application_domain_id: &str,
        enum_name: &str,
    ) -> Result<Option<String>, HookError>;
}

#[async_trait]
impl<L: EnumVersionLookup> EnumVersionLookup for std::sync::Arc<L> {
    async fn find_latest_enum_version_id(
        &self,
        application_domain_id: &str,
        enum_name: &str,
    ) -> Result<Option<String>, HookError> {
        (**self)
            .find_latest_enum_version_id(application_domain_id, enum_name)
            .await
    }
}

/// Latest version of an owner object, by semantic-version ordering.
///
/// Walks the paginated listing sequentially until the cursor is
/// exhausted or a page comes back empty. A version without a version
/// string is a contract violation; one that fails to parse as semver is
/// an invalid-version error.
pub async fn latest_version<A: VersionApi>(
    api: &A,
    owner_id: &str,
) -> Result<Option<A::Version>, HookError> {
    let mut page = 1u32;
    let mut best: Option<(semver::Version, A::Version)> = None;

    loop {
        let listed = api.list_versions(owner_id, DEFAULT_PAGE_SIZE, page).await?;
        if listed.data.is_empty() {
            break;
        }
        for candidate in listed.data {
            let raw = candidate
                .version()
                .ok_or(PortalError::MissingField {
                    object: A::Version::KIND,
                    field: "version",
                })?
                .to_string();
            let parsed = crate::version::parse(&raw)
                .map_err(|_| HookError::InvalidVersion(VersionError { version: raw }))?;
            if best.as_ref().map_or(true, |(current, _)| parsed > *current) {
                best = Some((parsed, candidate));
            }
        }
        match listed.next_page {
            Some(next) => page = next,
            None => break,
        }
    }

    Ok(best.map(|(_, version)| version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Clone)]
    struct FakeVersion {
        id: String,
        owner: String,
        version: Option<String>,
    }

    impl RemoteVersion for FakeVersion {
        const KIND: &'static str = "fakeVersion";

        fn id(&self) -> Option<&str> {
            Some(&self.id)
        }

        fn owner_id(&self) -> &str {
            &self.owner
        }

        fn version(&self) -> Option<&str> {
            self.version.as_deref()
        }
    }

    /// Serves pages of two entries each from a fixed list.
    struct PagedApi {
        versions: Vec<FakeVersion>,
        pages_served: AtomicU32,
    }

    #[async_trait]
    impl VersionApi for PagedApi {
        type Version = FakeVersion;

        async fn list_versions(
            &self,
            _owner_id: &str,
            _page_size: u32,
            page_number: u32,
        ) -> Result<VersionPage<FakeVersion>, PortalError> {
            self.pages_served.fetch_add(1, Ordering::SeqCst);
            let per_page = 2usize;
            let start = (page_number as usize - 1) * per_page;
            let data: Vec<_> = self
                .versions
                .iter()
                .skip(start)
                .take(per_page)
                .cloned()
                .collect();
            let has_more = start + per_page < self.versions.len();
            Ok(VersionPage {
                data,
                next_page: has_more.then_some(page_number + 1),
            })
        }

        async fn create_version(
            &self,
            _version: &FakeVersion,
        ) -> Result<FakeVersion, PortalError> {
            unreachable!("not used in these tests")
        }

        async fn update_lifecycle_state(
            &self,
            _version_id: &str,
            _state_id: &str,
        ) -> Result<FakeVersion, PortalError> {
            unreachable!("not used in these tests")
        }
    }

    fn fake(id: &str, version: &str) -> FakeVersion {
        FakeVersion {
            id: id.into(),
            owner: "owner-1".into(),
            version: Some(version.into()),
        }
    }

    #[tokio::test]
    async fn test_latest_version_spans_pages_and_uses_semver_order() {
        let api = PagedApi {
            versions: vec![
                fake("v1", "1.2.0"),
                fake("v2", "1.10.0"),
                fake("v3", "1.9.0"),
                fake("v4", "1.3.1"),
                fake("v5", "0.9.0"),
            ],
            pages_served: AtomicU32::new(0),
        };
        let latest = latest_version(&api, "owner-1").await.unwrap().unwrap();
        assert_eq!(latest.id, "v2");
        // All three pages were walked.
        assert!(api.pages_served.load(Ordering::SeqCst) >= 3);
    }

    #[tokio::test]
    async fn test_latest_version_none_when_no_versions() {
        let api = PagedApi {
            versions: vec![],
            pages_served: AtomicU32::new(0),
        };
        assert!(latest_version(&api, "owner-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_version_string_is_contract_violation() {
        let api = PagedApi {
            versions: vec![FakeVersion {
                id: "v1".into(),
                owner: "owner-1".into(),
                version: None,
            }],
            pages_served: AtomicU32::new(0),
        };
        let err = latest_version(&api, "owner-1").await.unwrap_err();
        assert!(matches!(
            err,
            HookError::Portal(PortalError::MissingField {
                object: "fakeVersion",
                field: "version",
            })
        ));
    }

    #[tokio::test]
    async fn test_unparseable_version_string_is_invalid_version() {
        let api = PagedApi {
            versions: vec![fake("v1", "not-semver")],
            pages_served: AtomicU32::new(0),
        };
        let err = latest_version(&api, "owner-1").await.unwrap_err();
        assert!(matches!(err, HookError::InvalidVersion(_)));
    }
}

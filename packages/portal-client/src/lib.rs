//! Typed REST client for the event-portal catalog API.
//!
//! A minimal client over the portal's v2 endpoints: application domains,
//! enums, schemas, events, event APIs, applications, and their versions.
//! Responses are unwrapped from the portal's `{ data, meta }` envelopes;
//! non-2xx responses surface as [`PortalError::Api`] with the body kept
//! for diagnosis.
//!
//! # Example
//!
//! ```rust,ignore
//! use portal_client::PortalClient;
//!
//! let client = PortalClient::new("https://api.portal.example".into(), token)?;
//! let domain = client.find_application_domain_by_name("acme-ops").await?;
//! ```

pub mod error;
pub mod types;

pub use error::{PortalError, Result};
pub use types::*;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Default per-request timeout. The reconciler adds no timeouts of its
/// own, so this is the only bound on a hung portal call.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct PortalClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl PortalClient {
    pub fn new(base_url: String, token: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), %message, "portal API error");
            return Err(PortalError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let resp = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn patch_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let resp = self
            .client
            .patch(self.url(path))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await?;
        Ok(Self::check(resp).await?.json().await?)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let resp = self
            .client
            .delete(self.url(path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    /// Exact-name lookup via the portal's list filter. Returns the first
    /// match; names are unique within their scope on the portal side.
    async fn find_by_name<T: DeserializeOwned>(
        &self,
        path: &str,
        name: &str,
        application_domain_id: Option<&str>,
    ) -> Result<Option<T>> {
        let mut query = vec![("name", name.to_string())];
        if let Some(domain_id) = application_domain_id {
            query.push(("applicationDomainId", domain_id.to_string()));
        }
        let listed: ListResponse<T> = self.get_json(path, &query).await?;
        Ok(listed.data.into_iter().next())
    }

    // =========================================================================
    // Lifecycle states
    // =========================================================================

    pub async fn list_states(&self) -> Result<Vec<StateDto>> {
        let resp: StatesResponse = self.get_json("states", &[]).await?;
        Ok(resp.data)
    }

    // =========================================================================
    // Application domains
    // =========================================================================

    pub async fn find_application_domain_by_name(
        &self,
        name: &str,
    ) -> Result<Option<ApplicationDomain>> {
        self.find_by_name("applicationDomains", name, None).await
    }

    pub async fn create_application_domain(
        &self,
        domain: &ApplicationDomain,
    ) -> Result<ApplicationDomain> {
        tracing::info!(name = %domain.name, "creating application domain");
        let resp: ApiResponse<ApplicationDomain> =
            self.post_json("applicationDomains", domain).await?;
        Ok(resp.data)
    }

    pub async fn update_application_domain(
        &self,
        id: &str,
        domain: &ApplicationDomain,
    ) -> Result<ApplicationDomain> {
        let resp: ApiResponse<ApplicationDomain> = self
            .patch_json(&format!("applicationDomains/{id}"), domain)
            .await?;
        Ok(resp.data)
    }

    pub async fn delete_application_domain(&self, id: &str) -> Result<()> {
        tracing::info!(id, "deleting application domain");
        self.delete(&format!("applicationDomains/{id}")).await
    }

    // =========================================================================
    // Enums
    // =========================================================================

    pub async fn find_enum_by_name(
        &self,
        application_domain_id: &str,
        name: &str,
    ) -> Result<Option<TopicAddressEnum>> {
        self.find_by_name("enums", name, Some(application_domain_id))
            .await
    }

    pub async fn create_enum(&self, object: &TopicAddressEnum) -> Result<TopicAddressEnum> {
        tracing::info!(name = %object.name, "creating enum");
        let resp: ApiResponse<TopicAddressEnum> = self.post_json("enums", object).await?;
        Ok(resp.data)
    }

    pub async fn update_enum(&self, id: &str, object: &TopicAddressEnum) -> Result<TopicAddressEnum> {
        let resp: ApiResponse<TopicAddressEnum> =
            self.patch_json(&format!("enums/{id}"), object).await?;
        Ok(resp.data)
    }

    pub async fn delete_enum(&self, id: &str) -> Result<()> {
        self.delete(&format!("enums/{id}")).await
    }

    pub async fn list_enum_versions(
        &self,
        enum_id: &str,
        page_size: u32,
        page_number: u32,
    ) -> Result<ListResponse<TopicAddressEnumVersion>> {
        self.get_json(
            &format!("enums/{enum_id}/versions"),
            &[
                ("pageSize", page_size.to_string()),
                ("pageNumber", page_number.to_string()),
            ],
        )
        .await
    }

    pub async fn create_enum_version(
        &self,
        version: &TopicAddressEnumVersion,
    ) -> Result<TopicAddressEnumVersion> {
        tracing::info!(enum_id = %version.enum_id, version = ?version.version, "creating enum version");
        let resp: ApiResponse<TopicAddressEnumVersion> =
            self.post_json("enumVersions", version).await?;
        Ok(resp.data)
    }

    pub async fn update_enum_version_state(
        &self,
        version_id: &str,
        state_id: &str,
    ) -> Result<TopicAddressEnumVersion> {
        let resp: ApiResponse<TopicAddressEnumVersion> = self
            .patch_json(
                &format!("enumVersions/{version_id}/state"),
                &serde_json::json!({ "stateId": state_id }),
            )
            .await?;
        Ok(resp.data)
    }

    // =========================================================================
    // Schemas
    // =========================================================================

    pub async fn find_schema_by_name(
        &self,
        application_domain_id: &str,
        name: &str,
    ) -> Result<Option<SchemaObject>> {
        self.find_by_name("schemas", name, Some(application_domain_id))
            .await
    }

    pub async fn create_schema(&self, object: &SchemaObject) -> Result<SchemaObject> {
        tracing::info!(name = %object.name, "creating schema");
        let resp: ApiResponse<SchemaObject> = self.post_json("schemas", object).await?;
        Ok(resp.data)
    }

    pub async fn update_schema(&self, id: &str, object: &SchemaObject) -> Result<SchemaObject> {
        let resp: ApiResponse<SchemaObject> =
            self.patch_json(&format!("schemas/{id}"), object).await?;
        Ok(resp.data)
    }

    pub async fn delete_schema(&self, id: &str) -> Result<()> {
        self.delete(&format!("schemas/{id}")).await
    }

    pub async fn list_schema_versions(
        &self,
        schema_id: &str,
        page_size: u32,
        page_number: u32,
    ) -> Result<ListResponse<SchemaVersion>> {
        self.get_json(
            &format!("schemas/{schema_id}/versions"),
            &[
                ("pageSize", page_size.to_string()),
                ("pageNumber", page_number.to_string()),
            ],
        )
        .await
    }

    pub async fn create_schema_version(&self, version: &SchemaVersion) -> Result<SchemaVersion> {
        tracing::info!(schema_id = %version.schema_id, version = ?version.version, "creating schema version");
        let resp: ApiResponse<SchemaVersion> = self.post_json("schemaVersions", version).await?;
        Ok(resp.data)
    }

    pub async fn update_schema_version_state(
        &self,
        version_id: &str,
        state_id: &str,
    ) -> Result<SchemaVersion> {
        let resp: ApiResponse<SchemaVersion> = self
            .patch_json(
                &format!("schemaVersions/{version_id}/state"),
                &serde_json::json!({ "stateId": state_id }),
            )
            .await?;
        Ok(resp.data)
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub async fn find_event_by_name(
        &self,
        application_domain_id: &str,
        name: &str,
    ) -> Result<Option<EventObject>> {
        self.find_by_name("events", name, Some(application_domain_id))
            .await
    }

    pub async fn create_event(&self, object: &EventObject) -> Result<EventObject> {
        tracing::info!(name = %object.name, "creating event");
        let resp: ApiResponse<EventObject> = self.post_json("events", object).await?;
        Ok(resp.data)
    }

    pub async fn update_event(&self, id: &str, object: &EventObject) -> Result<EventObject> {
        let resp: ApiResponse<EventObject> =
            self.patch_json(&format!("events/{id}"), object).await?;
        Ok(resp.data)
    }

    pub async fn delete_event(&self, id: &str) -> Result<()> {
        self.delete(&format!("events/{id}")).await
    }

    pub async fn list_event_versions(
        &self,
        event_id: &str,
        page_size: u32,
        page_number: u32,
    ) -> Result<ListResponse<EventVersion>> {
        self.get_json(
            &format!("events/{event_id}/versions"),
            &[
                ("pageSize", page_size.to_string()),
                ("pageNumber", page_number.to_string()),
            ],
        )
        .await
    }

    pub async fn create_event_version(&self, version: &EventVersion) -> Result<EventVersion> {
        tracing::info!(event_id = %version.event_id, version = ?version.version, "creating event version");
        let resp: ApiResponse<EventVersion> = self.post_json("eventVersions", version).await?;
        Ok(resp.data)
    }

    pub async fn update_event_version_state(
        &self,
        version_id: &str,
        state_id: &str,
    ) -> Result<EventVersion> {
        let resp: ApiResponse<EventVersion> = self
            .patch_json(
                &format!("eventVersions/{version_id}/state"),
                &serde_json::json!({ "stateId": state_id }),
            )
            .await?;
        Ok(resp.data)
    }

    // =========================================================================
    // Event APIs
    // =========================================================================

    pub async fn find_event_api_by_name(
        &self,
        application_domain_id: &str,
        name: &str,
    ) -> Result<Option<EventApi>> {
        self.find_by_name("eventApis", name, Some(application_domain_id))
            .await
    }

    pub async fn create_event_api(&self, object: &EventApi) -> Result<EventApi> {
        tracing::info!(name = %object.name, "creating event API");
        let resp: ApiResponse<EventApi> = self.post_json("eventApis", object).await?;
        Ok(resp.data)
    }

    pub async fn update_event_api(&self, id: &str, object: &EventApi) -> Result<EventApi> {
        let resp: ApiResponse<EventApi> =
            self.patch_json(&format!("eventApis/{id}"), object).await?;
        Ok(resp.data)
    }

    pub async fn delete_event_api(&self, id: &str) -> Result<()> {
        self.delete(&format!("eventApis/{id}")).await
    }

    pub async fn list_event_api_versions(
        &self,
        event_api_id: &str,
        page_size: u32,
        page_number: u32,
    ) -> Result<ListResponse<EventApiVersion>> {
        self.get_json(
            &format!("eventApis/{event_api_id}/versions"),
            &[
                ("pageSize", page_size.to_string()),
                ("pageNumber", page_number.to_string()),
            ],
        )
        .await
    }

    pub async fn create_event_api_version(
        &self,
        version: &EventApiVersion,
    ) -> Result<EventApiVersion> {
        tracing::info!(event_api_id = %version.event_api_id, version = ?version.version, "creating event API version");
        let resp: ApiResponse<EventApiVersion> =
            self.post_json("eventApiVersions", version).await?;
        Ok(resp.data)
    }

    pub async fn update_event_api_version_state(
        &self,
        version_id: &str,
        state_id: &str,
    ) -> Result<EventApiVersion> {
        let resp: ApiResponse<EventApiVersion> = self
            .patch_json(
                &format!("eventApiVersions/{version_id}/state"),
                &serde_json::json!({ "stateId": state_id }),
            )
            .await?;
        Ok(resp.data)
    }

    // =========================================================================
    // Applications
    // =========================================================================

    pub async fn find_application_by_name(
        &self,
        application_domain_id: &str,
        name: &str,
    ) -> Result<Option<Application>> {
        self.find_by_name("applications", name, Some(application_domain_id))
            .await
    }

    pub async fn create_application(&self, object: &Application) -> Result<Application> {
        tracing::info!(name = %object.name, "creating application");
        let resp: ApiResponse<Application> = self.post_json("applications", object).await?;
        Ok(resp.data)
    }

    pub async fn update_application(&self, id: &str, object: &Application) -> Result<Application> {
        let resp: ApiResponse<Application> = self
            .patch_json(&format!("applications/{id}"), object)
            .await?;
        Ok(resp.data)
    }

    pub async fn delete_application(&self, id: &str) -> Result<()> {
        self.delete(&format!("applications/{id}")).await
    }

    pub async fn list_application_versions(
        &self,
        application_id: &str,
        page_size: u32,
        page_number: u32,
    ) -> Result<ListResponse<ApplicationVersion>> {
        self.get_json(
            &format!("applications/{application_id}/versions"),
            &[
                ("pageSize", page_size.to_string()),
                ("pageNumber", page_number.to_string()),
            ],
        )
        .await
    }

    pub async fn create_application_version(
        &self,
        version: &ApplicationVersion,
    ) -> Result<ApplicationVersion> {
        tracing::info!(application_id = %version.application_id, version = ?version.version, "creating application version");
        let resp: ApiResponse<ApplicationVersion> =
            self.post_json("applicationVersions", version).await?;
        Ok(resp.data)
    }

    pub async fn update_application_version_state(
        &self,
        version_id: &str,
        state_id: &str,
    ) -> Result<ApplicationVersion> {
        let resp: ApiResponse<ApplicationVersion> = self
            .patch_json(
                &format!("applicationVersions/{version_id}/state"),
                &serde_json::json!({ "stateId": state_id }),
            )
            .await?;
        Ok(resp.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slashes() {
        let client = PortalClient::new("https://api.example.com/".into(), "t".into()).unwrap();
        assert_eq!(
            client.url("/applicationDomains"),
            "https://api.example.com/applicationDomains"
        );
        assert_eq!(client.url("enums"), "https://api.example.com/enums");
    }
}

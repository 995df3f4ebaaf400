//! Application-domain task. Domains are the one globally scoped kind;
//! everything else hangs off a domain id.

use serde::Serialize;
use serde_json::{json, Value};

use portal_client::ApplicationDomain;

use crate::error::HookError;
use crate::service::ObjectApi;
use crate::task::{ObjectType, TaskDriver, TaskSettings};

use super::{ObjectHooks, ObjectTaskKind};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDomainConfig {
    pub name: String,
    pub description: Option<String>,
    pub unique_topic_address_enforcement_enabled: bool,
    pub topic_domain_enforcement_enabled: bool,
}

impl ApplicationDomainConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            unique_topic_address_enforcement_enabled: true,
            topic_domain_enforcement_enabled: false,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

pub struct ApplicationDomainKind<A> {
    api: A,
    config: ApplicationDomainConfig,
}

impl<A> ObjectTaskKind for ApplicationDomainKind<A>
where
    A: ObjectApi<Object = ApplicationDomain>,
{
    type Api = A;
    type Object = ApplicationDomain;

    fn object_type(&self) -> ObjectType {
        ObjectType::ApplicationDomain
    }

    fn api(&self) -> &A {
        &self.api
    }

    fn scope(&self) -> Option<&str> {
        None
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn config_value(&self) -> Value {
        serde_json::to_value(&self.config).unwrap_or(Value::Null)
    }

    fn compare_existing(&self, current: &ApplicationDomain) -> Result<Value, HookError> {
        Ok(json!({
            "name": current.name,
            "description": current.description,
            "uniqueTopicAddressEnforcementEnabled": current.unique_topic_address_enforcement_enabled,
            "topicDomainEnforcementEnabled": current.topic_domain_enforcement_enabled,
        }))
    }

    fn compare_requested(&self) -> Result<Value, HookError> {
        Ok(json!({
            "name": self.config.name,
            "description": self.config.description,
            "uniqueTopicAddressEnforcementEnabled": self.config.unique_topic_address_enforcement_enabled,
            "topicDomainEnforcementEnabled": self.config.topic_domain_enforcement_enabled,
        }))
    }

    fn build_object(&self, existing_id: Option<&str>) -> Result<ApplicationDomain, HookError> {
        Ok(ApplicationDomain {
            id: existing_id.map(str::to_string),
            name: self.config.name.clone(),
            description: self.config.description.clone(),
            unique_topic_address_enforcement_enabled: self
                .config
                .unique_topic_address_enforcement_enabled,
            topic_domain_enforcement_enabled: self.config.topic_domain_enforcement_enabled,
            ..Default::default()
        })
    }
}

pub type ApplicationDomainTask<A> = TaskDriver<ObjectHooks<ApplicationDomainKind<A>>>;

pub fn application_domain_task<A>(
    api: A,
    config: ApplicationDomainConfig,
    settings: TaskSettings,
) -> ApplicationDomainTask<A>
where
    A: ObjectApi<Object = ApplicationDomain>,
{
    TaskDriver::new(ObjectHooks::new(ApplicationDomainKind { api, config }), settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskAction;
    use crate::testing::MemoryObjects;
    use std::sync::Arc;

    fn store() -> Arc<MemoryObjects<ApplicationDomain>> {
        Arc::new(MemoryObjects::new("dom"))
    }

    #[tokio::test]
    async fn test_creates_missing_domain() {
        let store = store();
        let config = ApplicationDomainConfig::new("acme-ops").description("ops objects");
        let outcome = application_domain_task(store.clone(), config, TaskSettings::present())
            .execute()
            .await
            .unwrap();
        assert_eq!(outcome.action, TaskAction::Create);
        assert_eq!(store.len(), 1);
        assert_eq!(outcome.object_keys.owner_object_id.as_deref(), Some("dom-1"));
    }

    #[tokio::test]
    async fn test_converged_domain_is_no_action() {
        let store = store();
        let config = ApplicationDomainConfig::new("acme-ops");
        application_domain_task(store.clone(), config.clone(), TaskSettings::present())
            .execute()
            .await
            .unwrap();
        let outcome = application_domain_task(store.clone(), config, TaskSettings::present())
            .execute()
            .await
            .unwrap();
        assert_eq!(outcome.action, TaskAction::NoAction);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_drifted_domain_is_patched_in_place() {
        let store = store();
        application_domain_task(
            store.clone(),
            ApplicationDomainConfig::new("acme-ops"),
            TaskSettings::present(),
        )
        .execute()
        .await
        .unwrap();

        let config = ApplicationDomainConfig::new("acme-ops").description("now documented");
        let outcome = application_domain_task(store.clone(), config, TaskSettings::present())
            .execute()
            .await
            .unwrap();
        assert_eq!(outcome.action, TaskAction::Update);
        assert_eq!(store.len(), 1);
        let stored = &store.all()[0];
        assert_eq!(stored.id.as_deref(), Some("dom-1"));
        assert_eq!(stored.description.as_deref(), Some("now documented"));
        let diff = &outcome.transaction_log.update_check.as_ref().unwrap().diff;
        assert!(diff.contains_key("description"));
    }

    #[tokio::test]
    async fn test_absent_target_deletes_domain() {
        let store = store();
        let config = ApplicationDomainConfig::new("acme-ops");
        application_domain_task(store.clone(), config.clone(), TaskSettings::present())
            .execute()
            .await
            .unwrap();
        let outcome = application_domain_task(store.clone(), config, TaskSettings::absent())
            .execute()
            .await
            .unwrap();
        assert_eq!(outcome.action, TaskAction::Delete);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_checkmode_create_leaves_portal_untouched() {
        let store = store();
        let outcome = application_domain_task(
            store.clone(),
            ApplicationDomainConfig::new("acme-ops"),
            TaskSettings::present().checkmode(true),
        )
        .execute()
        .await
        .unwrap();
        assert_eq!(outcome.action, TaskAction::WouldCreate);
        assert!(store.is_empty());
    }
}

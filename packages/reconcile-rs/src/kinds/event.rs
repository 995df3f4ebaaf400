//! Event tasks: the owner object and its topic-addressed versions.
//!
//! An event version carries a delivery descriptor built from the
//! configured topic pattern. Variable segments are bound to the latest
//! version of the same-named enum in the owning domain when one exists;
//! otherwise the segment stays an unbound variable.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use portal_client::{AddressLevel, DeliveryDescriptor, EventObject, EventVersion, TopicAddress};

use crate::error::HookError;
use crate::lifecycle::{LifecycleState, LifecycleStates};
use crate::service::{EnumVersionLookup, ObjectApi, VersionApi};
use crate::task::{ObjectType, TaskDriver, TaskSettings};
use crate::topic::{parse_topic, TopicLevel};
use crate::version_task::{VersionSettings, VersionTaskKind, VersionedHooks};

use super::{ObjectHooks, ObjectTaskKind};

pub const BROKER_TYPE_SOLACE: &str = "solace";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventConfig {
    pub application_domain_id: String,
    pub name: String,
    pub shared: bool,
}

impl EventConfig {
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

pub struct EventKind<A> {
    api: A,
    config: EventConfig,
}

impl<A> ObjectTaskKind for EventKind<A>
where
    A: ObjectApi<Object = EventObject>,
{
    type Api = A;
    type Object = EventObject;

    fn object_type(&self) -> ObjectType {
        ObjectType::Event
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

    fn compare_existing(&self, current: &EventObject) -> Result<Value, HookError> {
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

    fn build_object(&self, existing_id: Option<&str>) -> Result<EventObject, HookError> {
        Ok(EventObject {
            id: existing_id.map(str::to_string),
            name: self.config.name.clone(),
            application_domain_id: self.config.application_domain_id.clone(),
            shared: self.config.shared,
        })
    }
}

pub type EventTask<A> = TaskDriver<ObjectHooks<EventKind<A>>>;

pub fn event_task<A>(api: A, config: EventConfig, settings: TaskSettings) -> EventTask<A>
where
    A: ObjectApi<Object = EventObject>,
{
    TaskDriver::new(ObjectHooks::new(EventKind { api, config }), settings)
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventVersionConfig {
    /// Domain the topic's enum variables are resolved in.
    pub application_domain_id: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    /// Topic pattern, e.g. `acme/orders/{Region}/created`.
    pub topic: String,
    pub broker_type: String,
    pub schema_version_id: Option<String>,
    pub state: LifecycleState,
}

impl EventVersionConfig {
    pub fn new(application_domain_id: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            application_domain_id: application_domain_id.into(),
            display_name: None,
            description: None,
            topic: topic.into(),
            broker_type: BROKER_TYPE_SOLACE.to_string(),
            schema_version_id: None,
            state: LifecycleState::Released,
        }
    }

    pub fn schema_version(mut self, schema_version_id: impl Into<String>) -> Self {
        self.schema_version_id = Some(schema_version_id.into());
        self
    }

    pub fn state(mut self, state: LifecycleState) -> Self {
        self.state = state;
        self
    }
}

fn level_term(level: &AddressLevel) -> Value {
    json!({
        "name": level.name,
        "addressLevelType": level.address_level_type,
    })
}

pub struct EventVersionKind<A, L> {
    api: A,
    lookup: L,
    event_id: String,
    config: EventVersionConfig,
    states: LifecycleStates,
}

impl<A, L: EnumVersionLookup> EventVersionKind<A, L> {
    fn state_id(&self) -> Result<String, HookError> {
        Ok(self.states.resolve(self.config.state)?.to_string())
    }

    /// Resolve the topic pattern into portal address levels, binding
    /// variable segments to their domain enums where possible.
    async fn address_levels(&self) -> Result<Vec<AddressLevel>, HookError> {
        let mut levels = Vec::new();
        for level in parse_topic(&self.config.topic)? {
            levels.push(match level {
                TopicLevel::Literal(name) => AddressLevel::literal(name),
                TopicLevel::Variable(name) => {
                    let enum_version_id = self
                        .lookup
                        .find_latest_enum_version_id(&self.config.application_domain_id, &name)
                        .await?;
                    AddressLevel::variable(name, enum_version_id)
                }
            });
        }
        Ok(levels)
    }
}

#[async_trait]
impl<A, L> VersionTaskKind for EventVersionKind<A, L>
where
    A: VersionApi<Version = EventVersion>,
    L: EnumVersionLookup,
{
    type Api = A;
    type Version = EventVersion;

    fn object_type(&self) -> ObjectType {
        ObjectType::EventVersion
    }

    fn api(&self) -> &A {
        &self.api
    }

    fn owner_id(&self) -> &str {
        &self.event_id
    }

    fn config_value(&self) -> Value {
        serde_json::to_value(&self.config).unwrap_or(Value::Null)
    }

    fn compare_existing(&self, current: &EventVersion) -> Result<Value, HookError> {
        // Both sides compare address levels by name and type only; which
        // enum version a variable is bound to tracks the enum's own
        // lifecycle and is not drift of the event version.
        let descriptor = current.delivery_descriptor.as_ref().map(|descriptor| {
            json!({
                "brokerType": descriptor.broker_type,
                "address": descriptor.address.as_ref().map(|address| {
                    json!({
                        "addressType": address.address_type,
                        "addressLevels": address
                            .address_levels
                            .iter()
                            .map(level_term)
                            .collect::<Vec<Value>>(),
                    })
                }),
            })
        });
        Ok(json!({
            "displayName": current.display_name,
            "description": current.description,
            "schemaVersionId": current.schema_version_id,
            "stateId": current.state_id,
            "deliveryDescriptor": descriptor,
        }))
    }

    fn compare_requested(&self) -> Result<Value, HookError> {
        let levels: Vec<Value> = parse_topic(&self.config.topic)?
            .into_iter()
            .map(|level| match level {
                TopicLevel::Literal(name) => json!({
                    "name": name,
                    "addressLevelType": "literal",
                }),
                TopicLevel::Variable(name) => json!({
                    "name": name,
                    "addressLevelType": "variable",
                }),
            })
            .collect();
        Ok(json!({
            "displayName": self.config.display_name,
            "description": self.config.description,
            "schemaVersionId": self.config.schema_version_id,
            "stateId": self.state_id()?,
            "deliveryDescriptor": {
                "brokerType": self.config.broker_type,
                "address": {
                    "addressType": "topic",
                    "addressLevels": levels,
                },
            },
        }))
    }

    async fn build_version(&self, version: &str) -> Result<EventVersion, HookError> {
        Ok(EventVersion {
            id: None,
            event_id: self.event_id.clone(),
            version: Some(version.to_string()),
            display_name: self.config.display_name.clone(),
            description: self.config.description.clone(),
            schema_version_id: self.config.schema_version_id.clone(),
            delivery_descriptor: Some(DeliveryDescriptor {
                broker_type: Some(self.config.broker_type.clone()),
                address: Some(TopicAddress {
                    address_type: Some("topic".to_string()),
                    address_levels: self.address_levels().await?,
                }),
            }),
            state_id: Some(self.state_id()?),
        })
    }

    fn lifecycle_state_id(&self) -> Result<Option<String>, HookError> {
        self.state_id().map(Some)
    }
}

pub type EventVersionTask<A, L> = TaskDriver<VersionedHooks<EventVersionKind<A, L>>>;

pub fn event_version_task<A, L>(
    api: A,
    lookup: L,
    event_id: impl Into<String>,
    config: EventVersionConfig,
    states: LifecycleStates,
    versioning: VersionSettings,
    settings: TaskSettings,
) -> EventVersionTask<A, L>
where
    A: VersionApi<Version = EventVersion>,
    L: EnumVersionLookup,
{
    TaskDriver::new(
        VersionedHooks::new(
            EventVersionKind {
                api,
                lookup,
                event_id: event_id.into(),
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
    use crate::error::TaskError;
    use crate::task::TaskAction;
    use crate::testing::InMemoryPortal;
    use portal_client::{EnumValue, TopicAddressEnum, TopicAddressEnumVersion};

    fn seeded_region_enum(portal: &InMemoryPortal) {
        let owner = portal.enums.seed(TopicAddressEnum {
            id: None,
            name: "Region".into(),
            application_domain_id: "dom-1".into(),
            shared: false,
        });
        portal.enum_versions.seed(TopicAddressEnumVersion {
            id: None,
            enum_id: owner.id.unwrap(),
            version: Some("1.0.0".into()),
            display_name: None,
            description: None,
            state_id: Some("state-released".into()),
            values: vec![EnumValue {
                value: "emea".into(),
                label: Some("emea".into()),
            }],
        });
    }

    fn task(
        portal: &InMemoryPortal,
        topic: &str,
        settings: TaskSettings,
    ) -> EventVersionTask<
        std::sync::Arc<crate::testing::MemoryVersions<EventVersion>>,
        crate::testing::MemoryEnumLookup,
    > {
        event_version_task(
            portal.event_versions.clone(),
            portal.enum_lookup(),
            "event-1",
            EventVersionConfig::new("dom-1", topic),
            portal.states.clone(),
            VersionSettings::default(),
            settings,
        )
    }

    #[tokio::test]
    async fn test_variable_segment_binds_to_latest_enum_version() {
        let portal = InMemoryPortal::new();
        seeded_region_enum(&portal);

        let outcome = task(&portal, "acme/orders/{Region}/created", TaskSettings::present())
            .execute()
            .await
            .unwrap();
        assert_eq!(outcome.action, TaskAction::CreateFirstVersion);

        let descriptor = outcome.object.unwrap().delivery_descriptor.unwrap();
        let levels = descriptor.address.unwrap().address_levels;
        assert_eq!(levels.len(), 4);
        assert_eq!(levels[2].address_level_type, "variable");
        assert_eq!(levels[2].enum_version_id.as_deref(), Some("enumver-1"));
        assert_eq!(levels[3], AddressLevel::literal("created"));
    }

    #[tokio::test]
    async fn test_unknown_enum_leaves_variable_unbound() {
        let portal = InMemoryPortal::new();
        let outcome = task(&portal, "acme/{Nowhere}/created", TaskSettings::present())
            .execute()
            .await
            .unwrap();
        let descriptor = outcome.object.unwrap().delivery_descriptor.unwrap();
        let levels = descriptor.address.unwrap().address_levels;
        assert_eq!(levels[1].address_level_type, "variable");
        assert_eq!(levels[1].enum_version_id, None);
    }

    #[tokio::test]
    async fn test_malformed_topic_is_a_classified_error() {
        let portal = InMemoryPortal::new();
        let err = task(&portal, "acme//created", TaskSettings::present())
            .execute()
            .await
            .unwrap_err();
        assert!(matches!(err, TaskError::InvalidTopicAddress { .. }));
        assert!(portal.event_versions.is_empty());
    }

    #[tokio::test]
    async fn test_unchanged_topic_is_no_action() {
        let portal = InMemoryPortal::new();
        seeded_region_enum(&portal);
        task(&portal, "acme/{Region}/created", TaskSettings::present())
            .execute()
            .await
            .unwrap();
        let outcome = task(&portal, "acme/{Region}/created", TaskSettings::present())
            .execute()
            .await
            .unwrap();
        assert_eq!(outcome.action, TaskAction::NoAction);
        assert_eq!(portal.event_versions.len(), 1);
    }
}

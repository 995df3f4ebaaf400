//! DTOs for the event-portal REST API.
//!
//! Field names follow the wire format (camelCase) via serde renames.
//! The same structs serve as create/update payloads and as response
//! bodies: server-assigned fields (`id`, timestamps) are `Option` and
//! skipped on serialization when unset.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope for single-object portal responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Envelope for list responses, including pagination metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    pub meta: Option<Meta>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    pub pagination: Option<Pagination>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    #[serde(rename = "nextPage")]
    pub next_page: Option<u32>,
    pub count: Option<u64>,
}

/// A lifecycle state as listed by the portal (`Draft`, `Released`, ...).
///
/// Ids are backend-specific and treated as opaque strings everywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateDto {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatesResponse {
    pub data: Vec<StateDto>,
}

/// Unversioned parent namespace that owns every other object kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationDomain {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "uniqueTopicAddressEnforcementEnabled", default)]
    pub unique_topic_address_enforcement_enabled: bool,
    #[serde(rename = "topicDomainEnforcementEnabled", default)]
    pub topic_domain_enforcement_enabled: bool,
    #[serde(rename = "createdTime", skip_serializing_if = "Option::is_none")]
    pub created_time: Option<DateTime<Utc>>,
}

/// Enumeration owner object ("topic address enum" in portal terms).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicAddressEnum {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "applicationDomainId")]
    pub application_domain_id: String,
    #[serde(default)]
    pub shared: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicAddressEnumVersion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "enumId")]
    pub enum_id: String,
    /// Absent on malformed server responses; the reconciler treats that
    /// as a contract violation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "stateId", skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
    #[serde(default = "Vec::new")]
    pub values: Vec<EnumValue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnumValue {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Schema owner object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "applicationDomainId")]
    pub application_domain_id: String,
    #[serde(rename = "schemaType", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(rename = "contentType", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default)]
    pub shared: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaVersion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "schemaId")]
    pub schema_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(rename = "stateId", skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
}

/// Event owner object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "applicationDomainId")]
    pub application_domain_id: String,
    #[serde(default)]
    pub shared: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventVersion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "eventId")]
    pub event_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "schemaVersionId", skip_serializing_if = "Option::is_none")]
    pub schema_version_id: Option<String>,
    #[serde(rename = "deliveryDescriptor", skip_serializing_if = "Option::is_none")]
    pub delivery_descriptor: Option<DeliveryDescriptor>,
    #[serde(rename = "stateId", skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeliveryDescriptor {
    #[serde(rename = "brokerType", skip_serializing_if = "Option::is_none")]
    pub broker_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<TopicAddress>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TopicAddress {
    #[serde(rename = "addressType", skip_serializing_if = "Option::is_none")]
    pub address_type: Option<String>,
    #[serde(rename = "addressLevels", default = "Vec::new")]
    pub address_levels: Vec<AddressLevel>,
}

/// One segment of a topic address, either a literal or a variable bound
/// to an enum version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AddressLevel {
    pub name: String,
    #[serde(rename = "addressLevelType")]
    pub address_level_type: String,
    #[serde(rename = "enumVersionId", skip_serializing_if = "Option::is_none")]
    pub enum_version_id: Option<String>,
}

impl AddressLevel {
    pub fn literal(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address_level_type: "literal".into(),
            enum_version_id: None,
        }
    }

    pub fn variable(name: impl Into<String>, enum_version_id: Option<String>) -> Self {
        Self {
            name: name.into(),
            address_level_type: "variable".into(),
            enum_version_id,
        }
    }
}

/// Event API owner object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventApi {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "applicationDomainId")]
    pub application_domain_id: String,
    #[serde(default)]
    pub shared: bool,
    #[serde(rename = "brokerType", skip_serializing_if = "Option::is_none")]
    pub broker_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventApiVersion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "eventApiId")]
    pub event_api_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "producedEventVersionIds",
        default = "Vec::new",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub produced_event_version_ids: Vec<String>,
    #[serde(
        rename = "consumedEventVersionIds",
        default = "Vec::new",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub consumed_event_version_ids: Vec<String>,
    #[serde(rename = "stateId", skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
}

/// Application owner object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Application {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(rename = "applicationDomainId")]
    pub application_domain_id: String,
    #[serde(rename = "applicationType", skip_serializing_if = "Option::is_none")]
    pub application_type: Option<String>,
    #[serde(rename = "brokerType", skip_serializing_if = "Option::is_none")]
    pub broker_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationVersion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "applicationId")]
    pub application_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "declaredProducedEventVersionIds",
        default = "Vec::new",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub declared_produced_event_version_ids: Vec<String>,
    #[serde(
        rename = "declaredConsumedEventVersionIds",
        default = "Vec::new",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub declared_consumed_event_version_ids: Vec<String>,
    #[serde(rename = "stateId", skip_serializing_if = "Option::is_none")]
    pub state_id: Option<String>,
}

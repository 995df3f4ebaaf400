//! Lifecycle-state name resolution.
//!
//! The portal identifies lifecycle states by opaque, backend-specific
//! ids. Callers build one [`LifecycleStates`] table from the portal's
//! states listing and pass it into tasks explicitly; there is no global
//! cache, and an unresolvable name is a checkable error rather than a
//! placeholder id.

use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use portal_client::{PortalClient, PortalError, StateDto};

use crate::error::HookError;

/// The portal's release lifecycle for version objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LifecycleState {
    Draft,
    Released,
    Deprecated,
    Retired,
}

impl LifecycleState {
    pub const ALL: [LifecycleState; 4] = [
        LifecycleState::Draft,
        LifecycleState::Released,
        LifecycleState::Deprecated,
        LifecycleState::Retired,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LifecycleState::Draft => "Draft",
            LifecycleState::Released => "Released",
            LifecycleState::Deprecated => "Deprecated",
            LifecycleState::Retired => "Retired",
        }
    }
}

/// A state name with no known portal id. Either the table was never
/// initialized from the portal, or the portal stopped listing the state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("no portal id known for lifecycle state `{name}`; was the state table initialized?")]
pub struct UnknownLifecycleState {
    pub name: &'static str,
}

impl From<UnknownLifecycleState> for HookError {
    fn from(err: UnknownLifecycleState) -> Self {
        HookError::internal(err.to_string())
    }
}

/// Explicit name → id table, dependency-injected into version tasks.
#[derive(Debug, Clone, Default)]
pub struct LifecycleStates {
    ids: HashMap<LifecycleState, String>,
}

impl LifecycleStates {
    /// Build the table from the portal's states listing. Unrecognized
    /// state names are ignored; missing well-known names surface later,
    /// at resolution time.
    pub fn from_states(states: &[StateDto]) -> Self {
        let mut ids = HashMap::new();
        for state in states {
            for known in LifecycleState::ALL {
                if state.name.eq_ignore_ascii_case(known.name()) {
                    ids.insert(known, state.id.clone());
                }
            }
        }
        Self { ids }
    }

    /// Fetch the listing and build the table in one call.
    pub async fn fetch(client: &PortalClient) -> Result<Self, PortalError> {
        Ok(Self::from_states(&client.list_states().await?))
    }

    pub fn resolve(&self, state: LifecycleState) -> Result<&str, UnknownLifecycleState> {
        self.ids
            .get(&state)
            .map(String::as_str)
            .ok_or(UnknownLifecycleState { name: state.name() })
    }

    pub fn is_initialized(&self) -> bool {
        LifecycleState::ALL
            .iter()
            .all(|state| self.ids.contains_key(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(id: &str, name: &str) -> StateDto {
        StateDto {
            id: id.into(),
            name: name.into(),
        }
    }

    #[test]
    fn test_resolves_well_known_names_case_insensitively() {
        let table = LifecycleStates::from_states(&[
            state("1", "draft"),
            state("2", "Released"),
            state("3", "DEPRECATED"),
            state("4", "Retired"),
        ]);
        assert!(table.is_initialized());
        assert_eq!(table.resolve(LifecycleState::Released).unwrap(), "2");
        assert_eq!(table.resolve(LifecycleState::Draft).unwrap(), "1");
    }

    #[test]
    fn test_uninitialized_table_is_a_checkable_error() {
        let table = LifecycleStates::default();
        assert!(!table.is_initialized());
        let err = table.resolve(LifecycleState::Released).unwrap_err();
        assert_eq!(err.name, "Released");
        assert!(err.to_string().contains("Released"));
    }

    #[test]
    fn test_unknown_portal_states_are_ignored() {
        let table = LifecycleStates::from_states(&[
            state("1", "Draft"),
            state("9", "SomethingNew"),
        ]);
        assert_eq!(table.resolve(LifecycleState::Draft).unwrap(), "1");
        assert!(table.resolve(LifecycleState::Retired).is_err());
    }
}

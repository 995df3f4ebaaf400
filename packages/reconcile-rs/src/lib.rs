//! Idempotent reconciliation tasks for the event-portal catalog.
//!
//! Tasks decide, hooks execute. A task declares the desired state of one
//! catalog object (PRESENT with a given configuration, or ABSENT) and
//! the fixed driver in [`task`] converges the portal toward it: fetch,
//! deep-compare, then create, patch, delete, or do nothing. Version
//! objects are immutable, so their tasks append a new semver-numbered
//! version instead of patching (see [`version_task`]).
//!
//! Every execution, including a no-op, yields a transaction log of what
//! was fetched, what differed, and what was (or would have been) done.
//! Checkmode runs the same machine with mutations swapped for previews,
//! so a dry run reads live state and reports `WOULD_*` actions without
//! touching the portal.
//!
//! ```rust,ignore
//! use portal_reconcile::kinds::{application_domain_task, ApplicationDomainConfig};
//! use portal_reconcile::portal::DomainService;
//! use portal_reconcile::task::TaskSettings;
//!
//! let task = application_domain_task(
//!     DomainService::new(client),
//!     ApplicationDomainConfig::new("acme-ops"),
//!     TaskSettings::present(),
//! );
//! let outcome = task.execute().await?;
//! println!("{:?}", outcome.action);
//! ```

pub mod compare;
pub mod error;
pub mod kinds;
pub mod lifecycle;
pub mod portal;
pub mod service;
pub mod task;
pub mod topic;
pub mod transaction;
pub mod version;
pub mod version_task;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::{HookError, TaskError};
pub use lifecycle::{LifecycleState, LifecycleStates};
pub use task::{
    ObjectKeys, ObjectType, TargetState, TaskAction, TaskDriver, TaskHooks, TaskOutcome,
    TaskSettings,
};
pub use transaction::{TransactionContext, TransactionLog};
pub use version::{VersionStrategy, INITIAL_VERSION};
pub use version_task::VersionSettings;

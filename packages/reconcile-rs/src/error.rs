//! Task error types and the single classification boundary.
//!
//! Hooks and helpers below the task boundary return [`HookError`], which
//! carries no transaction log. The driver catches each hook failure once,
//! classifies it, and re-raises exactly one [`TaskError`] with the
//! in-progress log attached. No raw transport error and no `anyhow`
//! crosses the task boundary.

use thiserror::Error;

use portal_client::PortalError;

use crate::transaction::TransactionLog;
use crate::version::VersionError;

/// Failure raised below the task boundary, before classification.
#[derive(Debug, Error)]
pub enum HookError {
    #[error(transparent)]
    Portal(#[from] PortalError),

    #[error(transparent)]
    InvalidVersion(#[from] VersionError),

    #[error(transparent)]
    InvalidTopic(#[from] crate::topic::TopicError),

    /// Requested exact version does not sort above the existing latest.
    #[error("requested version {requested} is not greater than existing version {existing}")]
    VersionStrategy { requested: String, existing: String },

    #[error("{feature} is not supported")]
    FeatureNotSupported { feature: &'static str },

    /// A hook produced an impossible state; a bug in a task variant.
    #[error("task invariant violated: {message}")]
    Internal { message: String },
}

impl HookError {
    pub fn internal(message: impl Into<String>) -> Self {
        HookError::Internal {
            message: message.into(),
        }
    }
}

impl From<crate::compare::CompareError> for HookError {
    fn from(err: crate::compare::CompareError) -> Self {
        HookError::internal(err.to_string())
    }
}

/// Error returned by `execute()`. Every variant carries the transaction
/// log accumulated up to the failure.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The portal service failed at the HTTP level.
    #[error("portal request failed: {source}")]
    Transport {
        #[source]
        source: PortalError,
        log: Box<TransactionLog>,
    },

    /// The portal answered, but the response violates the contract the
    /// reconciler depends on (e.g. a version object without a version).
    #[error("portal response for {object} is missing required field `{field}`")]
    ApiContent {
        object: &'static str,
        field: &'static str,
        log: Box<TransactionLog>,
    },

    /// Caller supplied a version string that is not semver.
    #[error("invalid semantic version `{version}`")]
    InvalidVersionFormat {
        version: String,
        log: Box<TransactionLog>,
    },

    /// Caller supplied a topic address the engine cannot parse.
    #[error("invalid topic address: {source}")]
    InvalidTopicAddress {
        #[source]
        source: crate::topic::TopicError,
        log: Box<TransactionLog>,
    },

    /// Exact-version strategy rejected: requested must be strictly
    /// greater than the existing latest. In checkmode this is downgraded
    /// to a `WOULD_FAIL_*` outcome instead.
    #[error("requested version {requested} is not greater than existing version {existing}")]
    VersionStrategyValidation {
        requested: String,
        existing: String,
        log: Box<TransactionLog>,
    },

    /// The operation has no portal counterpart (e.g. deleting a version).
    #[error("{feature} is not supported")]
    FeatureNotSupported {
        feature: &'static str,
        log: Box<TransactionLog>,
    },

    /// Defensive invariant violation; a bug in a concrete task variant.
    #[error("task invariant violated: {message}")]
    Internal {
        message: String,
        log: Box<TransactionLog>,
    },
}

impl TaskError {
    /// The transaction log accumulated up to the failure.
    pub fn transaction_log(&self) -> &TransactionLog {
        match self {
            TaskError::Transport { log, .. }
            | TaskError::ApiContent { log, .. }
            | TaskError::InvalidVersionFormat { log, .. }
            | TaskError::InvalidTopicAddress { log, .. }
            | TaskError::VersionStrategyValidation { log, .. }
            | TaskError::FeatureNotSupported { log, .. }
            | TaskError::Internal { log, .. } => log,
        }
    }

    /// Classification boundary: map a hook failure onto exactly one
    /// domain error, attaching the log snapshot.
    pub(crate) fn classify(err: HookError, log: TransactionLog) -> TaskError {
        let log = Box::new(log);
        match err {
            HookError::Portal(PortalError::MissingField { object, field }) => {
                TaskError::ApiContent { object, field, log }
            }
            HookError::Portal(source) => TaskError::Transport { source, log },
            HookError::InvalidVersion(VersionError { version }) => {
                TaskError::InvalidVersionFormat { version, log }
            }
            HookError::InvalidTopic(source) => TaskError::InvalidTopicAddress { source, log },
            HookError::VersionStrategy {
                requested,
                existing,
            } => TaskError::VersionStrategyValidation {
                requested,
                existing,
                log,
            },
            HookError::FeatureNotSupported { feature } => {
                TaskError::FeatureNotSupported { feature, log }
            }
            HookError::Internal { message } => TaskError::Internal { message, log },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{ObjectType, TargetState};
    use crate::transaction::{TransactionContext, TransactionLogBuilder};

    fn log() -> TransactionLog {
        TransactionLogBuilder::new(
            ObjectType::Schema,
            TargetState::Present,
            false,
            TransactionContext::default(),
        )
        .snapshot()
    }

    #[test]
    fn test_missing_field_classifies_as_api_content() {
        let err = TaskError::classify(
            HookError::Portal(PortalError::MissingField {
                object: "schemaVersion",
                field: "version",
            }),
            log(),
        );
        assert!(matches!(
            err,
            TaskError::ApiContent {
                object: "schemaVersion",
                field: "version",
                ..
            }
        ));
    }

    #[test]
    fn test_http_failure_classifies_as_transport() {
        let err = TaskError::classify(
            HookError::Portal(PortalError::Api {
                status: 503,
                message: "unavailable".into(),
            }),
            log(),
        );
        match err {
            TaskError::Transport { source, .. } => {
                assert!(matches!(source, PortalError::Api { status: 503, .. }));
            }
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[test]
    fn test_every_variant_exposes_its_log() {
        let err = TaskError::classify(HookError::internal("impossible state"), log());
        assert_eq!(err.transaction_log().object_type, ObjectType::Schema);
        assert!(err.to_string().contains("impossible state"));
    }

    #[test]
    fn test_version_strategy_message_names_both_versions() {
        let err = TaskError::classify(
            HookError::VersionStrategy {
                requested: "1.0.0".into(),
                existing: "1.2.0".into(),
            },
            log(),
        );
        let message = err.to_string();
        assert!(message.contains("1.0.0"));
        assert!(message.contains("1.2.0"));
    }
}

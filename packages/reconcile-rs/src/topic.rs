//! Topic pattern parsing.
//!
//! Event versions address a topic like `acme/orders/{Region}/created`:
//! `/`-separated segments, where `{Name}` segments are variables bound to
//! an enum of allowed values and everything else is a literal.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TopicError {
    #[error("topic pattern is empty")]
    Empty,

    #[error("topic pattern has an empty segment at position {position}")]
    EmptySegment { position: usize },

    #[error("topic variable at position {position} has an empty name")]
    EmptyVariable { position: usize },
}

/// One parsed topic segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicLevel {
    Literal(String),
    /// Variable segment; the name refers to an enum in the owning domain.
    Variable(String),
}

/// Parse a topic pattern into its levels.
pub fn parse_topic(pattern: &str) -> Result<Vec<TopicLevel>, TopicError> {
    if pattern.trim().is_empty() {
        return Err(TopicError::Empty);
    }

    pattern
        .split('/')
        .enumerate()
        .map(|(position, segment)| {
            if segment.is_empty() {
                return Err(TopicError::EmptySegment { position });
            }
            if let Some(name) = segment
                .strip_prefix('{')
                .and_then(|rest| rest.strip_suffix('}'))
            {
                if name.is_empty() {
                    return Err(TopicError::EmptyVariable { position });
                }
                Ok(TopicLevel::Variable(name.to_string()))
            } else {
                Ok(TopicLevel::Literal(segment.to_string()))
            }
        })
        .collect()
}

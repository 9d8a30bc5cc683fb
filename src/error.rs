use crate::types::ResourceIdentifier;
use thiserror::Error;

/// Error type returned by custom relationship resolvers
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that abort flattening of a resource
#[derive(Debug, Error)]
pub enum FlattenError {
    /// A relationship whose `data` or `links` member has an unexpected shape
    #[error("malformed relationship `{relationship}`: {reason}")]
    MalformedRelationship { relationship: String, reason: String },

    /// The input could not be read as a JSON:API document
    #[error("malformed document: {0}")]
    MalformedDocument(#[from] serde_json::Error),

    /// A registered relationship resolver failed
    #[error("relationship resolver for {identifier} failed: {source}")]
    Resolver {
        identifier: ResourceIdentifier,
        #[source]
        source: BoxError,
    },
}

impl FlattenError {
    pub(crate) fn malformed(relationship: &str, reason: impl Into<String>) -> Self {
        FlattenError::MalformedRelationship {
            relationship: relationship.to_string(),
            reason: reason.into(),
        }
    }
}

pub type FlattenResult<T> = Result<T, FlattenError>;

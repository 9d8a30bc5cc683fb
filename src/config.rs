use crate::error::BoxError;
use crate::resolver::{RelationshipResolver, ResolverRegistry};
use crate::types::{FlattenedNode, ResourceIdentifier};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

/// Caller-supplied key casing function
pub type KeyForAttributeFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Built-in key casing conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyCase {
    /// `firstName`
    #[default]
    Camel,
    /// `FirstName`
    Pascal,
    /// `first-name`
    Kebab,
    /// `first_name`
    Snake,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown key casing convention: {0}")]
pub struct UnknownKeyCase(pub String);

impl FromStr for KeyCase {
    type Err = UnknownKeyCase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "camelCase" | "camel" => Ok(KeyCase::Camel),
            "CamelCase" | "PascalCase" | "pascal" => Ok(KeyCase::Pascal),
            "dash-case" | "lisp-case" | "spinal-case" | "kebab-case" | "kebab" => Ok(KeyCase::Kebab),
            "underscore_case" | "snake_case" | "snake" => Ok(KeyCase::Snake),
            other => Err(UnknownKeyCase(other.to_string())),
        }
    }
}

/// Per-call options for flattening
#[derive(Clone, Default)]
pub struct FlattenConfig {
    /// Built-in convention used when no custom function is set
    pub key_case: KeyCase,

    /// Overrides `key_case` when present
    pub key_for_attribute: Option<KeyForAttributeFn>,

    /// Per-type relationship value hooks
    pub resolvers: ResolverRegistry,

    /// Deepest relationship level expanded (`None` = only cycles stop expansion).
    /// Included targets below it resolve to `{"id": ...}`.
    pub max_depth: Option<usize>,
}

impl FlattenConfig {
    pub fn with_key_case(mut self, key_case: KeyCase) -> Self {
        self.key_case = key_case;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn with_key_for_attribute<F>(mut self, key_for_attribute: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.key_for_attribute = Some(Arc::new(key_for_attribute));
        self
    }

    /// Register a resolver for relationships targeting `resource_type`
    pub fn with_resolver<R>(mut self, resource_type: impl Into<String>, resolver: R) -> Self
    where
        R: RelationshipResolver + 'static,
    {
        self.resolvers.register(resource_type, resolver);
        self
    }

    /// Register an immediate `valueForRelationship` hook
    pub fn with_value_for_relationship<F>(mut self, resource_type: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&ResourceIdentifier, Option<FlattenedNode>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.resolvers.register_fn(resource_type, hook);
        self
    }

    /// Register a deferred `valueForRelationship` hook
    pub fn with_async_value_for_relationship<F, Fut>(mut self, resource_type: impl Into<String>, hook: F) -> Self
    where
        F: Fn(ResourceIdentifier, Option<FlattenedNode>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
    {
        self.resolvers.register_async(resource_type, hook);
        self
    }
}

impl fmt::Debug for FlattenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlattenConfig")
            .field("key_case", &self.key_case)
            .field("key_for_attribute", &self.key_for_attribute.as_ref().map(|_| "<fn>"))
            .field("resolvers", &self.resolvers)
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

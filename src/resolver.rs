//! Per-type relationship value hooks
//!
//! A resolver decides what value a relationship target produces once it has
//! been flattened. Types without a registered resolver get the flattened
//! target itself (or `null` when it was not included).

use crate::error::{BoxError, FlattenError, FlattenResult};
use crate::types::{FlattenedNode, ResourceIdentifier};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::trace;

/// Hook producing the value of a relationship target.
///
/// `target` is the already flattened included resource, or `None` when the
/// identifier is not part of the document's `included` table. Implementations
/// may await anything they need (a cache, a store) before answering.
#[async_trait]
pub trait RelationshipResolver: Send + Sync {
    async fn value_for_relationship(
        &self,
        identifier: &ResourceIdentifier,
        target: Option<FlattenedNode>,
    ) -> Result<Value, BoxError>;
}

/// Resolver backed by a synchronous closure
pub struct ValueFn<F>(pub F);

#[async_trait]
impl<F> RelationshipResolver for ValueFn<F>
where
    F: Fn(&ResourceIdentifier, Option<FlattenedNode>) -> Result<Value, BoxError> + Send + Sync,
{
    async fn value_for_relationship(
        &self,
        identifier: &ResourceIdentifier,
        target: Option<FlattenedNode>,
    ) -> Result<Value, BoxError> {
        (self.0)(identifier, target)
    }
}

/// Resolver backed by a closure returning a future
pub struct AsyncValueFn<F>(pub F);

#[async_trait]
impl<F, Fut> RelationshipResolver for AsyncValueFn<F>
where
    F: Fn(ResourceIdentifier, Option<FlattenedNode>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
{
    async fn value_for_relationship(
        &self,
        identifier: &ResourceIdentifier,
        target: Option<FlattenedNode>,
    ) -> Result<Value, BoxError> {
        (self.0)(identifier.clone(), target).await
    }
}

/// Lookup table from resource type to resolver
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    resolvers: HashMap<String, Arc<dyn RelationshipResolver>>,
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `resolver` for `resource_type`, replacing any previous entry
    pub fn register<R>(&mut self, resource_type: impl Into<String>, resolver: R) -> &mut Self
    where
        R: RelationshipResolver + 'static,
    {
        self.resolvers.insert(resource_type.into(), Arc::new(resolver));
        self
    }

    pub fn register_fn<F>(&mut self, resource_type: impl Into<String>, hook: F) -> &mut Self
    where
        F: Fn(&ResourceIdentifier, Option<FlattenedNode>) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.register(resource_type, ValueFn(hook))
    }

    pub fn register_async<F, Fut>(&mut self, resource_type: impl Into<String>, hook: F) -> &mut Self
    where
        F: Fn(ResourceIdentifier, Option<FlattenedNode>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, BoxError>> + Send + 'static,
    {
        self.register(resource_type, AsyncValueFn(hook))
    }

    pub fn get(&self, resource_type: &str) -> Option<&Arc<dyn RelationshipResolver>> {
        self.resolvers.get(resource_type)
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Produce the value for one relationship target, awaiting the hook if one is registered
    pub async fn resolve(
        &self,
        identifier: Option<&ResourceIdentifier>,
        target: Option<FlattenedNode>,
    ) -> FlattenResult<Value> {
        let resolver = identifier.and_then(|id| self.get(&id.resource_type).map(|r| (id, r)));

        match resolver {
            Some((identifier, resolver)) => {
                trace!(%identifier, found = target.is_some(), "dispatching relationship resolver");
                resolver
                    .value_for_relationship(identifier, target)
                    .await
                    .map_err(|source| FlattenError::Resolver {
                        identifier: identifier.clone(),
                        source,
                    })
            }
            None => Ok(target.map(Value::Object).unwrap_or(Value::Null)),
        }
    }
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&String> = self.resolvers.keys().collect();
        types.sort();
        f.debug_struct("ResolverRegistry").field("types", &types).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn target() -> FlattenedNode {
        json!({"id": "1", "name": "Ada"}).as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_identity_without_hook() {
        let registry = ResolverRegistry::new();
        let id = ResourceIdentifier::new("people", "1");

        let value = registry.resolve(Some(&id), Some(target())).await.unwrap();
        assert_eq!(value, json!({"id": "1", "name": "Ada"}));

        let value = registry.resolve(Some(&id), None).await.unwrap();
        assert_eq!(value, Value::Null);

        let value = registry.resolve(None, None).await.unwrap();
        assert_eq!(value, Value::Null);
    }

    #[tokio::test]
    async fn test_sync_hook_substitutes() {
        let mut registry = ResolverRegistry::new();
        registry.register_fn("people", |id, target| {
            Ok(json!({"ref": id.id, "wasIncluded": target.is_some()}))
        });

        let value = registry
            .resolve(Some(&ResourceIdentifier::new("people", "7")), None)
            .await
            .unwrap();
        assert_eq!(value, json!({"ref": "7", "wasIncluded": false}));

        let other = registry
            .resolve(Some(&ResourceIdentifier::new("tags", "7")), Some(target()))
            .await
            .unwrap();
        assert_eq!(other["name"], "Ada");
    }

    #[tokio::test]
    async fn test_deferred_hook_is_awaited() {
        let mut registry = ResolverRegistry::new();
        registry.register_async("people", |id, _target| async move {
            tokio::task::yield_now().await;
            Ok::<_, BoxError>(json!(format!("loaded-{}", id.id)))
        });

        let value = registry
            .resolve(Some(&ResourceIdentifier::new("people", "3")), Some(target()))
            .await
            .unwrap();
        assert_eq!(value, json!("loaded-3"));
    }

    #[tokio::test]
    async fn test_hook_failure_carries_identifier() {
        let mut registry = ResolverRegistry::new();
        registry.register_fn("people", |_, _| Err("store offline".into()));

        let err = registry
            .resolve(Some(&ResourceIdentifier::new("people", "3")), None)
            .await
            .unwrap_err();
        match err {
            FlattenError::Resolver { identifier, source } => {
                assert_eq!(identifier, ResourceIdentifier::new("people", "3"));
                assert_eq!(source.to_string(), "store offline");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}

//! Resource flattening
//!
//! Turns one JSON:API resource object into a plain nested object:
//! attributes are key-cased, relationships are replaced by the referenced
//! included resources (flattened the same way), and links are merged on.
//!
//! ## Resolution
//!
//! Sibling relationships, and the members of a to-many relationship, are
//! resolved concurrently with `try_join_all`, which keeps results in
//! declaration order. The first failure aborts the whole call.
//!
//! A resource that is already being flattened further up the current path
//! is not expanded again; it resolves to `{"id": ...}` instead. Non-ancestors
//! are expanded again every time they are reached, so densely cross-linked
//! `included` sets grow quickly; `FlattenConfig::max_depth` caps the nesting.

mod context;
mod links;

use crate::casing::KeyCaser;
use crate::config::FlattenConfig;
use crate::error::{FlattenError, FlattenResult};
use crate::index::IncludedIndex;
use crate::types::{FlattenedNode, Relationship, RelationshipData, Resource, ResourceIdentifier};
use context::ResolutionPath;
use futures::future::{try_join_all, BoxFuture};
use links::attach_links;
use serde_json::{Map, Value};
use tracing::{debug, trace};

/// Flattens resources against one document's `included` table
pub struct ResourceFlattener<'a> {
    config: &'a FlattenConfig,
    index: IncludedIndex<'a>,
    caser: KeyCaser<'a>,
}

impl<'a> ResourceFlattener<'a> {
    pub fn new(config: &'a FlattenConfig, included: &'a [Resource]) -> Self {
        ResourceFlattener {
            config,
            index: IncludedIndex::new(included),
            caser: KeyCaser::new(config),
        }
    }

    /// Flatten a top-level resource with a fresh recursion guard
    pub async fn flatten(&self, resource: &Resource) -> FlattenResult<FlattenedNode> {
        self.flatten_resource(resource, ResolutionPath::new().enter(resource))
            .await
    }

    fn flatten_resource<'s>(
        &'s self,
        resource: &'s Resource,
        path: ResolutionPath,
    ) -> BoxFuture<'s, FlattenResult<FlattenedNode>> {
        Box::pin(async move {
            trace!(resource_type = %resource.resource_type, id = ?resource.id, depth = path.depth, "flattening resource");

            let mut node = self.extract_attributes(resource);

            if let Some(relationships) = self.extract_relationships(resource, &path).await? {
                node.extend(relationships);
            }

            if let Some(links) = self.extract_links(resource) {
                node.extend(links);
            }

            Ok(node)
        })
    }

    /// Cased attributes plus `id`, which is set last and never cased
    fn extract_attributes(&self, resource: &Resource) -> FlattenedNode {
        let mut attributes = resource
            .attributes
            .as_ref()
            .map(|attributes| self.caser.map(attributes))
            .unwrap_or_default();

        if let Some(id) = &resource.id {
            attributes.insert("id".to_string(), Value::String(id.clone()));
        }

        attributes
    }

    /// `{"links": <cased links>}`, or nothing when the resource has no links
    fn extract_links(&self, resource: &Resource) -> Option<FlattenedNode> {
        let links = resource.links.as_ref()?;
        let mut wrapper = Map::new();
        wrapper.insert("links".to_string(), Value::Object(self.caser.map(links)));
        Some(wrapper)
    }

    async fn extract_relationships(
        &self,
        resource: &Resource,
        path: &ResolutionPath,
    ) -> FlattenResult<Option<FlattenedNode>> {
        let Some(relationships) = &resource.relationships else {
            return Ok(None);
        };

        let pending = relationships.iter().map(|(name, raw)| async move {
            let relationship = Relationship::from_value(name, raw)?;
            let value = self.resolve_relationship(&relationship, path).await?;
            Ok::<_, FlattenError>((self.caser.key(name), value))
        });

        let resolved = try_join_all(pending).await?;
        Ok(Some(resolved.into_iter().collect()))
    }

    async fn resolve_relationship(
        &self,
        relationship: &Relationship,
        path: &ResolutionPath,
    ) -> FlattenResult<Value> {
        let value = match &relationship.data {
            RelationshipData::Empty => Value::Null,
            RelationshipData::One(identifier) => self.resolve_identifier(Some(identifier), path).await?,
            RelationshipData::Many(identifiers) => {
                let pending = identifiers
                    .iter()
                    .map(|identifier| self.resolve_identifier(identifier.as_ref(), path));
                Value::Array(try_join_all(pending).await?)
            }
        };

        Ok(match &relationship.links {
            Some(links) => attach_links(value, links),
            None => value,
        })
    }

    /// Look up, flatten and pass one target through the per-type resolver
    async fn resolve_identifier(
        &self,
        identifier: Option<&ResourceIdentifier>,
        path: &ResolutionPath,
    ) -> FlattenResult<Value> {
        let target = match identifier {
            Some(identifier) if path.contains(identifier) => {
                debug!(%identifier, depth = path.depth, "cyclic relationship truncated");
                Some(truncated(&identifier.id))
            }
            _ => match self.index.find(identifier) {
                Some(included) if self.depth_exhausted(path) => {
                    trace!(resource_type = %included.resource_type, depth = path.depth, "max depth reached");
                    included.id.as_deref().map(truncated)
                }
                Some(included) => Some(self.flatten_resource(included, path.enter(included)).await?),
                None => None,
            },
        };

        self.config.resolvers.resolve(identifier, target).await
    }

    /// Targets found at `path` would sit `path.depth` relationship levels below the top
    fn depth_exhausted(&self, path: &ResolutionPath) -> bool {
        self.config.max_depth.is_some_and(|max| path.depth > max)
    }
}

fn truncated(id: &str) -> FlattenedNode {
    let mut node = Map::new();
    node.insert("id".to_string(), Value::String(id.to_string()));
    node
}

/// Flatten `resource`, resolving relationships against `included`
pub async fn perform(
    resource: &Resource,
    included: &[Resource],
    config: &FlattenConfig,
) -> FlattenResult<FlattenedNode> {
    ResourceFlattener::new(config, included).flatten(resource).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KeyCase;
    use serde_json::json;

    fn resource(value: Value) -> Resource {
        serde_json::from_value(value).unwrap()
    }

    fn resources(value: Value) -> Vec<Resource> {
        serde_json::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_attributes_and_id() {
        let article = resource(json!({
            "type": "articles",
            "id": "1",
            "attributes": {"title-text": "Hello", "id": "shadowed", "meta-info": {"word-count": 3}}
        }));

        let node = perform(&article, &[], &FlattenConfig::default()).await.unwrap();

        assert_eq!(Value::Object(node), json!({
            "titleText": "Hello",
            "id": "1",
            "metaInfo": {"wordCount": 3}
        }));
    }

    #[tokio::test]
    async fn test_empty_resource() {
        let bare = resource(json!({"type": "articles"}));
        let node = perform(&bare, &[], &FlattenConfig::default()).await.unwrap();
        assert!(node.is_empty());

        let with_id = resource(json!({"type": "articles", "id": "5"}));
        let node = perform(&with_id, &[], &FlattenConfig::default()).await.unwrap();
        assert_eq!(Value::Object(node), json!({"id": "5"}));
    }

    #[tokio::test]
    async fn test_resource_links_are_cased() {
        let article = resource(json!({
            "type": "articles",
            "id": "1",
            "links": {"self": "/articles/1", "first-page": "/articles?page=1"}
        }));
        let config = FlattenConfig::default().with_key_case(KeyCase::Snake);

        let node = perform(&article, &[], &config).await.unwrap();

        assert_eq!(node["links"], json!({"self": "/articles/1", "first_page": "/articles?page=1"}));
    }

    #[tokio::test]
    async fn test_relationship_shapes() {
        let article = resource(json!({
            "type": "articles",
            "id": "1",
            "relationships": {
                "lead-author": {"data": {"type": "people", "id": "9"}},
                "editor": {"data": null},
                "reviewer": {},
                "missing-author": {"data": {"type": "people", "id": "404"}},
                "tags": {"data": [{"type": "tags", "id": "t1"}, {"type": "tags", "id": "t2"}]}
            }
        }));
        let included = resources(json!([
            {"type": "people", "id": "9", "attributes": {"first-name": "Ada"}},
            {"type": "tags", "id": "t1", "attributes": {"label": "rust"}},
            {"type": "tags", "id": "t2", "attributes": {"label": "json"}}
        ]));

        let node = perform(&article, &included, &FlattenConfig::default()).await.unwrap();

        assert_eq!(node["leadAuthor"], json!({"firstName": "Ada", "id": "9"}));
        assert_eq!(node["editor"], Value::Null);
        assert_eq!(node["reviewer"], Value::Null);
        assert_eq!(node["missingAuthor"], Value::Null);
        assert_eq!(node["tags"], json!([{"label": "rust", "id": "t1"}, {"label": "json", "id": "t2"}]));
    }

    #[tokio::test]
    async fn test_merge_order() {
        let article = resource(json!({
            "type": "articles",
            "id": "1",
            "attributes": {"title": "Hi", "author": "plain text", "links": "attribute"},
            "relationships": {"author": {"data": null}},
            "links": {"self": "/articles/1"}
        }));

        let node = perform(&article, &[], &FlattenConfig::default()).await.unwrap();

        let keys: Vec<&str> = node.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["title", "author", "links", "id"]);
        assert_eq!(node["author"], Value::Null);
        assert_eq!(node["links"], json!({"self": "/articles/1"}));
    }

    #[tokio::test]
    async fn test_relationship_links() {
        let article = resource(json!({
            "type": "articles",
            "id": "1",
            "relationships": {
                "author": {
                    "data": {"type": "people", "id": "9"},
                    "links": {"self": "/articles/1/relationships/author"}
                },
                "editor": {"links": {"related": "/articles/1/editor"}},
                "comments": {
                    "data": [{"type": "comments", "id": "5"}],
                    "links": {"related": "/articles/1/comments"}
                }
            }
        }));
        let included = resources(json!([
            {"type": "people", "id": "9", "links": {"related": "/people/9"}},
            {"type": "comments", "id": "5"}
        ]));

        let node = perform(&article, &included, &FlattenConfig::default()).await.unwrap();

        assert_eq!(node["author"], json!({
            "id": "9",
            "links": {"related": "/people/9", "self": "/articles/1/relationships/author"}
        }));
        assert_eq!(node["editor"], json!({"links": {"related": "/articles/1/editor"}}));
        assert_eq!(node["comments"], json!({
            "data": [{"id": "5"}],
            "links": {"related": "/articles/1/comments"}
        }));
    }

    #[tokio::test]
    async fn test_nested_relationships() {
        let article = resource(json!({
            "type": "articles",
            "id": "1",
            "relationships": {"comments": {"data": [{"type": "comments", "id": "5"}]}}
        }));
        let included = resources(json!([
            {
                "type": "comments",
                "id": "5",
                "attributes": {"body": "First!"},
                "relationships": {"author": {"data": {"type": "people", "id": "2"}}}
            },
            {"type": "people", "id": "2", "attributes": {"twitter-handle": "@ada"}}
        ]));

        let node = perform(&article, &included, &FlattenConfig::default()).await.unwrap();

        assert_eq!(node["comments"], json!([{
            "body": "First!",
            "id": "5",
            "author": {"twitterHandle": "@ada", "id": "2"}
        }]));
    }

    #[tokio::test]
    async fn test_cycle_is_truncated() {
        let article = resource(json!({
            "type": "articles",
            "id": "1",
            "relationships": {"author": {"data": {"type": "people", "id": "2"}}}
        }));
        let included = resources(json!([{
            "type": "people",
            "id": "2",
            "attributes": {"name": "Ada"},
            "relationships": {
                "articles": {"data": [{"type": "articles", "id": "1"}]},
                "self-ref": {"data": {"type": "people", "id": "2"}}
            }
        }]));

        let node = perform(&article, &included, &FlattenConfig::default()).await.unwrap();

        assert_eq!(node["author"], json!({
            "name": "Ada",
            "id": "2",
            "articles": [{"id": "1"}],
            "selfRef": {"id": "2"}
        }));
    }

    #[tokio::test]
    async fn test_shared_target_is_not_a_cycle() {
        let article = resource(json!({
            "type": "articles",
            "id": "1",
            "relationships": {
                "author": {"data": {"type": "people", "id": "2"}},
                "editor": {"data": {"type": "people", "id": "2"}}
            }
        }));
        let included = resources(json!([{"type": "people", "id": "2", "attributes": {"name": "Ada"}}]));

        let node = perform(&article, &included, &FlattenConfig::default()).await.unwrap();

        assert_eq!(node["author"], json!({"name": "Ada", "id": "2"}));
        assert_eq!(node["editor"], node["author"]);
    }

    #[tokio::test]
    async fn test_max_depth_limits_expansion() {
        let article = resource(json!({
            "type": "articles",
            "id": "1",
            "relationships": {
                "author": {"data": {"type": "people", "id": "2"}},
                "editor": {"data": {"type": "people", "id": "404"}}
            }
        }));
        let included = resources(json!([
            {
                "type": "people",
                "id": "2",
                "attributes": {"name": "Ada"},
                "relationships": {"employer": {"data": {"type": "companies", "id": "3"}}}
            },
            {"type": "companies", "id": "3", "attributes": {"name": "Analytical"}}
        ]));

        let unlimited = perform(&article, &included, &FlattenConfig::default()).await.unwrap();
        assert_eq!(unlimited["author"]["employer"], json!({"name": "Analytical", "id": "3"}));

        let one_level = FlattenConfig::default().with_max_depth(1);
        let node = perform(&article, &included, &one_level).await.unwrap();
        assert_eq!(node["author"], json!({"name": "Ada", "id": "2", "employer": {"id": "3"}}));
        assert_eq!(node["editor"], Value::Null);

        let none = FlattenConfig::default().with_max_depth(0);
        let node = perform(&article, &included, &none).await.unwrap();
        assert_eq!(node["author"], json!({"id": "2"}));
        assert_eq!(node["editor"], Value::Null);
    }

    #[tokio::test]
    async fn test_max_depth_bounds_dense_graphs() {
        // every node links to every other node
        let ids = ["1", "2", "3", "4", "5", "6", "7", "8"];
        let node_json = |id: &str| {
            let links: Vec<Value> = ids
                .iter()
                .filter(|other| **other != id)
                .map(|other| json!({"type": "nodes", "id": other}))
                .collect();
            json!({"type": "nodes", "id": id, "relationships": {"peers": {"data": links}}})
        };
        let root = resource(node_json("1"));
        let included: Vec<Resource> = ids[1..].iter().map(|id| resource(node_json(*id))).collect();

        let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let seen = std::sync::Arc::clone(&calls);
        let config = FlattenConfig::default()
            .with_max_depth(2)
            .with_value_for_relationship("nodes", move |_, target| {
                seen.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Ok(target.map(Value::Object).unwrap_or(Value::Null))
            });

        let node = perform(&root, &included, &config).await.unwrap();

        // 7 expanded peers, 6 expanded each below them (plus the root, truncated),
        // and every reference from those 42 truncated
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 7 + 7 * 7 + 42 * 7);
        assert_eq!(node["peers"][0]["peers"][0], json!({"id": "1"}));
        assert_eq!(node["peers"][0]["peers"][1]["peers"][0], json!({"id": "1"}));
        assert_eq!(node["peers"][0]["peers"][1]["peers"][2], json!({"id": "4"}));
    }

    #[tokio::test]
    async fn test_malformed_relationship_fails() {
        let article = resource(json!({
            "type": "articles",
            "id": "1",
            "relationships": {"author": {"data": 42}}
        }));

        let err = perform(&article, &[], &FlattenConfig::default()).await.unwrap_err();
        assert!(matches!(err, FlattenError::MalformedRelationship { ref relationship, .. } if relationship == "author"));
    }

    #[tokio::test]
    async fn test_resolver_failure_aborts() {
        let article = resource(json!({
            "type": "articles",
            "id": "1",
            "relationships": {
                "author": {"data": {"type": "people", "id": "2"}},
                "tags": {"data": [{"type": "tags", "id": "1"}]}
            }
        }));
        let config = FlattenConfig::default()
            .with_value_for_relationship("tags", |_, _| Err("tag store unavailable".into()));

        let err = perform(&article, &[], &config).await.unwrap_err();
        assert!(matches!(err, FlattenError::Resolver { ref identifier, .. } if identifier.resource_type == "tags"));
    }
}

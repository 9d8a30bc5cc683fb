use crate::error::{FlattenError, FlattenResult};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Output of flattening one resource: cased attribute keys, inlined relationships
pub type FlattenedNode = Map<String, Value>;

/// Identity of a resource inside a document, e.g. `{"type": "users", "id": "1"}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentifier {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
}

impl ResourceIdentifier {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        ResourceIdentifier {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    fn parse(relationship: &str, value: &Value) -> FlattenResult<Self> {
        let field = |key: &str| value.get(key).and_then(Value::as_str);

        match (field("type"), field("id")) {
            (Some(resource_type), Some(id)) => Ok(ResourceIdentifier::new(resource_type, id)),
            _ => Err(FlattenError::malformed(
                relationship,
                "resource identifier requires string `type` and `id` members",
            )),
        }
    }
}

impl fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.id)
    }
}

/// Cardinality of a relationship, decided by the shape of its `data` member
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationshipData {
    /// `data` is `null` or missing
    Empty,
    /// To-one
    One(ResourceIdentifier),
    /// To-many; `null` elements are kept so output positions line up
    Many(Vec<Option<ResourceIdentifier>>),
}

impl RelationshipData {
    pub fn parse(relationship: &str, data: &Value) -> FlattenResult<Self> {
        match data {
            Value::Null => Ok(RelationshipData::Empty),
            Value::Object(_) => ResourceIdentifier::parse(relationship, data).map(RelationshipData::One),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Null => Ok(None),
                    other => ResourceIdentifier::parse(relationship, other).map(Some),
                })
                .collect::<FlattenResult<Vec<_>>>()
                .map(RelationshipData::Many),
            other => Err(FlattenError::malformed(
                relationship,
                format!("`data` must be null, an object or an array, found {}", json_kind(other)),
            )),
        }
    }
}

/// A parsed relationship object
#[derive(Debug, Clone, PartialEq)]
pub struct Relationship {
    pub data: RelationshipData,
    pub links: Option<Map<String, Value>>,
}

impl Relationship {
    /// Parse the raw relationship object stored under `name`
    pub fn from_value(name: &str, value: &Value) -> FlattenResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| FlattenError::malformed(name, format!("expected an object, found {}", json_kind(value))))?;

        let data = RelationshipData::parse(name, object.get("data").unwrap_or(&Value::Null))?;

        let links = match object.get("links") {
            None | Some(Value::Null) => None,
            Some(Value::Object(links)) => Some(links.clone()),
            Some(other) => {
                return Err(FlattenError::malformed(
                    name,
                    format!("`links` must be an object, found {}", json_kind(other)),
                ))
            }
        };

        Ok(Relationship { data, links })
    }
}

/// A JSON:API resource object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type", default)]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Map<String, Value>>,

    /// Raw relationship objects, parsed lazily so a bad shape names its relationship
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<Map<String, Value>>,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Resource {
            id: Some(id.into()),
            resource_type: resource_type.into(),
            ..Resource::default()
        }
    }

    /// The `(type, id)` pair of this resource, if it carries an id
    pub fn identifier(&self) -> Option<ResourceIdentifier> {
        self.id
            .as_ref()
            .map(|id| ResourceIdentifier::new(self.resource_type.clone(), id.clone()))
    }
}

/// Primary `data` of a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryData {
    Many(Vec<Resource>),
    One(Box<Resource>),
}

/// A JSON:API document; members other than `data` and `included` are ignored
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub data: Option<PrimaryData>,

    /// `null` and a missing member both mean "no included resources"
    #[serde(default, deserialize_with = "null_as_empty")]
    pub included: Vec<Resource>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Resource>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Resource>>::deserialize(deserializer)?.unwrap_or_default())
}

impl Document {
    pub fn from_value(value: Value) -> FlattenResult<Self> {
        Ok(serde_json::from_value(value)?)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

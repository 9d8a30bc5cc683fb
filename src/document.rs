use crate::config::FlattenConfig;
use crate::error::FlattenResult;
use crate::flatten::ResourceFlattener;
use crate::types::{Document, PrimaryData};
use futures::future::try_join_all;
use serde_json::Value;

/// Flatten a document's primary `data`.
///
/// A single resource becomes an object, a collection becomes an array in the
/// same order, and absent or `null` data becomes `null`.
pub async fn flatten_document(document: &Document, config: &FlattenConfig) -> FlattenResult<Value> {
    let flattener = ResourceFlattener::new(config, &document.included);

    match &document.data {
        None => Ok(Value::Null),
        Some(PrimaryData::One(resource)) => Ok(Value::Object(flattener.flatten(resource).await?)),
        Some(PrimaryData::Many(resources)) => {
            let nodes = try_join_all(resources.iter().map(|resource| flattener.flatten(resource))).await?;
            Ok(Value::Array(nodes.into_iter().map(Value::Object).collect()))
        }
    }
}

/// Parse and flatten a raw JSON:API document
pub async fn flatten_value(value: Value, config: &FlattenConfig) -> FlattenResult<Value> {
    let document = Document::from_value(value)?;
    flatten_document(&document, config).await
}

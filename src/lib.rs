//! # jsonapi-flatten - JSON:API document flattening
//!
//! Turns JSON:API resource objects into plain, developer-friendly JSON:
//! attribute keys are case-converted, relationships are replaced in place by
//! the resources they reference in the document's `included` table
//! (flattened recursively), and link metadata is merged onto each node.
//!
//! ## Modules
//!
//! - **flatten**: The relationship resolution engine (`perform`)
//! - **resolver**: Per-type hooks that substitute or hydrate relationship targets
//! - **casing**: Key casing conventions
//! - **index**: `(type, id)` lookup over `included`
//!
//! ## Quick Start
//!
//! ```rust
//! use jsonapi_flatten::{flatten_value, FlattenConfig};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let document = json!({
//!     "data": {
//!         "type": "articles",
//!         "id": "1",
//!         "attributes": {"title-text": "Hello"},
//!         "relationships": {"author": {"data": {"type": "people", "id": "9"}}}
//!     },
//!     "included": [
//!         {"type": "people", "id": "9", "attributes": {"first-name": "Ada"}}
//!     ]
//! });
//!
//! let article = flatten_value(document, &FlattenConfig::default()).await?;
//! assert_eq!(article, json!({
//!     "titleText": "Hello",
//!     "id": "1",
//!     "author": {"firstName": "Ada", "id": "9"}
//! }));
//! # Ok(())
//! # }
//! ```
//!
//! ### Relationship Hooks
//!
//! ```rust
//! use jsonapi_flatten::{perform, FlattenConfig, Resource};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let config = FlattenConfig::default()
//!     .with_value_for_relationship("people", |_, _| Ok(json!("REDACTED")));
//!
//! let article: Resource = serde_json::from_value(json!({
//!     "type": "articles",
//!     "id": "1",
//!     "relationships": {"author": {"data": {"type": "people", "id": "9"}}}
//! }))?;
//!
//! let node = perform(&article, &[], &config).await?;
//! assert_eq!(node["author"], "REDACTED");
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde_json::Value;
use std::io::BufRead;

pub mod casing;
pub mod config;
pub mod document;
pub mod error;
pub mod flatten;
pub mod index;
pub mod resolver;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{FlattenConfig, KeyCase};
pub use document::{flatten_document, flatten_value};
pub use error::{BoxError, FlattenError, FlattenResult};
pub use flatten::{perform, ResourceFlattener};
pub use resolver::{RelationshipResolver, ResolverRegistry};
pub use types::{Document, FlattenedNode, Relationship, RelationshipData, Resource, ResourceIdentifier};

/// Flatten a stream of newline-delimited JSON:API documents
pub async fn flatten_json<R: BufRead>(reader: R, config: &FlattenConfig) -> Result<Vec<Value>> {
    let mut flattened = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read line")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(line)
            .with_context(|| format!("Failed to parse JSON on line {}", line_no + 1))?;
        let output = flatten_value(value, config)
            .await
            .with_context(|| format!("Failed to flatten document on line {}", line_no + 1))?;
        flattened.push(output);
    }

    Ok(flattened)
}

//! Recursion guard for relationship traversal.

use crate::types::{Resource, ResourceIdentifier};
use std::collections::HashSet;
use std::sync::Arc;

/// Resources currently being flattened on the active resolution path.
///
/// Each branch of the traversal owns its own copy, so sibling relationships
/// never see each other's entries; only ancestors count as a cycle.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResolutionPath {
    /// Current traversal depth.
    pub(crate) depth: usize,
    /// `(type, id)` pairs of the resource and all its ancestors.
    visited: Arc<HashSet<(String, String)>>,
}

impl ResolutionPath {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn contains(&self, identifier: &ResourceIdentifier) -> bool {
        self.visited
            .contains(&(identifier.resource_type.clone(), identifier.id.clone()))
    }

    /// Path one level below, with `resource` marked as in progress
    pub(crate) fn enter(&self, resource: &Resource) -> Self {
        let mut visited = (*self.visited).clone();
        if let Some(id) = &resource.id {
            visited.insert((resource.resource_type.clone(), id.clone()));
        }
        Self {
            depth: self.depth + 1,
            visited: Arc::new(visited),
        }
    }
}

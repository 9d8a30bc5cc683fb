use crate::types::{Resource, ResourceIdentifier};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::debug;

/// Read-only lookup over a document's `included` resources, keyed by `(type, id)`
#[derive(Debug, Default)]
pub struct IncludedIndex<'a> {
    resources: HashMap<(&'a str, &'a str), &'a Resource>,
}

impl<'a> IncludedIndex<'a> {
    /// Index `included`; on duplicate `(type, id)` the first resource in document order wins
    pub fn new(included: &'a [Resource]) -> Self {
        let mut resources = HashMap::with_capacity(included.len());

        for resource in included {
            let Some(id) = resource.id.as_deref() else {
                debug!(resource_type = %resource.resource_type, "skipping included resource without id");
                continue;
            };

            match resources.entry((resource.resource_type.as_str(), id)) {
                Entry::Occupied(_) => {
                    debug!(resource_type = %resource.resource_type, id, "duplicate included resource ignored");
                }
                Entry::Vacant(slot) => {
                    slot.insert(resource);
                }
            }
        }

        IncludedIndex { resources }
    }

    pub fn find(&self, identifier: Option<&ResourceIdentifier>) -> Option<&'a Resource> {
        let identifier = identifier?;
        self.resources
            .get(&(identifier.resource_type.as_str(), identifier.id.as_str()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

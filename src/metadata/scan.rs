use std::any::TypeId;
use std::collections::HashSet;

use tracing::debug;

use crate::metadata::component::ComponentMetadata;

/// Accumulated candidate descriptors, deduplicated by type identity.
/// Registration happens at startup from generated or hand-written
/// calls; the definition builder consumes the result once.
pub struct ScanResult {
    components: Vec<ComponentMetadata>,
    seen: HashSet<TypeId>,
}

impl ScanResult {
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Add one candidate descriptor. A second descriptor for the same
    /// type is dropped so overlapping registration sets stay harmless.
    pub fn register(&mut self, metadata: ComponentMetadata) -> &mut Self {
        if !self.seen.insert(metadata.type_key.type_id) {
            debug!(type_name = metadata.type_key.type_name, "skipping duplicate candidate");
            return self;
        }
        self.components.push(metadata);
        self
    }

    /// Merge another scan result, keeping the first descriptor seen for
    /// each type.
    pub fn import(&mut self, other: ScanResult) -> &mut Self {
        let before = self.components.len();
        for metadata in other.components {
            self.register(metadata);
        }
        debug!(
            imported = self.components.len() - before,
            total = self.components.len(),
            "merged scan results"
        );
        self
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn into_components(self) -> Vec<ComponentMetadata> {
        self.components
    }
}

impl Default for ScanResult {
    fn default() -> Self {
        Self::new()
    }
}

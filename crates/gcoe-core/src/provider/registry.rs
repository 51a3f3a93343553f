//! Jurisdiction → provider lookup.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::AssessmentProvider;
use crate::domain::JurisdictionId;

/// Maps jurisdiction identifiers to provider implementations.
///
/// Populated once, then shared read-only (behind an `Arc`) with the engine.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: BTreeMap<JurisdictionId, Arc<dyn AssessmentProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `provider` for `jurisdiction` and return `self` (builder
    /// pattern). A later registration for the same identifier replaces it.
    pub fn register(
        mut self,
        jurisdiction: impl Into<JurisdictionId>,
        provider: Arc<dyn AssessmentProvider>,
    ) -> Self {
        self.providers.insert(jurisdiction.into(), provider);
        self
    }

    pub fn get(&self, jurisdiction: &JurisdictionId) -> Option<Arc<dyn AssessmentProvider>> {
        self.providers.get(jurisdiction).cloned()
    }

    pub fn contains(&self, jurisdiction: &JurisdictionId) -> bool {
        self.providers.contains_key(jurisdiction)
    }

    /// Registered identifiers in sorted order.
    pub fn jurisdictions(&self) -> Vec<JurisdictionId> {
        self.providers.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.providers.iter().map(|(k, v)| (k.as_str(), v.name())))
            .finish()
    }
}

//! Reference jurisdiction providers for GCOE.
//!
//! Each provider scores a [`gcoe_core::BusinessProfile`] against a static
//! [`Rulebook`] of tax rates and compliance factors. They stand in for the
//! real expert services and keep the engine usable out of the box.

pub mod provider;
pub mod rulebook;

use std::sync::Arc;

use gcoe_core::ProviderRegistry;

pub use provider::RulebookProvider;
pub use rulebook::{DimensionWeights, Rulebook, RulebookError};

/// Registry with one [`RulebookProvider`] per rulebook. A later rulebook for
/// the same jurisdiction replaces an earlier one.
pub fn registry_from_rulebooks(rulebooks: impl IntoIterator<Item = Rulebook>) -> ProviderRegistry {
    rulebooks.into_iter().fold(ProviderRegistry::new(), |registry, book| {
        let id = book.jurisdiction.clone();
        registry.register(id, Arc::new(RulebookProvider::new(book)))
    })
}

/// Registry covering uk, us, ae, eu and ch.
pub fn standard_registry() -> ProviderRegistry {
    registry_from_rulebooks(Rulebook::standard())
}

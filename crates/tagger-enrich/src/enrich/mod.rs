//! Enrichment components: the provider capability, its implementations,
//! and the orchestrator that consults them.

pub mod enricher;
pub mod musicbrainz;
pub mod provider;
pub mod resilience;

#[cfg(test)]
pub(crate) mod mock;

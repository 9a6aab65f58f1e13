//! CEP resolution subsystem.
//!
//! Provides postal-code validation, the BrasilAPI / ViaCEP / Nominatim
//! providers, an in-memory result cache, and the fallback resolver.

pub mod cache;
pub mod providers;
pub mod resolver;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cache::ResultCache;
pub use providers::Geocoder;
pub use resolver::{CepResolver, ResolveAttempt};
pub use types::{
    CepError, Coordinates, LocationRecord, LocationSource, PostalCode, ProviderError, PLACEHOLDER,
};

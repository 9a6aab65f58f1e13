//! Offline stand-ins for the network attempts, shared by unit tests.

use super::resolver::ResolveAttempt;
use super::types::{LocationRecord, LocationSource, PostalCode, ProviderError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared call counter handed out before the attempt is boxed.
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Answers from a fixed list of records, matched on the cleaned CEP.
pub struct StaticAttempt {
    name: &'static str,
    records: Vec<LocationRecord>,
    fallback: Option<LocationRecord>,
    failing: bool,
    calls: CallCounter,
}

impl StaticAttempt {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            records: Vec::new(),
            fallback: None,
            failing: false,
            calls: CallCounter::default(),
        }
    }

    /// An attempt that always errors, like an unreachable service.
    pub fn failing(name: &'static str) -> Self {
        Self {
            failing: true,
            ..Self::new(name)
        }
    }

    /// An attempt that answers every CEP with the same record, like a
    /// source falling back to a city-wide code.
    pub fn answering_all(name: &'static str, record: LocationRecord) -> Self {
        Self {
            fallback: Some(record),
            ..Self::new(name)
        }
    }

    pub fn with(mut self, record: LocationRecord) -> Self {
        self.records.push(record);
        self
    }

    pub fn calls(&self) -> CallCounter {
        self.calls.clone()
    }
}

impl ResolveAttempt for StaticAttempt {
    fn name(&self) -> &'static str {
        self.name
    }

    fn attempt(&self, cep: &PostalCode) -> Result<Option<LocationRecord>, ProviderError> {
        self.calls.bump();
        if self.failing {
            return Err(ProviderError::Network("connection refused".into()));
        }
        Ok(self
            .records
            .iter()
            .find(|r| r.cleaned_postal_code() == cep.as_str())
            .or(self.fallback.as_ref())
            .cloned())
    }
}

/// A São Paulo record from the primary source.
pub fn record(cep: &str, neighborhood: &str) -> LocationRecord {
    LocationRecord {
        postal_code: cep.into(),
        street: "Rua Teste".into(),
        neighborhood: neighborhood.into(),
        city: "São Paulo".into(),
        latitude: -23.55,
        longitude: -46.63,
        source: LocationSource::PrimaryApi,
        zone: None,
    }
}

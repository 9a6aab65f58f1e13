//! CEP resolver: orchestrates the fallback chain.
//!
//! Flow:  duplicate check → cache → BrasilAPI → ViaCEP + Nominatim → NotFound
//!
//! Each step after the cache is a [`ResolveAttempt`]. Provider errors are
//! logged and treated as "try the next attempt"; the caller only ever sees
//! `DuplicateEntry` or `NotFound`.

use super::cache::ResultCache;
use super::providers::{BrasilApi, Geocoder, Nominatim, ViaCep};
use super::types::{CepError, LocationRecord, PostalCode, ProviderError};
use crate::config::Config;

/// One step of the fallback chain.
pub trait ResolveAttempt: Send {
    fn name(&self) -> &'static str;

    /// `Ok(None)` means "this source had nothing usable, try the next one".
    fn attempt(&self, cep: &PostalCode) -> Result<Option<LocationRecord>, ProviderError>;
}

/// BrasilAPI lookup; succeeds only when the body carries a point coordinate.
pub struct PrimaryLookup {
    api: BrasilApi,
}

impl PrimaryLookup {
    pub fn new(api: BrasilApi) -> Self {
        Self { api }
    }
}

impl ResolveAttempt for PrimaryLookup {
    fn name(&self) -> &'static str {
        "brasilapi"
    }

    fn attempt(&self, cep: &PostalCode) -> Result<Option<LocationRecord>, ProviderError> {
        Ok(self.api.lookup(cep.as_str())?.into_record())
    }
}

/// ViaCEP lookup followed by forward geocoding of the returned address.
pub struct GeocodedLookup {
    viacep: ViaCep,
    geocoder: Box<dyn Geocoder>,
}

impl GeocodedLookup {
    pub fn new(viacep: ViaCep, geocoder: Box<dyn Geocoder>) -> Self {
        Self { viacep, geocoder }
    }
}

impl ResolveAttempt for GeocodedLookup {
    fn name(&self) -> &'static str {
        "viacep+nominatim"
    }

    fn attempt(&self, cep: &PostalCode) -> Result<Option<LocationRecord>, ProviderError> {
        let address = self.viacep.lookup(cep.as_str())?;
        address.geocode_with(self.geocoder.as_ref())
    }
}

/// The CEP resolver with its fallback pipeline and result cache.
pub struct CepResolver {
    attempts: Vec<Box<dyn ResolveAttempt>>,
    cache: ResultCache,
}

impl CepResolver {
    /// Standard chain against the configured service URLs.
    pub fn new(config: &Config) -> Self {
        let lookup_timeout = config.lookup_timeout();
        let primary = BrasilApi::new(&config.brasilapi_url, lookup_timeout, &config.user_agent);
        let viacep = ViaCep::new(&config.viacep_url, lookup_timeout, &config.user_agent);
        let nominatim = Nominatim::new(
            &config.nominatim_url,
            config.geocode_timeout(),
            &config.user_agent,
        );

        Self::with_attempts(
            vec![
                Box::new(PrimaryLookup::new(primary)),
                Box::new(GeocodedLookup::new(viacep, Box::new(nominatim))),
            ],
            ResultCache::new(config.cache_ttl()),
        )
    }

    /// Create a resolver with a custom chain (for testing).
    pub fn with_attempts(attempts: Vec<Box<dyn ResolveAttempt>>, cache: ResultCache) -> Self {
        Self { attempts, cache }
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Resolve a validated CEP against the caller's current collection.
    pub fn resolve(
        &mut self,
        cep: &PostalCode,
        existing: &[LocationRecord],
    ) -> Result<LocationRecord, CepError> {
        // 1. Already in the collection
        if existing
            .iter()
            .any(|r| r.cleaned_postal_code() == cep.as_str())
        {
            return Err(CepError::DuplicateEntry(cep.to_string()));
        }

        // 2. Cache
        if let Some(outcome) = self.cache.get(cep.as_str()) {
            tracing::debug!(cep = %cep, "cache hit");
            return outcome;
        }

        // 3. Sources, first usable record wins
        let outcome = self
            .run_attempts(cep)
            .ok_or_else(|| CepError::NotFound(cep.to_string()));

        self.cache.put(cep.as_str(), outcome.clone());
        outcome
    }

    fn run_attempts(&self, cep: &PostalCode) -> Option<LocationRecord> {
        for attempt in &self.attempts {
            match attempt.attempt(cep) {
                Ok(Some(record)) => {
                    tracing::info!(cep = %cep, source = attempt.name(), "resolved");
                    return Some(record);
                }
                Ok(None) => {
                    tracing::debug!(cep = %cep, source = attempt.name(), "no usable result");
                }
                Err(e) => {
                    tracing::debug!(cep = %cep, source = attempt.name(), error = %e, "attempt failed");
                }
            }
        }
        tracing::warn!(cep = %cep, "all sources exhausted");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::fixtures::{record, StaticAttempt};
    use crate::location::types::LocationSource;
    use std::time::Duration;

    fn resolver(attempts: Vec<Box<dyn ResolveAttempt>>) -> CepResolver {
        CepResolver::with_attempts(attempts, ResultCache::default())
    }

    fn cep(raw: &str) -> PostalCode {
        PostalCode::parse(raw).unwrap()
    }

    #[test]
    fn test_first_attempt_wins() {
        let primary = StaticAttempt::new("primary").with(record("01310100", "Bela Vista"));
        let fallback = StaticAttempt::new("fallback").with(record("01310-100", "Other"));
        let (p_calls, f_calls) = (primary.calls(), fallback.calls());

        let mut r = resolver(vec![Box::new(primary), Box::new(fallback)]);
        let rec = r.resolve(&cep("01310-100"), &[]).unwrap();

        assert_eq!(rec.neighborhood, "Bela Vista");
        assert_eq!(p_calls.get(), 1);
        assert_eq!(f_calls.get(), 0);
    }

    #[test]
    fn test_falls_through_on_none_and_error() {
        let empty = StaticAttempt::new("empty");
        let broken = StaticAttempt::failing("broken");
        let fallback = StaticAttempt::new("fallback").with(LocationRecord {
            source: LocationSource::SecondaryApiWithGeocoding,
            ..record("01001-000", "Sé")
        });

        let mut r = resolver(vec![Box::new(empty), Box::new(broken), Box::new(fallback)]);
        let rec = r.resolve(&cep("01001000"), &[]).unwrap();
        assert_eq!(rec.source, LocationSource::SecondaryApiWithGeocoding);
    }

    #[test]
    fn test_not_found_when_exhausted() {
        let mut r = resolver(vec![
            Box::new(StaticAttempt::failing("a")),
            Box::new(StaticAttempt::new("b")),
        ]);
        assert_eq!(
            r.resolve(&cep("99999-999"), &[]),
            Err(CepError::NotFound("99999-999".into()))
        );
    }

    #[test]
    fn test_duplicate_detected_without_network() {
        let attempt = StaticAttempt::new("primary").with(record("01310100", "Bela Vista"));
        let calls = attempt.calls();
        let mut r = resolver(vec![Box::new(attempt)]);

        let existing = vec![record("01310100", "Bela Vista")];
        assert_eq!(
            r.resolve(&cep("01310-100"), &existing),
            Err(CepError::DuplicateEntry("01310-100".into()))
        );
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_duplicate_matches_hyphenated_record() {
        let mut r = resolver(vec![]);
        let existing = vec![record("01001-000", "Sé")];
        assert!(matches!(
            r.resolve(&cep("01001000"), &existing),
            Err(CepError::DuplicateEntry(_))
        ));
    }

    #[test]
    fn test_cache_avoids_second_lookup() {
        let attempt = StaticAttempt::new("primary").with(record("01310100", "Bela Vista"));
        let calls = attempt.calls();
        let mut r = resolver(vec![Box::new(attempt)]);

        r.resolve(&cep("01310100"), &[]).unwrap();
        r.resolve(&cep("01310-100"), &[]).unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(r.cache().len(), 1);
    }

    #[test]
    fn test_cache_remembers_not_found() {
        let attempt = StaticAttempt::new("primary");
        let calls = attempt.calls();
        let mut r = resolver(vec![Box::new(attempt)]);

        assert!(r.resolve(&cep("99999999"), &[]).is_err());
        assert!(r.resolve(&cep("99999999"), &[]).is_err());
        assert_eq!(calls.get(), 1);

        r.clear_cache();
        assert!(r.resolve(&cep("99999999"), &[]).is_err());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_expired_cache_queries_again() {
        let attempt = StaticAttempt::new("primary").with(record("01310100", "Bela Vista"));
        let calls = attempt.calls();
        let mut r = CepResolver::with_attempts(
            vec![Box::new(attempt)],
            ResultCache::new(Duration::ZERO),
        );

        r.resolve(&cep("01310100"), &[]).unwrap();
        r.resolve(&cep("01310100"), &[]).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_duplicate_checked_before_cache() {
        let attempt = StaticAttempt::new("primary").with(record("01310100", "Bela Vista"));
        let mut r = resolver(vec![Box::new(attempt)]);

        let first = r.resolve(&cep("01310100"), &[]).unwrap();
        let existing = vec![first];
        assert!(matches!(
            r.resolve(&cep("01310100"), &existing),
            Err(CepError::DuplicateEntry(_))
        ));
    }
}

//! The user's session: an ordered, de-duplicated collection of classified
//! CEPs, fed by comma-separated batches.

use crate::config::Config;
use crate::location::{CepError, CepResolver, LocationRecord, PostalCode};
use crate::zones::{Classifier, Zone};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

const TOP_NEIGHBORHOODS: usize = 10;

/// Result for one item of a batch, in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome {
    /// The item as typed, trimmed.
    pub input: String,
    pub result: Result<LocationRecord, CepError>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    #[error("enter at least one CEP")]
    EmptyInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneCount {
    pub zone: Zone,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NeighborhoodCount {
    pub neighborhood: String,
    pub count: usize,
}

/// Aggregate view of the session: headline metrics plus per-zone and
/// per-neighborhood counts for records inside the target city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub total: usize,
    pub distinct_zones: usize,
    pub distinct_sources: usize,
    pub last_postal_code: Option<String>,
    pub in_target_city: usize,
    pub outside_target_city: usize,
    pub zones: Vec<ZoneCount>,
    pub top_neighborhoods: Vec<NeighborhoodCount>,
}

pub struct Session {
    resolver: CepResolver,
    classifier: Classifier,
    locations: Vec<LocationRecord>,
}

impl Session {
    pub fn new(resolver: CepResolver, classifier: Classifier) -> Self {
        Self {
            resolver,
            classifier,
            locations: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(CepResolver::new(config), Classifier::new(&config.target_city))
    }

    pub fn records(&self) -> &[LocationRecord] {
        &self.locations
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    /// Process a comma-separated batch. Every item is handled on its own;
    /// a failure never stops the rest of the batch.
    pub fn add_batch(&mut self, input: &str) -> Result<Vec<BatchOutcome>, BatchError> {
        if input.trim().is_empty() {
            return Err(BatchError::EmptyInput);
        }

        Ok(input
            .split(',')
            .map(|item| {
                let input = item.trim().to_string();
                let result = self.add(&input);
                BatchOutcome { input, result }
            })
            .collect())
    }

    /// Validate, resolve, classify and append a single CEP.
    pub fn add(&mut self, raw: &str) -> Result<LocationRecord, CepError> {
        let cep = PostalCode::parse(raw)?;
        let record = self.resolver.resolve(&cep, &self.locations)?;

        // A source may answer a different code than the one asked for.
        let cleaned = record.cleaned_postal_code();
        if self
            .locations
            .iter()
            .any(|r| r.cleaned_postal_code() == cleaned)
        {
            return Err(CepError::DuplicateEntry(record.postal_code));
        }

        let zone = self.classifier.classify_record(&record);
        let record = record.with_zone(zone);

        tracing::info!(cep = %record.postal_code, zone = %zone, source = %record.source, "added");
        self.locations.push(record.clone());
        Ok(record)
    }

    /// Remove by position. Later records shift down by one.
    pub fn remove(&mut self, index: usize) -> Option<LocationRecord> {
        if index >= self.locations.len() {
            return None;
        }
        Some(self.locations.remove(index))
    }

    pub fn summary(&self) -> SessionSummary {
        let in_city: Vec<&LocationRecord> = self
            .locations
            .iter()
            .filter(|r| self.classifier.is_target_city(&r.city))
            .collect();

        let distinct_zones = self
            .locations
            .iter()
            .map(|r| r.zone)
            .collect::<HashSet<_>>()
            .len();
        let distinct_sources = self
            .locations
            .iter()
            .map(|r| r.source)
            .collect::<HashSet<_>>()
            .len();

        let mut zone_counts: HashMap<Zone, usize> = HashMap::new();
        let mut neighborhood_counts: HashMap<&str, usize> = HashMap::new();
        for record in &in_city {
            *zone_counts
                .entry(record.zone.unwrap_or(Zone::Undefined))
                .or_default() += 1;
            *neighborhood_counts
                .entry(record.neighborhood.as_str())
                .or_default() += 1;
        }

        let mut zones: Vec<ZoneCount> = zone_counts
            .into_iter()
            .map(|(zone, count)| ZoneCount { zone, count })
            .collect();
        zones.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then(a.zone.ordinal().cmp(&b.zone.ordinal()))
        });

        let mut top_neighborhoods: Vec<NeighborhoodCount> = neighborhood_counts
            .into_iter()
            .map(|(name, count)| NeighborhoodCount {
                neighborhood: name.to_string(),
                count,
            })
            .collect();
        top_neighborhoods.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.neighborhood.cmp(&b.neighborhood))
        });
        top_neighborhoods.truncate(TOP_NEIGHBORHOODS);

        SessionSummary {
            total: self.locations.len(),
            distinct_zones,
            distinct_sources,
            last_postal_code: self.locations.last().map(|r| r.postal_code.clone()),
            in_target_city: in_city.len(),
            outside_target_city: self.locations.len() - in_city.len(),
            zones,
            top_neighborhoods,
        }
    }
}

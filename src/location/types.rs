//! Core types for the CEP pipeline.

use crate::zones::Zone;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Placeholder for street and neighborhood text a source did not provide.
pub const PLACEHOLDER: &str = "N/I";

/// Strip every hyphen from a postal code as written by a user or a source.
pub fn clean_postal_code(raw: &str) -> String {
    raw.replace('-', "")
}

/// A validated CEP: exactly 8 ASCII digits once hyphens are removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostalCode(String);

impl PostalCode {
    /// Validate raw user input. Hyphen placement is irrelevant, only the
    /// digit count matters.
    pub fn parse(raw: &str) -> Result<Self, CepError> {
        let trimmed = raw.trim();
        let digits = clean_postal_code(trimmed);
        if digits.len() == 8 && digits.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(digits))
        } else {
            Err(CepError::InvalidFormat(trimmed.to_string()))
        }
    }

    /// The cleaned 8-digit form, used for cache keys and duplicate checks.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Canonical `NNNNN-NNN` form.
    pub fn hyphenated(&self) -> String {
        format!("{}-{}", &self.0[..5], &self.0[5..])
    }
}

impl FromStr for PostalCode {
    type Err = CepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.hyphenated())
    }
}

/// Which lookup path produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LocationSource {
    PrimaryApi,
    SecondaryApiWithGeocoding,
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrimaryApi => write!(f, "BrasilAPI"),
            Self::SecondaryApiWithGeocoding => write!(f, "ViaCEP + Nominatim"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// A resolved CEP. Created once per successful resolution and given a zone
/// right after classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Postal code as the source returned it (hyphenated or not).
    pub postal_code: String,
    pub street: String,
    pub neighborhood: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
    pub source: LocationSource,
    /// `None` until the classifier has run.
    #[serde(default)]
    pub zone: Option<Zone>,
}

impl LocationRecord {
    pub fn cleaned_postal_code(&self) -> String {
        clean_postal_code(&self.postal_code)
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates {
            lat: self.latitude,
            lon: self.longitude,
        }
    }

    pub fn with_zone(self, zone: Zone) -> Self {
        Self {
            zone: Some(zone),
            ..self
        }
    }

    /// One-line listing: `01310-100 — Bela Vista (Central) - São Paulo`.
    pub fn display_line(&self) -> String {
        let zone = self
            .zone
            .map(|z| z.to_string())
            .unwrap_or_else(|| "?".into());
        format!(
            "{} \u{2014} {} ({}) - {}",
            self.postal_code, self.neighborhood, zone, self.city
        )
    }
}

/// Per-CEP failures reported back to the user. None of them aborts a batch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CepError {
    #[error("'{0}' is not a valid CEP")]
    InvalidFormat(String),
    #[error("CEP {0} already added")]
    DuplicateEntry(String),
    #[error("CEP {0} not found")]
    NotFound(String),
}

impl CepError {
    /// Stable machine-readable tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidFormat(_) => "invalid_format",
            Self::DuplicateEntry(_) => "duplicate_entry",
            Self::NotFound(_) => "not_found",
        }
    }
}

/// Failures inside a single provider call. Logged and swallowed by the
/// resolver, never shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("source reported an unknown CEP")]
    Rejected,
}

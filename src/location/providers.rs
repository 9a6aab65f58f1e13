//! Lookup providers: BrasilAPI (primary), ViaCEP (secondary) and Nominatim
//! (forward geocoding of ViaCEP addresses).

use super::types::{Coordinates, LocationRecord, LocationSource, ProviderError, PLACEHOLDER};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

pub const BRASILAPI_URL: &str = "https://brasilapi.com.br";
pub const VIACEP_URL: &str = "https://viacep.com.br";
pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

pub const DEFAULT_USER_AGENT: &str = concat!("cep-zones/", env!("CARGO_PKG_VERSION"));

fn build_agent(timeout: Duration, user_agent: &str) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(timeout)
        .user_agent(user_agent)
        .build()
}

/// Run a GET and decode its JSON body. Anything other than 200 is an error.
fn fetch_json<T: DeserializeOwned>(request: ureq::Request) -> Result<T, ProviderError> {
    let response = request.call().map_err(|e| match e {
        ureq::Error::Status(code, _) => ProviderError::Status(code),
        other => ProviderError::Network(other.to_string()),
    })?;

    if response.status() != 200 {
        return Err(ProviderError::Status(response.status()));
    }

    response
        .into_json()
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}

fn text_or_placeholder(value: Option<String>) -> String {
    value.unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Accept coordinates as JSON numbers or numeric strings. Non-finite
/// values (`"NaN"`, `"inf"`) count as missing.
fn coordinate(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// True whenever the key is present, whatever its value (`null` included).
fn key_present<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|_| true)
}

// ─── BrasilAPI ──────────────────────────────────────────────────

#[derive(Deserialize, Debug, Clone)]
pub struct BrasilApiAddress {
    pub cep: String,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub location: Option<BrasilApiLocation>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BrasilApiLocation {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub coordinates: Option<BrasilApiCoordinates>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct BrasilApiCoordinates {
    #[serde(default)]
    pub latitude: Option<Value>,
    #[serde(default)]
    pub longitude: Option<Value>,
}

impl BrasilApiAddress {
    /// The point coordinate, if the body carries a usable one.
    pub fn point(&self) -> Option<Coordinates> {
        let location = self.location.as_ref()?;
        if location.kind.as_deref() != Some("Point") {
            return None;
        }
        let coords = location.coordinates.as_ref()?;
        Some(Coordinates {
            lat: coordinate(coords.latitude.as_ref())?,
            lon: coordinate(coords.longitude.as_ref())?,
        })
    }

    /// Build a record, or None when there is no point coordinate.
    pub fn into_record(self) -> Option<LocationRecord> {
        let point = self.point()?;
        Some(LocationRecord {
            postal_code: self.cep,
            street: text_or_placeholder(self.street),
            neighborhood: text_or_placeholder(self.neighborhood),
            city: self.city.unwrap_or_default(),
            latitude: point.lat,
            longitude: point.lon,
            source: LocationSource::PrimaryApi,
            zone: None,
        })
    }
}

/// BrasilAPI CEP v2 client.
pub struct BrasilApi {
    agent: ureq::Agent,
    base_url: String,
}

impl BrasilApi {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Self {
        Self {
            agent: build_agent(timeout, user_agent),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn lookup(&self, cep: &str) -> Result<BrasilApiAddress, ProviderError> {
        let url = format!("{}/api/cep/v2/{}", self.base_url, cep);
        fetch_json(self.agent.get(&url))
    }
}

// ─── ViaCEP ─────────────────────────────────────────────────────

#[derive(Deserialize, Debug, Clone, Default)]
pub struct ViaCepAddress {
    #[serde(default)]
    pub cep: Option<String>,
    #[serde(default)]
    pub logradouro: Option<String>,
    #[serde(default)]
    pub bairro: Option<String>,
    #[serde(default)]
    pub localidade: Option<String>,
    #[serde(default)]
    pub uf: Option<String>,
    /// Set when the body carries an `erro` key: the CEP does not exist.
    #[serde(default, deserialize_with = "key_present")]
    pub erro: bool,
}

impl ViaCepAddress {
    /// `"{street}, {city}"`.
    pub fn short_query(&self) -> Option<String> {
        let street = self.logradouro.as_deref()?;
        let city = self.localidade.as_deref()?;
        Some(format!("{}, {}", street, city))
    }

    /// `"{street}, {neighborhood}, {city}, {state}, Brasil"`.
    pub fn detailed_query(&self) -> Option<String> {
        Some(format!(
            "{}, {}, {}, {}, Brasil",
            self.logradouro.as_deref()?,
            self.bairro.as_deref()?,
            self.localidade.as_deref()?,
            self.uf.as_deref()?,
        ))
    }

    /// Geocode the address, retrying with the detailed query when the short
    /// one finds nothing. Returns None if neither query matches or the body
    /// lacks the fields a query needs.
    pub fn geocode_with(
        &self,
        geocoder: &dyn Geocoder,
    ) -> Result<Option<LocationRecord>, ProviderError> {
        let Some(short) = self.short_query() else {
            return Ok(None);
        };

        let mut point = geocoder.geocode(&short)?;
        if point.is_none() {
            if let Some(detailed) = self.detailed_query() {
                point = geocoder.geocode(&detailed)?;
            }
        }

        let (Some(point), Some(cep)) = (point, self.cep.clone()) else {
            return Ok(None);
        };

        Ok(Some(LocationRecord {
            postal_code: cep,
            street: text_or_placeholder(self.logradouro.clone()),
            neighborhood: text_or_placeholder(self.bairro.clone()),
            city: self.localidade.clone().unwrap_or_default(),
            latitude: point.lat,
            longitude: point.lon,
            source: LocationSource::SecondaryApiWithGeocoding,
            zone: None,
        }))
    }
}

/// ViaCEP client.
pub struct ViaCep {
    agent: ureq::Agent,
    base_url: String,
}

impl ViaCep {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Self {
        Self {
            agent: build_agent(timeout, user_agent),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn lookup(&self, cep: &str) -> Result<ViaCepAddress, ProviderError> {
        let url = format!("{}/ws/{}/json/", self.base_url, cep);
        let address: ViaCepAddress = fetch_json(self.agent.get(&url))?;
        if address.erro {
            return Err(ProviderError::Rejected);
        }
        Ok(address)
    }
}

// ─── Nominatim ──────────────────────────────────────────────────

/// Forward geocoding: free-text address to best-match coordinate.
pub trait Geocoder: Send {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>, ProviderError>;
}

#[derive(Deserialize, Debug, Clone)]
pub struct NominatimResult {
    pub lat: String,
    pub lon: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// OpenStreetMap Nominatim search client.
pub struct Nominatim {
    agent: ureq::Agent,
    base_url: String,
}

impl Nominatim {
    pub fn new(base_url: &str, timeout: Duration, user_agent: &str) -> Self {
        Self {
            agent: build_agent(timeout, user_agent),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

impl Geocoder for Nominatim {
    fn geocode(&self, query: &str) -> Result<Option<Coordinates>, ProviderError> {
        let url = format!("{}/search", self.base_url);
        let request = self
            .agent
            .get(&url)
            .query("q", query)
            .query("format", "json")
            .query("limit", "1");

        let results: Vec<NominatimResult> = fetch_json(request)?;
        let Some(top) = results.first() else {
            return Ok(None);
        };

        let lat = top
            .lat
            .parse()
            .map_err(|_| ProviderError::InvalidResponse(format!("bad lat '{}'", top.lat)))?;
        let lon = top
            .lon
            .parse()
            .map_err(|_| ProviderError::InvalidResponse(format!("bad lon '{}'", top.lon)))?;
        Ok(Some(Coordinates { lat, lon }))
    }
}

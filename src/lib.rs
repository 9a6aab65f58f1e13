//! cep-zones: resolve Brazilian CEPs to addresses and coordinates, then
//! classify them into the five zones of São Paulo.
//!
//! The pipeline is `PostalCode::parse` → [`location::CepResolver`] →
//! [`zones::Classifier`], driven by a [`session::Session`] that owns the
//! ordered collection of results.

pub mod config;
pub mod location;
pub mod server;
pub mod session;
pub mod text;
pub mod zones;

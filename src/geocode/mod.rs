//! Address/coordinate resolution through the Google geocoding service
//!
//! Normalizers call this at most once per record, sequentially; there is no
//! batching contract with the service. The [`Geocoder`] trait is the seam
//! for tests and alternative providers.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;
use url::Url;

use crate::config::GeocodingConfig;
use crate::error::{Error, FetchError, GeocodeError, Result};

/// Placeholder returned when a reverse lookup has no result. The original
/// feed pipeline used this downtown-street stand-in rather than dropping the
/// record; the address parser then degrades it to road-only location fields.
const FALLBACK_ADDRESS: &str = "市區路";

/// External address/coordinate lookup contract
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Forward lookup: address text to WGS84 (latitude, longitude)
    async fn address_to_coordinate(&self, address: &str)
        -> std::result::Result<(f64, f64), GeocodeError>;

    /// Reverse lookup: WGS84 point to formatted address text
    async fn coordinate_to_address(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> std::result::Result<String, GeocodeError>;
}

/// Google Maps geocode API client
pub struct GoogleGeocoder {
    client: Client,
    endpoint: Url,
    api_key: String,
    language: String,
}

impl GoogleGeocoder {
    /// Create a geocoder from explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns a config error when the base URL is not parseable or the
    /// HTTP client cannot be constructed.
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .gzip(true)
            .build()
            .map_err(FetchError::Http)?;

        let endpoint = Url::parse(&config.base_url)
            .and_then(|base| base.join("/maps/api/geocode/json"))
            .map_err(|_| Error::Fetch(FetchError::InvalidUrl(config.base_url.clone())))?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            language: config.language.clone(),
        })
    }

    async fn query(
        &self,
        params: &[(&str, &str)],
    ) -> std::result::Result<GeocodeResponse, GeocodeError> {
        let response = self
            .client
            .get(self.endpoint.clone())
            .query(params)
            .query(&[("language", self.language.as_str()), ("key", &self.api_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    async fn address_to_coordinate(
        &self,
        address: &str,
    ) -> std::result::Result<(f64, f64), GeocodeError> {
        let body = self.query(&[("address", address)]).await?;

        body.results
            .into_iter()
            .next()
            .map(|r| (r.geometry.location.lat, r.geometry.location.lng))
            .ok_or_else(|| GeocodeError::NoResult {
                query: address.to_string(),
            })
    }

    async fn coordinate_to_address(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> std::result::Result<String, GeocodeError> {
        let latlng = format!("{latitude},{longitude}");
        let body = self.query(&[("latlng", latlng.as_str())]).await?;

        match body.results.into_iter().next() {
            Some(r) => Ok(r.formatted_address),
            None => {
                warn!(%latitude, %longitude, "no reverse geocode result, using fallback address");
                Ok(FALLBACK_ADDRESS.to_string())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    formatted_address: String,
    geometry: Geometry,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_built_from_base_url() {
        let config = GeocodingConfig {
            base_url: "http://127.0.0.1:9999".to_string(),
            ..GeocodingConfig::default()
        };
        let geocoder = GoogleGeocoder::new(&config).unwrap();
        assert_eq!(
            geocoder.endpoint.as_str(),
            "http://127.0.0.1:9999/maps/api/geocode/json"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = GeocodingConfig {
            base_url: "not a url".to_string(),
            ..GeocodingConfig::default()
        };
        assert!(GoogleGeocoder::new(&config).is_err());
    }

    #[test]
    fn test_response_deserialization() {
        let body = r#"{
            "results": [{
                "formatted_address": "台北市大安區羅斯福路四段1號",
                "geometry": {"location": {"lat": 25.017153, "lng": 121.533904}}
            }],
            "status": "OK"
        }"#;
        let parsed: GeocodeResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert!((parsed.results[0].geometry.location.lat - 25.017153).abs() < 1e-9);
    }
}

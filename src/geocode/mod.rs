//! Address geocoding through a Nominatim search endpoint.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::GeocodeError;
use crate::models::GeoPoint;

pub const NOMINATIM_SEARCH_ENDPOINT: &str = "https://nominatim.openstreetmap.org/search";

/// One Nominatim search hit; coordinates come back as strings
#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

/// Resolves free-text addresses to coordinates
pub struct Geocoder {
    client: Client,
    endpoint: Url,
}

impl Geocoder {
    pub fn new(endpoint: &str, user_agent: &str, timeout: Duration) -> Result<Self, GeocodeError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| GeocodeError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, endpoint })
    }

    /// Coordinates of the best match for `address`
    ///
    /// `Ok(None)` means the service knows no such address.
    pub async fn geocode(&self, address: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        let address = address.trim();
        if address.is_empty() {
            return Ok(None);
        }

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", address)
            .append_pair("format", "json")
            .append_pair("limit", "1");

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            warn!(
                "Geocoder returned status {} for {:?}",
                response.status(),
                address
            );
            return Err(GeocodeError::Status(response.status()));
        }

        let body = response.text().await?;
        let point = parse_search_response(&body)?;

        debug!("Geocoded {:?} to {:?}", address, point);
        Ok(point)
    }
}

/// Extract the first hit from a Nominatim JSON search response
pub fn parse_search_response(body: &str) -> Result<Option<GeoPoint>, GeocodeError> {
    let places: Vec<NominatimPlace> = serde_json::from_str(body)
        .map_err(|e| GeocodeError::InvalidCoordinate(format!("bad response: {}", e)))?;

    let Some(place) = places.into_iter().next() else {
        return Ok(None);
    };

    let lat: f64 = place
        .lat
        .trim()
        .parse()
        .map_err(|_| GeocodeError::InvalidCoordinate(place.lat.clone()))?;
    let lon: f64 = place
        .lon
        .trim()
        .parse()
        .map_err(|_| GeocodeError::InvalidCoordinate(place.lon.clone()))?;

    let point = GeoPoint::new(lat, lon);
    if !point.is_finite() {
        return Err(GeocodeError::InvalidCoordinate(format!("{}, {}", lat, lon)));
    }

    Ok(Some(point))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_hit() {
        let body = r#"[
            {"place_id": 1, "lat": "44.8378", "lon": "-0.5792", "display_name": "Bordeaux"},
            {"place_id": 2, "lat": "0", "lon": "0", "display_name": "Elsewhere"}
        ]"#;
        let point = parse_search_response(body).unwrap().unwrap();
        assert_eq!(point, GeoPoint::new(44.8378, -0.5792));
    }

    #[test]
    fn test_parse_no_hit() {
        assert_eq!(parse_search_response("[]").unwrap(), None);
    }

    #[test]
    fn test_parse_bad_coordinate() {
        let body = r#"[{"lat": "north", "lon": "-0.5"}]"#;
        assert!(matches!(
            parse_search_response(body),
            Err(GeocodeError::InvalidCoordinate(_))
        ));
        assert!(parse_search_response("{}").is_err());
    }

    #[tokio::test]
    async fn test_blank_address_skips_lookup() {
        // Unroutable endpoint: must not be contacted for a blank address
        let geocoder = Geocoder::new("http://127.0.0.1:9/search", "test", Duration::from_secs(1)).unwrap();
        assert_eq!(geocoder.geocode("   ").await.unwrap(), None);
    }
}

//! Best-effort reverse-geocoding enrichment.
//!
//! Runs after the route is final, one waypoint at a time. Lookups are slow
//! and rate limited, so the pass is strictly sequential with pacing between
//! calls; any per-point failure degrades to empty address fields and never
//! fails the job.

use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::error::Result;
use crate::export::WaypointRow;
use crate::geo::Coordinate;

/// Default Nominatim reverse-geocoding endpoint.
pub const DEFAULT_NOMINATIM_ENDPOINT: &str = "https://nominatim.openstreetmap.org/reverse";

/// Street-level address fields for a single point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Address {
    pub street: String,
    pub neighbourhood: String,
    pub city: String,
}

/// Coordinate to address lookup. `Ok(None)` means the provider had nothing
/// for the point; errors are treated the same way by the enrichment pass.
pub trait ReverseGeocoder {
    fn reverse(&self, point: Coordinate) -> Result<Option<Address>>;
}

/// Build the waypoint table, enriching each row when a geocoder is given.
///
/// Row numbering starts at 1. Enrichment failures are logged and leave the
/// address fields of that row empty.
pub fn enrich_waypoints(
    geocoder: Option<&dyn ReverseGeocoder>,
    waypoints: &[Coordinate],
) -> Vec<WaypointRow> {
    waypoints
        .iter()
        .enumerate()
        .map(|(index, &point)| {
            let address = match geocoder.map(|g| g.reverse(point)) {
                Some(Ok(Some(address))) => address,
                Some(Ok(None)) => Address::default(),
                Some(Err(error)) => {
                    warn!(
                        lat = point.lat,
                        lon = point.lon,
                        %error,
                        "reverse geocoding failed, leaving address empty"
                    );
                    Address::default()
                }
                None => Address::default(),
            };
            WaypointRow {
                point: index + 1,
                street: address.street,
                neighbourhood: address.neighbourhood,
                city: address.city,
                lat: point.lat,
                lon: point.lon,
            }
        })
        .collect()
}

/// Reverse geocoder backed by the Nominatim `jsonv2` endpoint.
///
/// Sleeps after every request to stay under the public instance's one
/// request per second policy.
pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    endpoint: String,
    pause: Duration,
}

impl NominatimGeocoder {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(DEFAULT_NOMINATIM_ENDPOINT, Duration::from_secs(1))
    }

    pub fn with_endpoint(endpoint: impl Into<String>, pause: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("sweeproute/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            pause,
        })
    }
}

impl ReverseGeocoder for NominatimGeocoder {
    fn reverse(&self, point: Coordinate) -> Result<Option<Address>> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("format", "jsonv2".to_string()),
                ("lat", format!("{:.7}", point.lat)),
                ("lon", format!("{:.7}", point.lon)),
            ])
            .send()?
            .error_for_status()?;
        let payload: NominatimPayload = response.json()?;
        std::thread::sleep(self.pause);
        Ok(payload.address.map(Address::from))
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPayload {
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    #[serde(default)]
    road: Option<String>,
    #[serde(default)]
    neighbourhood: Option<String>,
    #[serde(default)]
    suburb: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    town: Option<String>,
    #[serde(default)]
    village: Option<String>,
}

impl From<NominatimAddress> for Address {
    fn from(raw: NominatimAddress) -> Self {
        Self {
            street: raw.road.unwrap_or_default(),
            neighbourhood: raw.neighbourhood.or(raw.suburb).unwrap_or_default(),
            city: raw.city.or(raw.town).or(raw.village).unwrap_or_default(),
        }
    }
}

//! Routing provider adapter.
//!
//! The external provider is a road-routing HTTP API that answers a driving
//! query with a status code, string-typed distance/duration, and one or more
//! path segments each carrying a semicolon-delimited `"lng,lat"` polyline.
//! The adapter's whole job is to normalize that shape into a `RouteResult`;
//! everything downstream is provider-agnostic.

use std::future::Future;
use std::pin::Pin;

use geo::Coord;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RoutingError;

/// Normalized route geometry and travel estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResult {
    /// Travel distance in whole meters.
    pub distance_m: u64,
    /// Travel time in whole seconds.
    pub duration_s: u64,
    /// Flattened path, every segment's points concatenated in segment order.
    pub path: Vec<Coord>,
}

/// Type alias for a boxed future that can be sent between threads.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait for route providers.
///
/// Implementations must be `Send + Sync` for use across async tasks.
/// Methods return boxed futures for dyn-compatibility. This call performs
/// network I/O and is slow and fallible; the coordinator's single-flight
/// cache ensures it runs at most once per distinct endpoint pair.
pub trait RouteProvider: Send + Sync {
    fn fetch_route(
        &self,
        origin: Coord,
        destination: Coord,
    ) -> BoxFuture<'_, Result<RouteResult, RoutingError>>;
}

/// Wire shape of the provider's driving-direction response.
#[derive(Debug, Deserialize)]
pub struct DrivingResponse {
    pub status: String,
    #[serde(default)]
    pub info: String,
    #[serde(default)]
    pub route: Option<DrivingRoute>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DrivingRoute {
    #[serde(default)]
    pub paths: Vec<DrivingPath>,
}

#[derive(Debug, Deserialize)]
pub struct DrivingPath {
    pub distance: String,
    pub duration: String,
    #[serde(default)]
    pub steps: Vec<DrivingStep>,
}

#[derive(Debug, Deserialize)]
pub struct DrivingStep {
    pub polyline: String,
}

/// Normalizes a decoded provider response into a `RouteResult`.
pub fn normalize_response(resp: DrivingResponse) -> Result<RouteResult, RoutingError> {
    if resp.status != "1" {
        return Err(RoutingError::Provider {
            status: resp.status,
            info: resp.info,
        });
    }

    let path = resp
        .route
        .unwrap_or_default()
        .paths
        .into_iter()
        .next()
        .ok_or(RoutingError::EmptyRoute)?;

    let mut points = Vec::new();
    for step in &path.steps {
        flatten_polyline(&step.polyline, &mut points);
    }
    if points.is_empty() {
        return Err(RoutingError::EmptyRoute);
    }

    Ok(RouteResult {
        distance_m: parse_metric(&path.distance, "distance")?,
        duration_s: parse_metric(&path.duration, "duration")?,
        path: points,
    })
}

/// Appends a segment's `"lng,lat;lng,lat;..."` polyline to `out`.
///
/// Tokens that do not parse as two finite numbers are discarded, matching
/// the tolerant treatment of provider data everywhere else.
fn flatten_polyline(polyline: &str, out: &mut Vec<Coord>) {
    for token in polyline.split(';') {
        let mut parts = token.split(',');
        let (Some(lng), Some(lat)) = (parts.next(), parts.next()) else {
            continue;
        };
        let (Ok(lng), Ok(lat)) = (lng.trim().parse::<f64>(), lat.trim().parse::<f64>()) else {
            continue;
        };
        let coord = Coord::new(lng, lat);
        if coord.is_finite() {
            out.push(coord);
        }
    }
}

/// Parses a string-typed provider metric into whole units, truncating any
/// fractional part.
fn parse_metric(raw: &str, field: &str) -> Result<u64, RoutingError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| RoutingError::Malformed(format!("{field} is not numeric: {raw:?}")))?;
    if !value.is_finite() || value < 0.0 {
        return Err(RoutingError::Malformed(format!(
            "{field} out of range: {raw:?}"
        )));
    }
    Ok(value as u64)
}

/// Configuration for the HTTP route provider.
#[derive(Debug, Clone)]
pub struct HttpRouteConfig {
    /// Driving-direction endpoint.
    pub base_url: String,
    /// Provider API key.
    pub key: String,
}

impl HttpRouteConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            base_url: "https://restapi.amap.com/v3/direction/driving".to_string(),
            key: key.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// HTTP-backed route provider.
pub struct HttpRouteProvider {
    config: HttpRouteConfig,
    client: reqwest::Client,
}

impl HttpRouteProvider {
    pub fn new(config: HttpRouteConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_client(config: HttpRouteConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }
}

impl RouteProvider for HttpRouteProvider {
    fn fetch_route(
        &self,
        origin: Coord,
        destination: Coord,
    ) -> BoxFuture<'_, Result<RouteResult, RoutingError>> {
        Box::pin(async move {
            debug!(
                "fetching route ({}, {}) -> ({}, {})",
                origin.lng, origin.lat, destination.lng, destination.lat
            );

            let resp = self
                .client
                .get(&self.config.base_url)
                .query(&[
                    ("key", self.config.key.as_str()),
                    ("origin", &format!("{},{}", origin.lng, origin.lat)),
                    ("destination", &format!("{},{}", destination.lng, destination.lat)),
                    ("extensions", "base"),
                ])
                .send()
                .await
                .map_err(|e| RoutingError::Transport(e.to_string()))?;

            if !resp.status().is_success() {
                return Err(RoutingError::Transport(format!(
                    "http status {}",
                    resp.status()
                )));
            }

            let body: DrivingResponse = resp
                .json()
                .await
                .map_err(|e| RoutingError::Malformed(e.to_string()))?;

            normalize_response(body)
        })
    }
}

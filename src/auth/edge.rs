//! Edge metadata read from the current request.
//!
//! The hosting platform annotates inbound requests with the geolocation of
//! the edge location that received them. The snapshot either exists for a
//! request or it does not; fields are copied verbatim, never synthesized.

use axum::http::HeaderMap;

pub(crate) const HEADER_TIMEZONE: &str = "x-edge-timezone";
pub(crate) const HEADER_CITY: &str = "x-edge-city";
pub(crate) const HEADER_COUNTRY: &str = "x-edge-country";
pub(crate) const HEADER_REGION: &str = "x-edge-region";
pub(crate) const HEADER_REGION_CODE: &str = "x-edge-region-code";
pub(crate) const HEADER_COLO: &str = "x-edge-colo";
pub(crate) const HEADER_LATITUDE: &str = "x-edge-latitude";
pub(crate) const HEADER_LONGITUDE: &str = "x-edge-longitude";

/// Geolocation snapshot for a single request.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EdgeGeo {
    pub timezone: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub region: Option<String>,
    pub region_code: Option<String>,
    pub colo: Option<String>,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
}

/// What the handler records about the caller, gated by the tracking flags.
#[derive(Clone, Debug, Default)]
pub struct ClientInfo {
    pub ip: Option<String>,
    pub geo: Option<EdgeGeo>,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Read the request's geolocation snapshot.
///
/// Returns `None` when the platform supplied no edge metadata at all
/// (local development); otherwise every present header is copied verbatim.
#[must_use]
pub fn edge_geo(headers: &HeaderMap) -> Option<EdgeGeo> {
    let geo = EdgeGeo {
        timezone: header_value(headers, HEADER_TIMEZONE),
        city: header_value(headers, HEADER_CITY),
        country: header_value(headers, HEADER_COUNTRY),
        region: header_value(headers, HEADER_REGION),
        region_code: header_value(headers, HEADER_REGION_CODE),
        colo: header_value(headers, HEADER_COLO),
        latitude: header_value(headers, HEADER_LATITUDE),
        longitude: header_value(headers, HEADER_LONGITUDE),
    };

    if geo == EdgeGeo::default() {
        None
    } else {
        Some(geo)
    }
}

/// Extract a client IP for tracking and rate limiting from common proxy headers.
#[must_use]
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty());
    if forwarded.is_some() {
        return forwarded.map(str::to_string);
    }
    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn full_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_TIMEZONE, HeaderValue::from_static("Europe/Rome"));
        headers.insert(HEADER_CITY, HeaderValue::from_static("Milan"));
        headers.insert(HEADER_COUNTRY, HeaderValue::from_static("IT"));
        headers.insert(HEADER_REGION, HeaderValue::from_static("Lombardy"));
        headers.insert(HEADER_REGION_CODE, HeaderValue::from_static("MI"));
        headers.insert(HEADER_COLO, HeaderValue::from_static("MXP"));
        headers.insert(HEADER_LATITUDE, HeaderValue::from_static("45.46420"));
        headers.insert(HEADER_LONGITUDE, HeaderValue::from_static("9.18998"));
        headers
    }

    #[test]
    fn no_edge_headers_means_no_snapshot() {
        let headers = HeaderMap::new();
        assert_eq!(edge_geo(&headers), None);
    }

    #[test]
    fn all_eight_fields_copied_verbatim() {
        let geo = edge_geo(&full_headers()).expect("snapshot");
        assert_eq!(geo.timezone.as_deref(), Some("Europe/Rome"));
        assert_eq!(geo.city.as_deref(), Some("Milan"));
        assert_eq!(geo.country.as_deref(), Some("IT"));
        assert_eq!(geo.region.as_deref(), Some("Lombardy"));
        assert_eq!(geo.region_code.as_deref(), Some("MI"));
        assert_eq!(geo.colo.as_deref(), Some("MXP"));
        assert_eq!(geo.latitude.as_deref(), Some("45.46420"));
        assert_eq!(geo.longitude.as_deref(), Some("9.18998"));
    }

    #[test]
    fn single_header_still_yields_snapshot() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_COLO, HeaderValue::from_static("FRA"));
        let geo = edge_geo(&headers).expect("snapshot");
        assert_eq!(geo.colo.as_deref(), Some("FRA"));
        assert_eq!(geo.city, None);
    }

    #[test]
    fn blank_headers_do_not_count() {
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_CITY, HeaderValue::from_static("  "));
        assert_eq!(edge_geo(&headers), None);
    }

    #[test]
    fn extract_client_ip_prefers_forwarded() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("1.2.3.4, 5.6.7.8"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("1.2.3.4".to_string()));
    }

    #[test]
    fn extract_client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("9.9.9.9"));
        assert_eq!(extract_client_ip(&headers), Some("9.9.9.9".to_string()));
    }

    #[test]
    fn extract_client_ip_none_when_missing() {
        let headers = HeaderMap::new();
        assert_eq!(extract_client_ip(&headers), None);
    }
}

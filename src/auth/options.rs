//! Request-scoped handler configuration.
//!
//! An `AuthOptions` value is built fresh for every construction of an
//! `AuthHandler` and discarded with it. The two constructors encode the two
//! construction paths: strict per-request (tracking and rate limiting on,
//! edge snapshot injected) and relaxed per-process (everything off).

use super::{
    edge::EdgeGeo,
    origins::{trusted_origins, OriginPattern, Tier},
};

#[derive(Clone, Debug)]
pub struct AuthOptions {
    pub ip_tracking: bool,
    pub geolocation_tracking: bool,
    pub edge_geo: Option<EdgeGeo>,
    pub rate_limit_enabled: bool,
    pub trusted_origins: Vec<OriginPattern>,
}

impl AuthOptions {
    /// Configuration for the per-request handler: tracking and rate
    /// limiting enabled, with the request's geolocation snapshot (or none
    /// when the platform supplied none).
    #[must_use]
    pub fn for_request(tier: Tier, edge_geo: Option<EdgeGeo>) -> Self {
        Self {
            ip_tracking: true,
            geolocation_tracking: true,
            edge_geo,
            rate_limit_enabled: true,
            trusted_origins: trusted_origins(tier),
        }
    }

    /// Configuration for the process-wide handler: no request context, so
    /// no tracking, no geolocation, and no rate limiting.
    #[must_use]
    pub fn for_process(tier: Tier) -> Self {
        Self {
            ip_tracking: false,
            geolocation_tracking: false,
            edge_geo: None,
            rate_limit_enabled: false,
            trusted_origins: trusted_origins(tier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_options_enable_tracking_and_limits() {
        let geo = EdgeGeo {
            colo: Some("MXP".to_string()),
            ..EdgeGeo::default()
        };
        let options = AuthOptions::for_request(Tier::Local, Some(geo.clone()));
        assert!(options.ip_tracking);
        assert!(options.geolocation_tracking);
        assert!(options.rate_limit_enabled);
        assert_eq!(options.edge_geo, Some(geo));
    }

    #[test]
    fn process_options_disable_everything() {
        let options = AuthOptions::for_process(Tier::Local);
        assert!(!options.ip_tracking);
        assert!(!options.geolocation_tracking);
        assert!(!options.rate_limit_enabled);
        assert_eq!(options.edge_geo, None);
    }

    #[test]
    fn both_paths_share_one_origin_list() {
        for tier in [Tier::Local, Tier::Staging, Tier::Production] {
            let request = AuthOptions::for_request(tier, None);
            let process = AuthOptions::for_process(tier);
            assert_eq!(request.trusted_origins, process.trusted_origins);
        }
    }
}

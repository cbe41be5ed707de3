//! Trusted origin lists per environment tier.
//!
//! Both the process-wide and the per-request configurations derive their
//! origin list from `trusted_origins`, so the two can never drift apart.
//! Patterns ending in `:*` match any port on that scheme+host.

use anyhow::anyhow;
use std::str::FromStr;

/// Environment tier selecting which origins are trusted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tier {
    Local,
    Staging,
    Production,
}

impl Tier {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

impl FromStr for Tier {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "local" => Ok(Self::Local),
            "staging" => Ok(Self::Staging),
            "production" => Ok(Self::Production),
            other => Err(anyhow!("unknown tier: {other}")),
        }
    }
}

/// A literal origin, or a scheme+host with a `:*` port wildcard.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OriginPattern(&'static str);

impl OriginPattern {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Match an `Origin` header value against this pattern.
    #[must_use]
    pub fn matches(&self, origin: &str) -> bool {
        if let Some(prefix) = self.0.strip_suffix(":*") {
            return origin == prefix || origin.strip_prefix(prefix).is_some_and(|rest| {
                rest.strip_prefix(':')
                    .is_some_and(|port| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
            });
        }
        origin == self.0
    }
}

/// The single source of truth for allowed origins per tier.
#[must_use]
pub fn trusted_origins(tier: Tier) -> Vec<OriginPattern> {
    let mut origins = Vec::new();
    match tier {
        Tier::Local => {
            origins.push(OriginPattern("http://localhost:*"));
            origins.push(OriginPattern("https://localhost:*"));
        }
        Tier::Staging => {
            origins.push(OriginPattern("http://localhost:*"));
            origins.push(OriginPattern("https://localhost:*"));
            origins.push(OriginPattern("https://staging.varco.dev"));
        }
        Tier::Production => {
            origins.push(OriginPattern("https://varco.dev"));
        }
    }
    origins
}

/// True when any pattern in the list matches the origin.
#[must_use]
pub fn origin_allowed(patterns: &[OriginPattern], origin: &str) -> bool {
    patterns.iter().any(|pattern| pattern.matches(origin))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_parses_known_values() {
        assert_eq!("local".parse::<Tier>().ok(), Some(Tier::Local));
        assert_eq!("staging".parse::<Tier>().ok(), Some(Tier::Staging));
        assert_eq!("production".parse::<Tier>().ok(), Some(Tier::Production));
        assert!("qa".parse::<Tier>().is_err());
    }

    #[test]
    fn wildcard_matches_any_localhost_port() {
        let pattern = OriginPattern("http://localhost:*");
        assert!(pattern.matches("http://localhost:3000"));
        assert!(pattern.matches("http://localhost:8787"));
        assert!(pattern.matches("http://localhost"));
        assert!(!pattern.matches("http://localhost:"));
        assert!(!pattern.matches("http://localhost:30a0"));
        assert!(!pattern.matches("http://localhost.evil.dev"));
        assert!(!pattern.matches("https://localhost:3000"));
    }

    #[test]
    fn literal_pattern_is_exact() {
        let pattern = OriginPattern("https://varco.dev");
        assert!(pattern.matches("https://varco.dev"));
        assert!(!pattern.matches("https://varco.dev.evil.dev"));
        assert!(!pattern.matches("https://sub.varco.dev"));
    }

    #[test]
    fn local_tier_allows_localhost_only() {
        let origins = trusted_origins(Tier::Local);
        assert!(origin_allowed(&origins, "http://localhost:3000"));
        assert!(origin_allowed(&origins, "https://localhost:8443"));
        assert!(!origin_allowed(&origins, "https://varco.dev"));
    }

    #[test]
    fn production_tier_drops_localhost() {
        let origins = trusted_origins(Tier::Production);
        assert!(origin_allowed(&origins, "https://varco.dev"));
        assert!(!origin_allowed(&origins, "http://localhost:3000"));
    }
}

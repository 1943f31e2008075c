use crate::error::{ExtractError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Decides whether a record's location belongs in the result set.
///
/// Implementations must be pure: the same inputs always give the same answer, and
/// records are judged independently of one another.
pub trait RecordFilter {
    fn accepts(&self, location: &str, description: &str) -> bool;
}

impl<F> RecordFilter for F
where
    F: Fn(&str, &str) -> bool,
{
    fn accepts(&self, location: &str, description: &str) -> bool {
        self(location, description)
    }
}

/// Parameters of [`NetworkPlanFilter`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilterConfig {
    /// Required first DNS label of the file host (the network identifier)
    pub subdomain: String,

    /// Case-insensitive substring the description must contain (the plan type)
    pub description_contains: String,

    /// Vendor domain under `mrf.`, used to build the default URL pattern
    pub vendor_domain: String,

    /// Full URL pattern override; capture group 1 must be the subdomain
    pub url_pattern: Option<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            subdomain: "empirebcbs".to_string(),
            description_contains: "ppo".to_string(),
            vendor_domain: "bcbs.com".to_string(),
            url_pattern: None,
        }
    }
}

impl FilterConfig {
    /// The URL pattern this config will compile
    pub fn pattern(&self) -> String {
        match &self.url_pattern {
            Some(pattern) => pattern.clone(),
            None => format!(
                r"https://([^.]+)\.mrf\.{}/.*\.json\.gz",
                regex::escape(&self.vendor_domain)
            ),
        }
    }

    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.subdomain.is_empty() {
            return Err("filter.subdomain must not be empty".to_string());
        }
        if self.url_pattern.is_none() && self.vendor_domain.is_empty() {
            return Err("filter.vendor_domain must not be empty".to_string());
        }
        Ok(())
    }
}

/// Reference filter: a network-specific file host plus a plan-type keyword.
///
/// A location is accepted when it matches the URL pattern, the captured subdomain
/// equals the configured one, and the description contains the keyword (ignoring
/// case). The pattern is compiled once, at construction.
#[derive(Debug, Clone)]
pub struct NetworkPlanFilter {
    url_pattern: Regex,
    subdomain: String,
    description_needle: String,
}

impl NetworkPlanFilter {
    pub fn new(config: &FilterConfig) -> Result<Self> {
        config.validate().map_err(ExtractError::InvalidConfig)?;

        let pattern = config.pattern();
        let url_pattern = Regex::new(&pattern).map_err(|err| {
            ExtractError::invalid_config(format!("invalid URL pattern `{pattern}`: {err}"))
        })?;
        if url_pattern.captures_len() < 2 {
            return Err(ExtractError::invalid_config(format!(
                "URL pattern `{pattern}` needs a capture group for the subdomain"
            )));
        }

        Ok(Self {
            url_pattern,
            subdomain: config.subdomain.clone(),
            description_needle: config.description_contains.to_lowercase(),
        })
    }

    fn subdomain_of<'a>(&self, location: &'a str) -> Option<&'a str> {
        self.url_pattern
            .captures(location)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

impl RecordFilter for NetworkPlanFilter {
    fn accepts(&self, location: &str, description: &str) -> bool {
        match self.subdomain_of(location) {
            Some(subdomain) if subdomain == self.subdomain => description
                .to_lowercase()
                .contains(&self.description_needle),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_filter() -> NetworkPlanFilter {
        NetworkPlanFilter::new(&FilterConfig::default()).unwrap()
    }

    #[test]
    fn accepts_matching_network_and_plan() {
        let filter = default_filter();
        assert!(filter.accepts(
            "https://empirebcbs.mrf.bcbs.com/x.json.gz",
            "Empire PPO Plan"
        ));
        assert!(filter.accepts(
            "https://empirebcbs.mrf.bcbs.com/2024-07/deep/path/file_ppo.json.gz?sig=abc",
            "empire blue ppo"
        ));
    }

    #[test]
    fn rejects_other_subdomain_or_plan() {
        let filter = default_filter();
        assert!(!filter.accepts("https://other.mrf.bcbs.com/x.json.gz", "Empire PPO Plan"));
        assert!(!filter.accepts("https://empirebcbs.mrf.bcbs.com/x.json.gz", "HMO Plan"));
        assert!(!filter.accepts("https://empirebcbs.mrf.bcbs.com/x.json", "PPO"));
        assert!(!filter.accepts("http://empirebcbs.mrf.bcbs.com/x.json.gz", "PPO"));
        assert!(!filter.accepts("https://empirebcbs.mrf.example.com/x.json.gz", "PPO"));
        assert!(!filter.accepts("", "PPO"));
    }

    #[test]
    fn vendor_domain_is_escaped() {
        let filter = default_filter();
        assert!(!filter.accepts("https://empirebcbs.mrf.bcbsXcom/x.json.gz", "PPO"));
    }

    #[test]
    fn configurable_network() {
        let filter = NetworkPlanFilter::new(&FilterConfig {
            subdomain: "anthembcbsco".to_string(),
            description_contains: "HMO".to_string(),
            vendor_domain: "anthem.com".to_string(),
            url_pattern: None,
        })
        .unwrap();
        assert!(filter.accepts("https://anthembcbsco.mrf.anthem.com/a.json.gz", "Colorado hmo"));
        assert!(!filter.accepts("https://anthembcbsco.mrf.bcbs.com/a.json.gz", "Colorado hmo"));
    }

    #[test]
    fn custom_pattern_requires_capture_group() {
        let config = FilterConfig {
            url_pattern: Some(r"https://\w+\.example\.org/.*".to_string()),
            ..FilterConfig::default()
        };
        let err = NetworkPlanFilter::new(&config).unwrap_err();
        assert!(err.to_string().contains("capture group"));

        let config = FilterConfig {
            url_pattern: Some("https://([".to_string()),
            ..FilterConfig::default()
        };
        assert!(matches!(
            NetworkPlanFilter::new(&config),
            Err(ExtractError::InvalidConfig(_))
        ));
    }

    #[test]
    fn closures_are_filters() {
        let filter = |location: &str, _: &str| location.ends_with(".gz");
        assert!(filter.accepts("a.gz", ""));
        assert!(!filter.accepts("a.json", ""));
    }
}

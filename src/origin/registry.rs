//! Ranked origin registry.
//!
//! # Responsibilities
//! - Hold the ordered origin list (ascending tier, tier 1 first)
//! - Validate tier invariants at construction, fail fast on violation
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Tier order IS the fallback order; no runtime re-ranking
//! - Shared via Arc to the prober and the router

use url::Url;

use crate::config::schema::OriginConfig;
use crate::config::validation::{validate_origins, ValidationError};

/// One candidate backend capable of fully serving a request.
#[derive(Debug, Clone)]
pub struct Origin {
    pub id: String,
    pub label: String,
    pub base_url: Url,
    pub health_path: String,
    /// Fallback rank; lower is tried first.
    pub tier: u32,
}

impl Origin {
    /// Absolute URL of this origin's health check endpoint.
    pub fn health_url(&self) -> String {
        join_path(&self.base_url, &self.health_path)
    }

    /// Absolute URL for forwarding the given path-and-query.
    pub fn target_url(&self, path_and_query: &str) -> String {
        join_path(&self.base_url, path_and_query)
    }
}

fn join_path(base: &Url, path: &str) -> String {
    let base = base.as_str().trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Immutable ordered list of origins.
#[derive(Debug)]
pub struct OriginRegistry {
    /// Ascending by tier.
    origins: Vec<Origin>,
}

impl OriginRegistry {
    /// Build the registry from configuration.
    ///
    /// Fails fast with every violation found: empty list, duplicate
    /// ids, duplicate or zero tiers, unparseable base URLs.
    pub fn from_config(configs: &[OriginConfig]) -> Result<Self, Vec<ValidationError>> {
        let errors = validate_origins(configs);
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut origins: Vec<Origin> = configs
            .iter()
            .map(|c| {
                // Parse already checked by validate_origins
                let base_url = Url::parse(&c.url).map_err(|e| {
                    vec![ValidationError::InvalidBaseUrl {
                        id: c.id.clone(),
                        reason: e.to_string(),
                    }]
                })?;
                Ok(Origin {
                    id: c.id.clone(),
                    label: if c.label.is_empty() {
                        c.id.clone()
                    } else {
                        c.label.clone()
                    },
                    base_url,
                    health_path: c.health_path.clone(),
                    tier: c.tier,
                })
            })
            .collect::<Result<_, Vec<ValidationError>>>()?;

        origins.sort_by_key(|o| o.tier);
        Ok(Self { origins })
    }

    /// All origins, ascending by tier.
    pub fn ordered(&self) -> &[Origin] {
        &self.origins
    }

    /// The tier-1 origin.
    pub fn primary(&self) -> &Origin {
        &self.origins[0]
    }

    /// Look up an origin by id.
    pub fn get(&self, id: &str) -> Option<&Origin> {
        self.origins.iter().find(|o| o.id == id)
    }

    pub fn len(&self) -> usize {
        self.origins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(id: &str, url: &str, tier: u32) -> OriginConfig {
        OriginConfig {
            id: id.to_string(),
            label: String::new(),
            url: url.to_string(),
            health_path: "/health".to_string(),
            tier,
        }
    }

    #[test]
    fn test_orders_by_tier() {
        let registry = OriginRegistry::from_config(&[
            config("c", "http://127.0.0.1:3003", 3),
            config("a", "http://127.0.0.1:3001", 1),
            config("b", "http://127.0.0.1:3002", 2),
        ])
        .unwrap();

        let ids: Vec<&str> = registry.ordered().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(registry.primary().id, "a");
    }

    #[test]
    fn test_duplicate_tiers_fail_fast() {
        let result = OriginRegistry::from_config(&[
            config("a", "http://127.0.0.1:3001", 1),
            config("b", "http://127.0.0.1:3002", 1),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_label_defaults_to_id() {
        let registry =
            OriginRegistry::from_config(&[config("pi-fleet", "http://127.0.0.1:3001", 1)]).unwrap();
        assert_eq!(registry.primary().label, "pi-fleet");
    }

    #[test]
    fn test_url_joining() {
        let registry =
            OriginRegistry::from_config(&[config("a", "http://127.0.0.1:3001", 1)]).unwrap();
        let origin = registry.primary();

        assert_eq!(origin.health_url(), "http://127.0.0.1:3001/health");
        assert_eq!(
            origin.target_url("/api/v1?x=1"),
            "http://127.0.0.1:3001/api/v1?x=1"
        );
    }
}

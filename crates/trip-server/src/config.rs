//! Server configuration from environment.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use trip_core::PlanningRules;

use crate::providers::{llm, ors};

#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub groq_api_key: String,
    pub groq_api_base: String,
    pub groq_model: String,
    pub llm_timeout_s: u64,
    pub ors_api_key: String,
    pub ors_base_url: String,
    pub unsplash_access_key: String,
    pub cycling_max_km_per_day: f64,
    pub hiking_min_km: f64,
    pub hiking_max_km: f64,
    pub rate_limit_enabled: bool,
    pub rate_limit_rps: u32,
    pub trust_proxy: bool,
    pub image_cache_ttl_s: u64,
    pub image_cache_max_entries: usize,
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_flag(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}

impl Default for Config {
    fn default() -> Self {
        let rules = PlanningRules::default();
        Self {
            server_port: 3000,
            groq_api_key: String::new(),
            groq_api_base: llm::DEFAULT_API_BASE.to_string(),
            groq_model: llm::DEFAULT_MODEL.to_string(),
            llm_timeout_s: rules.model_timeout_s,
            ors_api_key: String::new(),
            ors_base_url: ors::DEFAULT_BASE_URL.to_string(),
            unsplash_access_key: String::new(),
            cycling_max_km_per_day: rules.cycling_max_km_per_day,
            hiking_min_km: rules.hiking_min_km,
            hiking_max_km: rules.hiking_max_km,
            rate_limit_enabled: true,
            rate_limit_rps: 2,
            trust_proxy: false,
            image_cache_ttl_s: 3600,
            image_cache_max_entries: 256,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("TRIP_PORT", defaults.server_port),
            groq_api_key: env_string("GROQ_API_KEY", ""),
            groq_api_base: env_string("GROQ_API_BASE", &defaults.groq_api_base),
            groq_model: env_string("GROQ_MODEL", &defaults.groq_model),
            llm_timeout_s: env_or("LLM_TIMEOUT_S", defaults.llm_timeout_s),
            ors_api_key: env_string("OPENROUTESERVICE_API_KEY", ""),
            ors_base_url: env_string("ORS_BASE_URL", &defaults.ors_base_url),
            unsplash_access_key: env_string("UNSPLASH_ACCESS_KEY", ""),
            cycling_max_km_per_day: env_or("CYCLING_MAX_KM_PER_DAY", defaults.cycling_max_km_per_day),
            hiking_min_km: env_or("HIKING_MIN_KM", defaults.hiking_min_km),
            hiking_max_km: env_or("HIKING_MAX_KM", defaults.hiking_max_km),
            rate_limit_enabled: env_flag("TRIP_RATE_LIMIT_ENABLED", defaults.rate_limit_enabled),
            rate_limit_rps: env_or("TRIP_RATE_LIMIT_RPS", defaults.rate_limit_rps),
            trust_proxy: env_flag("TRIP_TRUST_PROXY", defaults.trust_proxy),
            image_cache_ttl_s: env_or("IMAGE_CACHE_TTL_S", defaults.image_cache_ttl_s),
            image_cache_max_entries: env_or("IMAGE_CACHE_MAX_ENTRIES", defaults.image_cache_max_entries),
        }
    }

    /// Planning rules with the distance bounds and model timeout from the
    /// environment applied. Inverted hiking bounds fall back to defaults.
    pub fn planning_rules(&self) -> PlanningRules {
        let mut rules = PlanningRules {
            model_timeout_s: self.llm_timeout_s.max(1),
            ..PlanningRules::default()
        };
        if self.cycling_max_km_per_day.is_finite() && self.cycling_max_km_per_day > 0.0 {
            rules.cycling_max_km_per_day = self.cycling_max_km_per_day;
        }
        if self.hiking_min_km.is_finite()
            && self.hiking_max_km.is_finite()
            && 0.0 < self.hiking_min_km
            && self.hiking_min_km < self.hiking_max_km
        {
            rules.hiking_min_km = self.hiking_min_km;
            rules.hiking_max_km = self.hiking_max_km;
        } else {
            tracing::warn!(
                min = self.hiking_min_km,
                max = self.hiking_max_km,
                "invalid hiking bounds, using defaults"
            );
        }
        rules
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_s.max(1))
    }

    pub fn image_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.image_cache_ttl_s)
    }
}

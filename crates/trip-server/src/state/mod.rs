//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::planner::TripPlanner;
use crate::providers::images::{ImageLookup, ImageService, UnsplashClient};
use crate::providers::llm::ChatCompletionsModel;
use crate::providers::ors::OpenRouteService;

pub struct AppState {
    planner: TripPlanner,
    images: ImageService,
    config: Config,
}

impl AppState {
    pub fn new(planner: TripPlanner, images: ImageService, config: Config) -> Self {
        Self {
            planner,
            images,
            config,
        }
    }

    /// Wire the HTTP-backed providers from configuration.
    pub fn from_config(config: Config) -> Self {
        let client = reqwest::Client::new();
        let rules = config.planning_rules();

        let model = Arc::new(ChatCompletionsModel::new(
            client.clone(),
            config.groq_api_base.clone(),
            config.groq_api_key.clone(),
            config.groq_model.clone(),
            config.model_timeout(),
        ));
        tracing::info!(model = model.model(), "waypoint model configured");
        let ors = Arc::new(OpenRouteService::new(
            client.clone(),
            config.ors_base_url.clone(),
            config.ors_api_key.clone(),
            Duration::from_secs(rules.snap_timeout_s),
            Duration::from_secs(rules.directions_timeout_s),
        ));
        let unsplash: Arc<dyn ImageLookup> =
            Arc::new(UnsplashClient::new(client, config.unsplash_access_key.clone()));

        for (key, value) in [
            ("GROQ_API_KEY", &config.groq_api_key),
            ("OPENROUTESERVICE_API_KEY", &config.ors_api_key),
            ("UNSPLASH_ACCESS_KEY", &config.unsplash_access_key),
        ] {
            if value.is_empty() {
                tracing::warn!("{} is not set", key);
            }
        }

        let planner = TripPlanner::new(model, ors.clone(), ors, rules);
        let images = ImageService::new(
            unsplash,
            config.image_cache_ttl(),
            config.image_cache_max_entries,
        );
        Self::new(planner, images, config)
    }

    pub fn planner(&self) -> &TripPlanner {
        &self.planner
    }

    pub fn images(&self) -> &ImageService {
        &self.images
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

use std::sync::Arc;
use crate::{config::AppConfig, recommendation::LeadRecommendationProvider, store::EntityStore};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn EntityStore>,
    pub leads: Arc<dyn LeadRecommendationProvider>,
}

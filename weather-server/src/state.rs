use std::sync::Arc;

use weather_core::{RecencyLog, WeatherProvider};

#[derive(Clone, Debug)]
pub struct AppState {
    pub provider: Arc<dyn WeatherProvider>,
    /// Process-lifetime search history, lost on restart.
    pub history: Arc<RecencyLog>,
}

impl AppState {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider, history: Arc::new(RecencyLog::default()) }
    }
}

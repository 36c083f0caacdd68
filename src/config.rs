use std::env;

use crate::models::Theme;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_url: String,
    pub database_url: String,
    pub timeout_secs: u64,
    pub default_theme: Theme,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("DONORHUB_API_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8000/api".to_string()),
            database_url: env::var("DONORHUB_DB").unwrap_or_else(|_| "donorhub.db".to_string()),
            timeout_secs: env::var("DONORHUB_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
            default_theme: env::var("DONORHUB_THEME")
                .map(|v| Theme::parse(&v))
                .unwrap_or(Theme::Light),
        }
    }
}

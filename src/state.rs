use std::sync::{Arc, Mutex};

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::db::{self, Store};

pub struct AppState {
    pub config: AppConfig,
    pub store: Store,
    pub api: ApiClient,
}

impl AppState {
    pub fn init(config: AppConfig) -> anyhow::Result<Self> {
        let conn = db::init_db(&config.database_url)?;
        let store: Store = Arc::new(Mutex::new(conn));
        let api = ApiClient::new(&config, Arc::clone(&store))?;
        Ok(Self { config, store, api })
    }
}

use crate::api::HttpImageApi;
use crate::config::Config;
use crate::fetcher::ListingSource;
use crate::session::Sessions;

#[derive(Clone)]
pub struct AppState {
    pub api: HttpImageApi,
    pub source: ListingSource,
    pub sessions: Sessions,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            api: HttpImageApi::new(config.api_base.clone()),
            source: config.source,
            sessions: Sessions::default(),
        }
    }
}

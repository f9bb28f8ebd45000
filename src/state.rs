use std::sync::Arc;

use crate::atproto::{AtpClient, ClientError};
use crate::config::Config;
use crate::store::Store;
use crate::views::Views;

/// Shared application state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Store,
    pub views: Arc<Views>,
    atproto: AtpClient,
}

impl AppState {
    pub fn new(config: Config, store: Store) -> Result<Self, ClientError> {
        let atproto = AtpClient::new(&config.atproto)?;
        Ok(Self {
            config: Arc::new(config),
            store,
            views: Arc::new(Views::default()),
            atproto,
        })
    }

    /// A logged-out protocol client. Every login gets its own so credentials
    /// never leak between requests.
    pub fn atproto(&self) -> AtpClient {
        self.atproto.fresh()
    }
}

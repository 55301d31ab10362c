use crate::{
    bot::Dispatcher,
    config::{Config, UpdateMode},
};

/// Shared state of the HTTP surface
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
    /// Expected `X-Telegram-Bot-Api-Secret-Token`. `None` leaves `/webhook` unmounted.
    pub webhook_secret: Option<String>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, webhook_secret: Option<String>) -> Self {
        Self {
            dispatcher,
            webhook_secret: webhook_secret.filter(|s| !s.is_empty()),
        }
    }

    /// Enables the webhook only in webhook mode
    pub fn from_config(dispatcher: Dispatcher, config: &Config) -> Self {
        let secret = match config.update_mode {
            UpdateMode::Webhook => config.webhook_secret.clone(),
            UpdateMode::Polling => None,
        };
        Self::new(dispatcher, secret)
    }
}

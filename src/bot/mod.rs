use std::sync::Arc;

use crate::{
    config::Config,
    db::CatalogStore,
    models::UserId,
    services::{ChannelMembership, ChatApi, MatchConfig, MovieService, SessionStore},
};

pub mod commands;
pub mod dispatcher;
pub mod formatting;
pub mod polling;

pub use commands::{parse_command, Command};
pub use dispatcher::{BotSettings, Dispatcher};
pub use polling::{poll_once, run_polling};

/// Wires the movie service and channel membership check around `chat`
pub fn build_dispatcher(
    config: &Config,
    chat: Arc<dyn ChatApi>,
    store: Arc<dyn CatalogStore>,
) -> Dispatcher {
    let movies = Arc::new(MovieService::new(
        store,
        SessionStore::new(),
        MatchConfig::from_config(config),
        config.popularity_scheme,
        UserId(config.owner_id),
    ));
    let membership = Arc::new(ChannelMembership::new(
        chat.clone(),
        config.channel_username.clone(),
    ));

    Dispatcher::new(movies, membership, chat, BotSettings::from_config(config))
}

use std::sync::Arc;

use tracing::instrument;

use crate::{
    bot::{
        commands::{parse_callback, parse_command, CallbackAction, Command},
        formatting,
    },
    config::Config,
    error::AppResult,
    models::{CallbackQuery, Message, Reply, Update, User},
    services::{ChatApi, MembershipChecker, MovieService},
};

/// Static settings the command layer needs for its replies
#[derive(Debug, Clone)]
pub struct BotSettings {
    pub channel_username: String,
    pub bot_username: String,
    pub top_favorites: usize,
}

impl BotSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            channel_username: config.channel_username.clone(),
            bot_username: config.bot_username.clone(),
            top_favorites: config.top_favorites,
        }
    }
}

/// Routes updates to the movie service and sends the replies
///
/// Each update is handled to completion. Nothing serializes concurrent
/// handlers, so callers may run several at once.
#[derive(Clone)]
pub struct Dispatcher {
    movies: Arc<MovieService>,
    membership: Arc<dyn MembershipChecker>,
    chat: Arc<dyn ChatApi>,
    settings: Arc<BotSettings>,
}

impl Dispatcher {
    pub fn new(
        movies: Arc<MovieService>,
        membership: Arc<dyn MembershipChecker>,
        chat: Arc<dyn ChatApi>,
        settings: BotSettings,
    ) -> Self {
        Self {
            movies,
            membership,
            chat,
            settings: Arc::new(settings),
        }
    }

    pub fn movies(&self) -> &MovieService {
        &self.movies
    }

    #[instrument(skip(self, update), fields(update_id = update.update_id))]
    pub async fn handle_update(&self, update: Update) -> AppResult<()> {
        if let Some(message) = update.message {
            return self.handle_message(message).await;
        }
        if let Some(query) = update.callback_query {
            return self.handle_callback(query).await;
        }
        tracing::debug!("Ignoring update without message or callback");
        Ok(())
    }

    async fn handle_message(&self, message: Message) -> AppResult<()> {
        let (Some(user), Some(text)) = (message.from.as_ref(), message.text.as_deref()) else {
            return Ok(());
        };
        let Some(command) = parse_command(text, &self.settings.bot_username) else {
            return Ok(());
        };

        tracing::info!(user_id = user.id, ?command, "Command received");
        let reply = self.reply_to(user, command).await;
        self.chat.send_message(message.chat.id, &reply).await
    }

    /// Produces the reply for `command` issued by `user`
    pub async fn reply_to(&self, user: &User, command: Command) -> Reply {
        let user_id = user.user_id();
        let channel = &self.settings.channel_username;

        match command {
            Command::Start => {
                let is_member = self.membership.is_member(user_id).await;
                let favorites = self.movies.favorites(self.settings.top_favorites).await;
                formatting::welcome(
                    &user.first_name,
                    &self.settings.bot_username,
                    channel,
                    &favorites,
                    is_member,
                )
            }
            Command::Help => formatting::help(),
            Command::Verify => {
                if self.membership.is_member(user_id).await {
                    formatting::verified(&user.first_name)
                } else {
                    formatting::not_a_member(channel)
                }
            }
            Command::AddMovie(args) => {
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                formatting::add_movie(&self.movies.add_movie(user_id, &args).await)
            }
            Command::Unknown(name) => formatting::unknown_command(&name),
            gated => {
                if !self.membership.is_member(user_id).await {
                    return formatting::membership_required(channel);
                }
                match gated {
                    Command::Movie(query) => {
                        formatting::search(&self.movies.search(user_id, &query).await)
                    }
                    Command::Confirm(index) => {
                        formatting::confirm(&self.movies.confirm(user_id, index.as_deref()).await)
                    }
                    Command::Rate(args) => {
                        let args: Vec<&str> = args.iter().map(String::as_str).collect();
                        formatting::rate(&self.movies.rate_command(user_id, &args).await)
                    }
                    other => {
                        tracing::error!(command = ?other, "Command fell through to the gated branch");
                        formatting::help()
                    }
                }
            }
        }
    }

    async fn handle_callback(&self, query: CallbackQuery) -> AppResult<()> {
        let user_id = query.from.user_id();
        let Some(action) = query.data.as_deref().and_then(parse_callback) else {
            tracing::debug!(data = ?query.data, "Ignoring unknown callback");
            return self.chat.answer_callback_query(&query.id, None).await;
        };

        if !self.membership.is_member(user_id).await {
            return self
                .chat
                .answer_callback_query(
                    &query.id,
                    Some(format!("Please join {} first", self.settings.channel_username)),
                )
                .await;
        }

        match action {
            CallbackAction::Rate { score, title } => {
                tracing::info!(user_id = %user_id, score = score.value(), title = %title, "Rating button pressed");
                let outcome = self.movies.rate(user_id, &title, score).await;
                self.chat
                    .answer_callback_query(&query.id, Some(formatting::rate_toast(&outcome)))
                    .await?;
                if let Some(message) = query.message {
                    self.chat
                        .send_message(message.chat.id, &formatting::rate(&outcome))
                        .await?;
                }
                Ok(())
            }
        }
    }
}

//! Chat transport abstraction.
//!
//! The bot needs four Bot API calls. The command layer only sees this trait,
//! so tests drive it with a fake transport.

use crate::{
    error::AppResult,
    models::{ChatMemberStatus, Reply, Update, UserId},
};

pub mod client;

pub use client::TelegramClient;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ChatApi: Send + Sync {
    /// Sends `reply` to `chat_id`
    async fn send_message(&self, chat_id: i64, reply: &Reply) -> AppResult<()>;

    /// Acknowledges a button press, optionally with a toast text
    async fn answer_callback_query(&self, callback_query_id: &str, text: Option<String>) -> AppResult<()>;

    /// Looks up `user_id`'s membership in `chat` (an `@username` or numeric id)
    async fn get_chat_member(&self, chat: &str, user_id: UserId) -> AppResult<ChatMemberStatus>;

    /// Long-polls for updates with id `>= offset`
    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> AppResult<Vec<Update>>;

    /// Transport name for logging and debugging
    fn name(&self) -> &'static str;
}

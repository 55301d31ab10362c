use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod catalog;
pub mod movie;
pub mod rating;
pub mod telegram;

pub use catalog::{Catalog, CatalogDocument, MovieEntry, UpsertAction};
pub use movie::{MovieRecord, Popularity, Quality};
pub use rating::{RatingAction, RatingBook, RatingSummary, Score};
pub use telegram::{
    CallbackQuery, Chat, ChatMember, ChatMemberStatus, InlineKeyboardButton,
    InlineKeyboardMarkup, Message, ParseMode, Reply, Update, User,
};

/// Telegram user identifier
///
/// Serialized as a bare integer; as a JSON map key it becomes a string,
/// which is how `user_ratings` is stored in the catalog file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Which popularity model the catalog uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PopularityScheme {
    /// A view counter bumped on every successful lookup
    Counter,
    /// Per-user 1-5 star ratings
    Rating,
}

impl Display for PopularityScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PopularityScheme::Counter => write!(f, "counter"),
            PopularityScheme::Rating => write!(f, "rating"),
        }
    }
}

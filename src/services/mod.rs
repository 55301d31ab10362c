pub mod membership;
pub mod movies;
pub mod resolver;
pub mod session;
pub mod telegram;

pub use membership::{ChannelMembership, MembershipChecker};
pub use movies::MovieService;
pub use resolver::{resolve, MatchConfig, Resolution};
pub use session::SessionStore;
pub use telegram::{ChatApi, TelegramClient};

use std::sync::Arc;

use tracing::instrument;

use crate::{models::UserId, services::telegram::ChatApi};

/// Decides whether a user may use the gated commands
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MembershipChecker: Send + Sync {
    /// True only when membership is affirmatively confirmed
    async fn is_member(&self, user_id: UserId) -> bool;
}

/// Grants access to members, administrators and the creator of a channel
pub struct ChannelMembership {
    chat: Arc<dyn ChatApi>,
    channel: String,
}

impl ChannelMembership {
    pub fn new(chat: Arc<dyn ChatApi>, channel: impl Into<String>) -> Self {
        Self {
            chat,
            channel: channel.into(),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

#[async_trait::async_trait]
impl MembershipChecker for ChannelMembership {
    #[instrument(skip(self), fields(channel = %self.channel))]
    async fn is_member(&self, user_id: UserId) -> bool {
        match self.chat.get_chat_member(&self.channel, user_id).await {
            Ok(status) => {
                tracing::debug!(?status, "Membership status fetched");
                status.is_member()
            }
            Err(e) => {
                // Any failure denies access
                tracing::warn!(error = %e, "Membership check failed");
                false
            }
        }
    }
}

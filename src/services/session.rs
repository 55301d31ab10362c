use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::models::{MovieRecord, UserId};

/// Why a confirm request could not pick a suggestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// The index was not a plain positive integer
    NotANumber(String),
    /// No suggestion list is pending for this user
    NoSuggestions,
    /// The index is outside `1..=available`
    OutOfRange { index: usize, available: usize },
}

/// Pending suggestion lists, one per user
///
/// Lives in process memory only; a restart drops every pending confirmation.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<UserId, Vec<MovieRecord>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any pending list for `user_id`
    pub async fn store(&self, user_id: UserId, suggestions: Vec<MovieRecord>) {
        let mut inner = self.inner.write().await;
        if suggestions.is_empty() {
            inner.remove(&user_id);
        } else {
            inner.insert(user_id, suggestions);
        }
    }

    /// The pending list for `user_id`, empty if there is none
    pub async fn get(&self, user_id: UserId) -> Vec<MovieRecord> {
        self.inner
            .read()
            .await
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn clear(&self, user_id: UserId) {
        self.inner.write().await.remove(&user_id);
    }

    /// Picks the suggestion at a 1-based index given as text.
    ///
    /// Does not clear the list; the caller clears it once the pick succeeded.
    pub async fn select(&self, user_id: UserId, raw_index: &str) -> Result<MovieRecord, SelectionError> {
        let raw_index = raw_index.trim();
        if raw_index.is_empty() || !raw_index.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SelectionError::NotANumber(raw_index.to_string()));
        }

        let suggestions = self.get(user_id).await;
        if suggestions.is_empty() {
            return Err(SelectionError::NoSuggestions);
        }

        let available = suggestions.len();
        let index = raw_index.parse::<usize>().unwrap_or(usize::MAX);
        if index == 0 || index > available {
            return Err(SelectionError::OutOfRange { index, available });
        }

        Ok(suggestions[index - 1].clone())
    }

    /// Number of users with a pending list
    pub async fn pending(&self) -> usize {
        self.inner.read().await.len()
    }
}

use std::time::Duration;

use crate::{bot::Dispatcher, error::AppResult, services::ChatApi};

const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Fetches one batch of updates and handles them in order.
///
/// Returns the offset for the next call: one past the highest update id
/// seen, or `offset` unchanged when the batch was empty.
pub async fn poll_once(
    chat: &dyn ChatApi,
    dispatcher: &Dispatcher,
    offset: Option<i64>,
    timeout_secs: u64,
) -> AppResult<Option<i64>> {
    let updates = chat.get_updates(offset, timeout_secs).await?;
    let mut next = offset;

    for update in updates {
        let update_id = update.update_id;
        next = Some(next.map_or(update_id + 1, |n| n.max(update_id + 1)));

        // A failing update must not stall the queue
        if let Err(e) = dispatcher.handle_update(update).await {
            tracing::error!(update_id, error = %e, "Failed to handle update");
        }
    }

    Ok(next)
}

/// Long-polls until the task is cancelled
pub async fn run_polling(chat: &dyn ChatApi, dispatcher: &Dispatcher, timeout_secs: u64) {
    tracing::info!(client = chat.name(), timeout_secs, "Starting long polling");
    let mut offset = None;

    loop {
        match poll_once(chat, dispatcher, offset, timeout_secs).await {
            Ok(next) => offset = next,
            Err(e) => {
                tracing::warn!(error = %e, "getUpdates failed, retrying");
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}

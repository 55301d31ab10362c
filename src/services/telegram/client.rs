//! Telegram Bot API client over HTTPS

use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{AppError, AppResult},
    models::{ChatMember, ChatMemberStatus, InlineKeyboardMarkup, ParseMode, Reply, Update, UserId},
    services::telegram::ChatApi,
};

const ALLOWED_UPDATES: &[&str] = &["message", "callback_query"];

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Slack added on top of the long-poll timeout for `getUpdates`
const POLL_TIMEOUT_MARGIN: Duration = Duration::from_secs(10);

/// Response envelope shared by every Bot API method
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> AppResult<T> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            (true, None) => Err(AppError::Telegram(format!("{} returned no result", method))),
            (false, _) => Err(AppError::Telegram(format!(
                "{} failed: {}",
                method,
                self.description.unwrap_or_else(|| "no description".to_string())
            ))),
        }
    }
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<ParseMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboardMarkup>,
    disable_web_page_preview: bool,
}

#[derive(Debug, Serialize)]
struct AnswerCallbackQueryRequest<'a> {
    callback_query_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
struct GetChatMemberRequest<'a> {
    chat_id: &'a str,
    user_id: i64,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Clone)]
pub struct TelegramClient {
    http_client: HttpClient,
    api_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(api_url: impl Into<String>, token: impl Into<String>) -> AppResult<Self> {
        Self::with_timeout(api_url, token, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Builds a client whose calls fail after `timeout`. `getUpdates`
    /// overrides it with the long-poll timeout plus a margin.
    pub fn with_timeout(
        api_url: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    /// Calls `method` with a JSON body. The token is part of the URL, so the
    /// URL itself is never logged.
    async fn call<P, R>(&self, method: &str, payload: &P, timeout: Option<Duration>) -> AppResult<R>
    where
        P: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let mut request = self.http_client.post(self.method_url(method)).json(payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await.map_err(reqwest::Error::without_url)?;

        let status = response.status();
        let envelope: ApiResponse<R> = response.json().await.map_err(|e| {
            AppError::Telegram(format!(
                "{} returned status {} with an unreadable body: {}",
                method,
                status,
                e.without_url()
            ))
        })?;

        envelope.into_result(method)
    }
}

#[async_trait::async_trait]
impl ChatApi for TelegramClient {
    async fn send_message(&self, chat_id: i64, reply: &Reply) -> AppResult<()> {
        let request = SendMessageRequest {
            chat_id,
            text: &reply.text,
            parse_mode: reply.parse_mode,
            reply_markup: reply.keyboard.as_ref(),
            disable_web_page_preview: true,
        };
        let _: Value = self.call("sendMessage", &request, None).await?;
        Ok(())
    }

    async fn answer_callback_query(&self, callback_query_id: &str, text: Option<String>) -> AppResult<()> {
        let request = AnswerCallbackQueryRequest {
            callback_query_id,
            text,
        };
        let _: Value = self.call("answerCallbackQuery", &request, None).await?;
        Ok(())
    }

    async fn get_chat_member(&self, chat: &str, user_id: UserId) -> AppResult<ChatMemberStatus> {
        let request = GetChatMemberRequest {
            chat_id: chat,
            user_id: user_id.0,
        };
        let member: ChatMember = self.call("getChatMember", &request, None).await?;
        Ok(member.status)
    }

    async fn get_updates(&self, offset: Option<i64>, timeout_secs: u64) -> AppResult<Vec<Update>> {
        let request = GetUpdatesRequest {
            offset,
            timeout: timeout_secs,
            allowed_updates: ALLOWED_UPDATES,
        };
        let timeout = Duration::from_secs(timeout_secs) + POLL_TIMEOUT_MARGIN;
        let updates: Vec<Update> = self.call("getUpdates", &request, Some(timeout)).await?;

        tracing::debug!(count = updates.len(), "Fetched updates");
        Ok(updates)
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_url() {
        let client = TelegramClient::new("https://api.telegram.org/", "123:abc").unwrap();
        assert_eq!(
            client.method_url("getMe"),
            "https://api.telegram.org/bot123:abc/getMe"
        );
    }

    #[test]
    fn test_envelope_ok() {
        let envelope: ApiResponse<ChatMember> =
            serde_json::from_str(r#"{"ok": true, "result": {"status": "member"}}"#).unwrap();
        let member = envelope.into_result("getChatMember").unwrap();
        assert_eq!(member.status, ChatMemberStatus::Member);
    }

    #[test]
    fn test_envelope_error() {
        let envelope: ApiResponse<ChatMember> = serde_json::from_str(
            r#"{"ok": false, "error_code": 400, "description": "Bad Request: user not found"}"#,
        )
        .unwrap();
        let err = envelope.into_result("getChatMember").unwrap_err();
        assert!(matches!(err, AppError::Telegram(msg) if msg.contains("user not found")));
    }

    #[test]
    fn test_send_message_payload() {
        let keyboard = InlineKeyboardMarkup {
            inline_keyboard: vec![vec![crate::models::InlineKeyboardButton {
                text: "1⭐".to_string(),
                callback_data: "rate:1:Up".to_string(),
            }]],
        };
        let request = SendMessageRequest {
            chat_id: 5,
            text: "hi",
            parse_mode: Some(ParseMode::Html),
            reply_markup: Some(&keyboard),
            disable_web_page_preview: true,
        };
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["parse_mode"], "HTML");
        assert_eq!(
            json["reply_markup"]["inline_keyboard"][0][0]["callback_data"],
            "rate:1:Up"
        );
    }
}

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use movie_link_bot::{
    config::Config,
    error::AppResult,
    models::{ChatMemberStatus, Reply, Update, UserId},
    services::ChatApi,
};

/// In-process transport that records outbound calls
#[derive(Default)]
pub struct RecordingChat {
    pub sent: Mutex<Vec<(i64, Reply)>>,
    pub answered: Mutex<Vec<(String, Option<String>)>>,
    pub members: Mutex<Vec<i64>>,
}

impl RecordingChat {
    pub fn with_members(members: &[i64]) -> Arc<Self> {
        Arc::new(Self {
            members: Mutex::new(members.to_vec()),
            ..Default::default()
        })
    }

    pub fn sent(&self) -> Vec<(i64, Reply)> {
        self.sent.lock().unwrap().clone()
    }

    /// Waits for spawned handlers to send at least `count` messages
    pub async fn wait_for_messages(&self, count: usize) -> Vec<(i64, Reply)> {
        for _ in 0..200 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} messages, got {:?}", count, self.sent());
    }
}

#[async_trait::async_trait]
impl ChatApi for RecordingChat {
    async fn send_message(&self, chat_id: i64, reply: &Reply) -> AppResult<()> {
        self.sent.lock().unwrap().push((chat_id, reply.clone()));
        Ok(())
    }

    async fn answer_callback_query(&self, callback_query_id: &str, text: Option<String>) -> AppResult<()> {
        self.answered
            .lock()
            .unwrap()
            .push((callback_query_id.to_string(), text));
        Ok(())
    }

    async fn get_chat_member(&self, _chat: &str, user_id: UserId) -> AppResult<ChatMemberStatus> {
        if self.members.lock().unwrap().contains(&user_id.0) {
            Ok(ChatMemberStatus::Member)
        } else {
            Ok(ChatMemberStatus::Left)
        }
    }

    async fn get_updates(&self, _offset: Option<i64>, _timeout_secs: u64) -> AppResult<Vec<Update>> {
        Ok(vec![])
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

pub fn test_config(extra: &[(&str, &str)]) -> Config {
    let mut vars = vec![
        ("BOT_TOKEN".to_string(), "TESTTOKEN".to_string()),
        ("CHANNEL_USERNAME".to_string(), "@movies".to_string()),
        ("BOT_USERNAME".to_string(), "@moviebot".to_string()),
        ("OWNER_ID".to_string(), "1".to_string()),
    ];
    vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
    Config::from_iter(vars).unwrap()
}

pub const SAMPLE_CATALOG: &str = r#"{
    "movies": [
        {
            "title": "Inception",
            "qualities": [
                {"quality": "720p", "url": "https://dl.example/inception-720"},
                {"quality": "1080p", "url": "https://dl.example/inception-1080"}
            ],
            "popularity": 4
        },
        {
            "title": "Interstellar",
            "qualities": [{"quality": "1080p", "url": "https://dl.example/interstellar"}],
            "popularity": 9
        },
        {
            "title": "The Dark Knight",
            "qualities": [{"quality": "4K", "url": "https://dl.example/tdk"}],
            "popularity": 0
        }
    ]
}"#;

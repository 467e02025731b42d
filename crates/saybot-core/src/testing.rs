//! Test doubles and fixtures shared across the crate's test modules.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::completion::{CompletionClient, CompletionOutcome, CompletionRequest};
use crate::config::Config;
use crate::domain::{ChatId, ConversationToken, MessageId, MessageRef, UserId};
use crate::messaging::{ChatKind, Invocation, Messenger};
use crate::Result;

/// Throwaway per-test directory; never cleaned up, /tmp is fine with that.
pub(crate) fn tmp_dir(prefix: &str) -> PathBuf {
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis();
    let pid = std::process::id();
    PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}"))
}

pub(crate) fn invocation(kind: ChatKind, user: i64, chat: i64) -> Invocation {
    Invocation {
        chat: ChatId(chat),
        kind,
        from: UserId(user),
        username: Some("tester".to_string()),
        chat_title: match kind {
            ChatKind::Group => Some("testers".to_string()),
            ChatKind::Private => None,
        },
        message: MessageId(77),
    }
}

/// Config with admin id 1 and no environment involved.
pub(crate) fn config(throttle_ms: u64, typing_ms: u64) -> Config {
    Config {
        bot_token: "x".to_string(),
        openai_api_key: "k".to_string(),
        admin_user: UserId(1),
        openai_model: "gpt-test".to_string(),
        data_dir: "/tmp".into(),
        handler_timeout: Duration::from_secs(180),
        stream_throttle: Duration::from_millis(throttle_ms),
        typing_interval: Duration::from_millis(typing_ms),
    }
}

/// Messenger double recording every outbound call.
#[derive(Default)]
pub(crate) struct FakeMessenger {
    next_id: Mutex<i32>,
    pub(crate) sends: Mutex<Vec<String>>,
    pub(crate) replies: Mutex<Vec<(MessageId, String)>>,
    pub(crate) edits: Mutex<Vec<(MessageRef, String)>>,
    pub(crate) typing: Mutex<u32>,
}

impl FakeMessenger {
    pub(crate) fn new() -> Self {
        Self {
            next_id: Mutex::new(1),
            ..Default::default()
        }
    }

    fn alloc(&self, chat: ChatId) -> MessageRef {
        let mut guard = self.next_id.lock().unwrap();
        let id = *guard;
        *guard += 1;
        MessageRef {
            chat_id: chat,
            message_id: MessageId(id),
        }
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn send_html(&self, chat: ChatId, html: &str) -> Result<MessageRef> {
        self.sends.lock().unwrap().push(html.to_string());
        Ok(self.alloc(chat))
    }

    async fn reply_html(
        &self,
        chat: ChatId,
        reply_to: MessageId,
        html: &str,
    ) -> Result<MessageRef> {
        self.replies
            .lock()
            .unwrap()
            .push((reply_to, html.to_string()));
        Ok(self.alloc(chat))
    }

    async fn edit_html(&self, msg: MessageRef, html: &str) -> Result<()> {
        self.edits.lock().unwrap().push((msg, html.to_string()));
        Ok(())
    }

    async fn send_typing(&self, _chat: ChatId) -> Result<()> {
        *self.typing.lock().unwrap() += 1;
        Ok(())
    }
}

/// Completion double emitting scripted cumulative snapshots, then a final
/// text and token. Records every request it sees.
pub(crate) struct FakeCompletion {
    partials: Vec<String>,
    gap: Duration,
    text: String,
    token: String,
    pub(crate) requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeCompletion {
    pub(crate) fn instant(text: &str, token: &str) -> Self {
        Self::streaming(Vec::new(), Duration::ZERO, text, token)
    }

    pub(crate) fn streaming(
        partials: Vec<String>,
        gap: Duration,
        text: &str,
        token: &str,
    ) -> Self {
        Self {
            partials,
            gap,
            text: text.to_string(),
            token: token.to_string(),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionClient for FakeCompletion {
    async fn complete(
        &self,
        req: CompletionRequest,
        on_progress: &mut (dyn FnMut(String) -> Result<()> + Send),
    ) -> Result<CompletionOutcome> {
        self.requests.lock().unwrap().push(req);
        for p in &self.partials {
            if !self.gap.is_zero() {
                tokio::time::sleep(self.gap).await;
            }
            on_progress(p.clone())?;
        }
        Ok(CompletionOutcome {
            text: self.text.clone(),
            token: ConversationToken(self.token.clone()),
        })
    }
}

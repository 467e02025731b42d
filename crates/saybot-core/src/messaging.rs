use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    Result,
};

/// Whether a command arrived from a one-on-one chat or a group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
}

/// Normalized inbound command envelope.
///
/// Transport-specific fields stay in the Telegram adapter; core logic only
/// sees this.
#[derive(Clone, Debug)]
pub struct Invocation {
    pub chat: ChatId,
    pub kind: ChatKind,
    pub from: UserId,
    pub username: Option<String>,
    pub chat_title: Option<String>,
    /// Id of the message carrying the command; replies target it.
    pub message: MessageId,
}

impl Invocation {
    /// Human-readable sender description for log lines.
    pub fn actor_label(&self) -> String {
        match &self.username {
            Some(name) => format!("@{name} ({})", self.from.0),
            None => format!("user {}", self.from.0),
        }
    }

    /// Human-readable chat description for log lines.
    pub fn chat_label(&self) -> String {
        match self.kind {
            ChatKind::Private => "private chat".to_string(),
            ChatKind::Group => match &self.chat_title {
                Some(title) => format!("group {title} ({})", self.chat.0),
                None => format!("group {}", self.chat.0),
            },
        }
    }
}

/// Messenger port.
///
/// Telegram is the first implementation; the shape leaves room for other
/// transports behind the same interface.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_html(&self, chat: ChatId, html: &str) -> Result<MessageRef>;

    /// Send a message replying to `reply_to` in the same chat.
    async fn reply_html(&self, chat: ChatId, reply_to: MessageId, html: &str)
        -> Result<MessageRef>;

    async fn edit_html(&self, msg: MessageRef, html: &str) -> Result<()>;

    /// Show the "typing" presence indicator; the transport fades it out after
    /// a few seconds unless it is sent again.
    async fn send_typing(&self, chat: ChatId) -> Result<()>;
}

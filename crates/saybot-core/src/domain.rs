use serde::{Deserialize, Serialize};

/// Telegram user id. The same id names a sender in private chats and in
/// groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id. Positive for private chats, negative for groups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id, unique within its chat only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// Chat id plus message id, enough to edit a message the bot already sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Opaque continuation token handed back by the completion provider.
///
/// Sending it with the next request resumes the provider-side conversation;
/// omitting it starts a fresh one. Serializes as the bare string, so the
/// persisted value is byte-for-byte what the provider returned.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationToken(pub String);

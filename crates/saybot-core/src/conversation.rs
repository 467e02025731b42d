use std::sync::Arc;

use crate::{
    domain::ConversationToken,
    messaging::{ChatKind, Invocation},
    store::KvStore,
    Result,
};

/// Storage key for one conversation's continuation token.
///
/// Private chats get one conversation per sender; groups get one per chat,
/// shared by all members.
pub fn conversation_key(inv: &Invocation) -> String {
    match inv.kind {
        ChatKind::Private => format!("user_{}", inv.from.0),
        ChatKind::Group => format!("group_{}", inv.chat.0),
    }
}

/// Continuation tokens persisted per conversation key.
///
/// At most one token per key: every successful turn overwrites it, reset
/// removes it.
#[derive(Clone)]
pub struct ConversationStore {
    kv: Arc<KvStore>,
}

impl ConversationStore {
    pub fn new(kv: Arc<KvStore>) -> Self {
        Self { kv }
    }

    pub async fn token(&self, key: &str) -> Result<Option<ConversationToken>> {
        self.kv.get(key).await
    }

    pub async fn set_token(&self, key: &str, token: &ConversationToken) -> Result<()> {
        self.kv.put(key, token).await
    }

    pub async fn clear(&self, key: &str) -> Result<()> {
        self.kv.remove(key).await
    }
}

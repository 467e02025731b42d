use std::sync::Arc;

use crate::{
    domain::{ChatId, UserId},
    messaging::{ChatKind, Invocation},
    store::KvStore,
    Result,
};

const ALLOWED_USERS: &str = "allowed_users";
const ALLOWED_GROUPS: &str = "allowed_groups";

/// Allow-lists of users (private chats) and groups, persisted in the KV
/// store as integer arrays.
///
/// Adds append without dedup, so a list may hold the same id twice;
/// membership checks are unaffected.
#[derive(Clone)]
pub struct AccessStore {
    kv: Arc<KvStore>,
}

impl AccessStore {
    pub fn new(kv: Arc<KvStore>) -> Self {
        Self { kv }
    }

    /// Allow-list gate: a private chat checks the sender against
    /// `allowed_users`, a group chat checks the chat itself against
    /// `allowed_groups`. Absence from the list means denial.
    pub async fn authorize(&self, inv: &Invocation) -> Result<bool> {
        match inv.kind {
            ChatKind::Private => Ok(self.allowed_users().await?.contains(&inv.from.0)),
            ChatKind::Group => Ok(self.allowed_groups().await?.contains(&inv.chat.0)),
        }
    }

    pub async fn add_user(&self, user: UserId) -> Result<()> {
        let mut ids = self.allowed_users().await?;
        ids.push(user.0);
        self.kv.put(ALLOWED_USERS, &ids).await
    }

    pub async fn add_group(&self, chat: ChatId) -> Result<()> {
        let mut ids = self.allowed_groups().await?;
        ids.push(chat.0);
        self.kv.put(ALLOWED_GROUPS, &ids).await
    }

    pub async fn allowed_users(&self) -> Result<Vec<i64>> {
        Ok(self.kv.get(ALLOWED_USERS).await?.unwrap_or_default())
    }

    pub async fn allowed_groups(&self) -> Result<Vec<i64>> {
        Ok(self.kv.get(ALLOWED_GROUPS).await?.unwrap_or_default())
    }
}

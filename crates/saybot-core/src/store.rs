use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{de::DeserializeOwned, Serialize};
use tokio::fs;

use crate::Result;

static STAGING_SEQ: AtomicU64 = AtomicU64::new(0);

/// File-per-key JSON store.
///
/// Each key maps to `<dir>/<key>.json` holding the serialized value. Writes
/// go through a temp file plus rename, so a stored value is either the old
/// bytes or the new bytes, never a torn mix.
#[derive(Clone, Debug)]
pub struct KvStore {
    dir: PathBuf,
}

impl KvStore {
    /// Open the store, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match fs::read(self.path_for(key)).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        // Staging names are unique per write; concurrent writers to the same
        // key must never share one.
        let seq = STAGING_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .dir
            .join(format!("{key}.json.tmp-{}-{seq}", std::process::id()));
        fs::write(&tmp, serde_json::to_vec(value)?).await?;
        fs::rename(&tmp, self.path_for(key)).await?;
        Ok(())
    }

    /// Delete a key. Deleting an absent key is not an error.
    pub async fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::tmp_dir;

    #[tokio::test]
    async fn roundtrips_values() {
        let store = KvStore::open(tmp_dir("saybot-kv-roundtrip")).await.unwrap();
        store.put("allowed_users", &vec![1i64, 2, 3]).await.unwrap();
        let got: Option<Vec<i64>> = store.get("allowed_users").await.unwrap();
        assert_eq!(got, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let store = KvStore::open(tmp_dir("saybot-kv-missing")).await.unwrap();
        let got: Option<String> = store.get("user_1").await.unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn put_overwrites_previous_value() {
        let store = KvStore::open(tmp_dir("saybot-kv-overwrite")).await.unwrap();
        store.put("user_1", &"resp_a".to_string()).await.unwrap();
        store.put("user_1", &"resp_b".to_string()).await.unwrap();
        let got: Option<String> = store.get("user_1").await.unwrap();
        assert_eq!(got, Some("resp_b".to_string()));
    }

    #[tokio::test]
    async fn concurrent_puts_to_one_key_never_clash() {
        let store = KvStore::open(tmp_dir("saybot-kv-race")).await.unwrap();

        let mut tasks = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.put("user_1", &format!("resp_{i}")).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        // Last write wins; no writer may fail. Which one won is unspecified.
        let got: Option<String> = store.get("user_1").await.unwrap();
        assert!(got.unwrap().starts_with("resp_"));
    }

    #[tokio::test]
    async fn remove_is_quiet_for_missing_keys() {
        let store = KvStore::open(tmp_dir("saybot-kv-remove")).await.unwrap();
        store.put("user_9", &"resp".to_string()).await.unwrap();
        store.remove("user_9").await.unwrap();
        store.remove("user_9").await.unwrap();
        let got: Option<String> = store.get("user_9").await.unwrap();
        assert_eq!(got, None);
    }
}

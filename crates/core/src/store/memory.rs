use crate::mood::MoodLabel;
use crate::store::{MoodEntry, MoodStore, NewMoodEntry, StoreError};
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Process-local store; history is lost on exit.
#[derive(Clone, Default)]
pub struct InMemoryMoodStore {
    users: Arc<RwLock<HashMap<String, Vec<MoodEntry>>>>,
}

impl InMemoryMoodStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn append(&self, entry: MoodEntry) {
        let mut users = self.users.write().await;
        let history = users.entry(entry.data.user_id.clone()).or_default();
        // oldest first; equal timestamps keep arrival order
        let at = history.partition_point(|e| e.timestamp <= entry.timestamp);
        history.insert(at, entry);
    }

    async fn newest_first<F>(&self, user_id: &str, keep: F) -> Vec<MoodEntry>
    where
        F: Fn(&MoodEntry) -> bool,
    {
        let users = self.users.read().await;
        users
            .get(user_id)
            .map(|history| history.iter().rev().filter(|e| keep(e)).cloned().collect())
            .unwrap_or_default()
    }
}

impl MoodStore for InMemoryMoodStore {
    fn record(&self, entry: NewMoodEntry) -> BoxFuture<'_, Result<MoodEntry, StoreError>> {
        async move {
            let entry = MoodEntry {
                id: Uuid::new_v4(),
                timestamp: Utc::now(),
                data: entry,
            };
            self.append(entry.clone()).await;
            Ok(entry)
        }
        .boxed()
    }

    fn insert(&self, entry: MoodEntry) -> BoxFuture<'_, Result<(), StoreError>> {
        async move {
            self.append(entry).await;
            Ok(())
        }
        .boxed()
    }

    fn history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<MoodEntry>, StoreError>> {
        let user_id = user_id.to_owned();
        async move {
            let mut entries = self.newest_first(&user_id, |_| true).await;
            entries.truncate(limit);
            Ok(entries)
        }
        .boxed()
    }

    fn entries_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> BoxFuture<'_, Result<Vec<MoodEntry>, StoreError>> {
        let user_id = user_id.to_owned();
        async move {
            Ok(self
                .newest_first(&user_id, |e| e.timestamp >= since)
                .await)
        }
        .boxed()
    }

    fn count_negative_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
        min_confidence: u8,
    ) -> BoxFuture<'_, Result<u32, StoreError>> {
        let user_id = user_id.to_owned();
        async move {
            let users = self.users.read().await;
            let count = users
                .get(&user_id)
                .map(|history| {
                    history
                        .iter()
                        .filter(|e| e.timestamp >= since)
                        .filter(|e| e.mood() == MoodLabel::Stressed)
                        .filter(|e| e.confidence().get() >= min_confidence)
                        .count()
                })
                .unwrap_or(0);
            Ok(u32::try_from(count).unwrap_or(u32::MAX))
        }
        .boxed()
    }
}

//! Append-only archive of generated stories.
//!
//! Records are never updated or deleted here. Listing sorts explicitly by
//! `sort_key` because the store makes no promise about retrieval order.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::config::DEFAULT_LIST_LIMIT;
use crate::generator::StoryPrompt;
use crate::stores::DocumentStore;
use crate::{Result, UserId};

/// One persisted story, stored as `stories/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryRecord {
    pub id: Uuid,
    pub user_id: UserId,
    pub character: String,
    pub setting: String,
    pub plot_twist: String,
    pub content: String,
    /// ISO 8601, UTC.
    pub created_at: String,
    /// Epoch milliseconds; only used for ordering.
    pub sort_key: i64,
}

pub struct StoryArchive {
    store: Arc<dyn DocumentStore>,
    clock: Arc<dyn Clock>,
    last_sort_key: AtomicI64,
}

impl StoryArchive {
    pub fn new(store: Arc<dyn DocumentStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            last_sort_key: AtomicI64::new(0),
        }
    }

    /// Builds a record with a fresh id and timestamps without storing it.
    pub fn new_record(&self, user: &UserId, prompt: &StoryPrompt, content: String) -> StoryRecord {
        let now = self.clock.now();
        StoryRecord {
            id: Uuid::new_v4(),
            user_id: user.clone(),
            character: prompt.character().to_string(),
            setting: prompt.setting().to_string(),
            plot_twist: prompt.plot_twist().to_string(),
            content,
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            sort_key: self.next_sort_key(now.timestamp_millis()),
        }
    }

    pub async fn append(
        &self,
        user: &UserId,
        prompt: &StoryPrompt,
        content: String,
    ) -> Result<StoryRecord> {
        let record = self.new_record(user, prompt, content);
        self.store.insert_story(record.clone()).await?;
        tracing::debug!(%user, id = %record.id, sort_key = record.sort_key, "story appended");
        Ok(record)
    }

    /// Up to `max` stories of `user`, most recent first.
    pub async fn list(&self, user: &UserId, max: usize) -> Result<Vec<StoryRecord>> {
        let mut records = self.store.stories_for_user(user, max).await?;
        records.sort_by(|a, b| b.sort_key.cmp(&a.sort_key));
        records.truncate(max);
        Ok(records)
    }

    pub async fn list_recent(&self, user: &UserId) -> Result<Vec<StoryRecord>> {
        self.list(user, DEFAULT_LIST_LIMIT).await
    }

    // Wall-clock millis, bumped when needed so keys never repeat or go backwards.
    fn next_sort_key(&self, now_ms: i64) -> i64 {
        let prev = match self.last_sort_key.fetch_update(
            Ordering::AcqRel,
            Ordering::Acquire,
            |prev| Some(now_ms.max(prev + 1)),
        ) {
            Ok(prev) | Err(prev) => prev,
        };
        now_ms.max(prev + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{FixedClock, SystemClock};
    use crate::stores::{Collection, MemoryStore};
    use crate::Error;
    use chrono::{TimeZone, Utc};

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn prompt(n: usize) -> StoryPrompt {
        StoryPrompt::new(format!("hero {n}"), "a castle", "a storm").unwrap()
    }

    fn fixed_archive(store: Arc<MemoryStore>) -> StoryArchive {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        StoryArchive::new(store, Arc::new(clock))
    }

    #[tokio::test]
    async fn test_append_assigns_id_and_timestamps() {
        let archive = fixed_archive(Arc::new(MemoryStore::new()));
        let record = archive
            .append(&user("u1"), &prompt(1), "Once upon a time".into())
            .await
            .unwrap();

        assert_eq!(record.user_id, user("u1"));
        assert_eq!(record.character, "hero 1");
        assert_eq!(record.setting, "a castle");
        assert_eq!(record.plot_twist, "a storm");
        assert_eq!(record.created_at, "2024-05-01T12:00:00.000Z");
        assert_eq!(record.sort_key, 1_714_564_800_000);
        assert!(!record.id.is_nil());
    }

    #[tokio::test]
    async fn test_sort_keys_strictly_increase_under_frozen_clock() {
        let archive = fixed_archive(Arc::new(MemoryStore::new()));
        let u = user("u1");
        let first = archive.append(&u, &prompt(1), "a".into()).await.unwrap();
        let second = archive.append(&u, &prompt(2), "b".into()).await.unwrap();
        let third = archive.append(&u, &prompt(3), "c".into()).await.unwrap();

        assert!(first.sort_key < second.sort_key);
        assert!(second.sort_key < third.sort_key);
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_list_is_most_recent_first() {
        let archive = StoryArchive::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock));
        let u = user("u1");
        for n in 0..5 {
            archive.append(&u, &prompt(n), format!("story {n}")).await.unwrap();
        }

        let listed = archive.list_recent(&u).await.unwrap();
        let contents: Vec<_> = listed.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(
            contents,
            vec!["story 4", "story 3", "story 2", "story 1", "story 0"]
        );
    }

    #[tokio::test]
    async fn test_list_sorts_regardless_of_store_order() {
        let store = Arc::new(MemoryStore::new());
        let archive = fixed_archive(store.clone());
        let u = user("u1");

        // Insert directly with keys out of insertion order.
        for (key, content) in [(30, "middle"), (10, "oldest"), (50, "newest")] {
            let mut record = archive.new_record(&u, &prompt(0), content.into());
            record.sort_key = key;
            store.insert_story(record).await.unwrap();
        }

        let listed = archive.list(&u, 10).await.unwrap();
        let contents: Vec<_> = listed.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["newest", "middle", "oldest"]);
    }

    #[tokio::test]
    async fn test_list_caps_at_max() {
        let archive = fixed_archive(Arc::new(MemoryStore::new()));
        let u = user("u1");
        for n in 0..60 {
            archive.append(&u, &prompt(n), format!("story {n}")).await.unwrap();
        }

        let recent = archive.list_recent(&u).await.unwrap();
        assert_eq!(recent.len(), 50);
        assert_eq!(recent[0].content, "story 59");
        assert_eq!(recent[49].content, "story 10");

        assert_eq!(archive.list(&u, 3).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_filters_by_user() {
        let archive = fixed_archive(Arc::new(MemoryStore::new()));
        archive.append(&user("a"), &prompt(1), "for a".into()).await.unwrap();
        archive.append(&user("b"), &prompt(2), "for b".into()).await.unwrap();

        let listed = archive.list_recent(&user("a")).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].content, "for a");
    }

    #[tokio::test]
    async fn test_list_without_stories_is_empty() {
        let archive = fixed_archive(Arc::new(MemoryStore::new()));
        assert!(archive.list_recent(&user("nobody")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_outage_surfaces() {
        let store = Arc::new(MemoryStore::new());
        let archive = fixed_archive(store.clone());
        store.set_offline(Collection::Stories, true);

        assert!(matches!(
            archive.append(&user("u1"), &prompt(1), "lost".into()).await,
            Err(Error::StoreUnavailable { .. })
        ));
        assert!(matches!(
            archive.list_recent(&user("u1")).await,
            Err(Error::StoreUnavailable { .. })
        ));
    }

    #[test]
    fn test_record_uses_camel_case_layout() {
        let archive = fixed_archive(Arc::new(MemoryStore::new()));
        let record = archive.new_record(&user("u1"), &prompt(1), "text".into());
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["userId"], "u1");
        assert_eq!(json["plotTwist"], "a storm");
        assert_eq!(json["createdAt"], "2024-05-01T12:00:00.000Z");
        assert!(json["sortKey"].is_i64());
    }
}

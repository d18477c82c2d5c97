use super::QueueStore;
use anyhow::Result;
use std::collections::{HashMap, VecDeque};
use tokio::sync::Mutex;

#[derive(Default)]
struct Inner {
    lists: HashMap<String, VecDeque<Vec<u8>>>,
    /// key -> (member -> score); members are unique like a Redis sorted set
    zsets: HashMap<String, HashMap<Vec<u8>, i64>>,
}

/// In-process store with Redis list / sorted-set semantics
///
/// Every operation runs under a single lock, so `sorted_set_take_by_score`
/// is atomic with respect to all other callers.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl QueueStore for MemoryStore {
    async fn list_push_tail(&self, key: &str, payload: Vec<u8>) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner
            .lists
            .entry(key.to_string())
            .or_default()
            .push_back(payload);
        Ok(())
    }

    async fn list_pop_head(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut inner = self.inner.lock().await;
        let Some(list) = inner.lists.get_mut(key) else {
            return Ok(None);
        };
        let head = list.pop_front();
        if list.is_empty() {
            inner.lists.remove(key);
        }
        Ok(head)
    }

    async fn list_len(&self, key: &str) -> Result<u64> {
        let inner = self.inner.lock().await;
        Ok(inner.lists.get(key).map_or(0, |l| l.len() as u64))
    }

    async fn sorted_set_add(&self, key: &str, score: i64, payload: Vec<u8>) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner
            .zsets
            .entry(key.to_string())
            .or_default()
            .insert(payload, score);
        Ok(())
    }

    async fn sorted_set_take_by_score(
        &self,
        key: &str,
        min: i64,
        max: i64,
    ) -> Result<Vec<(Vec<u8>, i64)>> {
        let mut inner = self.inner.lock().await;
        let Some(zset) = inner.zsets.get_mut(key) else {
            return Ok(Vec::new());
        };

        let due: Vec<Vec<u8>> = zset
            .iter()
            .filter(|(_, score)| (min..=max).contains(*score))
            .map(|(member, _)| member.clone())
            .collect();

        let mut taken: Vec<(Vec<u8>, i64)> = due
            .into_iter()
            .filter_map(|member| zset.remove(&member).map(|score| (member, score)))
            .collect();

        if zset.is_empty() {
            inner.zsets.remove(key);
        }

        // Redis order: by score, then lexicographically by member
        taken.sort_by(|(ma, sa), (mb, sb)| sa.cmp(sb).then_with(|| ma.cmp(mb)));
        Ok(taken)
    }

    async fn sorted_set_len(&self, key: &str) -> Result<u64> {
        let inner = self.inner.lock().await;
        Ok(inner.zsets.get(key).map_or(0, |z| z.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_list_is_fifo() {
        let store = MemoryStore::new();
        store.list_push_tail("t:list", b"a".to_vec()).await.unwrap();
        store.list_push_tail("t:list", b"b".to_vec()).await.unwrap();

        assert_eq!(store.list_len("t:list").await.unwrap(), 2);
        assert_eq!(store.list_pop_head("t:list").await.unwrap(), Some(b"a".to_vec()));
        assert_eq!(store.list_pop_head("t:list").await.unwrap(), Some(b"b".to_vec()));
        assert_eq!(store.list_pop_head("t:list").await.unwrap(), None);
        assert_eq!(store.list_len("t:list").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_take_by_score_range() {
        let store = MemoryStore::new();
        store.sorted_set_add("t:zset", 300, b"c".to_vec()).await.unwrap();
        store.sorted_set_add("t:zset", 100, b"a".to_vec()).await.unwrap();
        store.sorted_set_add("t:zset", 900, b"late".to_vec()).await.unwrap();

        let taken = store.sorted_set_take_by_score("t:zset", 0, 500).await.unwrap();
        assert_eq!(taken, vec![(b"a".to_vec(), 100), (b"c".to_vec(), 300)]);
        assert_eq!(store.sorted_set_len("t:zset").await.unwrap(), 1);

        let taken = store.sorted_set_take_by_score("t:zset", 0, 500).await.unwrap();
        assert!(taken.is_empty());
    }

    #[tokio::test]
    async fn test_sorted_set_members_are_unique() {
        let store = MemoryStore::new();
        store.sorted_set_add("t:zset", 100, b"a".to_vec()).await.unwrap();
        store.sorted_set_add("t:zset", 200, b"a".to_vec()).await.unwrap();

        assert_eq!(store.sorted_set_len("t:zset").await.unwrap(), 1);
        let taken = store.sorted_set_take_by_score("t:zset", 0, 150).await.unwrap();
        assert!(taken.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_take_never_duplicates() {
        let store = Arc::new(MemoryStore::new());
        for i in 0..200 {
            store
                .sorted_set_add("t:zset", i, format!("m{}", i).into_bytes())
                .await
                .unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.sorted_set_take_by_score("t:zset", 0, 1_000).await.unwrap()
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap().len();
        }
        assert_eq!(total, 200);
    }
}

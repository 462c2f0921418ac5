//! Per-sender conversation mode and per-sender serialization.
//!
//! Each sender has at most one mode (idle or awaiting an image description). Modes live in a
//! sharded concurrent map and expire after a TTL, so an abandoned image flow does not capture
//! an unrelated message days later. [`SenderLocks`] lets the dispatcher run one event per sender
//! at a time while different senders proceed independently.

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// How the next message from a sender is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConversationMode {
    #[default]
    Idle,
    /// The next text message is the prompt for the image generator.
    AwaitingImagePrompt,
}

/// Storage for per-sender modes. Unknown senders are idle.
#[async_trait]
pub trait ModeStore: Send + Sync {
    async fn get(&self, sender_id: &str) -> ConversationMode;
    async fn set(&self, sender_id: &str, mode: ConversationMode);
    async fn clear(&self, sender_id: &str) {
        self.set(sender_id, ConversationMode::Idle).await
    }
}

#[derive(Debug, Clone, Copy)]
struct ModeEntry {
    mode: ConversationMode,
    set_at: Instant,
}

/// In-memory mode store with optional expiry. Idle senders are not stored.
pub struct ConversationStore {
    modes: DashMap<String, ModeEntry>,
    ttl: Option<Duration>,
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ConversationStore {
    /// `ttl` of None keeps modes until they are cleared.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            modes: DashMap::new(),
            ttl,
        }
    }

    /// Build from `conversation.modeTtlSecs`; 0 disables expiry.
    pub fn with_ttl_secs(secs: u64) -> Self {
        Self::new((secs > 0).then(|| Duration::from_secs(secs)))
    }

    fn is_expired(&self, entry: &ModeEntry) -> bool {
        self.ttl.is_some_and(|ttl| entry.set_at.elapsed() >= ttl)
    }

    fn current(&self, sender_id: &str) -> ConversationMode {
        if let Some(entry) = self.modes.get(sender_id) {
            if !self.is_expired(&entry) {
                return entry.mode;
            }
        }
        if self
            .modes
            .remove_if(sender_id, |_, e| self.is_expired(e))
            .is_some()
        {
            log::debug!("mode for sender {} expired", sender_id);
        }
        ConversationMode::Idle
    }

    fn store(&self, sender_id: &str, mode: ConversationMode) {
        match mode {
            ConversationMode::Idle => {
                self.modes.remove(sender_id);
            }
            mode => {
                self.modes.insert(
                    sender_id.to_string(),
                    ModeEntry {
                        mode,
                        set_at: Instant::now(),
                    },
                );
            }
        }
    }

    /// Drop expired entries; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.modes.len();
        self.modes.retain(|_, e| !self.is_expired(e));
        before.saturating_sub(self.modes.len())
    }

    /// Number of senders with a non-idle mode (expired entries included until purged).
    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

#[async_trait]
impl ModeStore for ConversationStore {
    async fn get(&self, sender_id: &str) -> ConversationMode {
        self.current(sender_id)
    }

    async fn set(&self, sender_id: &str, mode: ConversationMode) {
        self.store(sender_id, mode)
    }
}

/// Periodically purge expired modes until the returned task is aborted.
pub fn spawn_expiry_sweep(
    store: Arc<ConversationStore>,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(every);
        tick.tick().await;
        loop {
            tick.tick().await;
            let removed = store.purge_expired();
            if removed > 0 {
                log::debug!("mode sweep: removed {} expired entries", removed);
            }
        }
    })
}

/// Keyed async locks, one per sender. Entries are dropped once nobody holds or waits on them.
#[derive(Default)]
pub struct SenderLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SenderLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `sender_id`. Other senders are unaffected.
    pub async fn lock(&self, sender_id: &str) -> SenderGuard<'_> {
        let lock = Arc::clone(&self.locks.entry(sender_id.to_string()).or_default());
        let guard = lock.lock_owned().await;
        SenderGuard {
            locks: self,
            sender_id: sender_id.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of senders currently locked or waited on.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Held while one event for a sender is handled.
pub struct SenderGuard<'a> {
    locks: &'a SenderLocks,
    sender_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for SenderGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        self.locks
            .locks
            .remove_if(&self.sender_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[tokio::test]
    async fn unseen_sender_is_idle() {
        let store = ConversationStore::default();
        assert_eq!(store.get("u1").await, ConversationMode::Idle);
    }

    #[tokio::test]
    async fn set_get_clear() {
        let store = ConversationStore::default();
        store.set("u1", ConversationMode::AwaitingImagePrompt).await;
        assert_eq!(store.get("u1").await, ConversationMode::AwaitingImagePrompt);
        assert_eq!(store.get("u2").await, ConversationMode::Idle);
        store.clear("u1").await;
        assert_eq!(store.get("u1").await, ConversationMode::Idle);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn setting_idle_removes_entry() {
        let store = ConversationStore::default();
        store.set("u1", ConversationMode::AwaitingImagePrompt).await;
        assert_eq!(store.len(), 1);
        store.set("u1", ConversationMode::Idle).await;
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn mode_expires_after_ttl() {
        let store = ConversationStore::new(Some(Duration::from_millis(20)));
        store.set("u1", ConversationMode::AwaitingImagePrompt).await;
        assert_eq!(store.get("u1").await, ConversationMode::AwaitingImagePrompt);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get("u1").await, ConversationMode::Idle);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn purge_drops_only_expired() {
        let store = ConversationStore::new(Some(Duration::from_millis(20)));
        store.set("old", ConversationMode::AwaitingImagePrompt).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        store.set("new", ConversationMode::AwaitingImagePrompt).await;
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.get("new").await, ConversationMode::AwaitingImagePrompt);
    }

    #[test]
    fn zero_ttl_secs_disables_expiry() {
        assert!(ConversationStore::with_ttl_secs(0).ttl.is_none());
        assert_eq!(
            ConversationStore::with_ttl_secs(5).ttl,
            Some(Duration::from_secs(5))
        );
    }

    #[tokio::test]
    async fn same_sender_is_serialized() {
        let locks = Arc::new(SenderLocks::new());
        let busy = Arc::new(AtomicBool::new(false));
        let overlaps = Arc::new(AtomicUsize::new(0));
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            let busy = busy.clone();
            let overlaps = overlaps.clone();
            tasks.push(tokio::spawn(async move {
                let _guard = locks.lock("same").await;
                if busy.swap(true, Ordering::SeqCst) {
                    overlaps.fetch_add(1, Ordering::SeqCst);
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
                busy.store(false, Ordering::SeqCst);
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }
        assert_eq!(overlaps.load(Ordering::SeqCst), 0);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn different_senders_do_not_block() {
        let locks = SenderLocks::new();
        let _a = locks.lock("a").await;
        let b = tokio::time::timeout(Duration::from_millis(100), locks.lock("b")).await;
        assert!(b.is_ok());
        assert_eq!(locks.len(), 2);
    }

    #[tokio::test]
    async fn lock_entry_is_dropped_after_release() {
        let locks = SenderLocks::new();
        {
            let _g = locks.lock("a").await;
            assert_eq!(locks.len(), 1);
        }
        assert!(locks.is_empty());
    }
}

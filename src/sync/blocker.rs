//! Operation blocking for items being edited.
//!
//! While an item is blocked its sync is refused with [`super::SyncError::Blocked`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Operation name used when the caller doesn't give one
const ANY_OPERATION: &str = "-";

/// Registry of blocked items, keyed by component and item id
#[derive(Clone, Debug, Default)]
pub struct SyncBlocker {
    blocked: Arc<Mutex<HashMap<String, HashSet<String>>>>,
}

fn item_key(component: &str, item_id: i64) -> String {
    format!("{}#{}", component, item_id)
}

impl SyncBlocker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block an item for `operation`. An item stays blocked while any operation holds it.
    pub async fn block_operation(&self, component: &str, item_id: i64, operation: Option<&str>) {
        let operation = operation.unwrap_or(ANY_OPERATION).to_string();
        self.blocked
            .lock()
            .await
            .entry(item_key(component, item_id))
            .or_default()
            .insert(operation);
    }

    pub async fn unblock_operation(&self, component: &str, item_id: i64, operation: Option<&str>) {
        let operation = operation.unwrap_or(ANY_OPERATION);
        let key = item_key(component, item_id);
        let mut blocked = self.blocked.lock().await;
        if let Some(operations) = blocked.get_mut(&key) {
            operations.remove(operation);
            if operations.is_empty() {
                blocked.remove(&key);
            }
        }
    }

    /// Remove every block of an item
    pub async fn clear_blocks(&self, component: &str, item_id: i64) {
        self.blocked.lock().await.remove(&item_key(component, item_id));
    }

    pub async fn is_blocked(&self, component: &str, item_id: i64) -> bool {
        self.blocked
            .lock()
            .await
            .get(&item_key(component, item_id))
            .is_some_and(|operations| !operations.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn blocked_until_every_operation_is_released() {
        let blocker = SyncBlocker::new();
        blocker.block_operation("mod_workshop", 4, Some("edit")).await;
        blocker.block_operation("mod_workshop", 4, None).await;
        assert!(blocker.is_blocked("mod_workshop", 4).await);
        assert!(!blocker.is_blocked("mod_workshop", 5).await);
        assert!(!blocker.is_blocked("mod_assign", 4).await);

        blocker.unblock_operation("mod_workshop", 4, Some("edit")).await;
        assert!(blocker.is_blocked("mod_workshop", 4).await);
        blocker.unblock_operation("mod_workshop", 4, None).await;
        assert!(!blocker.is_blocked("mod_workshop", 4).await);
    }

    #[tokio::test]
    async fn clear_removes_all_operations() {
        let blocker = SyncBlocker::new();
        blocker.block_operation("mod_workshop", 1, Some("a")).await;
        blocker.block_operation("mod_workshop", 1, Some("b")).await;
        blocker.clear_blocks("mod_workshop", 1).await;
        assert!(!blocker.is_blocked("mod_workshop", 1).await);
    }
}

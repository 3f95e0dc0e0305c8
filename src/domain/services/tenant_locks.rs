use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One async mutex per tenant, created on first use. Serialises the
/// check-then-insert section of booking admission inside this process.
#[derive(Default)]
pub struct TenantLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl TenantLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, tenant_id: &str) -> OwnedMutexGuard<()> {
        // The map shard must not stay locked across the await below.
        let lock = self.locks.entry(tenant_id.to_string()).or_default().value().clone();
        lock.lock_owned().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_tenant_is_serialised() {
        let locks = Arc::new(TenantLocks::new());
        let guard = locks.acquire("a").await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _g = contender.acquire("a").await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());
        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiting).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn different_tenants_do_not_contend() {
        let locks = TenantLocks::new();
        let _a = locks.acquire("a").await;
        tokio::time::timeout(Duration::from_millis(100), locks.acquire("b"))
            .await
            .expect("tenant b must not wait on tenant a");
    }
}

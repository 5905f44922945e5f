use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::repo::{Snapshot, Store};

/// Process-local store for tests and `--mock` runs.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Snapshot>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn load(&self) -> anyhow::Result<Snapshot> {
        Ok(self.inner.read().clone())
    }

    async fn save(&self, snapshot: &Snapshot) -> anyhow::Result<()> {
        *self.inner.write() = snapshot.clone();
        Ok(())
    }
}

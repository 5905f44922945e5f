use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::ports::SessionStore;

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> anyhow::Result<Option<String>> {
        Ok(self.token.lock().clone())
    }

    async fn save(&self, token: &str) -> anyhow::Result<()> {
        *self.token.lock() = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> anyhow::Result<()> {
        self.token.lock().take();
        Ok(())
    }
}

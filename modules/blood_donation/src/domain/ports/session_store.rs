use async_trait::async_trait;

/// Where the current session token lives between calls.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> anyhow::Result<Option<String>>;
    async fn save(&self, token: &str) -> anyhow::Result<()>;
    /// Clearing an empty store is not an error.
    async fn clear(&self) -> anyhow::Result<()>;
}

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::domain::repo::{Snapshot, Store};
use crate::infra::storage::entity::StoreDocument;
use crate::infra::storage::mapper::{document_to_snapshot, snapshot_to_document};

/// Keeps the whole data set in one pretty-printed JSON file.
///
/// Writes go to a sibling temp file that is renamed over the target, so a
/// crash mid-write leaves the previous document intact.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "store.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl Store for JsonFileStore {
    #[instrument(name = "blood_donation.store.json.load", skip_all, fields(path = %self.path.display()))]
    async fn load(&self) -> Result<Snapshot> {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Store file missing, starting empty");
                return Ok(Snapshot::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("reading {}", self.path.display()));
            }
        };

        let doc: StoreDocument = serde_json::from_slice(&raw)
            .with_context(|| format!("parsing {}", self.path.display()))?;
        let snapshot = document_to_snapshot(doc)
            .with_context(|| format!("loading {}", self.path.display()))?;
        debug!(
            users = snapshot.users.len(),
            requests = snapshot.requests.len(),
            donations = snapshot.donations.len(),
            "Store loaded"
        );
        Ok(snapshot)
    }

    #[instrument(name = "blood_donation.store.json.save", skip_all, fields(path = %self.path.display()))]
    async fn save(&self, snapshot: &Snapshot) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }

        let body = serde_json::to_vec_pretty(&snapshot_to_document(snapshot))
            .context("serializing store document")?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &body)
            .await
            .with_context(|| format!("writing {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replacing {}", self.path.display()))?;
        debug!(bytes = body.len(), "Store saved");
        Ok(())
    }
}

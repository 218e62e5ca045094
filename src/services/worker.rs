use crate::services::video_storage::VideoStorage;
use crate::services::video_store::VideoStore;
use crate::utils::keys::id_from_key;
use chrono::Utc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::sleep;

/// Removes stored objects that never got a metadata row (e.g. the process
/// died between storing a file and registering it).
pub struct OrphanSweeper {
    store: VideoStore,
    storage: VideoStorage,
    interval: Duration,
    min_age: Duration,
    shutdown: watch::Receiver<bool>,
}

impl OrphanSweeper {
    pub fn new(
        store: VideoStore,
        storage: VideoStorage,
        interval: Duration,
        min_age: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            store,
            storage,
            interval,
            min_age,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            "🚀 Orphan sweeper started (every {:?}, min age {:?})",
            self.interval,
            self.min_age
        );

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Orphan sweeper shutting down");
                    break;
                }
                _ = sleep(self.interval) => {
                    if let Err(e) = self.sweep_once().await {
                        tracing::error!("Orphan sweep failed: {}", e);
                    }
                }
            }
        }
    }

    /// One pass over the video namespace. Returns how many objects were deleted.
    pub async fn sweep_once(&self) -> anyhow::Result<usize> {
        tracing::info!("🧹 Sweeping for orphaned video objects...");

        let min_age = chrono::Duration::from_std(self.min_age)?;
        let cutoff = Utc::now() - min_age;
        let objects = self.storage.list_videos().await?;
        let mut removed = 0;

        for object in objects {
            // Objects without a timestamp may still be mid-registration.
            let Some(last_modified) = object.last_modified else {
                continue;
            };
            if last_modified > cutoff {
                continue;
            }

            let registered = match id_from_key(&object.key) {
                Some(id) => self.store.video_exists(&id.to_string()).await?,
                None => false,
            };
            if registered {
                continue;
            }

            match self.storage.delete(&object.key).await {
                Ok(()) => {
                    tracing::info!("Deleted orphaned object {}", object.key);
                    removed += 1;
                }
                Err(e) => tracing::warn!("Failed to delete orphaned object {}: {}", object.key, e),
            }
        }

        tracing::info!("✅ Orphan sweep completed, {} object(s) removed", removed);
        Ok(removed)
    }
}

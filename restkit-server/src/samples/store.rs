//! Sample store
//!
//! Keyed by id, shared by every request through the application state.
//! Writers take the lock for the whole read-modify-write, so concurrent
//! updates to one sample never interleave.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{CreateSample, Sample, UpdateSample};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sample '{id}' not found")]
    NotFound { id: String },
}

/// Cheaply clonable handle to the sample map.
#[derive(Clone, Default)]
pub struct SampleStore {
    inner: Arc<RwLock<HashMap<String, Sample>>>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a new sample with a fresh UUID.
    ///
    /// `created_at` and `updated_at` start out equal.
    pub async fn create(&self, input: CreateSample) -> Sample {
        tracing::info!(name = %input.name, "Creating sample");

        let now = Utc::now();
        let sample = Sample {
            id: Uuid::new_v4().to_string(),
            name: input.name,
            description: input.description.unwrap_or_default(),
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        self.inner
            .write()
            .await
            .insert(sample.id.clone(), sample.clone());

        tracing::info!(id = %sample.id, "Sample created");
        sample
    }

    /// All samples, oldest first.
    pub async fn find_all(&self) -> Vec<Sample> {
        let samples = self.inner.read().await;
        tracing::info!(total = samples.len(), "Listing samples");

        let mut all: Vec<Sample> = samples.values().cloned().collect();
        all.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        all
    }

    pub async fn find_one(&self, id: &str) -> Result<Sample, StoreError> {
        tracing::info!(id, "Finding sample");
        self.inner
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Apply the provided fields and bump `updated_at`.
    pub async fn update(&self, id: &str, changes: UpdateSample) -> Result<Sample, StoreError> {
        tracing::info!(id, "Updating sample");

        let mut samples = self.inner.write().await;
        let sample = samples.get_mut(id).ok_or_else(|| not_found(id))?;

        if let Some(name) = changes.name {
            sample.name = name;
        }
        if let Some(description) = changes.description {
            sample.description = description;
        }
        if let Some(is_active) = changes.is_active {
            sample.is_active = is_active;
        }
        sample.updated_at = next_timestamp(sample.updated_at);

        tracing::info!(id, "Sample updated");
        Ok(sample.clone())
    }

    pub async fn remove(&self, id: &str) -> Result<(), StoreError> {
        tracing::info!(id, "Removing sample");
        self.inner
            .write()
            .await
            .remove(id)
            .map(|_| tracing::info!(id, "Sample removed"))
            .ok_or_else(|| not_found(id))
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

fn not_found(id: &str) -> StoreError {
    tracing::warn!(id, "Sample not found");
    StoreError::NotFound { id: id.to_owned() }
}

/// Now, or just past `previous` if the clock has not moved since.
fn next_timestamp(previous: DateTime<Utc>) -> DateTime<Utc> {
    let now = Utc::now();
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> CreateSample {
        CreateSample {
            name: name.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_applies_defaults() {
        let store = SampleStore::new();
        let sample = store.create(named("A sample")).await;

        assert!(Uuid::parse_str(&sample.id).is_ok());
        assert_eq!(sample.description, "");
        assert!(sample.is_active);
        assert_eq!(sample.created_at, sample.updated_at);
    }

    #[tokio::test]
    async fn round_trip() {
        let store = SampleStore::new();
        let created = store.create(named("AAA")).await;

        let found = store.find_one(&created.id).await.unwrap();
        assert_eq!(found.name, "AAA");
        assert!(found.is_active);
        assert_eq!(found.created_at, found.updated_at);

        let updated = store
            .update(
                &created.id,
                UpdateSample {
                    name: Some("BBB".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "BBB");
        assert!(updated.updated_at > updated.created_at);

        store.remove(&created.id).await.unwrap();
        assert!(matches!(
            store.find_one(&created.id).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn update_keeps_absent_fields() {
        let store = SampleStore::new();
        let created = store
            .create(CreateSample {
                name: "keep me".into(),
                description: Some("original".into()),
                is_active: Some(true),
            })
            .await;

        let updated = store
            .update(
                &created.id,
                UpdateSample {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "keep me");
        assert_eq!(updated.description, "original");
        assert!(!updated.is_active);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn repeated_updates_advance_timestamp() {
        let store = SampleStore::new();
        let created = store.create(named("tick")).await;

        let first = store
            .update(&created.id, UpdateSample::default())
            .await
            .unwrap();
        let second = store
            .update(&created.id, UpdateSample::default())
            .await
            .unwrap();
        assert!(second.updated_at > first.updated_at);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let store = SampleStore::new();
        assert!(matches!(
            store.update("nope", UpdateSample::default()).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.remove("nope").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn find_all_oldest_first() {
        let store = SampleStore::new();
        let a = store.create(named("first")).await;
        let b = store.create(named("second")).await;

        let all = store.find_all().await;
        assert_eq!(all.len(), 2);
        assert_eq!(store.len().await, 2);
        if a.created_at != b.created_at {
            assert_eq!(all[0].id, a.id);
            assert_eq!(all[1].id, b.id);
        }
    }

    #[tokio::test]
    async fn clones_share_state() {
        let store = SampleStore::new();
        let other = store.clone();
        store.create(named("shared")).await;
        assert!(!other.is_empty().await);
    }
}

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::GenerationError;

/// The derived artifacts produced from one uploaded report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    SimplifiedReport,
    HealthHighlights,
    HealthRecommendations,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 3] = [
        ArtifactKind::SimplifiedReport,
        ArtifactKind::HealthHighlights,
        ArtifactKind::HealthRecommendations,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::SimplifiedReport => "simplified_report",
            ArtifactKind::HealthHighlights => "health_highlights",
            ArtifactKind::HealthRecommendations => "health_recommendations",
        }
    }

    fn slot_index(self) -> usize {
        match self {
            ArtifactKind::SimplifiedReport => 0,
            ArtifactKind::HealthHighlights => 1,
            ArtifactKind::HealthRecommendations => 2,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where an artifact is in its lifecycle for the current document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    Absent,
    Pending,
    Populated,
}

/// Lazily populated, write-once store for the artifacts of a single document.
///
/// Each kind moves Absent -> Pending -> Populated. The slot mutex is held for
/// the whole generation, so concurrent requests for the same kind wait for
/// the first caller's result instead of issuing a duplicate backend call. A
/// failed generation releases the lock with the slot still Absent, which
/// keeps the operation retryable.
#[derive(Debug)]
pub struct ArtifactCache {
    slots: [Mutex<Option<String>>; 3],
}

impl ArtifactCache {
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| Mutex::new(None)),
        }
    }

    /// Return the cached text for `kind`, awaiting `generate` at most once
    /// per document to populate it. The future is lazy, so a cache hit never
    /// does any generation work.
    pub async fn get_or_generate<Fut>(
        &self,
        kind: ArtifactKind,
        generate: Fut,
    ) -> Result<String, GenerationError>
    where
        Fut: Future<Output = Result<String, GenerationError>>,
    {
        let mut slot = self.slots[kind.slot_index()].lock().await;
        if let Some(text) = slot.as_ref() {
            return Ok(text.clone());
        }

        let text = generate.await?;
        *slot = Some(text.clone());
        Ok(text)
    }

    pub fn status(&self, kind: ArtifactKind) -> ArtifactStatus {
        match self.slots[kind.slot_index()].try_lock() {
            Ok(slot) if slot.is_some() => ArtifactStatus::Populated,
            Ok(_) => ArtifactStatus::Absent,
            Err(_) => ArtifactStatus::Pending,
        }
    }

    /// The populated value, without triggering generation. `None` while the
    /// slot is absent or a generation is in flight.
    pub fn peek(&self, kind: ArtifactKind) -> Option<String> {
        self.slots[kind.slot_index()]
            .try_lock()
            .ok()
            .and_then(|slot| slot.clone())
    }
}

impl Default for ArtifactCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn generates_at_most_once_per_kind() {
        let cache = ArtifactCache::new();
        let calls = AtomicU32::new(0);

        for _ in 0..3 {
            let text = cache
                .get_or_generate(ArtifactKind::SimplifiedReport, async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok("simplified".to_string())
                })
                .await
                .unwrap();
            assert_eq!(text, "simplified");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            cache.status(ArtifactKind::SimplifiedReport),
            ArtifactStatus::Populated
        );
        // The other kinds are untouched.
        assert_eq!(
            cache.status(ArtifactKind::HealthHighlights),
            ArtifactStatus::Absent
        );
    }

    #[tokio::test]
    async fn concurrent_requests_share_one_generation() {
        let cache = Arc::new(ArtifactCache::new());
        let calls = Arc::new(AtomicU32::new(0));

        let mut handles = Vec::new();
        for _ in 0..4 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_generate(ArtifactKind::HealthHighlights, async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok("highlights".to_string())
                    })
                    .await
                    .unwrap()
            }));
        }

        for handle in handles {
            assert_eq!(handle.await.unwrap(), "highlights");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_leaves_slot_absent_and_retryable() {
        let cache = ArtifactCache::new();

        let result = cache
            .get_or_generate(ArtifactKind::SimplifiedReport, async {
                Err(GenerationError::Backend("boom".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(
            cache.status(ArtifactKind::SimplifiedReport),
            ArtifactStatus::Absent
        );
        assert!(cache.peek(ArtifactKind::SimplifiedReport).is_none());

        let text = cache
            .get_or_generate(ArtifactKind::SimplifiedReport, async {
                Ok("second try".to_string())
            })
            .await
            .unwrap();
        assert_eq!(text, "second try");
    }

    #[tokio::test]
    async fn status_reports_pending_while_generation_is_in_flight() {
        let cache = Arc::new(ArtifactCache::new());
        let started = Arc::new(tokio::sync::Notify::new());
        let release = Arc::new(tokio::sync::Notify::new());

        let handle = {
            let cache = cache.clone();
            let started = started.clone();
            let release = release.clone();
            tokio::spawn(async move {
                cache
                    .get_or_generate(ArtifactKind::HealthRecommendations, async move {
                        started.notify_one();
                        release.notified().await;
                        Ok("done".to_string())
                    })
                    .await
                    .unwrap()
            })
        };

        started.notified().await;
        assert_eq!(
            cache.status(ArtifactKind::HealthRecommendations),
            ArtifactStatus::Pending
        );

        release.notify_one();
        assert_eq!(handle.await.unwrap(), "done");
        assert_eq!(
            cache.status(ArtifactKind::HealthRecommendations),
            ArtifactStatus::Populated
        );
        assert_eq!(
            cache.peek(ArtifactKind::HealthRecommendations).as_deref(),
            Some("done")
        );
    }
}

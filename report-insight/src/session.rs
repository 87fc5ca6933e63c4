use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::cache::ArtifactCache;
use crate::chat::ChatTranscript;
use crate::error::{PipelineError, Result};

/// One uploaded report: the extracted text plus provenance. Immutable once
/// extracted; a new upload replaces the document rather than mutating it.
#[derive(Debug)]
pub struct UploadedDocument {
    pub id: Uuid,
    pub text: String,
    pub source_bytes: usize,
    pub received_at: DateTime<Utc>,
}

impl UploadedDocument {
    pub fn new(text: String, source_bytes: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            source_bytes,
            received_at: Utc::now(),
        }
    }
}

/// Everything scoped to the current document: the extracted text, the
/// artifact cache and the chat transcript. Replaced as one unit on upload,
/// so artifacts and transcript can never outlive their document.
#[derive(Debug)]
pub struct DocumentState {
    pub document: UploadedDocument,
    pub artifacts: ArtifactCache,
    pub transcript: ChatTranscript,
}

impl DocumentState {
    pub fn new(document: UploadedDocument) -> Self {
        Self {
            document,
            artifacts: ArtifactCache::new(),
            transcript: ChatTranscript::new(),
        }
    }
}

/// Per-session context. Each session owns its current document and the state
/// derived from it; nothing here is process-global. Cloning shares the
/// underlying state.
#[derive(Debug, Clone)]
pub struct PatientSession {
    pub id: String,
    pub created_at: DateTime<Utc>,
    current: Arc<RwLock<Option<Arc<DocumentState>>>>,
}

impl PatientSession {
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            current: Arc::new(RwLock::new(None)),
        }
    }

    /// Install a new current document, atomically discarding the previous
    /// document's artifacts and transcript. A generation still in flight for
    /// the old document completes into the detached state and is never
    /// visible through this session again.
    pub fn replace_document(&self, document: UploadedDocument) -> Arc<DocumentState> {
        let state = Arc::new(DocumentState::new(document));
        *self.current.write().unwrap() = Some(state.clone());
        state
    }

    pub fn current_document(&self) -> Result<Arc<DocumentState>> {
        self.current
            .read()
            .unwrap()
            .clone()
            .ok_or(PipelineError::DocumentMissing)
    }

    pub fn has_document(&self) -> bool {
        self.current.read().unwrap().is_some()
    }
}

impl Default for PatientSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Registry of active sessions.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn save(&self, session: PatientSession) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<PatientSession>>;
    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory implementation of SessionStorage
pub struct InMemorySessionStorage {
    sessions: Arc<DashMap<String, PatientSession>>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemorySessionStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn save(&self, session: PatientSession) -> Result<()> {
        self.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<PatientSession>> {
        Ok(self.sessions.get(id).map(|entry| entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.sessions.remove(id);
        Ok(())
    }
}

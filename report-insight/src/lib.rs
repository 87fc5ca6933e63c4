pub mod cache;
pub mod chat;
pub mod config;
pub mod error;
pub mod extract;
pub mod generation;
pub mod medications;
pub mod pipeline;
pub mod prompt;
pub mod session;

// Re-export commonly used types
pub use cache::{ArtifactCache, ArtifactKind, ArtifactStatus};
pub use chat::{ChatRole, ChatTranscript, ChatTurn};
pub use config::GenerationConfig;
pub use error::{
    ConfigurationError, ExtractionError, GenerationError, PipelineError, Result,
};
pub use generation::{GenerationClient, OpenRouterClient, RetryingClient};
pub use medications::{MedicationRecord, MedicationSource, StaticFormulary};
pub use pipeline::ReportPipeline;
pub use session::{
    DocumentState, InMemorySessionStorage, PatientSession, SessionStorage, UploadedDocument,
};

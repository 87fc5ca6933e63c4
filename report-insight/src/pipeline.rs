use std::sync::Arc;

use tracing::info;

use crate::cache::ArtifactKind;
use crate::error::Result;
use crate::extract;
use crate::generation::GenerationClient;
use crate::prompt;
use crate::session::{DocumentState, PatientSession, UploadedDocument};

/// Orchestrates the report-to-insight flow: extract text from an upload,
/// compose the prompt for each artifact, dispatch it to the generation
/// client and cache the result for the lifetime of the document.
pub struct ReportPipeline {
    client: Arc<dyn GenerationClient>,
    chat_context_chars: usize,
}

impl ReportPipeline {
    pub fn new(client: Arc<dyn GenerationClient>, chat_context_chars: usize) -> Self {
        Self {
            client,
            chat_context_chars,
        }
    }

    /// Extract text from an uploaded PDF and install it as the session's
    /// current document. Extraction failures abort before any generation is
    /// attempted; a successful upload resets every cached artifact and the
    /// chat transcript.
    pub async fn upload_document(
        &self,
        session: &PatientSession,
        bytes: Vec<u8>,
    ) -> Result<Arc<DocumentState>> {
        let source_bytes = bytes.len();
        let text = extract::extract_text_async(bytes).await?;
        let state = session.replace_document(UploadedDocument::new(text, source_bytes));

        info!(
            session_id = %session.id,
            document_id = %state.document.id,
            "installed new report document"
        );
        Ok(state)
    }

    pub async fn simplified_report(&self, session: &PatientSession) -> Result<String> {
        let state = session.current_document()?;
        let text = state
            .artifacts
            .get_or_generate(ArtifactKind::SimplifiedReport, async {
                let prompt = prompt::simplified_report_prompt(&state.document.text);
                self.client.generate(&prompt).await
            })
            .await?;
        Ok(text)
    }

    pub async fn health_highlights(&self, session: &PatientSession) -> Result<String> {
        let state = session.current_document()?;
        let text = state
            .artifacts
            .get_or_generate(ArtifactKind::HealthHighlights, async {
                let prompt = prompt::health_highlights_prompt(&state.document.text);
                self.client.generate(&prompt).await
            })
            .await?;
        Ok(text)
    }

    /// Recommendations are derived from the highlights rather than the raw
    /// report, so the highlights artifact is produced first for the current
    /// document (still at most once).
    pub async fn health_recommendations(&self, session: &PatientSession) -> Result<String> {
        let state = session.current_document()?;

        let highlights = state
            .artifacts
            .get_or_generate(ArtifactKind::HealthHighlights, async {
                let prompt = prompt::health_highlights_prompt(&state.document.text);
                self.client.generate(&prompt).await
            })
            .await?;

        let text = state
            .artifacts
            .get_or_generate(ArtifactKind::HealthRecommendations, async {
                let prompt = prompt::health_recommendations_prompt(&highlights);
                self.client.generate(&prompt).await
            })
            .await?;
        Ok(text)
    }

    /// Answer a patient question about the current report. The user turn is
    /// recorded before the backend call and stays in the transcript even if
    /// generation fails; the assistant turn is appended only on success.
    pub async fn answer_question(
        &self,
        session: &PatientSession,
        question: &str,
    ) -> Result<String> {
        let state = session.current_document()?;
        state.transcript.push_user(question);

        let excerpt = prompt::report_excerpt(&state.document.text, self.chat_context_chars);
        let answer = self
            .client
            .generate(&prompt::chat_answer_prompt(excerpt, question))
            .await?;

        state.transcript.push_assistant(answer.clone());
        Ok(answer)
    }
}

use std::collections::HashMap;

use report_insight::{ArtifactStatus, ChatTurn, MedicationRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreatedResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadReportResponse {
    pub session_id: String,
    pub document_id: String,
    pub extracted_chars: usize,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub has_document: bool,
    pub artifacts: HashMap<String, ArtifactStatus>,
    pub chat_turns: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ArtifactResponse {
    pub session_id: String,
    pub artifact: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptResponse {
    pub session_id: String,
    pub turns: Vec<ChatTurn>,
}

#[derive(Debug, Deserialize)]
pub struct MedicationQuery {
    pub search: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MedicationListResponse {
    pub medications: Vec<MedicationRecord>,
    pub disclaimer: String,
}

//! Prompt composition for each generation task.
//!
//! Every function here is a pure function of its inputs: same report text,
//! same instruction string, byte for byte. Nothing in this module touches
//! the network or session state, so prompt content can be verified without
//! a backend.

/// System preamble shared by every generation request.
pub const MEDICAL_ASSISTANT_PREAMBLE: &str =
    "You are a medical assistant that helps patients understand their exam \
     reports. You explain medical content in clear, accessible language and \
     never invent clinical claims.";

/// Instruction to rewrite the full report in plain language, sectioned by
/// exam type with abnormal values flagged.
pub fn simplified_report_prompt(report_text: &str) -> String {
    format!(
        "You are a medical assistant helping a patient understand a medical \
         report. Simplify this report using clear, accessible language.\n\n\
         **Original report:**\n{report_text}\n\n\
         **Instructions:**\n\
         1. Identify the exams that were performed\n\
         2. Highlight the most relevant results\n\
         3. Explain technical terms in simple language\n\
         4. Organize by section (blood count, cholesterol, etc.)\n\
         5. Keep every piece of important information\n\n\
         **Format:**\n\
         - A clear heading for each section\n\
         - Bulleted lists for readability\n\
         - Flag values outside the normal range\n\
         - Avoid medical jargon"
    )
}

/// Instruction to identify the findings that deserve the patient's
/// attention, ordered by importance.
pub fn health_highlights_prompt(report_text: &str) -> String {
    format!(
        "Analyze this medical report and identify:\n\n\
         **Report:**\n{report_text}\n\n\
         **Items to identify:**\n\
         1. Values outside the normal range (flag and explain)\n\
         2. Possible conditions suggested by the results\n\
         3. Lifestyle recommendations\n\
         4. Signs that require medical follow-up\n\
         5. Exams that may need to be repeated\n\n\
         **Format:**\n\
         - A list ordered by importance\n\
         - Simple, direct language\n\
         - Mark urgent items clearly\n\
         - Include reference values where relevant"
    )
}

/// Instruction to turn previously generated highlights into actionable
/// recommendations. Takes the highlights text, not the raw report.
pub fn health_recommendations_prompt(highlights_text: &str) -> String {
    format!(
        "Based on these health highlights:\n{highlights_text}\n\n\
         Create practical health recommendations covering:\n\
         1. Eating habits\n\
         2. Physical activity\n\
         3. Home monitoring\n\
         4. Signs that call for seeing a doctor\n\
         5. How often exams should be repeated\n\n\
         Format:\n\
         - A list of concrete actions\n\
         - A timeframe for each recommendation\n\
         - A priority level (high/medium/low)"
    )
}

/// Instruction to answer a patient question about the report. Only a bounded
/// excerpt of the report is embedded; callers truncate with
/// [`report_excerpt`] before composing.
pub fn chat_answer_prompt(report_excerpt: &str, question: &str) -> String {
    format!(
        "You are a medical assistant helping a patient understand their \
         report.\n\
         The report contains: {report_excerpt}\n\n\
         Patient question: {question}\n\n\
         Answer in a way that is:\n\
         - Clear and simple\n\
         - Empathetic and welcoming\n\
         - Technical when necessary, but with every term explained\n\
         - Practical, including recommendations when applicable\n\
         - If you do not know the answer, say you cannot answer and suggest \
         consulting the doctor who ordered the exam"
    )
}

/// At most `max_chars` characters of `text`, never splitting a character.
pub fn report_excerpt(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

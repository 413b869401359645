// Prompt text for the tailoring call. Inputs are embedded verbatim: no
// sanitization, no truncation.

/// System instruction sent with every tailoring request.
pub const TAILOR_SYSTEM: &str = "You are an expert resume optimization specialist. \
    Tailor the resume to closely match the job description \
    (~80–85% alignment) while keeping a professional tone and clean structure. \
    If needed, synthesize missing but plausible details, and resolve conflicts in favor of relevance. \
    Return only the revised resume.";

/// The two halves of a tailoring prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPayload {
    pub system_instruction: String,
    pub user_message: String,
}

pub fn build_prompt(job_description: &str, resume_template: &str) -> PromptPayload {
    PromptPayload {
        system_instruction: TAILOR_SYSTEM.to_string(),
        user_message: format!(
            "JOB DESCRIPTION:\n{job_description}\n\nCURRENT RESUME TEMPLATE:\n{resume_template}\n"
        ),
    }
}

use serde::Serialize;

/// Reset values for the job description, resume template and output boxes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClearedFields {
    pub job_description: String,
    pub resume_template: String,
    pub output: String,
}

/// Stateless reset: three empty strings, whatever the fields held before.
pub fn clear_all() -> (String, String, String) {
    (String::new(), String::new(), String::new())
}

impl From<(String, String, String)> for ClearedFields {
    fn from((job_description, resume_template, output): (String, String, String)) -> Self {
        ClearedFields {
            job_description,
            resume_template,
            output,
        }
    }
}

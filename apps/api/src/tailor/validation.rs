//! Pre-flight checks on the two user inputs. A failed check is an instruction
//! for the user, not an error, and no model call is made.

pub const MISSING_BOTH_MESSAGE: &str =
    "Please provide a job description and resume template to tailor.";
pub const MISSING_JOB_DESCRIPTION_MESSAGE: &str =
    "Please paste the job description before tailoring your resume.";
pub const MISSING_RESUME_MESSAGE: &str =
    "Please paste your current resume template before tailoring.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCheck {
    MissingBoth,
    MissingJobDescription,
    MissingResume,
    Ready,
}

impl InputCheck {
    /// The text shown to the user, or `None` when generation may proceed.
    pub fn message(self) -> Option<&'static str> {
        match self {
            InputCheck::MissingBoth => Some(MISSING_BOTH_MESSAGE),
            InputCheck::MissingJobDescription => Some(MISSING_JOB_DESCRIPTION_MESSAGE),
            InputCheck::MissingResume => Some(MISSING_RESUME_MESSAGE),
            InputCheck::Ready => None,
        }
    }
}

/// Classifies the inputs. Whitespace-only text counts as missing.
pub fn check_inputs(job_description: &str, resume_template: &str) -> InputCheck {
    match (
        job_description.trim().is_empty(),
        resume_template.trim().is_empty(),
    ) {
        (true, true) => InputCheck::MissingBoth,
        (true, false) => InputCheck::MissingJobDescription,
        (false, true) => InputCheck::MissingResume,
        (false, false) => InputCheck::Ready,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_blank() {
        assert_eq!(check_inputs("", ""), InputCheck::MissingBoth);
        assert_eq!(check_inputs("  \n\t", " "), InputCheck::MissingBoth);
        assert_eq!(
            check_inputs(" ", "\n").message(),
            Some("Please provide a job description and resume template to tailor.")
        );
    }

    #[test]
    fn test_job_description_blank() {
        let check = check_inputs("   ", "Jane Doe\nEngineer");
        assert_eq!(check, InputCheck::MissingJobDescription);
        assert_eq!(
            check.message(),
            Some("Please paste the job description before tailoring your resume.")
        );
    }

    #[test]
    fn test_resume_blank() {
        let check = check_inputs("Senior Rust Engineer", "\t\n");
        assert_eq!(check, InputCheck::MissingResume);
        assert_eq!(
            check.message(),
            Some("Please paste your current resume template before tailoring.")
        );
    }

    #[test]
    fn test_both_present() {
        let check = check_inputs(" Senior Rust Engineer ", " Jane Doe ");
        assert_eq!(check, InputCheck::Ready);
        assert_eq!(check.message(), None);
    }
}

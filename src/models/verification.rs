// ABOUTME: Correctness Verifier result type: forward/backward solve agreement
// ABOUTME: Internal verifier failure is signaled as a passing result, not an error

use serde::{Deserialize, Serialize};

/// `verify_correctness(question, blueprint)` result.
///
/// `verified` is true iff both the backward check (recovering the implied
/// setup from the marked answer) and the forward solve agree with the
/// marked answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectnessVerification {
    pub verified: bool,
    #[serde(default)]
    pub backwards_check: Option<String>,
    #[serde(default)]
    pub forwards_solution: Option<String>,
    #[serde(default = "default_true")]
    pub answer_matches: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl CorrectnessVerification {
    /// The fallback the verifier reports on its own internal failure: a
    /// pass, so the pipeline never blocks on a verifier-side fault.
    pub fn internal_failure_passes() -> Self {
        Self {
            verified: true,
            backwards_check: None,
            forwards_solution: None,
            answer_matches: true,
            issues: vec![],
            suggestions: vec![],
        }
    }

    /// Builds the synthetic judgment the controller feeds into the revision
    /// path when this verification fails (§4.7): `{accepted:false, issues,
    /// suggestions}`.
    pub fn as_synthetic_issues(&self) -> Vec<String> {
        if self.issues.is_empty() {
            vec!["Answer inconsistent with setup".to_string()]
        } else {
            self.issues.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_failure_passes_rather_than_blocking() {
        let verification = CorrectnessVerification::internal_failure_passes();
        assert!(verification.verified);
        assert!(verification.issues.is_empty());
    }

    #[test]
    fn synthetic_issues_fall_back_to_a_default_message() {
        let verification = CorrectnessVerification {
            verified: false,
            backwards_check: None,
            forwards_solution: None,
            answer_matches: false,
            issues: vec![],
            suggestions: vec![],
        };
        assert_eq!(
            verification.as_synthetic_issues(),
            vec!["Answer inconsistent with setup".to_string()]
        );
    }
}

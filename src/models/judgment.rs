// ABOUTME: Quality Judge verdict types: status derivation over solve, attack, and score passes
// ABOUTME: Status is a total function of its inputs per the documented derivation order

use serde::{Deserialize, Serialize};

/// Final judgment status for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JudgmentStatus {
    Accepted,
    Rejected,
    NeedsRevision,
}

/// A single vulnerability the adversarial pass found in a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VulnerabilitySeverity {
    Critical,
    Major,
    Minor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vulnerability {
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: VulnerabilitySeverity,
    pub description: String,
}

/// Clarity, difficulty-match, and alignment scores from the scoring pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgmentScores {
    pub clarity_score: f64,
    pub vulnerability_score: f64,
    pub num_reasoning_steps: u32,
    #[serde(default)]
    pub estimated_year6_success_rate: f64,
    #[serde(default)]
    pub too_easy: bool,
}

/// The Quality Judge's verdict: `check_quality(question, blueprint)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityJudgment {
    pub status: JudgmentStatus,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub vulnerabilities: Vec<Vulnerability>,
    pub scores: JudgmentScores,
    #[serde(default)]
    pub solution: Option<String>,
    /// True iff `answer_matches` the marked choice from the solve pass.
    pub answer_matches: bool,
}

impl QualityJudgment {
    pub fn accepted(&self) -> bool {
        self.status == JudgmentStatus::Accepted
    }

    /// Status derivation per §4.6, evaluated in strict order. `is_too_easy`
    /// and `high_success_rate` are distinct gates, not merged into one bool:
    /// the original rejects outright on `is_too_easy` but only sends a
    /// high estimated success rate back for revision.
    pub fn derive_status(
        answer_matches: bool,
        is_too_easy: bool,
        high_success_rate: bool,
        worst_vulnerability: Option<VulnerabilitySeverity>,
        has_too_easy_vulnerability: bool,
        num_reasoning_steps: u32,
        clarity_score: f64,
        vulnerability_score: f64,
    ) -> JudgmentStatus {
        if !answer_matches {
            return JudgmentStatus::Rejected;
        }
        if is_too_easy {
            return JudgmentStatus::Rejected;
        }
        if high_success_rate {
            return JudgmentStatus::NeedsRevision;
        }
        match worst_vulnerability {
            Some(VulnerabilitySeverity::Critical) => return JudgmentStatus::Rejected,
            Some(VulnerabilitySeverity::Major) => return JudgmentStatus::NeedsRevision,
            _ => {}
        }
        if has_too_easy_vulnerability {
            return JudgmentStatus::NeedsRevision;
        }
        if num_reasoning_steps < 3 {
            return JudgmentStatus::NeedsRevision;
        }
        if clarity_score < 0.5 {
            return JudgmentStatus::Rejected;
        }
        if clarity_score < 0.7 {
            return JudgmentStatus::NeedsRevision;
        }
        if vulnerability_score > 0.6 {
            return JudgmentStatus::NeedsRevision;
        }
        JudgmentStatus::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_answer_always_rejects_regardless_of_other_scores() {
        let status = QualityJudgment::derive_status(false, false, false, None, false, 5, 0.9, 0.1);
        assert_eq!(status, JudgmentStatus::Rejected);
    }

    #[test]
    fn critical_vulnerability_rejects() {
        let status = QualityJudgment::derive_status(
            true,
            false,
            false,
            Some(VulnerabilitySeverity::Critical),
            false,
            5,
            0.9,
            0.1,
        );
        assert_eq!(status, JudgmentStatus::Rejected);
    }

    #[test]
    fn too_few_reasoning_steps_needs_revision() {
        let status = QualityJudgment::derive_status(true, false, false, None, false, 1, 0.9, 0.1);
        assert_eq!(status, JudgmentStatus::NeedsRevision);
    }

    #[test]
    fn clean_inputs_are_accepted() {
        let status = QualityJudgment::derive_status(true, false, false, None, false, 4, 0.9, 0.1);
        assert_eq!(status, JudgmentStatus::Accepted);
    }

    #[test]
    fn status_derivation_is_a_total_function_of_its_inputs() {
        let a = QualityJudgment::derive_status(true, false, false, None, false, 4, 0.6, 0.1);
        let b = QualityJudgment::derive_status(true, false, false, None, false, 4, 0.6, 0.1);
        assert_eq!(a, b);
        assert_eq!(a, JudgmentStatus::NeedsRevision);
    }

    #[test]
    fn too_easy_rejects_but_high_success_rate_alone_needs_revision() {
        let too_easy = QualityJudgment::derive_status(true, true, false, None, false, 4, 0.9, 0.1);
        assert_eq!(too_easy, JudgmentStatus::Rejected);

        let high_success_rate = QualityJudgment::derive_status(true, false, true, None, false, 4, 0.9, 0.1);
        assert_eq!(high_success_rate, JudgmentStatus::NeedsRevision);
    }
}

// ABOUTME: Fixed curriculum data: topic and subtopic UUIDs from the exam database
// ABOUTME: Not environment-overridable; these identifiers are the database's own keys

//! Topic and subtopic identifiers as assigned by the database this pipeline
//! feeds. Fixed at compile time, matching the source of truth.

use std::collections::HashMap;
use std::sync::OnceLock;

/// A single subtopic's identity within its topic.
#[derive(Debug, Clone, Copy)]
pub struct Subtopic {
    pub id: &'static str,
    pub name: &'static str,
    pub display_name: &'static str,
}

/// Exam topic UUIDs, keyed by topic slug.
pub fn topic_uuids() -> &'static HashMap<&'static str, &'static str> {
    static MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    MAP.get_or_init(|| {
        HashMap::from([
            ("reading", "8e64a8a1-126a-41d4-a8a1-40116970e9bc"),
            ("mathematics", "64cc2488-91f0-43e3-a560-b2bccf91442c"),
            ("thinking_skills", "096feb43-20f5-4ab7-8e3f-feb907884f9e"),
            ("writing", "f2a2bd14-b5bc-424c-990a-1f60d55cb506"),
        ])
    })
}

pub static THINKING_SKILLS_SUBTOPICS: &[(&str, Subtopic)] = &[
    (
        "analogies",
        Subtopic {
            id: "fb7782d6-b227-48eb-a010-a6ea21c3e8df",
            name: "Analogies",
            display_name: "Conditional Logic",
        },
    ),
    (
        "critical_thinking",
        Subtopic {
            id: "b131ca12-b369-4823-a459-a389064dc7bf",
            name: "Critical Thinking",
            display_name: "Critical Thinking",
        },
    ),
    (
        "deduction",
        Subtopic {
            id: "81762f7f-019e-4834-a764-fc4a830a46db",
            name: "Deduction",
            display_name: "Deduction",
        },
    ),
    (
        "inference",
        Subtopic {
            id: "1b4015b7-8647-4229-afd2-0717ed2786ee",
            name: "Inference",
            display_name: "Inference",
        },
    ),
    (
        "logical_reasoning",
        Subtopic {
            id: "01915e09-31a5-4757-b666-0a3a8811b663",
            name: "Logical Reasoning",
            display_name: "Logical Reasoning",
        },
    ),
    (
        "pattern_recognition",
        Subtopic {
            id: "98d8d204-fd1e-431e-b689-f8198235a6bc",
            name: "Pattern Recognition",
            display_name: "Pattern Recognition",
        },
    ),
    (
        "numerical_reasoning",
        Subtopic {
            id: "40825bd0-994a-4e6e-8417-03aa359b45c6",
            name: "Numerical Reasoning",
            display_name: "Numerical Reasoning",
        },
    ),
    (
        "spatial_reasoning",
        Subtopic {
            id: "2c6553b7-29cd-4f4e-8291-4ee25921f8e0",
            name: "Spatial Reasoning",
            display_name: "Spatial Reasoning",
        },
    ),
];

pub static MATH_SUBTOPICS: &[(&str, Subtopic)] = &[
    (
        "geometry",
        Subtopic {
            id: "a1b2c3d4-1111-4000-8000-000000000001",
            name: "Geometry",
            display_name: "Geometry",
        },
    ),
    (
        "number_operations",
        Subtopic {
            id: "a1b2c3d4-2222-4000-8000-000000000002",
            name: "Number Operations",
            display_name: "Number Operations",
        },
    ),
    (
        "measurement",
        Subtopic {
            id: "a1b2c3d4-3333-4000-8000-000000000003",
            name: "Measurement",
            display_name: "Measurement",
        },
    ),
    (
        "algebra_patterns",
        Subtopic {
            id: "a1b2c3d4-4444-4000-8000-000000000004",
            name: "Algebra & Patterns",
            display_name: "Algebra & Patterns",
        },
    ),
    (
        "fractions_decimals",
        Subtopic {
            id: "a1b2c3d4-5555-4000-8000-000000000005",
            name: "Fractions & Decimals",
            display_name: "Fractions & Decimals",
        },
    ),
    (
        "probability",
        Subtopic {
            id: "a1b2c3d4-6666-4000-8000-000000000006",
            name: "Probability",
            display_name: "Probability",
        },
    ),
    (
        "data_statistics",
        Subtopic {
            id: "a1b2c3d4-7777-4000-8000-000000000007",
            name: "Data & Statistics",
            display_name: "Data & Statistics",
        },
    ),
    (
        "number_theory",
        Subtopic {
            id: "a1b2c3d4-8888-4000-8000-000000000008",
            name: "Number Theory",
            display_name: "Number Theory",
        },
    ),
];

/// Look up a subtopic by slug across both curricula.
pub fn find_subtopic(slug: &str) -> Option<Subtopic> {
    THINKING_SKILLS_SUBTOPICS
        .iter()
        .chain(MATH_SUBTOPICS.iter())
        .find(|(key, _)| *key == slug)
        .map(|(_, s)| *s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_uuids_contains_all_four_exam_topics() {
        let map = topic_uuids();
        assert_eq!(map.len(), 4);
        assert_eq!(map["mathematics"], "64cc2488-91f0-43e3-a560-b2bccf91442c");
    }

    #[test]
    fn find_subtopic_resolves_across_both_curricula() {
        assert!(find_subtopic("analogies").is_some());
        assert!(find_subtopic("geometry").is_some());
        assert!(find_subtopic("nonexistent").is_none());
    }
}

//! Fixed suggestion tables evaluated by the rule engine.
//!
//! Order in every table is significant: the engine walks them top to
//! bottom and truncation keeps the earliest strings.

use crate::models::Severity;

/// Running total below which the top-up tier is appended.
pub const TOP_UP_THRESHOLD: usize = 6;

/// Hard cap on returned suggestions.
pub const MAX_SUGGESTIONS: usize = 8;

/// A case-insensitive substring trigger paired with two suggestions.
#[derive(Debug)]
pub struct KeywordGroup {
    pub name: &'static str,
    /// Lowercase keywords; any one matching is enough.
    pub keywords: &'static [&'static str],
    pub suggestions: [&'static str; 2],
}

impl KeywordGroup {
    /// True if any (already lowercased) label contains any keyword.
    pub fn matches(&self, lowered_labels: &[String]) -> bool {
        lowered_labels
            .iter()
            .any(|label| self.keywords.iter().any(|kw| label.contains(kw)))
    }
}

pub fn severity_pair(severity: Severity) -> [&'static str; 2] {
    match severity {
        Severity::Severe => [
            "Consider seeking immediate medical attention if symptoms worsen or persist",
            "Contact your healthcare provider for a professional evaluation",
        ],
        Severity::Moderate => [
            "Monitor your symptoms and consult a healthcare provider if they worsen",
            "Keep track of symptom duration and any changes in intensity",
        ],
        Severity::Mild => [
            "Get adequate rest and monitor your symptoms",
            "Consider over-the-counter remedies if appropriate",
        ],
    }
}

pub const KEYWORD_GROUPS: &[KeywordGroup] = &[
    KeywordGroup {
        name: "fever",
        keywords: &["fever"],
        suggestions: [
            "Stay hydrated and monitor your temperature regularly",
            "Rest in a cool environment and consider fever-reducing medication",
        ],
    },
    KeywordGroup {
        name: "headache",
        keywords: &["headache"],
        suggestions: [
            "Ensure you're drinking enough water throughout the day",
            "Take breaks from screens and rest in a quiet, dark room",
        ],
    },
    KeywordGroup {
        name: "respiratory",
        keywords: &["cough", "throat"],
        suggestions: [
            "Stay hydrated with warm liquids like tea or soup",
            "Consider using a humidifier to ease respiratory discomfort",
        ],
    },
    KeywordGroup {
        name: "fatigue",
        keywords: &["fatigue", "tired"],
        suggestions: [
            "Prioritize sleep and maintain a regular sleep schedule",
            "Avoid strenuous activities and give your body time to recover",
        ],
    },
    KeywordGroup {
        name: "digestive",
        keywords: &["nausea", "stomach"],
        suggestions: [
            "Eat small, bland meals and avoid fatty or spicy foods",
            "Stay hydrated with small sips of water or clear fluids",
        ],
    },
    KeywordGroup {
        name: "dizziness",
        keywords: &["dizz"],
        suggestions: [
            "Avoid sudden movements and get up slowly from sitting or lying down",
            "Ensure you're eating regularly and staying hydrated",
        ],
    },
];

pub const WELLNESS: [&str; 2] = [
    "Maintain a healthy diet rich in fruits and vegetables",
    "Practice good hygiene, including regular handwashing",
];

pub const TOP_UP: [&str; 3] = [
    "Get adequate sleep (7-9 hours per night)",
    "Avoid smoking and limit alcohol consumption",
    "Consider gentle exercise once you feel better, if appropriate",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn lowered(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|l| l.to_lowercase()).collect()
    }

    #[test]
    fn group_matches_on_any_keyword() {
        let resp = &KEYWORD_GROUPS[2];
        assert!(resp.matches(&lowered(&["Sore Throat"])));
        assert!(resp.matches(&lowered(&["dry cough"])));
        assert!(!resp.matches(&lowered(&["rash"])));
    }

    #[test]
    fn dizziness_matches_stem() {
        let dizz = KEYWORD_GROUPS.iter().find(|g| g.name == "dizziness").unwrap();
        assert!(dizz.matches(&lowered(&["Dizzy spells"])));
    }

    #[test]
    fn severity_pairs_are_disjoint() {
        let all: Vec<&str> = [Severity::Mild, Severity::Moderate, Severity::Severe]
            .into_iter()
            .flat_map(severity_pair)
            .collect();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn catalog_order_is_fixed() {
        let names: Vec<&str> = KEYWORD_GROUPS.iter().map(|g| g.name).collect();
        assert_eq!(
            names,
            ["fever", "headache", "respiratory", "fatigue", "digestive", "dizziness"]
        );
    }
}

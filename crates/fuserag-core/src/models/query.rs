use serde::{Deserialize, Serialize};

/// Closed set of query intents produced by the router.
///
/// The wire labels are the exact strings the classification collaborator is
/// instructed to emit; anything outside the set maps to the conservative
/// fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Intent {
    /// Small talk or meta questions; answered without retrieval
    Chat,

    /// Targeted fact lookup against the corpus
    Precision,

    /// Broad analysis across several documents
    Analysis,

    /// Step-by-step procedural guidance
    Walkthrough,
}

impl Intent {
    /// The closed label set, in classification-prompt order
    pub const LABELS: [&'static str; 4] = ["CHAT", "PRECISION", "ANALYSIS", "WALKTHROUGH"];

    /// Parse a classifier label. Returns `None` for anything outside the set.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_uppercase().as_str() {
            "CHAT" => Some(Intent::Chat),
            "PRECISION" => Some(Intent::Precision),
            "ANALYSIS" => Some(Intent::Analysis),
            "WALKTHROUGH" => Some(Intent::Walkthrough),
            _ => None,
        }
    }

    /// The wire label for this intent
    pub fn as_label(&self) -> &'static str {
        match self {
            Intent::Chat => "CHAT",
            Intent::Precision => "PRECISION",
            Intent::Analysis => "ANALYSIS",
            Intent::Walkthrough => "WALKTHROUGH",
        }
    }

    /// Fallback intent used when classification fails or returns an
    /// out-of-set label.
    ///
    /// Deliberately a retrieval-requiring intent: skipping retrieval by
    /// accident is worse than retrieving when it was not needed.
    pub fn fallback() -> Self {
        Intent::Precision
    }

    /// Whether this intent runs retrieval before generation
    pub fn requires_retrieval(&self) -> bool {
        !matches!(self, Intent::Chat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip() {
        for label in Intent::LABELS {
            let intent = Intent::from_label(label).unwrap();
            assert_eq!(intent.as_label(), label);
        }
    }

    #[test]
    fn test_from_label_normalizes() {
        assert_eq!(Intent::from_label(" precision \n"), Some(Intent::Precision));
        assert_eq!(Intent::from_label("Walkthrough"), Some(Intent::Walkthrough));
    }

    #[test]
    fn test_out_of_set_label() {
        assert_eq!(Intent::from_label("SUMMARIZE"), None);
        assert_eq!(Intent::from_label(""), None);
    }

    #[test]
    fn test_fallback_requires_retrieval() {
        assert!(Intent::fallback().requires_retrieval());
        assert!(!Intent::Chat.requires_retrieval());
    }
}

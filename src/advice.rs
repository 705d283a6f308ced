//! Advice selection
//!
//! Maps a stress category to a fixed, ordered list of suggestions.

use tracing::warn;

use crate::types::StressLevel;

const LOW_TIPS: [&str; 4] = [
    "Keep up the good routine!",
    "Maintain a balanced lifestyle.",
    "Stay hydrated and active.",
    "Continue your healthy habits.",
];

const MEDIUM_TIPS: [&str; 4] = [
    "Take short walks or stretch breaks.",
    "Try breathing or meditation exercises.",
    "Reduce screen time when possible.",
    "Consider taking short breaks throughout the day.",
];

const HIGH_TIPS: [&str; 4] = [
    "Consider journaling your feelings.",
    "Talk to a friend, family member, or counselor.",
    "Limit caffeine intake and get enough sleep.",
    "Try relaxation techniques like deep breathing or yoga.",
];

/// Shown first when the assessment could not actually be computed
pub const ANALYSIS_UNAVAILABLE_TIP: &str =
    "Unable to analyze your data right now. Please try again later.";

/// Static tip tables
pub struct AdviceSelector;

impl AdviceSelector {
    pub fn tips_for(level: StressLevel) -> Vec<String> {
        let tips: &[&str] = match level {
            StressLevel::Low => &LOW_TIPS,
            StressLevel::Medium => &MEDIUM_TIPS,
            StressLevel::High => &HIGH_TIPS,
        };
        tips.iter().map(|tip| tip.to_string()).collect()
    }

    /// Tips for a raw category label; unrecognized labels get the medium list
    pub fn tips_for_label(label: &str) -> Vec<String> {
        let level = StressLevel::from_label(label).unwrap_or_else(|| {
            warn!(label, "No tips for stress category; using medium tips");
            StressLevel::Medium
        });
        Self::tips_for(level)
    }

    /// Best-effort advice when the classifier itself failed
    pub fn fallback_tips() -> Vec<String> {
        let mut tips = vec![ANALYSIS_UNAVAILABLE_TIP.to_string()];
        tips.extend(Self::tips_for(StressLevel::CONSERVATIVE_DEFAULT));
        tips
    }
}

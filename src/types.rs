//! Core types for the Synheart Stress pipeline
//!
//! This module defines the data structures that flow through prediction:
//! the raw feature vector received from the caller, the categorical feature
//! identifiers, and the prediction result returned to the caller.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of numeric inputs the classifier consumes
pub const FEATURE_COUNT: usize = 8;

/// Column order of the classifier input vector.
///
/// The trained artifact was fit on exactly this order; a different order
/// silently produces garbage predictions.
pub const FEATURE_ORDER: [&str; FEATURE_COUNT] = [
    "mood",
    "sleep_hours",
    "workload",
    "face_emotion",
    "blink_rate",
    "caffeine_intake",
    "exercise_hours",
    "screen_time",
];

/// Categorical features that carry a label vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Mood,
    FaceEmotion,
    StressLevel,
}

impl Feature {
    pub const ALL: [Feature; 3] = [Feature::Mood, Feature::FaceEmotion, Feature::StressLevel];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Mood => "mood",
            Feature::FaceEmotion => "face_emotion",
            Feature::StressLevel => "stress_level",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stress category produced by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StressLevel {
    Low,
    Medium,
    High,
}

impl StressLevel {
    /// Category used whenever the real one cannot be determined
    pub const CONSERVATIVE_DEFAULT: StressLevel = StressLevel::Medium;

    pub fn as_str(&self) -> &'static str {
        match self {
            StressLevel::Low => "low",
            StressLevel::Medium => "medium",
            StressLevel::High => "high",
        }
    }

    /// Parse a decoded label. Returns `None` for anything outside the three categories.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "low" => Some(StressLevel::Low),
            "medium" => Some(StressLevel::Medium),
            "high" => Some(StressLevel::High),
            _ => None,
        }
    }
}

impl fmt::Display for StressLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw signals for a single prediction request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Self-reported mood label
    pub mood: String,
    /// Hours slept last night
    pub sleep_hours: i64,
    /// Perceived workload (1-10)
    pub workload: i64,
    /// Dominant facial emotion label
    pub face_emotion: String,
    /// Blinks per minute
    pub blink_rate: i64,
    /// Caffeinated drinks per day
    pub caffeine_intake: i64,
    /// Hours of exercise per day
    pub exercise_hours: i64,
    /// Hours of screen time per day
    pub screen_time: i64,
}

/// Record of categorical inputs that were substituted before encoding.
///
/// Present on a result only when at least one field was remapped; both
/// fields are always reported so the caller sees the full picture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputMappings {
    pub original_mood: String,
    pub mapped_mood: String,
    pub original_face_emotion: String,
    pub mapped_face_emotion: String,
}

/// Stress assessment returned to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub stress_level: StressLevel,
    pub tips: Vec<String>,
    pub input_mappings: Option<InputMappings>,
}

/// Health summary of a predictor instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// "healthy" when predictions can be served, otherwise "unhealthy"
    pub status: String,
    pub model_loaded: bool,
    pub encoders_loaded: bool,
    /// Known mood labels in code order
    pub available_moods: Vec<String>,
    /// Known face emotion labels in code order
    pub available_emotions: Vec<String>,
    /// Unique identifier for this predictor instance
    pub instance_id: String,
    /// When the predictor was constructed (RFC 3339, UTC)
    pub started_at_utc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stress_level_labels() {
        for level in [StressLevel::Low, StressLevel::Medium, StressLevel::High] {
            assert_eq!(StressLevel::from_label(level.as_str()), Some(level));
        }
        assert_eq!(StressLevel::from_label("extreme"), None);
        assert_eq!(StressLevel::from_label("Low"), None);
    }

    #[test]
    fn test_feature_order_matches_vector_fields() {
        assert_eq!(
            FEATURE_ORDER,
            [
                "mood",
                "sleep_hours",
                "workload",
                "face_emotion",
                "blink_rate",
                "caffeine_intake",
                "exercise_hours",
                "screen_time",
            ]
        );
        assert_eq!(FEATURE_ORDER[0], Feature::Mood.as_str());
        assert_eq!(FEATURE_ORDER[3], Feature::FaceEmotion.as_str());

        let request = FeatureVector {
            mood: "sad".to_string(),
            sleep_hours: 1,
            workload: 2,
            face_emotion: "sad".to_string(),
            blink_rate: 3,
            caffeine_intake: 4,
            exercise_hours: 5,
            screen_time: 6,
        };
        let value = serde_json::to_value(&request).unwrap();
        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        let mut expected = FEATURE_ORDER.to_vec();
        expected.sort_unstable();
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_feature_vector_rejects_wrong_types() {
        let missing = r#"{"mood": "sad", "sleep_hours": 1}"#;
        assert!(serde_json::from_str::<FeatureVector>(missing).is_err());

        let wrong_type = r#"{
            "mood": "sad", "sleep_hours": "one", "workload": 3, "face_emotion": "sad",
            "blink_rate": 18, "caffeine_intake": 10, "exercise_hours": 2, "screen_time": 3
        }"#;
        assert!(serde_json::from_str::<FeatureVector>(wrong_type).is_err());
    }

    #[test]
    fn test_result_serializes_null_mappings() {
        let result = PredictionResult {
            stress_level: StressLevel::High,
            tips: vec!["Rest.".to_string()],
            input_mappings: None,
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["stress_level"], "high");
        assert!(value["input_mappings"].is_null());
        assert!(value.as_object().unwrap().contains_key("input_mappings"));
    }
}

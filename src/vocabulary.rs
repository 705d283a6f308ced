//! Label encoder registry
//!
//! Holds the closed label vocabularies the classifier was trained on and
//! converts between human-readable labels and the integer codes the
//! classifier consumes. Lookups are pure; unknown labels and codes are
//! reported, never guessed.

use std::collections::{BTreeSet, HashMap};

use crate::error::StressError;
use crate::types::Feature;

/// Ordered bijection between labels and codes for one feature.
///
/// The code of a label is its position in training order, so every code in
/// `0..len()` maps to exactly one label and back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelVocabulary {
    labels: Vec<String>,
    codes: HashMap<String, u32>,
    /// Index into `labels` of the designated fallback label
    default_index: Option<usize>,
}

impl LabelVocabulary {
    /// Build a vocabulary from labels in code order.
    ///
    /// The fallback label is the lexicographically smallest label, so the
    /// choice never depends on hash or set iteration order.
    pub fn new(labels: Vec<String>) -> Result<Self, StressError> {
        let mut codes = HashMap::with_capacity(labels.len());
        for (code, label) in labels.iter().enumerate() {
            if codes.insert(label.clone(), code as u32).is_some() {
                return Err(StressError::InvalidArtifact(format!(
                    "duplicate label '{label}' in vocabulary"
                )));
            }
        }

        let default_index = labels
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.cmp(b))
            .map(|(index, _)| index);

        Ok(Self {
            labels,
            codes,
            default_index,
        })
    }

    /// Override the fallback label. The label must already be known.
    pub fn with_default_label(mut self, label: &str) -> Result<Self, StressError> {
        match self.codes.get(label) {
            Some(&code) => {
                self.default_index = Some(code as usize);
                Ok(self)
            }
            None => Err(StressError::InvalidArtifact(format!(
                "default label '{label}' is not part of the vocabulary"
            ))),
        }
    }

    pub fn encode(&self, label: &str) -> Option<u32> {
        self.codes.get(label).copied()
    }

    pub fn decode(&self, code: u32) -> Option<&str> {
        self.labels.get(code as usize).map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.codes.contains_key(label)
    }

    /// Labels in code order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Designated fallback label, `None` only for an empty vocabulary
    pub fn default_label(&self) -> Option<&str> {
        self.default_index.map(|index| self.labels[index].as_str())
    }

    pub fn default_code(&self) -> Option<u32> {
        self.default_index.map(|index| index as u32)
    }
}

/// Read-only set of vocabularies for every categorical feature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncoderRegistry {
    mood: LabelVocabulary,
    face_emotion: LabelVocabulary,
    stress_level: LabelVocabulary,
}

impl EncoderRegistry {
    pub fn new(
        mood: LabelVocabulary,
        face_emotion: LabelVocabulary,
        stress_level: LabelVocabulary,
    ) -> Self {
        Self {
            mood,
            face_emotion,
            stress_level,
        }
    }

    pub fn vocabulary(&self, feature: Feature) -> &LabelVocabulary {
        match feature {
            Feature::Mood => &self.mood,
            Feature::FaceEmotion => &self.face_emotion,
            Feature::StressLevel => &self.stress_level,
        }
    }

    /// Encode a label. Unknown labels must be resolved by the mapper first.
    pub fn encode(&self, feature: Feature, label: &str) -> Result<u32, StressError> {
        self.vocabulary(feature)
            .encode(label)
            .ok_or_else(|| StressError::UnknownLabel {
                feature,
                label: label.to_string(),
            })
    }

    pub fn decode(&self, feature: Feature, code: u32) -> Result<&str, StressError> {
        self.vocabulary(feature)
            .decode(code)
            .ok_or(StressError::UnknownCode { feature, code })
    }

    pub fn known_labels(&self, feature: Feature) -> BTreeSet<&str> {
        self.vocabulary(feature)
            .labels()
            .iter()
            .map(String::as_str)
            .collect()
    }

    pub fn default_label(&self, feature: Feature) -> Option<&str> {
        self.vocabulary(feature).default_label()
    }

    pub fn default_code(&self, feature: Feature) -> Option<u32> {
        self.vocabulary(feature).default_code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn make_registry() -> EncoderRegistry {
        let emotions = labels(&["angry", "happy", "neutral", "sad", "surprise"]);
        EncoderRegistry::new(
            LabelVocabulary::new(emotions.clone()).unwrap(),
            LabelVocabulary::new(emotions).unwrap(),
            LabelVocabulary::new(labels(&["high", "low", "medium"])).unwrap(),
        )
    }

    #[test]
    fn test_encode_decode_bijection() {
        let registry = make_registry();
        for feature in Feature::ALL {
            let vocab = registry.vocabulary(feature);
            for code in 0..vocab.len() as u32 {
                let label = registry.decode(feature, code).unwrap();
                assert_eq!(registry.encode(feature, label).unwrap(), code);
            }
        }
    }

    #[test]
    fn test_unknown_label_is_reported() {
        let registry = make_registry();
        let err = registry.encode(Feature::Mood, "fear").unwrap_err();
        match err {
            StressError::UnknownLabel { feature, label } => {
                assert_eq!(feature, Feature::Mood);
                assert_eq!(label, "fear");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_code_is_reported() {
        let registry = make_registry();
        assert!(matches!(
            registry.decode(Feature::StressLevel, 3),
            Err(StressError::UnknownCode { code: 3, .. })
        ));
    }

    #[test]
    fn test_duplicate_labels_rejected() {
        assert!(LabelVocabulary::new(labels(&["sad", "happy", "sad"])).is_err());
    }

    #[test]
    fn test_default_is_lexicographically_first() {
        let vocab = LabelVocabulary::new(labels(&["sad", "neutral", "angry", "happy"])).unwrap();
        assert_eq!(vocab.default_label(), Some("angry"));
        assert_eq!(vocab.default_code(), Some(2));
    }

    #[test]
    fn test_default_override() {
        let vocab = LabelVocabulary::new(labels(&["sad", "neutral", "angry"]))
            .unwrap()
            .with_default_label("neutral")
            .unwrap();
        assert_eq!(vocab.default_label(), Some("neutral"));
        assert_eq!(vocab.default_code(), Some(1));

        let bad = LabelVocabulary::new(labels(&["sad"]))
            .unwrap()
            .with_default_label("fear");
        assert!(bad.is_err());
    }

    #[test]
    fn test_empty_vocabulary_has_no_default() {
        let vocab = LabelVocabulary::new(Vec::new()).unwrap();
        assert!(vocab.is_empty());
        assert_eq!(vocab.default_label(), None);
        assert_eq!(vocab.default_code(), None);
    }

    #[test]
    fn test_known_labels() {
        let registry = make_registry();
        let known = registry.known_labels(Feature::StressLevel);
        assert_eq!(known.into_iter().collect::<Vec<_>>(), vec!["high", "low", "medium"]);
    }
}

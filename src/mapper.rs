//! Unknown-label mapping
//!
//! The classifier only understands the labels it was trained on. This module
//! resolves any incoming categorical label to a known one:
//! 1. known labels pass through untouched
//! 2. labels with a synonym whose target is known are replaced by it
//! 3. anything else falls back to the vocabulary's designated default
//! 4. an empty vocabulary leaves the label as-is and marks it unresolved

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{error, info, warn};

use crate::error::StressError;
use crate::types::Feature;
use crate::vocabulary::EncoderRegistry;

/// Hand-curated replacements for labels the classifier never saw
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymTable {
    #[serde(default)]
    pub mood: BTreeMap<String, String>,
    #[serde(default)]
    pub face_emotion: BTreeMap<String, String>,
}

impl SynonymTable {
    /// Table shipped with the service: fear reads as sad, disgust as angry
    pub fn builtin() -> Self {
        let pairs = [("fear", "sad"), ("disgust", "angry")];
        let table: BTreeMap<String, String> = pairs
            .iter()
            .map(|(from, to)| (from.to_string(), to.to_string()))
            .collect();

        Self {
            mood: table.clone(),
            face_emotion: table,
        }
    }

    /// Parse a table from JSON
    pub fn from_json(json: &str) -> Result<Self, StressError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Entries whose target is not a known label; these never apply
    pub fn dangling_targets<'a>(
        &'a self,
        registry: &EncoderRegistry,
    ) -> Vec<(Feature, &'a str, &'a str)> {
        [(Feature::Mood, &self.mood), (Feature::FaceEmotion, &self.face_emotion)]
            .into_iter()
            .flat_map(|(feature, table)| {
                table
                    .iter()
                    .filter(move |(_, to)| !registry.vocabulary(feature).contains(to))
                    .map(move |(from, to)| (feature, from.as_str(), to.as_str()))
            })
            .collect()
    }

    pub fn lookup(&self, feature: Feature, label: &str) -> Option<&str> {
        let table = match feature {
            Feature::Mood => &self.mood,
            Feature::FaceEmotion => &self.face_emotion,
            Feature::StressLevel => return None,
        };
        table.get(label).map(String::as_str)
    }
}

/// How a label was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    /// Already in the vocabulary
    Known,
    /// Replaced through the synonym table
    Synonym,
    /// Replaced by the vocabulary's designated default
    Default,
    /// Vocabulary is empty; label returned unchanged
    Unresolved,
}

/// Outcome of resolving one categorical label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub label: String,
    pub kind: ResolutionKind,
}

impl Resolution {
    pub fn was_remapped(&self) -> bool {
        matches!(self.kind, ResolutionKind::Synonym | ResolutionKind::Default)
    }

    pub fn is_unresolved(&self) -> bool {
        self.kind == ResolutionKind::Unresolved
    }
}

/// Resolves out-of-vocabulary labels against a registry and synonym table
pub struct UnknownLabelMapper<'a> {
    registry: &'a EncoderRegistry,
    synonyms: &'a SynonymTable,
}

impl<'a> UnknownLabelMapper<'a> {
    pub fn new(registry: &'a EncoderRegistry, synonyms: &'a SynonymTable) -> Self {
        Self { registry, synonyms }
    }

    /// Resolve `raw_label` for `feature` to a label the classifier knows.
    ///
    /// Deterministic: the same input always yields the same resolution.
    pub fn resolve(&self, feature: Feature, raw_label: &str) -> Resolution {
        let vocab = self.registry.vocabulary(feature);

        if vocab.contains(raw_label) {
            return Resolution {
                label: raw_label.to_string(),
                kind: ResolutionKind::Known,
            };
        }

        if let Some(synonym) = self.synonyms.lookup(feature, raw_label) {
            if vocab.contains(synonym) {
                info!(%feature, from = raw_label, to = synonym, "Mapped unknown label via synonym");
                return Resolution {
                    label: synonym.to_string(),
                    kind: ResolutionKind::Synonym,
                };
            }
            warn!(
                %feature,
                from = raw_label,
                to = synonym,
                "Synonym target is not a known label; ignoring synonym"
            );
        }

        match vocab.default_label() {
            Some(default) => {
                warn!(%feature, from = raw_label, to = default, "No mapping found; using default label");
                Resolution {
                    label: default.to_string(),
                    kind: ResolutionKind::Default,
                }
            }
            None => {
                error!(%feature, label = raw_label, "Vocabulary is empty; label left unresolved");
                Resolution {
                    label: raw_label.to_string(),
                    kind: ResolutionKind::Unresolved,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocabulary::LabelVocabulary;

    const EMOTIONS: [&str; 5] = ["angry", "happy", "neutral", "sad", "surprise"];

    fn vocab(values: &[&str]) -> LabelVocabulary {
        LabelVocabulary::new(values.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    fn make_registry() -> EncoderRegistry {
        EncoderRegistry::new(
            vocab(&EMOTIONS),
            vocab(&EMOTIONS),
            vocab(&["high", "low", "medium"]),
        )
    }

    #[test]
    fn test_known_labels_pass_through() {
        let registry = make_registry();
        let synonyms = SynonymTable::builtin();
        let mapper = UnknownLabelMapper::new(&registry, &synonyms);

        for mood in EMOTIONS {
            for emotion in EMOTIONS {
                let m = mapper.resolve(Feature::Mood, mood);
                let e = mapper.resolve(Feature::FaceEmotion, emotion);
                assert_eq!(m.label, mood);
                assert_eq!(e.label, emotion);
                assert!(!m.was_remapped());
                assert!(!e.was_remapped());
            }
        }
    }

    #[test]
    fn test_synonyms_resolve_to_known_target() {
        let registry = make_registry();
        let synonyms = SynonymTable::builtin();
        let mapper = UnknownLabelMapper::new(&registry, &synonyms);

        for feature in [Feature::Mood, Feature::FaceEmotion] {
            let fear = mapper.resolve(feature, "fear");
            assert_eq!(fear.label, "sad");
            assert_eq!(fear.kind, ResolutionKind::Synonym);
            assert!(fear.was_remapped());

            let disgust = mapper.resolve(feature, "disgust");
            assert_eq!(disgust.label, "angry");
            assert!(disgust.was_remapped());
        }
    }

    #[test]
    fn test_unknown_label_uses_fixed_default() {
        let registry = make_registry();
        let synonyms = SynonymTable::builtin();
        let mapper = UnknownLabelMapper::new(&registry, &synonyms);

        let first = mapper.resolve(Feature::Mood, "bored");
        assert_eq!(first.label, "angry");
        assert_eq!(first.kind, ResolutionKind::Default);

        for _ in 0..50 {
            assert_eq!(mapper.resolve(Feature::Mood, "bored"), first);
        }
        assert_eq!(mapper.resolve(Feature::FaceEmotion, "").label, "angry");
    }

    #[test]
    fn test_synonym_with_unknown_target_falls_back_to_default() {
        let registry = make_registry();
        let mut synonyms = SynonymTable::default();
        synonyms
            .mood
            .insert("tired".to_string(), "sleepy".to_string());
        let mapper = UnknownLabelMapper::new(&registry, &synonyms);

        let resolved = mapper.resolve(Feature::Mood, "tired");
        assert_eq!(resolved.label, "angry");
        assert_eq!(resolved.kind, ResolutionKind::Default);
    }

    #[test]
    fn test_empty_vocabulary_is_unresolved() {
        let registry = EncoderRegistry::new(
            vocab(&[]),
            vocab(&EMOTIONS),
            vocab(&["high", "low", "medium"]),
        );
        let synonyms = SynonymTable::builtin();
        let mapper = UnknownLabelMapper::new(&registry, &synonyms);

        let resolved = mapper.resolve(Feature::Mood, "fear");
        assert_eq!(resolved.label, "fear");
        assert!(resolved.is_unresolved());
        assert!(!resolved.was_remapped());
    }

    #[test]
    fn test_dangling_targets() {
        let registry = make_registry();
        assert!(SynonymTable::builtin().dangling_targets(&registry).is_empty());

        let table =
            SynonymTable::from_json(r#"{"face_emotion": {"tired": "sleepy", "fear": "sad"}}"#)
                .unwrap();
        assert_eq!(
            table.dangling_targets(&registry),
            vec![(Feature::FaceEmotion, "tired", "sleepy")]
        );
    }

    #[test]
    fn test_synonym_table_from_json() {
        let table = SynonymTable::from_json(r#"{"mood": {"anxious": "sad"}}"#).unwrap();
        assert_eq!(table.lookup(Feature::Mood, "anxious"), Some("sad"));
        assert_eq!(table.lookup(Feature::FaceEmotion, "anxious"), None);
        assert_eq!(table.lookup(Feature::StressLevel, "anxious"), None);
        assert!(SynonymTable::from_json("[1, 2]").is_err());
    }
}

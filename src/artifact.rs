//! Model artifact loading
//!
//! A model artifact is a single JSON document produced at training time. It
//! carries the label vocabularies, an optional synonym table and the trained
//! classifier. Everything is validated before use; a bad artifact never
//! reaches the prediction path.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::classifier::ForestClassifier;
use crate::error::StressError;
use crate::mapper::SynonymTable;
use crate::types::{Feature, StressLevel, FEATURE_ORDER};
use crate::vocabulary::{EncoderRegistry, LabelVocabulary};

/// Artifact layout version understood by this crate
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// Persisted form of one label vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularySpec {
    /// Labels in code order
    pub labels: Vec<String>,
    /// Fallback label; the lexicographically first label when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_label: Option<String>,
}

impl VocabularySpec {
    pub fn new<S: AsRef<str>>(labels: &[S]) -> Self {
        Self {
            labels: labels.iter().map(|s| s.as_ref().to_string()).collect(),
            default_label: None,
        }
    }

    fn build(&self, feature: Feature) -> Result<LabelVocabulary, StressError> {
        if self.labels.is_empty() {
            return Err(StressError::InvalidArtifact(format!(
                "vocabulary for {feature} is empty"
            )));
        }
        let vocab = LabelVocabulary::new(self.labels.clone()).map_err(|e| {
            StressError::InvalidArtifact(format!("vocabulary for {feature}: {e}"))
        })?;
        match &self.default_label {
            Some(label) => vocab.with_default_label(label),
            None => Ok(vocab),
        }
    }
}

/// Vocabularies for every categorical feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabularies {
    pub mood: VocabularySpec,
    pub face_emotion: VocabularySpec,
    pub stress_level: VocabularySpec,
}

/// On-disk model artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    /// Column order the classifier was trained on
    pub feature_order: Vec<String>,
    pub vocabularies: Vocabularies,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub synonyms: Option<SynonymTable>,
    pub classifier: ForestClassifier,
}

/// Validated, ready-to-serve model state
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub registry: EncoderRegistry,
    pub synonyms: SynonymTable,
    pub classifier: ForestClassifier,
}

impl ModelArtifact {
    /// Parse an artifact from JSON without validating it
    pub fn from_json(json: &str) -> Result<Self, StressError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse an artifact file without validating it
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, StressError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, StressError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the artifact against the pipeline's fixed contracts and build
    /// the runtime model
    pub fn into_model(self) -> Result<LoadedModel, StressError> {
        if self.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(StressError::InvalidArtifact(format!(
                "unsupported format version {} (expected {})",
                self.format_version, ARTIFACT_FORMAT_VERSION
            )));
        }

        if self.feature_order.iter().map(String::as_str).ne(FEATURE_ORDER) {
            return Err(StressError::InvalidArtifact(format!(
                "feature order {:?} does not match {:?}",
                self.feature_order, FEATURE_ORDER
            )));
        }

        let registry = EncoderRegistry::new(
            self.vocabularies.mood.build(Feature::Mood)?,
            self.vocabularies.face_emotion.build(Feature::FaceEmotion)?,
            self.vocabularies.stress_level.build(Feature::StressLevel)?,
        );

        let stress_vocab = registry.vocabulary(Feature::StressLevel);
        for label in stress_vocab.labels() {
            if StressLevel::from_label(label).is_none() {
                warn!(label = %label, "Stress vocabulary contains an unrecognized category");
            }
        }

        self.classifier.validate(stress_vocab.len())?;

        Ok(LoadedModel {
            registry,
            synonyms: self.synonyms.unwrap_or_else(SynonymTable::builtin),
            classifier: self.classifier,
        })
    }
}

impl LoadedModel {
    /// Parse and validate an artifact held in memory
    pub fn from_json(json: &str) -> Result<Self, StressError> {
        ModelArtifact::from_json(json)
            .and_then(ModelArtifact::into_model)
            .map_err(|e| StressError::ModelLoad(e.to_string()))
    }

    /// Read, parse and validate an artifact file.
    ///
    /// Every failure is reported as [`StressError::ModelLoad`].
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StressError> {
        let path = path.as_ref();
        let model = ModelArtifact::from_path(path)
            .and_then(ModelArtifact::into_model)
            .map_err(|e| StressError::ModelLoad(format!("{}: {e}", path.display())))?;

        info!(
            path = %path.display(),
            moods = model.registry.vocabulary(Feature::Mood).len(),
            face_emotions = model.registry.vocabulary(Feature::FaceEmotion).len(),
            stress_levels = model.registry.vocabulary(Feature::StressLevel).len(),
            trees = model.classifier.trees.len(),
            "Model and encoders loaded"
        );

        Ok(model)
    }

    /// Replace the synonym table carried by the artifact
    pub fn with_synonyms(mut self, synonyms: SynonymTable) -> Self {
        self.synonyms = synonyms;
        self
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::classifier::{LeafNode, SplitNode, TreeNode};
    use std::io::Write;

    pub(crate) const EMOTIONS: [&str; 5] = ["angry", "happy", "neutral", "sad", "surprise"];

    fn leaf(class_label: u32) -> Box<TreeNode> {
        Box::new(TreeNode::Leaf(LeafNode {
            class_label,
            n_samples: 0,
        }))
    }

    /// Small artifact: stress codes high=0, low=1, medium=2.
    /// Low workload is low stress, heavy workload with little sleep is high.
    pub(crate) fn sample_artifact() -> ModelArtifact {
        let sleep_split = |short: u32, long: u32| {
            Box::new(TreeNode::Split(SplitNode {
                feature_idx: 1,
                threshold: 5.5,
                left: leaf(short),
                right: leaf(long),
            }))
        };
        let tree = TreeNode::Split(SplitNode {
            feature_idx: 2,
            threshold: 4.5,
            left: sleep_split(2, 1),
            right: sleep_split(0, 2),
        });

        ModelArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            feature_order: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
            vocabularies: Vocabularies {
                mood: VocabularySpec::new(&EMOTIONS),
                face_emotion: VocabularySpec::new(&EMOTIONS),
                stress_level: VocabularySpec::new(&["high", "low", "medium"]),
            },
            synonyms: None,
            classifier: ForestClassifier::new(vec![tree]),
        }
    }

    #[test]
    fn test_valid_artifact_builds_model() {
        let model = sample_artifact().into_model().unwrap();
        assert_eq!(model.registry.encode(Feature::Mood, "sad").unwrap(), 3);
        assert_eq!(model.registry.decode(Feature::StressLevel, 0).unwrap(), "high");
        assert_eq!(model.synonyms, SynonymTable::builtin());
    }

    #[test]
    fn test_json_round_trip_loads() {
        let json = sample_artifact().to_json().unwrap();
        let model = LoadedModel::from_json(&json).unwrap();
        assert_eq!(model.classifier.trees.len(), 1);
    }

    #[test]
    fn test_wrong_feature_order_rejected() {
        let mut artifact = sample_artifact();
        artifact.feature_order.swap(0, 3);
        assert!(matches!(
            artifact.into_model(),
            Err(StressError::InvalidArtifact(_))
        ));
    }

    #[test]
    fn test_unsupported_version_rejected() {
        let mut artifact = sample_artifact();
        artifact.format_version = 7;
        assert!(artifact.into_model().is_err());
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        let mut artifact = sample_artifact();
        artifact.vocabularies.face_emotion.labels.clear();
        assert!(artifact.into_model().is_err());
    }

    #[test]
    fn test_unknown_default_label_rejected() {
        let mut artifact = sample_artifact();
        artifact.vocabularies.mood.default_label = Some("calm".to_string());
        assert!(artifact.into_model().is_err());

        let mut artifact = sample_artifact();
        artifact.vocabularies.mood.default_label = Some("neutral".to_string());
        let model = artifact.into_model().unwrap();
        assert_eq!(model.registry.default_label(Feature::Mood), Some("neutral"));
    }

    #[test]
    fn test_leaf_outside_stress_vocabulary_rejected() {
        let mut artifact = sample_artifact();
        artifact.vocabularies.stress_level = VocabularySpec::new(&["high", "low"]);
        assert!(artifact.into_model().is_err());
    }

    #[test]
    fn test_artifact_synonyms_are_used() {
        let mut artifact = sample_artifact();
        let table = SynonymTable::from_json(r#"{"mood": {"anxious": "sad"}}"#).unwrap();
        artifact.synonyms = Some(table.clone());
        assert_eq!(artifact.into_model().unwrap().synonyms, table);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stress_model.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(sample_artifact().to_json().unwrap().as_bytes())
            .unwrap();

        let model = LoadedModel::load(&path).unwrap();
        assert_eq!(model.registry.vocabulary(Feature::Mood).len(), 5);
    }

    #[test]
    fn test_load_failures_are_model_load_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            LoadedModel::load(&missing),
            Err(StressError::ModelLoad(_))
        ));

        let empty = dir.path().join("empty.json");
        fs::write(&empty, "").unwrap();
        assert!(matches!(LoadedModel::load(&empty), Err(StressError::ModelLoad(_))));

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, r#"{"format_version": 1, "classifier": "#).unwrap();
        assert!(matches!(LoadedModel::load(&corrupt), Err(StressError::ModelLoad(_))));
    }

    #[test]
    fn test_from_path_reports_io_and_json_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = ModelArtifact::from_path(dir.path().join("missing.json"));
        assert!(matches!(missing, Err(StressError::IoError(_))));

        let corrupt = dir.path().join("corrupt.json");
        fs::write(&corrupt, "{").unwrap();
        assert!(matches!(
            ModelArtifact::from_path(&corrupt),
            Err(StressError::JsonError(_))
        ));

        let valid = dir.path().join("stress_model.json");
        fs::write(&valid, sample_artifact().to_json().unwrap()).unwrap();
        assert_eq!(ModelArtifact::from_path(&valid).unwrap(), sample_artifact());
    }

    #[test]
    fn test_load_error_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        match LoadedModel::load(&missing) {
            Err(StressError::ModelLoad(message)) => {
                assert!(message.contains("missing.json"));
                assert!(message.contains("I/O error"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_shipped_artifact_is_valid() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/models/stress_model.json");
        let model = LoadedModel::load(path).unwrap();
        assert!(!model.registry.vocabulary(Feature::Mood).contains("fear"));
        assert!(model.registry.vocabulary(Feature::Mood).contains("sad"));
    }
}

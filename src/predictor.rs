//! Prediction orchestration
//!
//! This module provides the public API for Synheart Stress. It sequences a
//! single request through the pipeline:
//! 1. InputSanitizer - clamp numeric fields
//! 2. UnknownLabelMapper - resolve mood and face emotion to known labels
//! 3. EncoderRegistry - encode labels to classifier codes
//! 4. Classifier - predict a stress-level code
//! 5. EncoderRegistry - decode the code back to a category
//! 6. AdviceSelector - attach tips
//!
//! Only a predictor without a model can fail a request. Every other anomaly is
//! logged and replaced by a conservative default so the caller always gets an
//! actionable answer.

use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::advice::AdviceSelector;
use crate::artifact::LoadedModel;
use crate::classifier::{Classifier, ModelInput};
use crate::error::StressError;
use crate::mapper::{Resolution, SynonymTable, UnknownLabelMapper};
use crate::sanitizer::InputSanitizer;
use crate::types::{
    Feature, FeatureVector, InputMappings, PredictionResult, StatusReport, StressLevel,
};
use crate::vocabulary::EncoderRegistry;

/// Read-only state shared by every request
struct ReadyModel {
    registry: EncoderRegistry,
    synonyms: SynonymTable,
    classifier: Box<dyn Classifier>,
}

enum ModelState {
    Ready(ReadyModel),
    Unavailable { reason: String },
}

/// Stateless-per-request stress predictor.
///
/// Construct once at startup and share by reference (or `Arc`) across
/// threads; nothing in [`StressPredictor::predict`] mutates it.
pub struct StressPredictor {
    state: ModelState,
    instance_id: String,
    started_at: DateTime<Utc>,
}

impl StressPredictor {
    /// Create a ready predictor from a validated model
    pub fn new(model: LoadedModel) -> Self {
        Self::with_classifier(model.registry, model.synonyms, Box::new(model.classifier))
    }

    /// Create a ready predictor around any classifier implementation
    pub fn with_classifier(
        registry: EncoderRegistry,
        synonyms: SynonymTable,
        classifier: Box<dyn Classifier>,
    ) -> Self {
        Self::from_state(ModelState::Ready(ReadyModel {
            registry,
            synonyms,
            classifier,
        }))
    }

    /// Create a degraded predictor that rejects every prediction
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::from_state(ModelState::Unavailable {
            reason: reason.into(),
        })
    }

    /// Load a model artifact from disk.
    ///
    /// Never fails: a missing or invalid artifact yields a degraded predictor
    /// that still answers status queries.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        Self::load_with_synonyms(path, None)
    }

    /// Load a model artifact, optionally replacing its synonym table
    pub fn load_with_synonyms<P: AsRef<Path>>(path: P, synonyms: Option<SynonymTable>) -> Self {
        match LoadedModel::load(path) {
            Ok(model) => match synonyms {
                Some(table) => Self::new(model.with_synonyms(table)),
                None => Self::new(model),
            },
            Err(e) => {
                error!(error = %e, "Error loading model or encoders; predictions disabled");
                Self::unavailable(e.to_string())
            }
        }
    }

    fn from_state(state: ModelState) -> Self {
        Self {
            state,
            instance_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
        }
    }

    /// True when the model and encoders loaded and predictions can be served
    pub fn is_ready(&self) -> bool {
        matches!(self.state, ModelState::Ready(_))
    }

    /// Encoder registry of a ready predictor
    pub fn registry(&self) -> Option<&EncoderRegistry> {
        match &self.state {
            ModelState::Ready(model) => Some(&model.registry),
            ModelState::Unavailable { .. } => None,
        }
    }

    /// Synonym table in effect for a ready predictor
    pub fn synonyms(&self) -> Option<&SynonymTable> {
        match &self.state {
            ModelState::Ready(model) => Some(&model.synonyms),
            ModelState::Unavailable { .. } => None,
        }
    }

    /// Health and vocabulary summary
    pub fn status(&self) -> StatusReport {
        let (available_moods, available_emotions, load_error) = match &self.state {
            ModelState::Ready(model) => (
                model.registry.vocabulary(Feature::Mood).labels().to_vec(),
                model.registry.vocabulary(Feature::FaceEmotion).labels().to_vec(),
                None,
            ),
            ModelState::Unavailable { reason } => (Vec::new(), Vec::new(), Some(reason.clone())),
        };

        let ready = self.is_ready();
        let status = if ready { "healthy" } else { "unhealthy" };
        StatusReport {
            status: status.to_string(),
            model_loaded: ready,
            encoders_loaded: ready,
            available_moods,
            available_emotions,
            instance_id: self.instance_id.clone(),
            started_at_utc: self.started_at.to_rfc3339(),
            load_error,
        }
    }

    /// Assess stress for one request.
    ///
    /// Returns [`StressError::ServiceUnavailable`] only when no model is
    /// loaded; any other failure is absorbed into a best-effort result.
    pub fn predict(&self, raw: &FeatureVector) -> Result<PredictionResult, StressError> {
        let model = match &self.state {
            ModelState::Ready(model) => model,
            ModelState::Unavailable { reason } => {
                return Err(StressError::ServiceUnavailable(format!(
                    "model or encoders not loaded: {reason}"
                )));
            }
        };

        let data = InputSanitizer::sanitize(raw);

        let mapper = UnknownLabelMapper::new(&model.registry, &model.synonyms);
        let mood = mapper.resolve(Feature::Mood, &data.mood);
        let face_emotion = mapper.resolve(Feature::FaceEmotion, &data.face_emotion);

        info!(
            mood = %data.mood,
            mapped_mood = %mood.label,
            face_emotion = %data.face_emotion,
            mapped_face_emotion = %face_emotion.label,
            "Processing prediction"
        );

        let input_mappings = if mood.was_remapped() || face_emotion.was_remapped() {
            Some(InputMappings {
                original_mood: data.mood.clone(),
                mapped_mood: mood.label.clone(),
                original_face_emotion: data.face_emotion.clone(),
                mapped_face_emotion: face_emotion.label.clone(),
            })
        } else {
            None
        };

        let input: ModelInput = [
            encode_or_default(&model.registry, Feature::Mood, &mood),
            data.sleep_hours as f64,
            data.workload as f64,
            encode_or_default(&model.registry, Feature::FaceEmotion, &face_emotion),
            data.blink_rate as f64,
            data.caffeine_intake as f64,
            data.exercise_hours as f64,
            data.screen_time as f64,
        ];
        debug!(?input, "Assembled classifier input");

        let code = match model.classifier.predict(&input) {
            Ok(code) => code,
            Err(e) => {
                error!(error = %e, "Prediction error; returning conservative default");
                return Ok(PredictionResult {
                    stress_level: StressLevel::CONSERVATIVE_DEFAULT,
                    tips: AdviceSelector::fallback_tips(),
                    input_mappings,
                });
            }
        };

        let stress_level = decode_or_default(&model.registry, code);
        info!(%stress_level, code, "Prediction successful");

        Ok(PredictionResult {
            stress_level,
            tips: AdviceSelector::tips_for(stress_level),
            input_mappings,
        })
    }

    /// Predict from a JSON request body and return a JSON response body
    pub fn predict_json(&self, json: &str) -> Result<String, StressError> {
        let raw: FeatureVector = serde_json::from_str(json)?;
        let result = self.predict(&raw)?;
        serde_json::to_string(&result).map_err(StressError::JsonError)
    }
}

/// Encode a resolved label, substituting the feature's default code when the
/// label is still unknown
fn encode_or_default(registry: &EncoderRegistry, feature: Feature, resolved: &Resolution) -> f64 {
    match registry.encode(feature, &resolved.label) {
        Ok(code) => code as f64,
        Err(e) => {
            let fallback = registry.default_code(feature).unwrap_or(0);
            error!(error = %e, %feature, fallback, "Error encoding label; using default code");
            fallback as f64
        }
    }
}

/// Decode a classifier code, falling back to the conservative default category
fn decode_or_default(registry: &EncoderRegistry, code: u32) -> StressLevel {
    match registry.decode(Feature::StressLevel, code) {
        Ok(label) => StressLevel::from_label(label).unwrap_or_else(|| {
            warn!(label, "Decoded stress category is not recognized; defaulting to medium");
            StressLevel::CONSERVATIVE_DEFAULT
        }),
        Err(e) => {
            error!(error = %e, "Error decoding stress level; defaulting to medium");
            StressLevel::CONSERVATIVE_DEFAULT
        }
    }
}

//! Synheart Stress - Stress-level inference over behavioral and physiological signals
//!
//! Stress maps a handful of self-reported and sensed signals (mood, sleep,
//! workload, facial emotion, blink rate, caffeine, exercise, screen time)
//! through a pre-trained classifier into a stress category with advice:
//! sanitization → label resolution → encoding → classification → decoding
//! → advice selection.
//!
//! ## Modules
//!
//! - **Predictor**: request orchestration with graceful degradation
//! - **Vocabulary / Mapper**: closed label sets and out-of-vocabulary handling
//! - **Artifact**: loading and validating the persisted model

pub mod advice;
pub mod artifact;
pub mod classifier;
pub mod error;
pub mod mapper;
pub mod predictor;
pub mod sanitizer;
pub mod types;
pub mod vocabulary;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use artifact::{LoadedModel, ModelArtifact};
pub use error::StressError;
pub use mapper::{SynonymTable, UnknownLabelMapper};
pub use predictor::StressPredictor;
pub use types::{FeatureVector, InputMappings, PredictionResult, StressLevel};

/// Library version reported by the CLI and FFI
pub const STRESS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name reported in status output
pub const PRODUCER_NAME: &str = "synheart-stress";

/// Artifact path used when none is configured
pub const DEFAULT_MODEL_PATH: &str = "models/stress_model.json";

//! Numeric input sanitization
//!
//! Signals are self-estimated and noisy, so out-of-range numbers are clamped
//! into physiologically plausible ranges instead of being rejected.

use tracing::debug;

use crate::types::FeatureVector;

/// Closed range `[min, max]` for a numeric field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericRange {
    pub field: &'static str,
    pub min: i64,
    pub max: i64,
}

impl NumericRange {
    const fn new(field: &'static str, min: i64, max: i64) -> Self {
        Self { field, min, max }
    }

    pub fn clamp(&self, value: i64) -> i64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

pub const SLEEP_HOURS: NumericRange = NumericRange::new("sleep_hours", 0, 24);
pub const WORKLOAD: NumericRange = NumericRange::new("workload", 1, 10);
pub const BLINK_RATE: NumericRange = NumericRange::new("blink_rate", 5, 60);
pub const CAFFEINE_INTAKE: NumericRange = NumericRange::new("caffeine_intake", 0, 20);
pub const EXERCISE_HOURS: NumericRange = NumericRange::new("exercise_hours", 0, 12);
pub const SCREEN_TIME: NumericRange = NumericRange::new("screen_time", 0, 24);

/// All clamped fields, in classifier column order
pub const NUMERIC_RANGES: [NumericRange; 6] = [
    SLEEP_HOURS,
    WORKLOAD,
    BLINK_RATE,
    CAFFEINE_INTAKE,
    EXERCISE_HOURS,
    SCREEN_TIME,
];

/// Sanitizer for numeric feature fields
pub struct InputSanitizer;

impl InputSanitizer {
    /// Clamp every numeric field into its range. Total and idempotent.
    pub fn sanitize(raw: &FeatureVector) -> FeatureVector {
        let sanitized = FeatureVector {
            mood: raw.mood.clone(),
            sleep_hours: SLEEP_HOURS.clamp(raw.sleep_hours),
            workload: WORKLOAD.clamp(raw.workload),
            face_emotion: raw.face_emotion.clone(),
            blink_rate: BLINK_RATE.clamp(raw.blink_rate),
            caffeine_intake: CAFFEINE_INTAKE.clamp(raw.caffeine_intake),
            exercise_hours: EXERCISE_HOURS.clamp(raw.exercise_hours),
            screen_time: SCREEN_TIME.clamp(raw.screen_time),
        };

        if &sanitized != raw {
            debug!(?raw, ?sanitized, "Clamped out-of-range numeric input");
        }

        sanitized
    }
}

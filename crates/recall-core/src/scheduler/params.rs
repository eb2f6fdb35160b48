//! Scheduler parameters
//!
//! All weighting constants of the memory model live in one immutable value.
//! Construct it once, validate it once, pass it by reference per call:
//! there is no process-wide singleton and nothing on the hot path re-checks
//! ranges.

use serde::{Deserialize, Serialize};

/// Default target recall probability at the scheduled due date.
pub const DEFAULT_DESIRED_RETENTION: f64 = 0.9;

/// Smallest stability a reviewed card can hold, in days.
///
/// The forgetting branch collapses stability multiplicatively; without a
/// floor a chain of `Again` ratings would drive the interval to zero and
/// the card would re-surface in the same instant forever.
pub const STABILITY_FLOOR: f64 = 0.1;

/// Default initial stability per rating (Again, Hard, Good, Easy), in days.
pub const DEFAULT_INITIAL_STABILITY: [f64; 4] = [0.5, 1.2, 2.5, 6.0];

/// Invalid scheduler configuration.
///
/// Raised once at construction time; a validated [`SchedulerParams`] never
/// produces NaN or negative stability/difficulty for any reachable input.
#[non_exhaustive]
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParamsError {
    /// `desired_retention` outside the open interval (0, 1)
    #[error("desired_retention must be in (0, 1), got {0}")]
    Retention(f64),
    /// `again_decay_factor` outside the open interval (0, 1)
    #[error("again_decay_factor must be in (0, 1), got {0}")]
    DecayFactor(f64),
    /// A constant that must be strictly positive was not
    #[error("{name} must be > 0, got {value}")]
    NonPositive {
        /// Field name
        name: &'static str,
        /// Offending value
        value: f64,
    },
}

/// Weighting constants for the memory model.
///
/// Field-for-field this is the configuration surface of the scheduler; the
/// defaults are a usable starting set, not fitted to any review history.
/// Exponents and weights are deliberately plain fields so they can be tuned
/// without touching the transition code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulerParams {
    /// Initial stability per rating (Again, Hard, Good, Easy), in days
    pub initial_stability: [f64; 4],
    /// Base difficulty assigned on first review before the rating adjustment
    pub base_difficulty: f64,
    /// Weight of `(rating - Good)` in the initial-difficulty computation
    pub difficulty_rating_weight: f64,
    /// Weight of `(rating - Good)` in subsequent difficulty adjustments
    pub difficulty_decay_weight: f64,
    /// Multiplicative stability collapse applied on `Again`
    pub again_decay_factor: f64,
    /// Floor under post-collapse stability, in days
    pub stability_floor: f64,
    /// Exponent of the retention term `exp(k * (1 - desired_retention)) - 1`
    pub growth_scale_exponent: f64,
    /// Inverse-power exponent of difficulty in the growth formula
    pub difficulty_power_exponent: f64,
    /// Inverse-power exponent of stability in the growth formula
    pub stability_power_exponent: f64,
    /// Growth damping applied on `Hard` (< 1)
    pub hard_damping: f64,
    /// Growth boost applied on `Easy` (> 1)
    pub easy_boost: f64,
    /// Target recall probability at the due date, in (0, 1)
    pub desired_retention: f64,
}

impl Default for SchedulerParams {
    fn default() -> Self {
        Self {
            initial_stability: DEFAULT_INITIAL_STABILITY,
            base_difficulty: 5.0,
            difficulty_rating_weight: 1.0,
            difficulty_decay_weight: 0.5,
            again_decay_factor: 0.2,
            stability_floor: STABILITY_FLOOR,
            growth_scale_exponent: 12.0,
            difficulty_power_exponent: 0.5,
            stability_power_exponent: 0.3,
            hard_damping: 0.5,
            easy_boost: 1.5,
            desired_retention: DEFAULT_DESIRED_RETENTION,
        }
    }
}

impl SchedulerParams {
    /// Validate the parameter set, consuming and returning it.
    ///
    /// Checks run once here so [`next_state`](super::Scheduler::next_state)
    /// stays branch-minimal.
    pub fn validated(self) -> Result<Self, ParamsError> {
        if !(self.desired_retention > 0.0 && self.desired_retention < 1.0) {
            return Err(ParamsError::Retention(self.desired_retention));
        }
        if !(self.again_decay_factor > 0.0 && self.again_decay_factor < 1.0) {
            return Err(ParamsError::DecayFactor(self.again_decay_factor));
        }
        for (i, s) in self.initial_stability.iter().enumerate() {
            if !(*s > 0.0) {
                return Err(ParamsError::NonPositive {
                    name: ["initial_stability[Again]", "initial_stability[Hard]",
                           "initial_stability[Good]", "initial_stability[Easy]"][i],
                    value: *s,
                });
            }
        }
        let positive = [
            ("base_difficulty", self.base_difficulty),
            ("stability_floor", self.stability_floor),
            ("growth_scale_exponent", self.growth_scale_exponent),
            ("difficulty_power_exponent", self.difficulty_power_exponent),
            ("stability_power_exponent", self.stability_power_exponent),
            ("hard_damping", self.hard_damping),
            ("easy_boost", self.easy_boost),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ParamsError::NonPositive { name, value });
            }
        }
        Ok(self)
    }
}

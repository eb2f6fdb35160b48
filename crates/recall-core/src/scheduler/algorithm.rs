//! Memory-model transition formulas
//!
//! Pure functions from `(state, rating, params)` to the next stability and
//! difficulty. Clamps and floors are applied *before* exponentiation so no
//! input reachable through [`SchedulerParams`] validation can produce NaN;
//! there is deliberately no runtime NaN check anywhere in this module.

use super::params::SchedulerParams;
use super::state::Rating;

/// Lower difficulty bound
pub const MIN_DIFFICULTY: f64 = 1.0;

/// Upper difficulty bound
pub const MAX_DIFFICULTY: f64 = 10.0;

/// Stability entering the growth power term is raised to this floor first.
///
/// Sub-1 bases under a negative exponent would inflate the growth term
/// without bound; the floor keeps the diminishing-returns term in `(0, 1]`.
pub const STABILITY_POW_FLOOR: f64 = 1.0;

fn clamp_difficulty(d: f64) -> f64 {
    d.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY)
}

/// Stability assigned on a card's very first review.
///
/// Selected straight from the per-rating lookup table: the first interval
/// depends only on how well the card was recalled on first exposure.
pub fn initial_stability(params: &SchedulerParams, rating: Rating) -> f64 {
    params.initial_stability[rating.index()]
}

/// Difficulty assigned on a card's very first review.
///
/// Base difficulty shifted linearly by `(rating - Good)`: worse ratings
/// raise it, better ratings lower it.
pub fn initial_difficulty(params: &SchedulerParams, rating: Rating) -> f64 {
    clamp_difficulty(params.base_difficulty - params.difficulty_rating_weight * rating.offset_from_good())
}

/// Difficulty after a subsequent review.
pub fn next_difficulty(params: &SchedulerParams, difficulty: f64, rating: Rating) -> f64 {
    clamp_difficulty(difficulty - params.difficulty_decay_weight * rating.offset_from_good())
}

/// Stability after a failed review (`Again`).
///
/// Multiplicative collapse toward the floor: the interval resets close to
/// zero no matter how large stability had grown.
fn forget_stability(params: &SchedulerParams, stability: f64) -> f64 {
    (stability * params.again_decay_factor).max(params.stability_floor)
}

/// Stability after a successful review (`Hard`, `Good`, `Easy`).
///
/// `s' = s * (1 + growth)` where growth is the product of a retention term
/// (lower desired retention tolerates more forgetting, so intervals grow
/// faster), an inverse power of the new difficulty, an inverse power of the
/// current stability (diminishing returns; this term prevents runaway
/// interval growth), and the per-rating damping/boost multiplier.
pub fn recall_stability(
    params: &SchedulerParams,
    stability: f64,
    new_difficulty: f64,
    rating: Rating,
) -> f64 {
    debug_assert!(rating != Rating::Again, "forgetting is handled separately");

    let retention_term =
        (params.growth_scale_exponent * (1.0 - params.desired_retention)).exp() - 1.0;
    let difficulty_term =
        clamp_difficulty(new_difficulty).powf(-params.difficulty_power_exponent);
    let stability_term =
        stability.max(STABILITY_POW_FLOOR).powf(-params.stability_power_exponent);

    let multiplier = match rating {
        Rating::Again => 1.0,
        Rating::Hard => params.hard_damping,
        Rating::Good => 1.0,
        Rating::Easy => params.easy_boost,
    };

    let growth = retention_term * difficulty_term * stability_term * multiplier;
    stability * (1.0 + growth)
}

/// Next stability for a previously reviewed card.
pub(super) fn next_stability(
    params: &SchedulerParams,
    stability: f64,
    new_difficulty: f64,
    rating: Rating,
) -> f64 {
    match rating {
        Rating::Again => forget_stability(params, stability),
        _ => recall_stability(params, stability, new_difficulty, rating),
    }
}

/// Probability of recall after `elapsed_days` without review.
///
/// Exponential forgetting curve normalized so that recall at `elapsed ==
/// stability` equals the 90% reference retention: `R(t) = 0.9^(t / s)`.
pub fn retrievability(stability: f64, elapsed_days: f64) -> f64 {
    if elapsed_days <= 0.0 {
        return 1.0;
    }
    let s = stability.max(super::params::STABILITY_FLOOR);
    0.9f64.powf(elapsed_days / s)
}

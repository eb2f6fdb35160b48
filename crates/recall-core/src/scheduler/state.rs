//! Memory state, ratings, and the scheduler entry points

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::algorithm;
use super::params::{ParamsError, SchedulerParams};

/// Learner's self-reported recall quality for one review event.
///
/// A closed enumeration: the wire representation is the integer grade 1-4,
/// and construction from an integer is fallible. Nothing downstream of
/// [`Rating::from_grade`] ever sees an out-of-range rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Rating {
    /// Forgot the card entirely
    Again = 1,
    /// Recalled with significant effort
    Hard = 2,
    /// Recalled normally
    Good = 3,
    /// Recalled effortlessly
    Easy = 4,
}

impl Rating {
    /// Parse a wire grade (1-4). Returns `None` for anything else.
    pub fn from_grade(grade: u8) -> Option<Self> {
        match grade {
            1 => Some(Rating::Again),
            2 => Some(Rating::Hard),
            3 => Some(Rating::Good),
            4 => Some(Rating::Easy),
            _ => None,
        }
    }

    /// Wire grade (1-4).
    pub fn grade(self) -> u8 {
        self as u8
    }

    /// Zero-based index into per-rating lookup tables.
    pub(super) fn index(self) -> usize {
        self as usize - 1
    }

    /// Signed distance from `Good` on the grade scale.
    ///
    /// `Again` is -2, `Hard` -1, `Good` 0, `Easy` +1; the difficulty
    /// adjustments are linear in this offset.
    pub(super) fn offset_from_good(self) -> f64 {
        self.grade() as f64 - Rating::Good.grade() as f64
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Rating::Again => "again",
            Rating::Hard => "hard",
            Rating::Good => "good",
            Rating::Easy => "easy",
        };
        write!(f, "{}", name)
    }
}

/// Per-card memory state.
///
/// `stability == 0.0` marks a card that has never been reviewed; the first
/// review always takes the initial-state branch. After any review stability
/// is strictly positive and difficulty sits in `[1, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryState {
    /// Days until recall probability decays to the desired retention
    pub stability: f64,
    /// Intrinsic hardness in `[1, 10]` (0 until first review)
    pub difficulty: f64,
    /// When the card was last reviewed; `None` for new cards
    pub last_reviewed: Option<DateTime<Utc>>,
}

impl MemoryState {
    /// State of a card that has never been reviewed.
    pub fn new() -> Self {
        Self {
            stability: 0.0,
            difficulty: 0.0,
            last_reviewed: None,
        }
    }

    /// Whether the card has never been reviewed.
    pub fn is_new(&self) -> bool {
        self.stability == 0.0
    }
}

impl Default for MemoryState {
    fn default() -> Self {
        Self::new()
    }
}

/// Fractional days between `last` and `now`, never negative.
///
/// Clock skew (a `last` in the future) clamps to zero rather than producing
/// a negative elapsed time.
pub fn elapsed_days(last: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let seconds = now.signed_duration_since(last).num_milliseconds() as f64 / 1000.0;
    (seconds / 86_400.0).max(0.0)
}

/// The review scheduler: validated parameters plus the two operations that
/// matter, [`next_state`](Self::next_state) and
/// [`next_due_date`](Self::next_due_date).
///
/// A `Scheduler` is a plain immutable value. Every method is a pure function
/// of its arguments, so a single instance can be shared freely across
/// threads; the read-modify-write hazards live entirely in the caller's
/// load/persist cycle (see the storage layer).
#[derive(Debug, Clone)]
pub struct Scheduler {
    params: SchedulerParams,
}

impl Scheduler {
    /// Build a scheduler, validating the parameters once up front.
    pub fn new(params: SchedulerParams) -> Result<Self, ParamsError> {
        Ok(Self {
            params: params.validated()?,
        })
    }

    /// The parameter set in use.
    pub fn params(&self) -> &SchedulerParams {
        &self.params
    }

    /// Compute the next memory state for a review at `now`.
    ///
    /// Branches on whether this is the first review (`stability == 0`):
    /// first reviews read the per-rating initial tables, subsequent reviews
    /// run the difficulty adjustment and the forget/growth stability
    /// transition. `last_reviewed` is set to `now` in both branches; the
    /// numeric part depends only on `(current, rating)`.
    pub fn next_state(&self, current: &MemoryState, rating: Rating, now: DateTime<Utc>) -> MemoryState {
        if current.is_new() {
            return MemoryState {
                stability: algorithm::initial_stability(&self.params, rating),
                difficulty: algorithm::initial_difficulty(&self.params, rating),
                last_reviewed: Some(now),
            };
        }

        let difficulty = algorithm::next_difficulty(&self.params, current.difficulty, rating);
        let stability =
            algorithm::next_stability(&self.params, current.stability, difficulty, rating);

        MemoryState {
            stability,
            difficulty,
            last_reviewed: Some(now),
        }
    }

    /// Absolute due timestamp for a stability value, `stability` days after
    /// `now`.
    ///
    /// Fractional days are kept as-is (no rounding to whole days) so a
    /// burst of reviews does not cluster every card onto the same midnight.
    pub fn next_due_date(&self, stability: f64, now: DateTime<Utc>) -> DateTime<Utc> {
        let millis = (stability * 86_400_000.0).round() as i64;
        now + Duration::milliseconds(millis)
    }

    /// Current recall probability for a state at `now`.
    pub fn retrievability(&self, state: &MemoryState, now: DateTime<Utc>) -> f64 {
        match state.last_reviewed {
            Some(last) => algorithm::retrievability(state.stability, elapsed_days(last, now)),
            None => 1.0,
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self {
            params: SchedulerParams::default(),
        }
    }
}

//! Review scheduler
//!
//! A simplified FSRS (Free Spaced Repetition Scheduler) memory model.
//! Each card carries a memory state of two numbers:
//!
//! - **stability**: days until recall probability decays to the desired
//!   retention, absent further review. 0 means "never reviewed".
//! - **difficulty**: intrinsic hardness in `[1, 10]`; higher difficulty
//!   slows stability growth.
//!
//! A review maps `(state, rating) -> state` through [`Scheduler::next_state`]
//! and the new stability maps to an absolute due timestamp through
//! [`Scheduler::next_due_date`]. The whole module is pure computation: no
//! I/O, no clock reads (callers inject `now`), no shared mutable state.

mod algorithm;
mod params;
mod state;

pub use algorithm::{
    initial_difficulty, initial_stability, next_difficulty, recall_stability, retrievability,
    MAX_DIFFICULTY, MIN_DIFFICULTY, STABILITY_POW_FLOOR,
};

pub use params::{
    ParamsError, SchedulerParams, DEFAULT_DESIRED_RETENTION, DEFAULT_INITIAL_STABILITY,
    STABILITY_FLOOR,
};

pub use state::{elapsed_days, MemoryState, Rating, Scheduler};

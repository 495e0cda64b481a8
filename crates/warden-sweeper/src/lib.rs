//! Warden Sweeper: background expiry sweep
//!
//! Runs on its own periodic schedule, independent of request-handling
//! threads, and retires temporary restrictions whose `expires_at` has
//! passed. Queries never depend on it (the store applies lazy expiry at
//! read time); the sweeper exists for proactive cleanup and for the
//! "restriction expired" notifications external consumers rely on.

pub mod daemon;
pub mod stats;

pub use daemon::{Sweeper, SweeperConfig};
pub use stats::SweepStats;

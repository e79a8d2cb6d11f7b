//! Live coaching session: the recording loop and its shared status.

mod runner;
mod state;

pub use runner::{SessionCommand, SessionError, SessionRunner, MAX_CAPTURE_FAILURES};
pub use state::{new_shared_status, LiveMetrics, SessionPhase, SessionStatus, SharedStatus};

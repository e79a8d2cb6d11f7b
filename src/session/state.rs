//! Session phase machine and shared status.
//!
//! [`SessionPhase`] tracks where the recording loop currently is; a status
//! surface (CLI printout, future UI) reads it via [`SharedStatus`] without
//! touching the loop itself.
//!
//! [`SessionStatus`] is the single source of truth for observers: current
//! phase, the latest measured metrics, the alert on display, and any
//! error message.

use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// SessionPhase
// ---------------------------------------------------------------------------

/// Phases of the recording loop.
///
/// ```text
/// Idle ──start──▶ Capturing ──segment ready──▶ Analyzing
///                     ▲                             │
///                     └────────next cycle───────────┘
/// any phase ──stop──▶ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// No session running.
    #[default]
    Idle,
    /// Microphone is recording the current segment.
    Capturing,
    /// The segment has been handed to the analysis service.
    Analyzing,
}

impl SessionPhase {
    /// True while a session owns the capture device.
    pub fn is_running(&self) -> bool {
        !matches!(self, SessionPhase::Idle)
    }

    /// Short label for status display.
    pub fn label(&self) -> &'static str {
        match self {
            SessionPhase::Idle => "Idle",
            SessionPhase::Capturing => "Capturing",
            SessionPhase::Analyzing => "Analyzing",
        }
    }
}

// ---------------------------------------------------------------------------
// LiveMetrics
// ---------------------------------------------------------------------------

/// The most recent successful analysis, ready for display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveMetrics {
    pub speed_wpm: f64,
    /// Mean dB as reported by the analysis service.
    pub raw_volume_db: f64,
    /// Raw dB minus the calibrated zero point — what thresholds see.
    pub adjusted_volume_db: f64,
    pub filler_count: u32,
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// Shared session status — everything an observer needs.
///
/// The runner mutates it; observers read it. Lock for short critical
/// sections only and never across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct SessionStatus {
    pub phase: SessionPhase,

    /// `None` until the first analysis of the session succeeds.
    pub latest: Option<LiveMetrics>,

    /// Message of the alert currently on display, if any.
    pub active_alert: Option<&'static str>,

    /// Most recent cycle-level failure, cleared by the next success.
    pub error_message: Option<String>,

    /// Completed analysis cycles this session.
    pub cycles_completed: u64,
}

/// Thread-safe handle to [`SessionStatus`]. Cheap to clone.
pub type SharedStatus = Arc<Mutex<SessionStatus>>;

/// Construct a fresh idle [`SharedStatus`].
pub fn new_shared_status() -> SharedStatus {
    Arc::new(Mutex::new(SessionStatus::default()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

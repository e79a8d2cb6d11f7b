//! Real-time speech coaching engine.
//!
//! Records short rolling audio segments from the microphone, sends them to a
//! remote analysis service for speaking-rate / volume / filler-word metrics,
//! and fires coaching alerts ("Talk slower", "Speak louder", …) when a
//! metric stays out of its configured range long enough.
//!
//! # Module map
//!
//! * [`capture`]     — microphone seam ([`capture::CaptureDevice`], cpal impl)
//! * [`analyze`]     — analysis-service seam ([`analyze::MetricAnalyzer`], HTTP impl)
//! * [`metrics`]     — metric kinds, samples, rolling history
//! * [`feedback`]    — threshold evaluation, violation tracking, alerts
//! * [`calibration`] — ambient-volume zero-point calibration
//! * [`session`]     — the recording loop and shared session status
//! * [`config`]      — app config, per-user threshold documents, persistence

pub mod analyze;
pub mod calibration;
pub mod capture;
pub mod config;
pub mod feedback;
pub mod metrics;
pub mod session;

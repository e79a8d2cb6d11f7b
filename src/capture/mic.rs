//! Microphone capture via `cpal`.
//!
//! [`MicCapture`] records one fixed-length mono segment per
//! [`record`](crate::capture::CaptureDevice::record) call. The cpal stream
//! lives entirely inside a `spawn_blocking` closure: built on entry, dropped
//! on exit, so the hardware handle is released no matter how the cycle ends.

use std::sync::mpsc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::{AudioSegment, CaptureDevice, CaptureError};

// ---------------------------------------------------------------------------
// MicCapture
// ---------------------------------------------------------------------------

/// Default-input-device capture.
///
/// Stateless between calls — each `record` re-resolves the default device so
/// the engine follows OS-level input switches without a restart.
#[derive(Debug, Default)]
pub struct MicCapture;

impl MicCapture {
    pub fn new() -> Self {
        Self
    }

    /// Blocking record of `window` seconds of mono audio.
    ///
    /// Runs on the blocking thread pool. The cpal callback pushes chunks
    /// over a std mpsc channel; this thread drains it until the window has
    /// elapsed, then drops the stream (releasing the device) and downmixes
    /// to mono.
    fn record_blocking(window: Duration) -> Result<AudioSegment, CaptureError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(CaptureError::NoDevice)?;

        let supported = device
            .default_input_config()
            .map_err(|e| CaptureError::Stream(e.to_string()))?;
        let channels = supported.channels() as usize;
        let sample_rate = supported.sample_rate().0;
        let config: cpal::StreamConfig = supported.into();

        let (tx, rx) = mpsc::channel::<Vec<f32>>();

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    // Receiver may be gone once the window closes.
                    let _ = tx.send(data.to_vec());
                },
                |err| log::error!("cpal stream error: {err}"),
                None,
            )
            .map_err(|e| match e {
                cpal::BuildStreamError::DeviceNotAvailable => CaptureError::NoDevice,
                other => CaptureError::Stream(other.to_string()),
            })?;

        stream
            .play()
            .map_err(|e| CaptureError::Stream(e.to_string()))?;

        let mut interleaved: Vec<f32> = Vec::with_capacity(sample_rate as usize);
        let deadline = Instant::now() + window;
        while Instant::now() < deadline {
            match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                Ok(chunk) => interleaved.extend_from_slice(&chunk),
                Err(mpsc::RecvTimeoutError::Timeout) => break,
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Err(CaptureError::Stream("input stream closed".into()))
                }
            }
        }
        drop(stream); // release the device before returning

        let samples = downmix_to_mono(&interleaved, channels);
        Ok(AudioSegment {
            samples,
            sample_rate,
        })
    }
}

#[async_trait]
impl CaptureDevice for MicCapture {
    async fn record(&self, window: Duration) -> Result<AudioSegment, CaptureError> {
        tokio::task::spawn_blocking(move || Self::record_blocking(window))
            .await
            .map_err(|e| CaptureError::TaskFailed(e.to_string()))?
    }
}

// ---------------------------------------------------------------------------
// Channel downmix
// ---------------------------------------------------------------------------

/// Average interleaved channels into mono.
fn downmix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

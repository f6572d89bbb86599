use anyhow::{bail, Result};
use tokio::sync::mpsc;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

/// Configuration for audio capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Sample rate requested from the device
    pub sample_rate: u32,
    /// Channel count (1 = mono, 2 = stereo)
    pub channels: u16,
    /// Frame size in milliseconds (affects latency)
    pub frame_duration_ms: u64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000, // 16kHz speech
            channels: 1,        // Mono
            frame_duration_ms: 100,
        }
    }
}

/// An exclusively held capture stream.
///
/// Frames arrive on the receiver returned by `start`. After `stop` the backend
/// closes that channel once the last buffered frame has been delivered; the
/// closed channel is the capture-stopped event.
pub trait CaptureBackend: Send {
    /// Start capturing audio
    fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Request capture stop
    fn stop(&mut self);

    /// Check if backend is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get backend name for logging
    fn name(&self) -> &str;
}

/// Microphone permission and device acquisition.
#[async_trait::async_trait]
pub trait MicrophoneAccess: Send + Sync {
    /// Suspend until access is granted (returning the device) or denied.
    async fn acquire(&self) -> Result<Box<dyn CaptureBackend>>;
}

/// Microphone capability for hosts with no capture device.
pub struct UnavailableMicrophone;

#[async_trait::async_trait]
impl MicrophoneAccess for UnavailableMicrophone {
    async fn acquire(&self) -> Result<Box<dyn CaptureBackend>> {
        bail!("No microphone is available on this host")
    }
}

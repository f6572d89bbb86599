use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use hound::WavReader;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::backend::{AudioFrame, CaptureBackend, CaptureConfig, MicrophoneAccess};

pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path).context("Failed to open WAV file")?;

        let spec = reader.spec();
        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds = samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Split into frames of `frame_duration_ms`, the last one possibly shorter.
    pub fn frames(&self, frame_duration_ms: u64) -> Vec<AudioFrame> {
        let per_frame = (self.sample_rate as u64 * frame_duration_ms / 1000) as usize
            * self.channels.max(1) as usize;
        let per_frame = per_frame.max(1);

        self.samples
            .chunks(per_frame)
            .enumerate()
            .map(|(i, chunk)| AudioFrame {
                samples: chunk.to_vec(),
                sample_rate: self.sample_rate,
                channels: self.channels,
                timestamp_ms: i as u64 * frame_duration_ms,
            })
            .collect()
    }
}

/// Microphone stand-in that "captures" the contents of a WAV file.
///
/// Each acquisition re-reads the file, so every recording replays it from the
/// start. Frames are paced at real time until stopped or exhausted.
pub struct WavFileMicrophone {
    path: PathBuf,
    config: CaptureConfig,
}

impl WavFileMicrophone {
    pub fn new(path: impl Into<PathBuf>, config: CaptureConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }
}

#[async_trait::async_trait]
impl MicrophoneAccess for WavFileMicrophone {
    async fn acquire(&self) -> Result<Box<dyn CaptureBackend>> {
        let path = self.path.clone();
        let audio = tokio::task::spawn_blocking(move || AudioFile::open(path))
            .await
            .context("WAV reader task panicked")??;

        info!(
            "Microphone replays {} ({:.1}s)",
            audio.path, audio.duration_seconds
        );

        if audio.sample_rate != self.config.sample_rate || audio.channels != self.config.channels {
            warn!(
                "WAV file is {}Hz/{}ch, capture config expects {}Hz/{}ch; using file format",
                audio.sample_rate, audio.channels, self.config.sample_rate, self.config.channels
            );
        }

        Ok(Box::new(FileBackend {
            frames: audio.frames(self.config.frame_duration_ms),
            frame_duration_ms: self.config.frame_duration_ms,
            capturing: Arc::new(AtomicBool::new(false)),
        }))
    }
}

struct FileBackend {
    frames: Vec<AudioFrame>,
    frame_duration_ms: u64,
    capturing: Arc<AtomicBool>,
}

impl CaptureBackend for FileBackend {
    fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.capturing.swap(true, Ordering::SeqCst) {
            bail!("Already capturing");
        }

        let (tx, rx) = mpsc::channel(32);
        let frames = std::mem::take(&mut self.frames);
        let capturing = Arc::clone(&self.capturing);
        let pace = std::time::Duration::from_millis(self.frame_duration_ms);

        tokio::spawn(async move {
            for frame in frames {
                if !capturing.load(Ordering::SeqCst) {
                    break;
                }
                if tx.send(frame).await.is_err() {
                    break;
                }
                tokio::time::sleep(pace).await;
            }
            // Hold the channel open until stop is requested
            while capturing.load(Ordering::SeqCst) && !tx.is_closed() {
                tokio::time::sleep(pace).await;
            }
        });

        Ok(rx)
    }

    fn stop(&mut self) {
        self.capturing.store(false, Ordering::SeqCst);
    }

    fn is_capturing(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        "WAV file"
    }
}

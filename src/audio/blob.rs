use std::io::Cursor;

use anyhow::{Context, Result};
use tracing::debug;

use super::backend::AudioFrame;

/// One assembled recording, ready for upload
#[derive(Debug, Clone)]
pub struct AudioBlob {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
    pub duration_ms: u64,
}

/// Accumulates captured frames for one recording session
#[derive(Debug, Default)]
pub struct RecordingBuffer {
    frames: Vec<AudioFrame>,
    sample_count: usize,
}

impl RecordingBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty frames are dropped
    pub fn push(&mut self, frame: AudioFrame) {
        if frame.samples.is_empty() {
            return;
        }
        self.sample_count += frame.samples.len();
        self.frames.push(frame);
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Encode everything captured so far as a single 16-bit WAV blob.
    ///
    /// The format of the first frame wins; an empty buffer yields a valid
    /// zero-length 16kHz mono WAV.
    pub fn into_blob(self, file_name: &str, mime_type: &str) -> Result<AudioBlob> {
        let (sample_rate, channels) = self
            .frames
            .first()
            .map(|f| (f.sample_rate, f.channels))
            .unwrap_or((16000, 1));

        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer =
                hound::WavWriter::new(&mut cursor, spec).context("Failed to create WAV writer")?;
            for frame in &self.frames {
                for &sample in &frame.samples {
                    writer
                        .write_sample(sample)
                        .context("Failed to write sample to WAV")?;
                }
            }
            writer.finalize().context("Failed to finalize WAV blob")?;
        }

        let duration_ms =
            self.sample_count as u64 * 1000 / (sample_rate as u64 * channels.max(1) as u64).max(1);
        let bytes = cursor.into_inner();

        debug!(
            "Assembled recording: {} frames, {} samples, {}ms, {} bytes",
            self.frames.len(),
            self.sample_count,
            duration_ms,
            bytes.len()
        );

        Ok(AudioBlob {
            bytes,
            file_name: file_name.to_string(),
            mime_type: mime_type.to_string(),
            duration_ms,
        })
    }
}

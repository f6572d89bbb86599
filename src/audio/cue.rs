//! Fire-and-forget audio cues on conversation state transitions.
//!
//! Each cue is synthesized and played on its own detached task that tears the
//! voice down after the tone duration. Nothing here is ever awaited by the
//! caller and every failure stays inside the task.

use std::f32::consts::PI;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::debug;

const CUE_SAMPLE_RATE: u32 = 16000;
const CUE_DURATION: Duration = Duration::from_millis(80);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CueKind {
    /// User message sent
    Send,
    /// Assistant message received
    Recv,
    /// Widget opened
    Open,
}

/// A short sine tone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f32,
    pub gain: f32,
    pub duration: Duration,
}

impl CueKind {
    pub fn tone(self) -> Tone {
        let (frequency_hz, gain) = match self {
            CueKind::Send => (1200.0, 0.02),
            CueKind::Recv => (800.0, 0.02),
            CueKind::Open => (1500.0, 0.01),
        };
        Tone {
            frequency_hz,
            gain,
            duration: CUE_DURATION,
        }
    }
}

impl Tone {
    /// Render as mono 16-bit PCM
    pub fn render(&self, sample_rate: u32) -> Vec<i16> {
        let count = (sample_rate as u128 * self.duration.as_millis() / 1000) as usize;
        let amplitude = self.gain.clamp(0.0, 1.0) * i16::MAX as f32;

        (0..count)
            .map(|n| {
                let t = n as f32 / sample_rate as f32;
                (amplitude * (2.0 * PI * self.frequency_hz * t).sin()) as i16
            })
            .collect()
    }
}

/// Platform audio output able to play a rendered tone.
pub trait ToneOutput: Send + Sync {
    /// Begin playback; the returned voice is closed after the tone duration.
    fn open(&self, tone: &Tone, samples: Vec<i16>, sample_rate: u32) -> Result<Box<dyn ToneVoice>>;
}

/// A playing tone
pub trait ToneVoice: Send {
    fn close(self: Box<Self>) -> Result<()>;
}

/// Output for headless hosts: tones are rendered and discarded.
pub struct SilentOutput;

struct SilentVoice;

impl ToneOutput for SilentOutput {
    fn open(&self, _tone: &Tone, _samples: Vec<i16>, _sample_rate: u32) -> Result<Box<dyn ToneVoice>> {
        Ok(Box::new(SilentVoice))
    }
}

impl ToneVoice for SilentVoice {
    fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}

#[derive(Clone)]
pub struct CueEmitter {
    output: Arc<dyn ToneOutput>,
}

impl CueEmitter {
    pub fn new(output: Arc<dyn ToneOutput>) -> Self {
        Self { output }
    }

    pub fn silent() -> Self {
        Self::new(Arc::new(SilentOutput))
    }

    /// Schedule a cue. Returns immediately; without a tokio runtime the cue is
    /// dropped.
    pub fn emit(&self, kind: CueKind) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime available, {:?} cue dropped", kind);
            return;
        };

        let output = Arc::clone(&self.output);
        runtime.spawn(async move {
            let tone = kind.tone();
            let samples = tone.render(CUE_SAMPLE_RATE);

            let voice = match output.open(&tone, samples, CUE_SAMPLE_RATE) {
                Ok(voice) => voice,
                Err(e) => {
                    debug!("Audio cue {:?} unavailable: {}", kind, e);
                    return;
                }
            };

            tokio::time::sleep(tone.duration).await;

            if let Err(e) = voice.close() {
                debug!("Failed to close {:?} cue: {}", kind, e);
            }
        });
    }
}

// Stub services and platform capabilities shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{bail, Result};
use serde_json::{json, Value};
use sula_assistant::audio::{
    AudioBlob, AudioFrame, CaptureBackend, MicrophoneAccess, SilentOutput, Tone, ToneOutput, ToneVoice,
};
use sula_assistant::voice::RecognitionEvent;
use sula_assistant::{
    AnswerService, AssistantSession, Config, Message, Platform, ServiceError, Services, SpeechRecognizer,
    TranscriptionService,
};
use tokio::sync::{mpsc, Notify};

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.reveal.tick_ms = 1;
    config
}

pub fn last_content(messages: &[Message]) -> String {
    messages.last().map(|m| m.content.clone()).unwrap_or_default()
}

/// Poll until `check` holds or two seconds pass
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}

// ============================================================================
// Answer service
// ============================================================================

/// Replays queued responses; answers `{"BK9": "Refer friends."}` once empty
#[derive(Default)]
pub struct StubAnswers {
    responses: Mutex<VecDeque<Result<Value, ServiceError>>>,
    prompts: Mutex<Vec<String>>,
    gate: Option<Arc<Notify>>,
}

impl StubAnswers {
    pub fn answering(body: Value) -> Arc<Self> {
        let stub = Self::default();
        stub.push(Ok(body));
        Arc::new(stub)
    }

    pub fn failing() -> Arc<Self> {
        let stub = Self::default();
        stub.push(Err(ServiceError::Status(reqwest::StatusCode::BAD_GATEWAY)));
        Arc::new(stub)
    }

    /// Every call waits for `gate` to be notified before answering
    pub fn gated(gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            gate: Some(gate),
            ..Self::default()
        })
    }

    pub fn push(&self, response: Result<Value, ServiceError>) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl AnswerService for StubAnswers {
    async fn ask(&self, prompt: &str) -> Result<Value, ServiceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(json!({"BK9": "Refer friends."})))
    }
}

// ============================================================================
// Transcription service
// ============================================================================

pub struct StubTranscriber {
    calls: AtomicUsize,
    uploads: Mutex<Vec<AudioBlob>>,
    fail: bool,
    body: Value,
}

impl StubTranscriber {
    pub fn returning(body: Value) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            uploads: Mutex::new(Vec::new()),
            fail: false,
            body,
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            uploads: Mutex::new(Vec::new()),
            fail: true,
            body: Value::Null,
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> Vec<AudioBlob> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TranscriptionService for StubTranscriber {
    async fn transcribe(&self, audio: AudioBlob) -> Result<Value, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.uploads.lock().unwrap().push(audio);
        if self.fail {
            return Err(ServiceError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR));
        }
        Ok(self.body.clone())
    }
}

// ============================================================================
// Microphone
// ============================================================================

pub fn speech_frames(count: usize) -> Vec<AudioFrame> {
    (0..count)
        .map(|i| AudioFrame {
            samples: vec![(i as i16) * 10; 160],
            sample_rate: 16000,
            channels: 1,
            timestamp_ms: i as u64 * 10,
        })
        .collect()
}

/// Grants access to a device that yields fixed frames and closes its channel
/// on stop
pub struct ScriptedMicrophone {
    frames: Vec<AudioFrame>,
    acquisitions: AtomicUsize,
    releases: Arc<AtomicUsize>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedMicrophone {
    pub fn new(frames: Vec<AudioFrame>) -> Arc<Self> {
        Arc::new(Self {
            frames,
            acquisitions: AtomicUsize::new(0),
            releases: Arc::default(),
            gate: None,
        })
    }

    /// Acquisition waits for `gate` (a pending permission prompt)
    pub fn gated(frames: Vec<AudioFrame>, gate: Arc<Notify>) -> Arc<Self> {
        Arc::new(Self {
            frames,
            acquisitions: AtomicUsize::new(0),
            releases: Arc::default(),
            gate: Some(gate),
        })
    }

    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::SeqCst)
    }

    /// Times any backend it handed out was told to stop
    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MicrophoneAccess for ScriptedMicrophone {
    async fn acquire(&self) -> Result<Box<dyn CaptureBackend>> {
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.acquisitions.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedBackend {
            frames: self.frames.clone(),
            tx: None,
            releases: Arc::clone(&self.releases),
        }))
    }
}

struct ScriptedBackend {
    frames: Vec<AudioFrame>,
    tx: Option<mpsc::Sender<AudioFrame>>,
    releases: Arc<AtomicUsize>,
}

impl CaptureBackend for ScriptedBackend {
    fn start(&mut self) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.tx.is_some() {
            bail!("Already capturing");
        }
        let (tx, rx) = mpsc::channel(self.frames.len().max(1));
        for frame in self.frames.drain(..) {
            tx.try_send(frame)?;
        }
        self.tx = Some(tx);
        Ok(rx)
    }

    fn stop(&mut self) {
        self.tx = None;
        self.releases.fetch_add(1, Ordering::SeqCst);
    }

    fn is_capturing(&self) -> bool {
        self.tx.is_some()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// Speech recognizer
// ============================================================================

#[derive(Default)]
pub struct MockRecognizer {
    events: Mutex<Option<mpsc::UnboundedSender<RecognitionEvent>>>,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl MockRecognizer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver an event to the current platform session
    pub fn emit(&self, event: RecognitionEvent) {
        if let Some(tx) = self.events.lock().unwrap().as_ref() {
            let _ = tx.send(event);
        }
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl SpeechRecognizer for MockRecognizer {
    fn start(&self) -> Result<mpsc::UnboundedReceiver<RecognitionEvent>> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        // Replacing the sender ends the previous session's channel
        *self.events.lock().unwrap() = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

// ============================================================================
// Tone output
// ============================================================================

/// Records the frequency and length of every tone opened, and counts closes
#[derive(Default)]
pub struct RecordingOutput {
    pub opened: Mutex<Vec<(f32, usize)>>,
    pub closed: Arc<Mutex<usize>>,
}

impl RecordingOutput {
    pub fn frequencies(&self) -> Vec<f32> {
        self.opened.lock().unwrap().iter().map(|(f, _)| *f).collect()
    }
}

struct RecordedVoice(Arc<Mutex<usize>>);

impl ToneOutput for RecordingOutput {
    fn open(&self, tone: &Tone, samples: Vec<i16>, _sample_rate: u32) -> Result<Box<dyn ToneVoice>> {
        self.opened.lock().unwrap().push((tone.frequency_hz, samples.len()));
        Ok(Box::new(RecordedVoice(Arc::clone(&self.closed))))
    }
}

impl ToneVoice for RecordedVoice {
    fn close(self: Box<Self>) -> Result<()> {
        *self.0.lock().unwrap() += 1;
        Ok(())
    }
}

// ============================================================================
// Session wiring
// ============================================================================

pub fn session_with(
    answers: Arc<StubAnswers>,
    transcriber: Arc<StubTranscriber>,
    recognizer: Option<Arc<MockRecognizer>>,
    microphone: Arc<dyn MicrophoneAccess>,
) -> AssistantSession {
    let services = Services {
        answers,
        transcriber,
    };
    let platform = Platform {
        recognizer: recognizer.map(|r| r as Arc<dyn SpeechRecognizer>),
        microphone,
        tone_output: Arc::new(SilentOutput),
    };
    AssistantSession::new(&test_config(), services, platform)
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::session::Mode;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub answer: AnswerConfig,
    pub transcription: TranscriptionConfig,
    pub prompt: PromptConfig,
    pub reveal: RevealConfig,
    pub messages: MessagesConfig,
    pub presets: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

/// Remote answer-generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerConfig {
    pub endpoint: String,
    /// Query-string parameter carrying the composed prompt
    pub query_param: String,
    pub timeout_secs: u64,
}

/// Remote transcription service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptionConfig {
    pub endpoint: String,
    /// Server transcription starts enabled; a failure disables it for the session
    pub enabled: bool,
    /// Multipart field name carrying the audio
    pub field_name: String,
    pub file_name: String,
    pub mime_type: String,
    pub timeout_secs: u64,
}

/// Fixed prompt fragments composed around every outbound query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    pub assistant: String,
    pub creative: String,
    pub precise: String,
    pub context_note: String,
    pub summary: String,
    pub closing: String,
}

impl PromptConfig {
    pub fn instruction(&self, mode: Mode) -> &str {
        match mode {
            Mode::Assistant => &self.assistant,
            Mode::Creative => &self.creative,
            Mode::Precise => &self.precise,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealConfig {
    pub tick_ms: u64,
    /// Single glyph shown while an answer is pending
    pub placeholder: String,
}

/// User-visible fixed texts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesConfig {
    pub greeting: Vec<String>,
    pub cleared: String,
    pub fallback: String,
    pub error: String,
    pub processing_voice: String,
    pub transcription_empty: String,
    pub transcription_unavailable: String,
    pub voice_recorded: String,
    pub microphone_unavailable: String,
    pub recognition_unsupported: String,
    /// Shown when speech arrives while an earlier query is still in flight
    pub voice_busy: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            answer: AnswerConfig::default(),
            transcription: TranscriptionConfig::default(),
            prompt: PromptConfig::default(),
            reveal: RevealConfig::default(),
            messages: MessagesConfig::default(),
            presets: default_presets(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "sula-assistant".to_string(),
            http: HttpConfig {
                bind: "127.0.0.1".to_string(),
                port: 8787,
            },
        }
    }
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.bk9.dev/ai/llama".to_string(),
            query_param: "q".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8788/api/transcribe".to_string(),
            enabled: true,
            field_name: "file".to_string(),
            file_name: "message.wav".to_string(),
            mime_type: "audio/wav".to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            assistant: "Answer in a helpful, friendly assistant style.".to_string(),
            creative: "Answer creatively with imaginative solutions and engaging style.".to_string(),
            precise: "Answer precisely with technical details and exact information.".to_string(),
            context_note: "Include info about Owner: Sula and Developer/Web Creator: Thenux when relevant. \
                Keep answers friendly and actionable."
                .to_string(),
            summary: DEFAULT_SUMMARY.to_string(),
            closing: "Provide a helpful response.".to_string(),
        }
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            tick_ms: 12,
            placeholder: "▎".to_string(),
        }
    }
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            greeting: vec![
                "👋 Hello! I'm SULA-MD AI Assistant, your intelligent guide to everything SULA-MD!".to_string(),
                "I can help with Owner Sula, Developer Thenux, bot deployment, coins system, referrals, \
                 admin features and more. Try the quick buttons below!"
                    .to_string(),
            ],
            cleared: "💫 Chat cleared! How can I assist you today?".to_string(),
            fallback: "I apologize, but I couldn't process your request. Please try again.".to_string(),
            error: "⚠️ I encountered an error. Please check your connection or try again later.".to_string(),
            processing_voice: "🎤 Processing your voice message...".to_string(),
            transcription_empty: "Transcription failed. Try microphone transcription instead.".to_string(),
            transcription_unavailable: "Server transcription failed. Try live speech recognition instead.".to_string(),
            voice_recorded: "🎙️ Voice recorded. Enable server transcription for automatic conversion.".to_string(),
            microphone_unavailable: "❌ Microphone permission denied or not available.".to_string(),
            recognition_unsupported: "Speech recognition is not supported on this platform.".to_string(),
            voice_busy: "⏳ I'm still answering your previous question. Please ask again in a moment.".to_string(),
        }
    }
}

pub fn default_presets() -> Vec<String> {
    [
        "Who is Owner Sula?",
        "Who is Developer Thenux?",
        "What can SULA-MD do?",
        "How to earn coins?",
        "How to deploy SULA-MD?",
        "Show admin features",
        "Bot deployment guide",
        "Referral system",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

const DEFAULT_SUMMARY: &str = "Summary of Your Web Application: SULA-MD
- Core Purpose: SULA-MD is a sophisticated WhatsApp automation platform designed to manage WhatsApp channels efficiently while earning and spending digital coins.
- Key Features:
  - Channel React Manager with reaction packs.
  - Coin Economy: Earn coins through referrals, ads, social subscriptions, daily tasks.
  - Real-Time Stats for active users, bots, channels, success rates.
  - Referral System with tracked referred users & events.
  - Admin Controls: manage coins, reward events, referrals.
  - Integrated Support: floating WhatsApp contact widget with Owner and Developer.
- Deployment: Frontend on Netlify/Vercel; Backend on Firebase (Auth, Firestore, Cloud Functions), Storage for images.
- Engagement: ads, daily rewards, WhatsApp orders for purchasing coins.
";

impl Config {
    /// Load configuration layered as defaults, then `path` (optional), then
    /// `ASSISTANT__*` environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let defaults = Self::default();

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&defaults).context("Failed to encode defaults")?)
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("ASSISTANT").separator("__"))
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }
}

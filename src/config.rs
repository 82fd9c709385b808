//! Configuration management for Parley
//!
//! Everything is read once at startup, from the process environment and an
//! optional `.env` file, and passed explicitly from there on.

use secrecy::{ExposeSecret, SecretString};

use crate::{Error, Result};

/// Default Gemini model identifier
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default Gemini API endpoint
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Default HTTP port for the web variant
pub const DEFAULT_PORT: u16 = 5000;

/// Parley configuration
#[derive(Debug)]
pub struct Config {
    /// Google API key (`GOOGLE_API_KEY`), used for Gemini and Cloud Speech
    pub api_key: Option<SecretString>,

    /// Answer with a canned echo instead of calling the model (`USE_MOCK`)
    pub mock: bool,

    /// Expose underlying error details to clients (`DEBUG`)
    pub debug: bool,

    /// Gemini model identifier (`PARLEY_MODEL`)
    pub model: String,

    /// Gemini API base URL (`PARLEY_API_BASE`)
    pub api_base_url: String,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Voice loop configuration
    pub voice: VoiceConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind (`PARLEY_HOST`)
    pub host: String,

    /// Port to listen on (`PARLEY_PORT` or `PORT`)
    pub port: u16,
}

/// Speech-to-text backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SttProvider {
    /// Google Cloud Speech-to-Text
    #[default]
    Google,
    /// `OpenAI` Whisper
    Whisper,
}

/// Text-to-speech backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TtsProvider {
    /// Google Cloud Text-to-Speech
    #[default]
    Google,
    /// `OpenAI` TTS
    OpenAI,
}

impl SttProvider {
    /// Parse a provider name, case-insensitively
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "google" => Some(Self::Google),
            "whisper" | "openai" => Some(Self::Whisper),
            _ => None,
        }
    }
}

impl TtsProvider {
    /// Parse a provider name, case-insensitively
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "google" => Some(Self::Google),
            "openai" => Some(Self::OpenAI),
            _ => None,
        }
    }
}

/// Voice loop configuration
#[derive(Debug, Default)]
pub struct VoiceConfig {
    /// STT backend (`PARLEY_STT_PROVIDER`)
    pub stt_provider: SttProvider,

    /// TTS backend (`PARLEY_TTS_PROVIDER`)
    pub tts_provider: TtsProvider,

    /// TTS voice name, provider default when unset (`PARLEY_TTS_VOICE`)
    pub tts_voice: Option<String>,

    /// BCP-47 language code for recognition and synthesis (`PARLEY_LANGUAGE`)
    pub language: String,

    /// `OpenAI` API key for the Whisper/OpenAI backends (`OPENAI_API_KEY`)
    pub openai_api_key: Option<SecretString>,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// Variables from a `.env` file in the working directory (or a parent)
    /// are loaded first; variables already set in the process take priority.
    #[must_use]
    pub fn from_env() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env file"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "failed to load .env file"),
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let server = ServerConfig {
            host: non_empty("PARLEY_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: non_empty("PARLEY_PORT")
                .or_else(|| non_empty("PORT"))
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT),
        };

        let stt_provider = non_empty("PARLEY_STT_PROVIDER").map_or_else(
            SttProvider::default,
            |name| {
                SttProvider::parse(&name).unwrap_or_else(|| {
                    tracing::warn!(provider = %name, "unknown STT provider, using google");
                    SttProvider::default()
                })
            },
        );

        let tts_provider = non_empty("PARLEY_TTS_PROVIDER").map_or_else(
            TtsProvider::default,
            |name| {
                TtsProvider::parse(&name).unwrap_or_else(|| {
                    tracing::warn!(provider = %name, "unknown TTS provider, using google");
                    TtsProvider::default()
                })
            },
        );

        let voice = VoiceConfig {
            stt_provider,
            tts_provider,
            tts_voice: non_empty("PARLEY_TTS_VOICE"),
            language: non_empty("PARLEY_LANGUAGE").unwrap_or_else(|| "en-US".to_string()),
            openai_api_key: non_empty("OPENAI_API_KEY").map(SecretString::from),
        };

        Self {
            api_key: non_empty("GOOGLE_API_KEY").map(SecretString::from),
            mock: env_flag(lookup("USE_MOCK").as_deref(), false),
            debug: env_flag(lookup("DEBUG").as_deref(), true),
            model: non_empty("PARLEY_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_base_url: non_empty("PARLEY_API_BASE")
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            server,
            voice,
        }
    }

    /// Prepare configuration for the web variant
    ///
    /// A missing API key forces mock mode so the page stays usable offline.
    #[must_use]
    pub fn for_server(mut self) -> Self {
        if !self.mock && self.api_key.is_none() {
            tracing::warn!("GOOGLE_API_KEY not set, forcing mock mode");
            self.mock = true;
        }
        self
    }

    /// Check configuration for the command-line variant
    ///
    /// `spoken_input` and `spoken_output` say whether the microphone and the
    /// speakers are used; each needs the key of its speech provider, even in
    /// mock mode.
    ///
    /// # Errors
    ///
    /// Returns error if the Gemini key is missing outside of mock mode, or
    /// if a speech provider in use has no key
    pub fn ensure_listen_ready(&self, spoken_input: bool, spoken_output: bool) -> Result<()> {
        if !self.mock && self.api_key.is_none() {
            return Err(Error::Config(
                "GOOGLE_API_KEY not found; set it in the environment or in a .env file \
                 (GOOGLE_API_KEY=your_api_key_here)"
                    .to_string(),
            ));
        }

        if spoken_input {
            let uses_google = self.voice.stt_provider == SttProvider::Google;
            self.require_speech_key(uses_google, "speech recognition", "--typed")?;
        }
        if spoken_output {
            let uses_google = self.voice.tts_provider == TtsProvider::Google;
            self.require_speech_key(uses_google, "speech synthesis", "--mute")?;
        }
        Ok(())
    }

    fn require_speech_key(&self, uses_google: bool, purpose: &str, bypass: &str) -> Result<()> {
        let (present, var) = if uses_google {
            (self.api_key.is_some(), "GOOGLE_API_KEY")
        } else {
            (self.voice.openai_api_key.is_some(), "OPENAI_API_KEY")
        };

        if present {
            Ok(())
        } else {
            Err(Error::Config(format!(
                "{var} required for {purpose}; pass {bypass} to run without it"
            )))
        }
    }
}

/// Duplicate a secret for a second owner
pub(crate) fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_string())
}

/// Interpret a boolean environment value (`1`, `true`, `yes`)
#[must_use]
pub fn env_flag(value: Option<&str>, default: bool) -> bool {
    value.map_or(default, |v| {
        matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes")
    })
}

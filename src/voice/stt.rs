//! Speech-to-text (STT) processing

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::capture::SAMPLE_RATE;
use crate::config::{Config, SttProvider, copy_secret};
use crate::{Error, Result};

const GOOGLE_STT_URL: &str = "https://speech.googleapis.com/v1/speech:recognize";
const WHISPER_URL: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Response from Google Cloud Speech-to-Text
#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    results: Vec<GoogleResult>,
}

#[derive(Deserialize)]
struct GoogleResult {
    #[serde(default)]
    alternatives: Vec<GoogleAlternative>,
}

#[derive(Deserialize)]
struct GoogleAlternative {
    #[serde(default)]
    transcript: String,
}

/// Response from `OpenAI` Whisper transcription API
#[derive(Deserialize)]
struct WhisperResponse {
    text: String,
}

/// Transcribes speech to text
pub struct SpeechToText {
    client: reqwest::Client,
    api_key: SecretString,
    language: String,
    provider: SttProvider,
}

impl SpeechToText {
    /// Create a new STT instance using Google Cloud Speech-to-Text
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_google(api_key: SecretString, language: String) -> Result<Self> {
        Self::with_provider(SttProvider::Google, api_key, language)
    }

    /// Create a new STT instance using `OpenAI` Whisper
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_whisper(api_key: SecretString, language: String) -> Result<Self> {
        Self::with_provider(SttProvider::Whisper, api_key, language)
    }

    /// Create the configured STT backend
    ///
    /// # Errors
    ///
    /// Returns error if the backend's API key is not configured
    pub fn from_config(config: &Config) -> Result<Self> {
        let language = config.voice.language.clone();
        match config.voice.stt_provider {
            SttProvider::Google => {
                let key = config.api_key.as_ref().ok_or_else(|| {
                    Error::Config("GOOGLE_API_KEY required for Google speech recognition".to_string())
                })?;
                Self::new_google(copy_secret(key), language)
            }
            SttProvider::Whisper => {
                let key = config.voice.openai_api_key.as_ref().ok_or_else(|| {
                    Error::Config("OPENAI_API_KEY required for Whisper".to_string())
                })?;
                Self::new_whisper(copy_secret(key), language)
            }
        }
    }

    fn with_provider(provider: SttProvider, api_key: SecretString, language: String) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(format!("API key required for {provider:?} STT")));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            language,
            provider,
        })
    }

    /// Transcribe audio to text
    ///
    /// Returns an empty string when the audio contained no recognizable speech.
    ///
    /// # Arguments
    ///
    /// * `audio` - 16kHz mono WAV bytes
    ///
    /// # Errors
    ///
    /// Returns error if transcription fails
    pub async fn transcribe(&self, audio: &[u8]) -> Result<String> {
        match self.provider {
            SttProvider::Google => self.transcribe_google(audio).await,
            SttProvider::Whisper => self.transcribe_whisper(audio).await,
        }
    }

    /// Transcribe using Google Cloud Speech-to-Text
    async fn transcribe_google(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting Google transcription");

        let request = serde_json::json!({
            "config": {
                "encoding": "LINEAR16",
                "sampleRateHertz": SAMPLE_RATE,
                "languageCode": self.language,
            },
            "audio": { "content": BASE64.encode(audio) },
        });

        let response = self
            .client
            .post(GOOGLE_STT_URL)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Google STT request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Google STT API error");
            return Err(Error::Stt(format!("Google STT error {status}: {body}")));
        }

        let result: GoogleResponse = response.json().await?;
        let transcript = first_transcript(&result);

        tracing::info!(transcript = %transcript, "transcription complete");
        Ok(transcript)
    }

    /// Transcribe using `OpenAI` Whisper
    async fn transcribe_whisper(&self, audio: &[u8]) -> Result<String> {
        tracing::debug!(audio_bytes = audio.len(), "starting Whisper transcription");

        let language = self
            .language
            .split('-')
            .next()
            .unwrap_or_default()
            .to_string();

        let form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(audio.to_vec())
                    .file_name("audio.wav")
                    .mime_str("audio/wav")
                    .map_err(|e| Error::Stt(e.to_string()))?,
            )
            .text("model", "whisper-1")
            .text("language", language);

        let response = self
            .client
            .post(WHISPER_URL)
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Whisper request failed");
                e
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Whisper API error");
            return Err(Error::Stt(format!("Whisper API error {status}: {body}")));
        }

        let result: WhisperResponse = response.json().await?;

        tracing::info!(transcript = %result.text, "transcription complete");
        Ok(result.text.trim().to_string())
    }
}

fn first_transcript(response: &GoogleResponse) -> String {
    response
        .results
        .first()
        .and_then(|r| r.alternatives.first())
        .map(|a| a.transcript.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_response_parsing() {
        let response: GoogleResponse = serde_json::from_str(
            r#"{"results": [{"alternatives": [{"transcript": " what time is it ", "confidence": 0.9}]}]}"#,
        )
        .unwrap();
        assert_eq!(first_transcript(&response), "what time is it");
    }

    #[test]
    fn google_no_speech_is_empty() {
        let response: GoogleResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(first_transcript(&response), "");
    }

    #[test]
    fn rejects_empty_key() {
        let result = SpeechToText::new_google(SecretString::from(String::new()), "en-US".into());
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

//! Text-to-speech (TTS) processing

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::config::{Config, TtsProvider, copy_secret};
use crate::{Error, Result};

const GOOGLE_TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";
const OPENAI_TTS_URL: &str = "https://api.openai.com/v1/audio/speech";

/// Synthesizes speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    api_key: SecretString,
    voice: Option<String>,
    language: String,
    provider: TtsProvider,
}

impl TextToSpeech {
    /// Create a new TTS instance using Google Cloud Text-to-Speech
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_google(api_key: SecretString, voice: Option<String>, language: String) -> Result<Self> {
        Self::with_provider(TtsProvider::Google, api_key, voice, language)
    }

    /// Create a new TTS instance using `OpenAI`
    ///
    /// # Errors
    ///
    /// Returns error if API key is missing
    pub fn new_openai(api_key: SecretString, voice: Option<String>) -> Result<Self> {
        Self::with_provider(TtsProvider::OpenAI, api_key, voice, String::new())
    }

    /// Create the configured TTS backend
    ///
    /// # Errors
    ///
    /// Returns error if the backend's API key is not configured
    pub fn from_config(config: &Config) -> Result<Self> {
        let voice = config.voice.tts_voice.clone();
        match config.voice.tts_provider {
            TtsProvider::Google => {
                let key = config.api_key.as_ref().ok_or_else(|| {
                    Error::Config("GOOGLE_API_KEY required for Google TTS".to_string())
                })?;
                Self::new_google(copy_secret(key), voice, config.voice.language.clone())
            }
            TtsProvider::OpenAI => {
                let key = config.voice.openai_api_key.as_ref().ok_or_else(|| {
                    Error::Config("OPENAI_API_KEY required for OpenAI TTS".to_string())
                })?;
                Self::new_openai(copy_secret(key), voice)
            }
        }
    }

    fn with_provider(
        provider: TtsProvider,
        api_key: SecretString,
        voice: Option<String>,
        language: String,
    ) -> Result<Self> {
        if api_key.expose_secret().is_empty() {
            return Err(Error::Config(format!("API key required for {provider:?} TTS")));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            voice,
            language,
            provider,
        })
    }

    /// Synthesize text to speech
    ///
    /// # Returns
    ///
    /// Audio bytes (MP3 format)
    ///
    /// # Errors
    ///
    /// Returns error if synthesis fails
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        match self.provider {
            TtsProvider::Google => self.synthesize_google(text).await,
            TtsProvider::OpenAI => self.synthesize_openai(text).await,
        }
    }

    /// Synthesize using Google Cloud Text-to-Speech
    async fn synthesize_google(&self, text: &str) -> Result<Vec<u8>> {
        let request = google_request(text, &self.language, self.voice.as_deref());

        let response = self
            .client
            .post(GOOGLE_TTS_URL)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("Google TTS error {status}: {body}")));
        }

        let result: GoogleSynthesizeResponse = response.json().await?;
        let audio = BASE64.decode(result.audio_content)?;
        tracing::debug!(audio_bytes = audio.len(), "speech synthesized");
        Ok(audio)
    }

    /// Synthesize using `OpenAI` TTS
    async fn synthesize_openai(&self, text: &str) -> Result<Vec<u8>> {
        #[derive(Serialize)]
        struct TtsRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
        }

        let request = TtsRequest {
            model: "tts-1",
            input: text,
            voice: self.voice.as_deref().unwrap_or("alloy"),
        };

        let response = self
            .client
            .post(OPENAI_TTS_URL)
            .bearer_auth(self.api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        let audio = response.bytes().await?;
        tracing::debug!(audio_bytes = audio.len(), "speech synthesized");
        Ok(audio.to_vec())
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleSynthesizeResponse {
    audio_content: String,
}

fn google_request(text: &str, language: &str, voice: Option<&str>) -> serde_json::Value {
    let mut voice_params = serde_json::json!({ "languageCode": language });
    if let Some(name) = voice {
        voice_params["name"] = serde_json::Value::from(name);
    }

    serde_json::json!({
        "input": { "text": text },
        "voice": voice_params,
        "audioConfig": { "audioEncoding": "MP3" },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn google_request_shape() {
        let request = google_request("hello", "en-GB", None);
        assert_eq!(request["input"]["text"], "hello");
        assert_eq!(request["voice"]["languageCode"], "en-GB");
        assert!(request["voice"].get("name").is_none());
        assert_eq!(request["audioConfig"]["audioEncoding"], "MP3");

        let request = google_request("hello", "en-US", Some("en-US-Neural2-C"));
        assert_eq!(request["voice"]["name"], "en-US-Neural2-C");
    }

    #[test]
    fn google_response_decodes() {
        let response: GoogleSynthesizeResponse =
            serde_json::from_str(r#"{"audioContent": "SUQz"}"#).unwrap();
        assert_eq!(BASE64.decode(response.audio_content).unwrap(), b"ID3");
    }

    #[test]
    fn rejects_empty_key() {
        let result = TextToSpeech::new_openai(SecretString::from(String::new()), None);
        assert!(matches!(result, Err(Error::Config(_))));
    }
}

//! Where utterances come from

use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};

use super::capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
use super::endpoint::UtteranceDetector;
use super::stt::SpeechToText;
use crate::Result;

/// How long to sample room noise before each utterance
const CALIBRATION: Duration = Duration::from_millis(500);

/// Capture poll interval
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Produces user utterances
#[async_trait(?Send)]
pub trait TranscriptionSource {
    /// Wait for the next utterance
    ///
    /// `Ok(None)` means the source is exhausted; an empty string means
    /// nothing intelligible was heard.
    ///
    /// # Errors
    ///
    /// Returns error if capture or recognition fails
    async fn listen(&mut self) -> Result<Option<String>>;
}

/// Spoken input: microphone, endpointing, then cloud recognition
pub struct MicrophoneSource {
    capture: AudioCapture,
    detector: UtteranceDetector,
    stt: SpeechToText,
}

impl MicrophoneSource {
    /// Open the microphone and start capturing
    ///
    /// # Errors
    ///
    /// Returns error if the input device cannot be opened
    pub fn new(stt: SpeechToText) -> Result<Self> {
        let mut capture = AudioCapture::new()?;
        capture.start()?;
        Ok(Self {
            capture,
            detector: UtteranceDetector::new(),
            stt,
        })
    }

    async fn record_utterance(&mut self) -> Vec<f32> {
        self.capture.clear_buffer();
        tokio::time::sleep(CALIBRATION).await;
        self.detector.calibrate(&self.capture.take_buffer());
        self.detector.reset();

        println!("Listening...");
        loop {
            tokio::time::sleep(POLL_INTERVAL).await;
            let samples = self.capture.take_buffer();
            if let Some(utterance) = self.detector.process(&samples) {
                return utterance;
            }
        }
    }
}

#[async_trait(?Send)]
impl TranscriptionSource for MicrophoneSource {
    async fn listen(&mut self) -> Result<Option<String>> {
        let utterance = self.record_utterance().await;
        let wav = samples_to_wav(&utterance, SAMPLE_RATE)?;
        let text = self.stt.transcribe(&wav).await?;

        if text.is_empty() {
            println!("Sorry, I could not understand the audio.");
        } else {
            println!("You said: {text}");
        }
        Ok(Some(text))
    }
}

/// Typed input, one utterance per line
pub struct TypedSource<R> {
    lines: Lines<BufReader<R>>,
    prompt: bool,
}

impl TypedSource<tokio::io::Stdin> {
    /// Read from standard input with a `You: ` prompt
    #[must_use]
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            prompt: true,
        }
    }
}

impl<R: AsyncRead + Unpin> TypedSource<R> {
    /// Read from any async reader, without prompting
    pub fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            prompt: false,
        }
    }
}

#[async_trait(?Send)]
impl<R: AsyncRead + Unpin> TranscriptionSource for TypedSource<R> {
    async fn listen(&mut self) -> Result<Option<String>> {
        if self.prompt {
            print!("You: ");
            std::io::stdout().flush()?;
        }
        Ok(self.lines.next_line().await?)
    }
}

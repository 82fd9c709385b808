//! Where replies go

use async_trait::async_trait;

use super::playback::AudioPlayback;
use super::tts::TextToSpeech;
use crate::Result;

/// Presents assistant replies
#[async_trait(?Send)]
pub trait SpeechSink {
    /// Present one reply
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn speak(&mut self, text: &str) -> Result<()>;
}

/// Prints replies only
#[derive(Debug, Default)]
pub struct ConsoleSink;

#[async_trait(?Send)]
impl SpeechSink for ConsoleSink {
    async fn speak(&mut self, text: &str) -> Result<()> {
        println!("AI: {text}");
        Ok(())
    }
}

/// Prints replies and reads them aloud
pub struct SpokenSink {
    tts: TextToSpeech,
    playback: AudioPlayback,
}

impl SpokenSink {
    /// Open the output device
    ///
    /// # Errors
    ///
    /// Returns error if no output device is available
    pub fn new(tts: TextToSpeech) -> Result<Self> {
        Ok(Self {
            tts,
            playback: AudioPlayback::new()?,
        })
    }
}

#[async_trait(?Send)]
impl SpeechSink for SpokenSink {
    async fn speak(&mut self, text: &str) -> Result<()> {
        println!("AI: {text}");
        let audio = self.tts.synthesize(text).await?;
        self.playback.play_mp3(&audio)
    }
}

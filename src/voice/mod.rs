//! Voice processing module
//!
//! Audio capture and playback, endpointing, cloud STT/TTS, and the
//! command-line conversation loop built on them.

mod capture;
mod conversation;
mod endpoint;
mod playback;
mod sink;
mod source;
mod stt;
mod tts;

pub use capture::{AudioCapture, SAMPLE_RATE, rms, samples_to_wav};
pub use conversation::{ConversationSummary, EXIT_KEYWORDS, is_exit_command, run_conversation};
pub use endpoint::{DetectorState, UtteranceDetector};
pub use playback::AudioPlayback;
pub use sink::{ConsoleSink, SpeechSink, SpokenSink};
pub use source::{MicrophoneSource, TranscriptionSource, TypedSource};
pub use stt::SpeechToText;
pub use tts::TextToSpeech;

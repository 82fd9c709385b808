//! The command-line conversation loop
//!
//! listen → handle → speak, one utterance at a time, until an exit keyword
//! or the end of input.

use super::sink::SpeechSink;
use super::source::TranscriptionSource;
use crate::chat::ChatHandler;

/// Utterances that end the conversation
pub const EXIT_KEYWORDS: [&str; 3] = ["exit", "quit", "stop"];

/// What happened during a conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversationSummary {
    /// Replies delivered to the sink (including apologies)
    pub turns: usize,
    /// Empty or unintelligible utterances skipped
    pub skipped: usize,
    /// Turns whose chat request failed
    pub failures: usize,
}

/// Check whether an utterance asks to end the conversation
#[must_use]
pub fn is_exit_command(utterance: &str) -> bool {
    let normalized = utterance.trim().to_lowercase();
    EXIT_KEYWORDS.contains(&normalized.as_str())
}

/// Run the conversation until an exit keyword or end of input
///
/// Transcription and playback failures are logged and never end the loop.
pub async fn run_conversation<S, K>(
    source: &mut S,
    chat: &ChatHandler,
    sink: &mut K,
) -> ConversationSummary
where
    S: TranscriptionSource + ?Sized,
    K: SpeechSink + ?Sized,
{
    let mut summary = ConversationSummary::default();

    loop {
        let utterance = match source.listen().await {
            Ok(Some(utterance)) => utterance,
            Ok(None) => {
                tracing::info!("input closed");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "transcription failed");
                String::new()
            }
        };

        if is_exit_command(&utterance) {
            println!("Exiting...");
            break;
        }

        if utterance.trim().is_empty() {
            summary.skipped += 1;
            continue;
        }

        let reply = match chat.handle(&utterance).await {
            Ok(reply) => {
                tracing::debug!(mock = reply.mock, chars = reply.text.len(), "reply ready");
                reply.text
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                summary.failures += 1;
                e.spoken_message().to_string()
            }
        };

        if let Err(e) = sink.speak(&reply).await {
            tracing::error!(error = %e, "failed to speak reply");
        }
        summary.turns += 1;
    }

    tracing::debug!(?summary, "conversation ended");
    summary
}

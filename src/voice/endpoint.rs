//! Utterance endpointing
//!
//! Splits a live sample stream into utterances using local energy
//! detection. The speech threshold adapts to the room via [`calibrate`].
//!
//! [`calibrate`]: UtteranceDetector::calibrate

use super::capture::{SAMPLE_RATE, rms};

/// Threshold used before calibration
const DEFAULT_THRESHOLD: f32 = 0.03;

/// Calibration never drops the threshold below this
const MIN_THRESHOLD: f32 = 0.01;

/// Speech must be this many times louder than the ambient noise
const NOISE_FACTOR: f32 = 2.5;

/// Minimum voiced audio for an utterance (0.3 seconds)
const MIN_SPEECH_SAMPLES: usize = SAMPLE_RATE as usize * 3 / 10;

/// Trailing silence that ends an utterance (0.8 seconds)
const SILENCE_SAMPLES: usize = SAMPLE_RATE as usize * 8 / 10;

/// Longest utterance before it is cut off (15 seconds)
const MAX_UTTERANCE_SAMPLES: usize = SAMPLE_RATE as usize * 15;

/// State of the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Waiting for speech
    Idle,
    /// Speech started, accumulating
    Speaking,
}

/// Detects where utterances start and end
#[derive(Debug)]
pub struct UtteranceDetector {
    threshold: f32,
    state: DetectorState,
    buffer: Vec<f32>,
    voiced: usize,
    silence: usize,
}

impl Default for UtteranceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl UtteranceDetector {
    /// Create a detector with the default threshold
    #[must_use]
    pub const fn new() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            state: DetectorState::Idle,
            buffer: Vec::new(),
            voiced: 0,
            silence: 0,
        }
    }

    /// Set the speech threshold from a sample of ambient noise
    ///
    /// Returns the new threshold.
    pub fn calibrate(&mut self, ambient: &[f32]) -> f32 {
        let noise = rms(ambient);
        self.threshold = (noise * NOISE_FACTOR).max(MIN_THRESHOLD);
        tracing::debug!(noise, threshold = self.threshold, "calibrated for ambient noise");
        self.threshold
    }

    /// Feed a block of samples
    ///
    /// Returns the utterance once trailing silence (or the length cap) ends it.
    pub fn process(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        if samples.is_empty() {
            return None;
        }

        let energy = rms(samples);
        let is_speech = energy > self.threshold;

        match self.state {
            DetectorState::Idle => {
                if is_speech {
                    tracing::trace!(energy, "speech started");
                    self.state = DetectorState::Speaking;
                    self.buffer.clear();
                    self.buffer.extend_from_slice(samples);
                    self.voiced = samples.len();
                    self.silence = 0;
                }
                None
            }
            DetectorState::Speaking => {
                self.buffer.extend_from_slice(samples);
                if is_speech {
                    self.voiced += samples.len();
                    self.silence = 0;
                } else {
                    self.silence += samples.len();
                }

                if self.buffer.len() >= MAX_UTTERANCE_SAMPLES {
                    tracing::debug!(samples = self.buffer.len(), "utterance hit length cap");
                    return Some(self.finish());
                }

                if self.silence > SILENCE_SAMPLES {
                    if self.voiced >= MIN_SPEECH_SAMPLES {
                        tracing::debug!(samples = self.buffer.len(), "utterance complete");
                        return Some(self.finish());
                    }
                    tracing::trace!(voiced = self.voiced, "too short, discarding");
                    self.reset();
                }
                None
            }
        }
    }

    fn finish(&mut self) -> Vec<f32> {
        let utterance = std::mem::take(&mut self.buffer);
        self.reset();
        utterance
    }

    /// Reset detector to idle state
    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
        self.buffer.clear();
        self.voiced = 0;
        self.silence = 0;
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> DetectorState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 100ms blocks, like the capture poll interval
    const BLOCK: usize = SAMPLE_RATE as usize / 10;

    fn tone(blocks: usize) -> Vec<Vec<f32>> {
        vec![vec![0.3; BLOCK]; blocks]
    }

    fn silence(blocks: usize) -> Vec<Vec<f32>> {
        vec![vec![0.0; BLOCK]; blocks]
    }

    fn feed(detector: &mut UtteranceDetector, blocks: Vec<Vec<f32>>) -> Option<Vec<f32>> {
        blocks.iter().find_map(|b| detector.process(b))
    }

    #[test]
    fn calibration_raises_threshold_above_noise() {
        let mut detector = UtteranceDetector::new();
        let threshold = detector.calibrate(&[0.1; 1000]);
        assert!((threshold - 0.25).abs() < 0.001);

        let threshold = detector.calibrate(&[0.0; 1000]);
        assert!((threshold - MIN_THRESHOLD).abs() < f32::EPSILON);
    }

    #[test]
    fn silence_stays_idle() {
        let mut detector = UtteranceDetector::new();
        assert!(feed(&mut detector, silence(30)).is_none());
        assert_eq!(detector.state(), DetectorState::Idle);
    }

    #[test]
    fn speech_then_silence_completes() {
        let mut detector = UtteranceDetector::new();
        assert!(feed(&mut detector, tone(10)).is_none());
        assert_eq!(detector.state(), DetectorState::Speaking);

        let utterance = feed(&mut detector, silence(10)).unwrap();
        // 10 voiced blocks + 9 silent blocks until silence exceeds 0.8s
        assert_eq!(utterance.len(), BLOCK * 19);
        assert_eq!(detector.state(), DetectorState::Idle);
    }

    #[test]
    fn short_blip_is_discarded() {
        let mut detector = UtteranceDetector::new();
        assert!(feed(&mut detector, tone(1)).is_none());
        assert!(feed(&mut detector, silence(12)).is_none());
        assert_eq!(detector.state(), DetectorState::Idle);
    }

    #[test]
    fn long_speech_is_capped() {
        let mut detector = UtteranceDetector::new();
        let utterance = feed(&mut detector, tone(200)).unwrap();
        assert_eq!(utterance.len(), MAX_UTTERANCE_SAMPLES);
    }

    #[test]
    fn quiet_room_after_calibration() {
        let mut detector = UtteranceDetector::new();
        detector.calibrate(&[0.2; 1000]);
        // Speech at the ambient level is not speech
        assert!(feed(&mut detector, vec![vec![0.2; BLOCK]; 20]).is_none());
        assert_eq!(detector.state(), DetectorState::Idle);
    }
}

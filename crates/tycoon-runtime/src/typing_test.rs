//! Timed typing test runs that feed the boost formula.

use crate::error::Rejection;
use crate::features::require;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tycoon_core::{AccuracyRecord, Feature, GameState, TestMode};

/// A test in progress.
#[derive(Clone, Debug, PartialEq)]
pub struct TypingTest {
    pub mode: TestMode,
    pub target_words: u32,
    pub started_at: DateTime<Utc>,
    pub correct_words: u32,
    pub incorrect_words: u32,
    pub correct_chars: u64,
}

/// Summary of a finished test.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub mode: TestMode,
    pub wpm: f64,
    pub word_count: u32,
    pub accuracy: f64,
}

impl TypingTest {
    /// Start a run; the mode's feature (and its parents) must be unlocked.
    pub fn start(
        mode: TestMode,
        words: u32,
        now: DateTime<Utc>,
        state: &GameState,
    ) -> Result<Self, Rejection> {
        require(state, Feature::TypingTest)?;
        if mode == TestMode::Marathon {
            require(state, Feature::MarathonMode)?;
        }
        if !mode.allowed_lengths().contains(&words) {
            return Err(Rejection::InvalidTestLength { mode, words });
        }
        Ok(Self {
            mode,
            target_words: words,
            started_at: now,
            correct_words: 0,
            incorrect_words: 0,
            correct_chars: 0,
        })
    }

    pub fn typed_words(&self) -> u32 {
        self.correct_words + self.incorrect_words
    }

    /// Count one typed word. Words past the target length are ignored.
    pub fn record_word(&mut self, correct: bool, length: u64) {
        if self.is_complete() {
            return;
        }
        if correct {
            self.correct_words += 1;
            self.correct_chars += length;
        } else {
            self.incorrect_words += 1;
        }
    }

    pub fn is_complete(&self) -> bool {
        self.typed_words() >= self.target_words
    }

    /// Close the run. WPM counts correct characters over at least one second.
    pub fn finish(&self, now: DateTime<Utc>) -> TestResult {
        let elapsed_ms = (now - self.started_at).num_milliseconds().max(1_000);
        let minutes = elapsed_ms as f64 / 60_000.0;
        TestResult {
            mode: self.mode,
            wpm: (self.correct_chars as f64 / 5.0) / minutes,
            word_count: self.typed_words().min(self.target_words),
            accuracy: AccuracyRecord::derived_percentage(
                u64::from(self.correct_words),
                u64::from(self.incorrect_words),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 2, 18, 30, 0).unwrap()
    }

    fn unlocked(features: &[Feature]) -> GameState {
        let mut s = GameState::default();
        s.unlocked_features.extend(features.iter().copied());
        s
    }

    #[test]
    fn start_requires_feature() {
        let s = GameState::default();
        assert_eq!(
            TypingTest::start(TestMode::Standard, 15, t0(), &s),
            Err(Rejection::FeatureLocked(Feature::TypingTest))
        );
        let s = unlocked(&[Feature::TypingTest]);
        assert_eq!(
            TypingTest::start(TestMode::Marathon, 100, t0(), &s),
            Err(Rejection::FeatureLocked(Feature::MarathonMode))
        );
        let s = unlocked(&[Feature::TypingTest, Feature::MarathonMode]);
        assert!(TypingTest::start(TestMode::Marathon, 100, t0(), &s).is_ok());
    }

    #[test]
    fn rejects_lengths_outside_mode() {
        let s = unlocked(&[Feature::TypingTest]);
        assert_eq!(
            TypingTest::start(TestMode::Sprint, 15, t0(), &s),
            Err(Rejection::InvalidTestLength {
                mode: TestMode::Sprint,
                words: 15
            })
        );
    }

    #[test]
    fn finish_reports_wpm_and_accuracy() {
        let s = unlocked(&[Feature::TypingTest]);
        let mut t = TypingTest::start(TestMode::Sprint, 10, t0(), &s).unwrap();
        for _ in 0..8 {
            t.record_word(true, 5);
        }
        assert!(!t.is_complete());
        t.record_word(false, 5);
        t.record_word(false, 5);
        assert!(t.is_complete());
        // 40 chars = 8 words in 30s
        let r = t.finish(t0() + Duration::seconds(30));
        assert_eq!(r.wpm, 16.0);
        assert_eq!(r.word_count, 10);
        assert_eq!(r.accuracy, 80.0);
        assert_eq!(r.mode, TestMode::Sprint);
    }

    #[test]
    fn words_past_target_are_ignored() {
        let s = unlocked(&[Feature::TypingTest]);
        let mut t = TypingTest::start(TestMode::Sprint, 10, t0(), &s).unwrap();
        for _ in 0..25 {
            t.record_word(true, 5);
        }
        t.record_word(false, 5);
        assert_eq!(t.typed_words(), 10);
        assert_eq!(t.correct_chars, 50);
        let r = t.finish(t0() + Duration::seconds(60));
        assert_eq!(r.word_count, 10);
        assert_eq!(r.accuracy, 100.0);
        assert_eq!(r.wpm, 10.0);
    }
}
